//! Compass heading pipeline

use log::{debug, info, trace};

use crate::calibration::{
    ButtonResponse, CalibrationEvent, CalibrationOutcome, CalibrationPhase, CalibrationSession,
    ControlState,
};
use crate::error::Result;
use crate::filter::HeadingFilter;
use crate::gate::UpdateGate;
use crate::math::normalize;
use crate::resolver::OrientationResolver;
use crate::types::{
    CompassSettings, CompassState, DisplayRotation, DisplayUpdate, Orientation, SensorAvailability,
    SensorEvent, SensorSourceMode,
};

/// Heading pipeline from raw sensor events to display updates
///
/// Each event is resolved into a raw azimuth, corrected by the calibration
/// offset, smoothed, rate limited for display and, while a calibration is
/// collecting, recorded for the stability check.
///
/// Sensor subscription is owned by the host: call [`Compass::start`] when
/// the compass becomes visible and [`Compass::stop`] when it is hidden.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use fusion_compass::{Compass, DisplayRotation, SensorAvailability, SensorEvent};
///
/// let mut compass = Compass::new();
/// compass.start(SensorAvailability { rotation_vector: false });
///
/// let rotation = DisplayRotation::Rotation0;
/// compass.process(SensorEvent::Accelerometer(Vector3::new(0.0, 0.0, 9.81)), rotation, 1000);
/// let update = compass
///     .process(SensorEvent::Magnetometer(Vector3::new(-22.0, 0.0, -40.0)), rotation, 1010)
///     .unwrap();
///
/// assert_eq!(update.heading_rounded, 90);
/// ```
#[derive(Debug, Clone)]
pub struct Compass {
    settings: CompassSettings,
    /// Active sensing session, `None` while stopped
    resolver: Option<OrientationResolver>,
    filter: HeadingFilter,
    gate: UpdateGate,
    calibration: CalibrationSession,
    /// Subtracted from each raw azimuth; only changed by `restore`
    calibrated_offset: f32,
    orientation: Option<Orientation>,
}

impl Compass {
    /// Create a compass with default settings
    pub fn new() -> Self {
        Self::build(CompassSettings::default())
    }

    /// Create a compass with validated settings
    pub fn with_settings(settings: CompassSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::build(settings))
    }

    fn build(settings: CompassSettings) -> Self {
        Self {
            settings,
            resolver: None,
            filter: HeadingFilter::new(),
            gate: UpdateGate::new(settings.refresh_interval_ms, settings.refresh_threshold),
            calibration: CalibrationSession::new(
                settings.calibration_window_ms,
                settings.stability_threshold,
            ),
            calibrated_offset: 0.0,
            orientation: None,
        }
    }

    /// Begin a sensing session, choosing the sensor mode for its lifetime
    pub fn start(&mut self, sensors: SensorAvailability) -> SensorSourceMode {
        let mode = sensors.mode();
        debug!("Sensing started in {:?} mode", mode);
        self.resolver = Some(OrientationResolver::new(mode));
        mode
    }

    /// End the sensing session and drop cached sensor readings
    pub fn stop(&mut self) {
        if self.resolver.take().is_some() {
            debug!("Sensing stopped");
        }
    }

    /// Whether a sensing session is active
    pub fn is_running(&self) -> bool {
        self.resolver.is_some()
    }

    /// Sensor mode of the active session
    pub fn mode(&self) -> Option<SensorSourceMode> {
        self.resolver.as_ref().map(OrientationResolver::mode)
    }

    /// Run one sensor event through the pipeline
    ///
    /// Returns the display update when a refresh is due. Events that do not
    /// resolve to an orientation leave all state untouched.
    pub fn process(
        &mut self,
        event: SensorEvent,
        display_rotation: DisplayRotation,
        now_ms: u64,
    ) -> Option<DisplayUpdate> {
        let Some(resolver) = self.resolver.as_mut() else {
            trace!("Dropping sample received while stopped");
            return None;
        };

        let orientation = resolver.resolve(&event, display_rotation)?;
        self.orientation = Some(orientation);

        let target = normalize(orientation.azimuth - self.calibrated_offset);
        let heading = self.filter.update(target);
        let update = self.gate.evaluate(heading, now_ms);

        if let Some(CalibrationOutcome::Accepted { mean, .. }) = self.calibration.tick(heading, now_ms) {
            self.filter.reseed(mean);
        }

        update
    }

    /// Handle a press of the calibration control
    pub fn press_button(&mut self, now_ms: u64) -> ButtonResponse {
        self.calibration.press_button(now_ms)
    }

    /// Take the oldest pending calibration event
    pub fn poll_event(&mut self) -> Option<CalibrationEvent> {
        self.calibration.poll_event()
    }

    /// Smoothed heading, `None` until the first orientation is resolved
    pub fn heading(&self) -> Option<f32> {
        self.filter.heading()
    }

    /// Last resolved orientation, before offset correction and smoothing
    pub fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }

    /// Offset subtracted from the raw azimuth
    pub fn calibrated_offset(&self) -> f32 {
        self.calibrated_offset
    }

    /// Current calibration phase
    pub fn calibration_phase(&self) -> CalibrationPhase {
        self.calibration.phase()
    }

    /// How the calibration control should be rendered
    pub fn control(&self) -> ControlState {
        self.calibration.control()
    }

    /// Active settings
    pub fn settings(&self) -> CompassSettings {
        self.settings
    }

    /// State to persist across a suspend of the host
    pub fn snapshot(&self) -> CompassState {
        CompassState {
            is_calibrating: self.calibration.is_calibrating(),
            calibrated_offset: self.calibrated_offset,
        }
    }

    /// Restore persisted state after a suspend
    pub fn restore(&mut self, state: CompassState) {
        info!(
            "Restoring compass state: calibrating={}, offset={}",
            state.is_calibrating, state.calibrated_offset
        );
        self.calibration.restore(state.is_calibrating);
        self.calibrated_offset = state.calibrated_offset;
    }
}

impl Default for Compass {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RotationVector;
    use nalgebra::Vector3;

    const ROTATION_VECTOR: SensorAvailability = SensorAvailability { rotation_vector: true };
    const ACCEL_MAG: SensorAvailability = SensorAvailability { rotation_vector: false };

    /// Rotation vector sample reading as `azimuth` on a portrait screen
    fn heading_sample(azimuth: f32) -> SensorEvent {
        let half = -azimuth.to_radians() / 2.0;
        SensorEvent::RotationVector(RotationVector::new(0.0, 0.0, half.sin(), half.cos()))
    }

    fn started() -> Compass {
        let mut compass = Compass::new();
        compass.start(ROTATION_VECTOR);
        compass
    }

    #[test]
    fn test_new_compass() {
        let compass = Compass::new();
        assert!(!compass.is_running());
        assert_eq!(compass.heading(), None);
        assert_eq!(compass.calibrated_offset(), 0.0);
        assert_eq!(compass.calibration_phase(), CalibrationPhase::Idle);
    }

    #[test]
    fn test_mode_selection() {
        let mut compass = Compass::new();
        assert_eq!(compass.start(ROTATION_VECTOR), SensorSourceMode::RotationVector);
        assert_eq!(compass.mode(), Some(SensorSourceMode::RotationVector));

        compass.stop();
        assert_eq!(compass.mode(), None);

        assert_eq!(compass.start(ACCEL_MAG), SensorSourceMode::AccelerometerMagnetometer);
    }

    #[test]
    fn test_samples_dropped_while_stopped() {
        let mut compass = Compass::new();
        assert!(compass.process(heading_sample(30.0), DisplayRotation::Rotation0, 1000).is_none());
        assert_eq!(compass.heading(), None);
    }

    #[test]
    fn test_first_sample_seeds_heading() {
        let mut compass = started();
        let update = compass
            .process(heading_sample(30.0), DisplayRotation::Rotation0, 1000)
            .unwrap();

        assert_eq!(update.heading_rounded, 30);
        assert!((compass.heading().unwrap() - 30.0).abs() < 1e-3);
        assert!((compass.orientation().unwrap().azimuth - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_sample_changes_nothing() {
        let mut compass = started();
        compass.process(heading_sample(30.0), DisplayRotation::Rotation0, 1000);
        let before = compass.heading();

        let degenerate = SensorEvent::RotationVector(RotationVector::new(0.0, 0.0, 0.0, 0.0));
        assert!(compass.process(degenerate, DisplayRotation::Rotation0, 2000).is_none());
        assert_eq!(compass.heading(), before);
    }

    #[test]
    fn test_overflowing_pair_leaves_heading_untouched() {
        let mut compass = Compass::new();
        compass.start(ACCEL_MAG);
        let rotation = DisplayRotation::Rotation0;

        compass.process(SensorEvent::Accelerometer(Vector3::new(0.0, 0.0, 9.81)), rotation, 0);
        compass.process(SensorEvent::Magnetometer(Vector3::new(-22.0, 0.0, -40.0)), rotation, 10);
        let before = compass.heading();
        assert!(before.is_some());

        // Finite readings whose norms overflow f32
        let update = compass.process(SensorEvent::Accelerometer(Vector3::new(1e20, 0.0, 0.0)), rotation, 500);
        assert!(update.is_none());
        let update = compass.process(SensorEvent::Magnetometer(Vector3::new(0.0, 1e15, 0.0)), rotation, 510);
        assert!(update.is_none());
        assert_eq!(compass.heading(), before);

        // Level again with the strong north field cached: the heading moves on
        compass.process(SensorEvent::Accelerometer(Vector3::new(0.0, 0.0, 9.81)), rotation, 600);
        let heading = compass.heading().unwrap();
        assert!(heading.is_finite());
        assert!((heading - 76.5).abs() < 1e-2, "expected 15% of the way from 90 to 0, got {}", heading);
    }

    #[test]
    fn test_restored_offset_is_subtracted() {
        let mut compass = started();
        compass.restore(CompassState {
            is_calibrating: false,
            calibrated_offset: 40.0,
        });

        let update = compass
            .process(heading_sample(30.0), DisplayRotation::Rotation0, 1000)
            .unwrap();
        assert_eq!(update.heading_rounded, 350);
    }

    #[test]
    fn test_accepted_calibration_reseeds_filter() {
        let mut compass = started();
        compass.process(heading_sample(100.0), DisplayRotation::Rotation0, 0);

        compass.press_button(0);
        compass.press_button(0);
        assert!(matches!(compass.calibration_phase(), CalibrationPhase::Collecting { .. }));

        for i in 1..=15u64 {
            compass.process(heading_sample(100.0), DisplayRotation::Rotation0, i * 100);
        }

        assert_eq!(compass.calibration_phase(), CalibrationPhase::Idle);
        assert!((compass.heading().unwrap() - 100.0).abs() < 1e-2);

        // Calibration never writes the offset
        assert_eq!(compass.calibrated_offset(), 0.0);

        let events: Vec<_> = std::iter::from_fn(|| compass.poll_event()).collect();
        assert!(matches!(
            events.last(),
            Some(CalibrationEvent::Finished(CalibrationOutcome::Accepted { .. }))
        ));
    }

    #[test]
    fn test_snapshot_tracks_calibration() {
        let mut compass = started();
        assert_eq!(compass.snapshot(), CompassState::default());

        compass.press_button(0);
        assert!(compass.snapshot().is_calibrating);

        let mut resumed = Compass::new();
        resumed.restore(compass.snapshot());
        assert_eq!(resumed.calibration_phase(), CalibrationPhase::AwaitingConfirmation);
        assert_eq!(resumed.control(), compass.control());
    }
}
