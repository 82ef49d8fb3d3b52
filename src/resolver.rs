//! Orientation resolution from raw sensor events

use log::trace;
use nalgebra::Vector3;

use crate::axes::remap_coordinate_system;
use crate::compass::{orientation_angles, rotation_matrix_from_gravity, rotation_matrix_from_vector};
use crate::types::{DisplayRotation, Orientation, RotationVector, SensorEvent, SensorSourceMode};

/// Sensor readings that fully determine one orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrientationSource {
    /// Platform-fused rotation vector
    RotationVector(RotationVector),
    /// Latest accelerometer and magnetometer pair
    AccelerometerMagnetometer {
        accelerometer: Vector3<f32>,
        magnetometer: Vector3<f32>,
    },
}

/// Resolve screen-frame orientation angles from one source sample
///
/// The device rotation matrix is remapped for the current display rotation
/// before angles are extracted. Returns `None` when the readings are
/// degenerate.
pub fn resolve_orientation(
    source: &OrientationSource,
    display_rotation: DisplayRotation,
) -> Option<Orientation> {
    let rotation = match *source {
        OrientationSource::RotationVector(sample) => rotation_matrix_from_vector(sample)?,
        OrientationSource::AccelerometerMagnetometer {
            accelerometer,
            magnetometer,
        } => rotation_matrix_from_gravity(accelerometer, magnetometer)?,
    };

    let remapped = remap_coordinate_system(&rotation, display_rotation.alignment());
    Some(orientation_angles(&remapped))
}

/// Resolve the raw azimuth in `[0, 360)` from one source sample
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use fusion_compass::{DisplayRotation, OrientationSource, resolve_azimuth};
///
/// let source = OrientationSource::AccelerometerMagnetometer {
///     accelerometer: Vector3::new(0.0, 0.0, 9.81),
///     magnetometer: Vector3::new(-22.0, 0.0, -40.0), // Top edge towards east
/// };
/// let azimuth = resolve_azimuth(&source, DisplayRotation::Rotation0).unwrap();
/// assert!((azimuth - 90.0).abs() < 1e-3);
/// ```
pub fn resolve_azimuth(source: &OrientationSource, display_rotation: DisplayRotation) -> Option<f32> {
    resolve_orientation(source, display_rotation).map(|orientation| orientation.azimuth)
}

/// Turns the stream of sensor events of one sensing session into orientations
///
/// In accelerometer/magnetometer mode the most recent reading of each sensor
/// is kept; either one arriving triggers a new resolution once both are
/// known. Events that do not belong to the session's mode are ignored.
#[derive(Debug, Clone)]
pub struct OrientationResolver {
    mode: SensorSourceMode,
    accelerometer: Option<Vector3<f32>>,
    magnetometer: Option<Vector3<f32>>,
}

impl OrientationResolver {
    /// Create a resolver for one sensing session
    pub fn new(mode: SensorSourceMode) -> Self {
        Self {
            mode,
            accelerometer: None,
            magnetometer: None,
        }
    }

    /// Sensor mode fixed for this session
    pub fn mode(&self) -> SensorSourceMode {
        self.mode
    }

    /// Feed one event and resolve the orientation it implies
    pub fn resolve(
        &mut self,
        event: &SensorEvent,
        display_rotation: DisplayRotation,
    ) -> Option<Orientation> {
        let source = self.source_for(event)?;
        let orientation = resolve_orientation(&source, display_rotation);

        if orientation.is_none() {
            trace!("Degenerate {:?} sample skipped", self.mode);
        }

        orientation
    }

    fn source_for(&mut self, event: &SensorEvent) -> Option<OrientationSource> {
        match (self.mode, *event) {
            (SensorSourceMode::RotationVector, SensorEvent::RotationVector(sample)) => {
                Some(OrientationSource::RotationVector(sample))
            }
            (SensorSourceMode::AccelerometerMagnetometer, SensorEvent::Accelerometer(reading)) => {
                self.accelerometer = Some(reading);
                self.latest_pair()
            }
            (SensorSourceMode::AccelerometerMagnetometer, SensorEvent::Magnetometer(reading)) => {
                self.magnetometer = Some(reading);
                self.latest_pair()
            }
            (mode, event) => {
                trace!("Ignoring {:?} while resolving in {:?} mode", event, mode);
                None
            }
        }
    }

    fn latest_pair(&self) -> Option<OrientationSource> {
        Some(OrientationSource::AccelerometerMagnetometer {
            accelerometer: self.accelerometer?,
            magnetometer: self.magnetometer?,
        })
    }
}
