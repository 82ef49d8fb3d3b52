//! Core types and conventions for the compass heading pipeline

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::axes::AxesAlignment;
use crate::error::{CompassError, Result};

/// Current screen orientation relative to the device's natural orientation
///
/// The display rotation decides how device axes are remapped before the
/// azimuth is extracted. It is read with every sample because the user can
/// rotate the device at any time.
///
/// # Example
/// ```
/// use fusion_compass::DisplayRotation;
///
/// let rotation = DisplayRotation::try_from(270u16).unwrap();
/// assert_eq!(rotation, DisplayRotation::Rotation270);
/// assert!(DisplayRotation::try_from(45u16).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayRotation {
    /// Natural orientation (portrait on phones)
    #[default]
    Rotation0,
    /// Rotated a quarter turn counter-clockwise
    Rotation90,
    /// Upside down
    Rotation180,
    /// Rotated a quarter turn clockwise
    Rotation270,
}

impl DisplayRotation {
    /// Build from the platform surface index (0..=3 quarter turns)
    pub fn from_surface_index(index: u8) -> Result<Self> {
        match index {
            0 => Ok(Self::Rotation0),
            1 => Ok(Self::Rotation90),
            2 => Ok(Self::Rotation180),
            3 => Ok(Self::Rotation270),
            other => Err(CompassError::InvalidDisplayRotation(u16::from(other) * 90)),
        }
    }

    /// Rotation in degrees
    pub fn degrees(self) -> u16 {
        match self {
            Self::Rotation0 => 0,
            Self::Rotation90 => 90,
            Self::Rotation180 => 180,
            Self::Rotation270 => 270,
        }
    }

    /// Axes remapping that brings device axes into screen axes
    pub fn alignment(self) -> AxesAlignment {
        match self {
            Self::Rotation0 => AxesAlignment::PxPyPz,
            Self::Rotation90 => AxesAlignment::PyNxPz,
            Self::Rotation180 => AxesAlignment::NxNyPz,
            Self::Rotation270 => AxesAlignment::NyPxPz,
        }
    }
}

impl TryFrom<u16> for DisplayRotation {
    type Error = CompassError;

    fn try_from(degrees: u16) -> Result<Self> {
        match degrees {
            0 => Ok(Self::Rotation0),
            90 => Ok(Self::Rotation90),
            180 => Ok(Self::Rotation180),
            270 => Ok(Self::Rotation270),
            other => Err(CompassError::InvalidDisplayRotation(other)),
        }
    }
}

/// Which sensors feed the orientation resolver
///
/// Chosen once when sensing starts and kept until it stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorSourceMode {
    /// Platform-fused rotation vector sensor
    RotationVector,
    /// Raw accelerometer and magnetometer fused here
    AccelerometerMagnetometer,
}

impl SensorSourceMode {
    /// Prefer the rotation vector whenever the platform provides one
    pub fn select(rotation_vector_available: bool) -> Self {
        if rotation_vector_available {
            Self::RotationVector
        } else {
            Self::AccelerometerMagnetometer
        }
    }
}

/// Sensors the host platform can provide for a sensing session
///
/// # Example
/// ```
/// use fusion_compass::{SensorAvailability, SensorSourceMode};
///
/// let sensors = SensorAvailability { rotation_vector: false };
/// assert_eq!(sensors.mode(), SensorSourceMode::AccelerometerMagnetometer);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorAvailability {
    /// A fused rotation vector sensor exists
    pub rotation_vector: bool,
}

impl SensorAvailability {
    /// Sensor mode a session started with these sensors uses
    pub fn mode(self) -> SensorSourceMode {
        SensorSourceMode::select(self.rotation_vector)
    }
}

/// Rotation vector sample: the vector part of a unit quaternion with an
/// optional scalar part
///
/// Older platforms only report three components; the scalar part is then
/// derived from the unit-norm constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationVector {
    /// Quaternion vector part (x, y, z)
    pub vector: Vector3<f32>,
    /// Quaternion scalar part, if reported
    pub scalar: Option<f32>,
}

impl RotationVector {
    /// Create a rotation vector sample with all four components
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self {
            vector: Vector3::new(x, y, z),
            scalar: Some(w),
        }
    }

    /// Create a rotation vector sample without a scalar component
    pub fn from_vector(vector: Vector3<f32>) -> Self {
        Self {
            vector,
            scalar: None,
        }
    }
}

/// A raw sensor event delivered by the platform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorEvent {
    /// Fused rotation vector
    RotationVector(RotationVector),
    /// Accelerometer reading in m/s²
    Accelerometer(Vector3<f32>),
    /// Magnetometer reading in µT
    Magnetometer(Vector3<f32>),
}

/// Device orientation angles in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    /// Compass heading in `[0, 360)`
    pub azimuth: f32,
    /// Rotation about the screen X axis, `[-90, 90]`
    pub pitch: f32,
    /// Rotation about the screen Y axis, `(-180, 180]`
    pub roll: f32,
}

/// Display refresh pushed to the UI
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayUpdate {
    /// Heading rounded to whole degrees, `0..360`
    pub heading_rounded: u16,
    /// Needle rotation in degrees; always the negated displayed heading
    pub visual_rotation: f32,
}

/// Compass pipeline settings
///
/// The defaults match the stock compass behavior. The heading filter's
/// smoothing factor is fixed and is not part of the settings.
///
/// # Example
/// ```
/// use fusion_compass::{Compass, CompassSettings};
///
/// let settings = CompassSettings {
///     calibration_window_ms: 2000, // Longer settling window
///     ..Default::default()
/// };
/// let compass = Compass::with_settings(settings).unwrap();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompassSettings {
    /// Length of the calibration sampling window in milliseconds
    pub calibration_window_ms: u64,
    /// Largest accepted heading spread during calibration, in degrees
    pub stability_threshold: f32,
    /// Display refreshes at least this often while samples arrive, in milliseconds
    pub refresh_interval_ms: u64,
    /// Heading change that forces an immediate refresh, in degrees
    pub refresh_threshold: f32,
}

impl Default for CompassSettings {
    fn default() -> Self {
        Self {
            calibration_window_ms: 1500,
            stability_threshold: 5.0,
            refresh_interval_ms: 100,
            refresh_threshold: 1.0,
        }
    }
}

impl CompassSettings {
    /// Check that every field holds a usable value
    pub fn validate(&self) -> Result<()> {
        if self.calibration_window_ms == 0 {
            return Err(CompassError::InvalidSettings(
                "calibration window must be longer than 0 ms".into(),
            ));
        }
        if !self.stability_threshold.is_finite() || self.stability_threshold < 0.0 {
            return Err(CompassError::InvalidSettings(format!(
                "stability threshold must be a non-negative angle, got {}",
                self.stability_threshold
            )));
        }
        if !self.refresh_threshold.is_finite() || self.refresh_threshold < 0.0 {
            return Err(CompassError::InvalidSettings(format!(
                "refresh threshold must be a non-negative angle, got {}",
                self.refresh_threshold
            )));
        }
        Ok(())
    }
}

/// State that survives suspend and resume of the host application
///
/// Everything else (filter, gate, calibration samples) is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CompassState {
    /// Whether a calibration was in progress
    pub is_calibrating: bool,
    /// Offset subtracted from every raw azimuth, in degrees
    pub calibrated_offset: f32,
}
