//! Fusion Compass - heading estimation for handheld compass displays
//!
//! This library turns raw orientation sensor events into a steady compass
//! heading ready for display. It resolves the device orientation from either
//! a fused rotation vector or an accelerometer/magnetometer pair, compensates
//! for the current screen rotation, smooths the heading on the circle and
//! limits how often the display is refreshed.
//!
//! # Features
//!
//! - Rotation vector or accelerometer + magnetometer orientation resolution
//! - Display-rotation axes remapping (portrait, landscape, reversed)
//! - Circular exponential smoothing that crosses north cleanly
//! - Time and threshold gated display refreshes
//! - User-triggered calibration that verifies the heading is steady
//! - Suspend/resume state snapshot with `serde` support
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use fusion_compass::{Compass, DisplayRotation, SensorAvailability, SensorEvent};
//!
//! let mut compass = Compass::new();
//! compass.start(SensorAvailability { rotation_vector: false }); // Accelerometer + magnetometer
//!
//! // Sensor readings
//! let accelerometer = Vector3::new(0.0, 0.0, 9.81);  // m/s²
//! let magnetometer = Vector3::new(0.0, 22.0, -40.0); // µT
//!
//! let rotation = DisplayRotation::Rotation0;
//! compass.process(SensorEvent::Accelerometer(accelerometer), rotation, 0);
//! compass.process(SensorEvent::Magnetometer(magnetometer), rotation, 20);
//!
//! // Smoothed heading in degrees
//! let heading = compass.heading().unwrap();
//! assert!(heading < 1.0 || heading > 359.0);
//! ```

pub mod axes;
pub mod calibration;
pub mod compass;
mod error;
mod filter;
mod gate;
mod math;
mod pipeline;
mod resolver;
mod types;

// Re-export all public types and functions
pub use axes::{AxesAlignment, remap_coordinate_system};
pub use calibration::{
    ButtonLabel, ButtonResponse, CalibrationEvent, CalibrationOutcome, CalibrationPhase,
    CalibrationSession, ControlState, Prompt,
};
pub use compass::{orientation_angles, rotation_matrix_from_gravity, rotation_matrix_from_vector};
pub use error::{CompassError, Result};
pub use filter::{HeadingFilter, SMOOTHING_FACTOR};
pub use gate::UpdateGate;
pub use math::{DEG_TO_RAD, RAD_TO_DEG, circular_mean, circular_std_dev, normalize, shortest_delta};
pub use pipeline::Compass;
pub use resolver::{OrientationResolver, OrientationSource, resolve_azimuth, resolve_orientation};
pub use types::*;
