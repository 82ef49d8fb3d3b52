//! Error types for the compass pipeline

use thiserror::Error;

/// Compass configuration errors
///
/// The per-sample path never fails; these only arise when building settings
/// or translating platform values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompassError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid display rotation: {0} degrees")]
    InvalidDisplayRotation(u16),
}

/// Result type for compass operations
pub type Result<T> = core::result::Result<T, CompassError>;
