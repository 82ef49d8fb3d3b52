//! Display-rotation axes remapping for rotation matrices
//!
//! A rotation matrix computed in the device frame has to be re-expressed in
//! the screen frame before the azimuth is read, otherwise a landscape screen
//! reports a heading a quarter turn off.
//!
//! # Example
//! ```
//! use nalgebra::Matrix3;
//! use fusion_compass::{AxesAlignment, remap_coordinate_system};
//!
//! // Device lying flat with its top edge towards north
//! let device = Matrix3::identity();
//!
//! // Screen rotated a quarter turn: screen X comes from device +Y, screen Y from device -X
//! let screen = remap_coordinate_system(&device, AxesAlignment::PyNxPz);
//!
//! assert_eq!(screen[(0, 1)], 1.0);
//! assert_eq!(screen[(1, 0)], -1.0);
//! ```

use nalgebra::Matrix3;

/// Axes alignment describing the screen axes relative to the device axes.
///
/// Each variant name lists the device axis used for screen X, Y and Z in
/// order, as letter pairs:
/// - `P` = Positive (same direction)
/// - `N` = Negative (inverted direction)
/// - `x`, `y`, `z` = which device axis to use
///
/// Only rotations about the device Z axis are needed for display rotation,
/// so Z is always `Pz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxesAlignment {
    /// +X+Y+Z (identity - no remapping)
    #[default]
    PxPyPz,
    /// +Y-X+Z
    PyNxPz,
    /// -X-Y+Z
    NxNyPz,
    /// -Y+X+Z
    NyPxPz,
}

impl AxesAlignment {
    /// Device column index and sign feeding screen X and screen Y
    fn sources(self) -> ((usize, f32), (usize, f32)) {
        match self {
            AxesAlignment::PxPyPz => ((0, 1.0), (1, 1.0)),
            AxesAlignment::PyNxPz => ((1, 1.0), (0, -1.0)),
            AxesAlignment::NxNyPz => ((0, -1.0), (1, -1.0)),
            AxesAlignment::NyPxPz => ((1, -1.0), (0, 1.0)),
        }
    }
}

/// Remap a rotation matrix into another coordinate system.
///
/// For every row `j`, the first input column lands in the column of the
/// screen X source axis and the second input column in the column of the
/// screen Y source axis, each with its sign applied. The third column is
/// copied unchanged.
///
/// # Arguments
/// * `rotation` - Rotation matrix in the device frame
/// * `alignment` - Screen axes expressed in device axes
///
/// # Returns
/// Rotation matrix in the screen frame
#[inline]
pub fn remap_coordinate_system(rotation: &Matrix3<f32>, alignment: AxesAlignment) -> Matrix3<f32> {
    let ((x_axis, x_sign), (y_axis, y_sign)) = alignment.sources();
    let mut remapped = Matrix3::zeros();

    for row in 0..3 {
        remapped[(row, x_axis)] = x_sign * rotation[(row, 0)];
        remapped[(row, y_axis)] = y_sign * rotation[(row, 1)];
        remapped[(row, 2)] = rotation[(row, 2)];
    }

    remapped
}
