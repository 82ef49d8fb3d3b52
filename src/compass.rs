//! Rotation matrices and orientation angles from raw sensor readings

use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

use crate::math::{RAD_TO_DEG, normalize};
use crate::types::{Orientation, RotationVector};

/// Standard gravity in m/s²
pub const STANDARD_GRAVITY: f32 = 9.80665;

/// Squared accelerometer magnitude below which the device is treated as free falling
const FREE_FALL_GRAVITY_SQUARED: f32 = 0.01 * STANDARD_GRAVITY * STANDARD_GRAVITY;

/// Smallest usable horizontal field magnitude (|geomagnetic × gravity|)
const MIN_HORIZONTAL_FIELD: f32 = 0.1;

/// Build the device-to-world rotation matrix from gravity and geomagnetic readings
///
/// The rows of the returned matrix are the world East, North and Up axes
/// expressed in device coordinates:
/// - East = geomagnetic × gravity (normalized)
/// - North = gravity × East
/// - Up = gravity (normalized)
///
/// # Arguments
/// * `gravity` - Accelerometer reading in m/s²
/// * `geomagnetic` - Magnetometer reading in µT
///
/// # Returns
/// `None` when the readings cannot define an orientation: free fall, a
/// magnetic field parallel to gravity, or input that is non-finite or too
/// large to normalize.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use fusion_compass::compass::rotation_matrix_from_gravity;
///
/// let gravity = Vector3::new(0.0, 0.0, 9.81);       // Lying flat
/// let geomagnetic = Vector3::new(0.0, 22.0, -40.0); // Top edge towards north
/// let rotation = rotation_matrix_from_gravity(gravity, geomagnetic).unwrap();
/// assert!((rotation[(1, 1)] - 1.0).abs() < 1e-5);
///
/// // No gravity, no orientation
/// assert!(rotation_matrix_from_gravity(Vector3::zeros(), geomagnetic).is_none());
/// ```
pub fn rotation_matrix_from_gravity(
    gravity: Vector3<f32>,
    geomagnetic: Vector3<f32>,
) -> Option<Matrix3<f32>> {
    if !is_finite(&gravity) || !is_finite(&geomagnetic) {
        return None;
    }

    // Finite readings can still overflow the norms, which would collapse the
    // normalized axes to zero or NaN
    let gravity_squared = gravity.magnitude_squared();
    if gravity_squared < FREE_FALL_GRAVITY_SQUARED || !gravity_squared.is_finite() {
        return None;
    }

    let east = geomagnetic.cross(&gravity);
    let east_magnitude = east.magnitude();
    if east_magnitude < MIN_HORIZONTAL_FIELD || !east_magnitude.is_finite() {
        return None;
    }

    let east = east / east_magnitude;
    let up = gravity / gravity_squared.sqrt();
    let north = up.cross(&east);

    Some(Matrix3::from_rows(&[
        east.transpose(),
        north.transpose(),
        up.transpose(),
    ]))
}

/// Build the device-to-world rotation matrix from a rotation vector sample
///
/// When the sample carries no scalar component it is derived from the
/// unit-norm constraint, clamped at zero.
///
/// # Returns
/// `None` for all-zero samples and for samples that are non-finite or too
/// large to normalize.
pub fn rotation_matrix_from_vector(sample: RotationVector) -> Option<Matrix3<f32>> {
    let vector = sample.vector;
    let scalar = match sample.scalar {
        Some(w) => w,
        None => {
            let remainder = 1.0 - vector.magnitude_squared();
            if remainder > 0.0 { remainder.sqrt() } else { 0.0 }
        }
    };

    if !is_finite(&vector) || !scalar.is_finite() {
        return None;
    }

    let quaternion = Quaternion::new(scalar, vector.x, vector.y, vector.z);
    let norm_squared = quaternion.norm_squared();
    if norm_squared == 0.0 || !norm_squared.is_finite() {
        return None;
    }

    Some(
        UnitQuaternion::from_quaternion(quaternion)
            .to_rotation_matrix()
            .into_inner(),
    )
}

/// Extract azimuth, pitch and roll from a rotation matrix
///
/// - azimuth = atan2(R[0][1], R[1][1]), normalized to `[0, 360)`
/// - pitch = asin(-R[2][1])
/// - roll = atan2(-R[2][0], R[2][2])
pub fn orientation_angles(rotation: &Matrix3<f32>) -> Orientation {
    let azimuth = rotation[(0, 1)].atan2(rotation[(1, 1)]);
    let pitch = (-rotation[(2, 1)]).clamp(-1.0, 1.0).asin();
    let roll = (-rotation[(2, 0)]).atan2(rotation[(2, 2)]);

    Orientation {
        azimuth: normalize(azimuth * RAD_TO_DEG),
        pitch: pitch * RAD_TO_DEG,
        roll: roll * RAD_TO_DEG,
    }
}

fn is_finite(vector: &Vector3<f32>) -> bool {
    vector.iter().all(|component| component.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{DEG_TO_RAD, shortest_delta};

    const FIELD: f32 = 45.0;
    const DIP: f32 = -30.0;

    /// Magnetometer reading for a level device whose top edge points at `azimuth`
    fn level_field(azimuth: f32) -> Vector3<f32> {
        let radians = azimuth * DEG_TO_RAD;
        Vector3::new(-FIELD * radians.sin(), FIELD * radians.cos(), DIP)
    }

    #[test]
    fn test_compass_cardinal_directions() {
        let gravity = Vector3::new(0.0, 0.0, STANDARD_GRAVITY);

        for (azimuth, name) in [(0.0, "North"), (90.0, "East"), (180.0, "South"), (270.0, "West")] {
            let rotation = rotation_matrix_from_gravity(gravity, level_field(azimuth)).unwrap();
            let orientation = orientation_angles(&rotation);
            assert!(
                shortest_delta(azimuth, orientation.azimuth).abs() < 1e-3,
                "{} heading should be ~{}°, got {}",
                name,
                azimuth,
                orientation.azimuth
            );
            assert!(orientation.pitch.abs() < 1e-3);
            assert!(orientation.roll.abs() < 1e-3);
        }
    }

    #[test]
    fn test_rotation_matrix_is_orthonormal() {
        let gravity = Vector3::new(0.8, -1.2, 9.6);
        let rotation = rotation_matrix_from_gravity(gravity, level_field(37.0)).unwrap();

        let orthogonality = (rotation * rotation.transpose() - Matrix3::identity()).norm();
        assert!(orthogonality < 1e-5, "R·Rᵀ deviates by {}", orthogonality);
        assert!((rotation.determinant() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_tilt_compensation() {
        // Pitch the device 20° about its X axis: gravity and field rotate together
        let tilt = nalgebra::Rotation3::from_axis_angle(&Vector3::x_axis(), 20.0 * DEG_TO_RAD);
        let gravity = tilt * Vector3::new(0.0, 0.0, STANDARD_GRAVITY);
        let field = tilt * level_field(60.0);

        let level = orientation_angles(
            &rotation_matrix_from_gravity(Vector3::new(0.0, 0.0, STANDARD_GRAVITY), level_field(60.0))
                .unwrap(),
        );
        let tilted = orientation_angles(&rotation_matrix_from_gravity(gravity, field).unwrap());

        assert!(
            shortest_delta(level.azimuth, tilted.azimuth).abs() < 1e-2,
            "Tilt compensation failed: level={:.2}°, tilted={:.2}°",
            level.azimuth,
            tilted.azimuth
        );
    }

    #[test]
    fn test_degenerate_readings() {
        let field = level_field(0.0);

        // Free fall
        assert!(rotation_matrix_from_gravity(Vector3::new(0.0, 0.0, 0.5), field).is_none());

        // Field parallel to gravity
        let gravity = Vector3::new(0.0, 0.0, STANDARD_GRAVITY);
        assert!(rotation_matrix_from_gravity(gravity, Vector3::new(0.0, 0.0, -40.0)).is_none());

        // Non-finite input
        assert!(rotation_matrix_from_gravity(Vector3::new(f32::NAN, 0.0, 9.8), field).is_none());
        assert!(rotation_matrix_from_gravity(gravity, Vector3::new(f32::INFINITY, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_overflowing_readings() {
        // Finite, but the squared norms and cross product overflow f32
        let gravity = Vector3::new(1e20, 0.0, 0.0);
        let field = Vector3::new(0.0, 1e20, 0.0);
        assert!(rotation_matrix_from_gravity(gravity, field).is_none());

        // Overflowing gravity alone would leave a zero Up axis
        assert!(rotation_matrix_from_gravity(gravity, level_field(0.0)).is_none());

        // Overflowing horizontal field alone would leave a zero East axis
        let level = Vector3::new(0.0, 0.0, STANDARD_GRAVITY);
        assert!(rotation_matrix_from_gravity(level, Vector3::new(0.0, 1e38, 0.0)).is_none());

        let huge = RotationVector::new(1e20, 0.0, 1e20, 1e20);
        assert!(rotation_matrix_from_vector(huge).is_none());
        assert!(rotation_matrix_from_vector(RotationVector::from_vector(Vector3::new(1e20, 0.0, 0.0))).is_none());

        // Large but representable readings still resolve
        let rotation = rotation_matrix_from_gravity(
            Vector3::new(0.0, 0.0, 9.81e5),
            Vector3::new(0.0, 2.2e6, -4.0e6),
        )
        .unwrap();
        assert!(orientation_angles(&rotation).azimuth.abs() < 1e-3);
    }

    #[test]
    fn test_rotation_vector_headings() {
        // Rotating the device by -θ about Z reads as azimuth θ
        for azimuth in [0.0f32, 45.0, 135.0, 200.0, 315.0] {
            let half = -azimuth * DEG_TO_RAD / 2.0;
            let sample = RotationVector::new(0.0, 0.0, half.sin(), half.cos());
            let rotation = rotation_matrix_from_vector(sample).unwrap();
            let orientation = orientation_angles(&rotation);
            assert!(
                shortest_delta(azimuth, orientation.azimuth).abs() < 1e-3,
                "expected {}°, got {}°",
                azimuth,
                orientation.azimuth
            );
        }
    }

    #[test]
    fn test_rotation_vector_derived_scalar() {
        let half = -30.0 * DEG_TO_RAD / 2.0;
        let with_scalar = RotationVector::new(0.0, 0.0, half.sin(), half.cos());
        let without_scalar = RotationVector::from_vector(Vector3::new(0.0, 0.0, half.sin()));

        let a = rotation_matrix_from_vector(with_scalar).unwrap();
        let b = rotation_matrix_from_vector(without_scalar).unwrap();
        assert!((a - b).norm() < 1e-5);
    }

    #[test]
    fn test_rotation_vector_invalid() {
        assert!(rotation_matrix_from_vector(RotationVector::new(0.0, 0.0, 0.0, 0.0)).is_none());
        assert!(rotation_matrix_from_vector(RotationVector::new(f32::NAN, 0.0, 0.0, 1.0)).is_none());
    }
}
