//! Circular arithmetic on compass angles expressed in degrees

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

const FULL_TURN: f32 = 360.0;
const HALF_TURN: f32 = 180.0;

/// Reduce an angle into the range `[0, 360)`
///
/// # Example
/// ```
/// use fusion_compass::normalize;
///
/// assert_eq!(normalize(370.0), 10.0);
/// assert_eq!(normalize(-90.0), 270.0);
/// ```
pub fn normalize(angle: f32) -> f32 {
    let reduced = angle.rem_euclid(FULL_TURN);

    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if reduced >= FULL_TURN { 0.0 } else { reduced }
}

/// Signed minimal rotation from `from` to `to`, in `(-180, 180]`
///
/// A difference of exactly half a turn is reported as `+180`.
///
/// # Example
/// ```
/// use fusion_compass::shortest_delta;
///
/// assert_eq!(shortest_delta(350.0, 10.0), 20.0);
/// assert_eq!(shortest_delta(10.0, 350.0), -20.0);
/// ```
pub fn shortest_delta(from: f32, to: f32) -> f32 {
    let delta = normalize(to - from);

    if delta > HALF_TURN { delta - FULL_TURN } else { delta }
}

/// Circular mean of a set of headings
///
/// Each sample is treated as a unit vector; the mean is the direction of the
/// vector sum. Returns `None` when there are no samples.
///
/// # Example
/// ```
/// use fusion_compass::circular_mean;
///
/// let mean = circular_mean(&[350.0, 10.0]).unwrap();
/// assert!(mean < 1e-3 || mean > 360.0 - 1e-3);
/// assert!(circular_mean(&[]).is_none());
/// ```
pub fn circular_mean(samples: &[f32]) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }

    let (sin_sum, cos_sum) = samples.iter().fold((0.0f32, 0.0f32), |(s, c), sample| {
        let radians = sample * DEG_TO_RAD;
        (s + radians.sin(), c + radians.cos())
    });

    Some(normalize(sin_sum.atan2(cos_sum) * RAD_TO_DEG))
}

/// Root-mean-square of the shortest deltas between `mean` and each sample
///
/// This is the spread measure used to judge calibration stability. It is not
/// the textbook circular variance. Returns `None` when there are no samples.
pub fn circular_std_dev(samples: &[f32], mean: f32) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }

    let sum_squared: f32 = samples
        .iter()
        .map(|&sample| {
            let delta = shortest_delta(mean, sample);
            delta * delta
        })
        .sum();

    Some((sum_squared / samples.len() as f32).sqrt())
}
