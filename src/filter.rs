//! Circular low-pass filter for the displayed heading

use crate::math::{normalize, shortest_delta};

/// Fraction of the remaining angular error applied per sample
pub const SMOOTHING_FACTOR: f32 = 0.15;

/// First-order exponential smoothing over compass headings
///
/// The filter steps along the shortest arc towards each new target, so a
/// heading crossing north moves through 0° instead of sweeping back across
/// the whole dial.
///
/// # Example
/// ```
/// use fusion_compass::HeadingFilter;
///
/// let mut filter = HeadingFilter::new();
/// assert_eq!(filter.update(350.0), 350.0); // First sample seeds the filter
///
/// let heading = filter.update(10.0);       // Moves 15% of the way across north
/// assert!((heading - 353.0).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingFilter {
    /// Current smoothed heading, `None` until the first sample
    heading: Option<f32>,
}

impl HeadingFilter {
    /// Create an unseeded filter
    pub fn new() -> Self {
        Self { heading: None }
    }

    /// Advance the filter towards `target` and return the smoothed heading
    pub fn update(&mut self, target: f32) -> f32 {
        let heading = match self.heading {
            None => target,
            Some(current) => {
                let delta = shortest_delta(current, target);
                normalize(current + SMOOTHING_FACTOR * delta)
            }
        };

        self.heading = Some(heading);
        heading
    }

    /// Jump directly to `heading`, bypassing the smoothing
    pub fn reseed(&mut self, heading: f32) {
        self.heading = Some(normalize(heading));
    }

    /// Forget the current heading; the next sample seeds the filter again
    pub fn reset(&mut self) {
        self.heading = None;
    }

    /// Current smoothed heading
    pub fn heading(&self) -> Option<f32> {
        self.heading
    }

    /// Whether the filter has seen a sample
    pub fn is_seeded(&self) -> bool {
        self.heading.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_update_seeds() {
        let mut filter = HeadingFilter::new();
        assert!(!filter.is_seeded());
        assert_eq!(filter.heading(), None);

        assert_eq!(filter.update(123.456), 123.456);
        assert!(filter.is_seeded());
        assert_eq!(filter.heading(), Some(123.456));
    }

    #[test]
    fn test_smoothing_step() {
        let mut filter = HeadingFilter::new();
        filter.update(10.0);

        // 10 + 0.15 * (20 - 10)
        let heading = filter.update(20.0);
        assert!((heading - 11.5).abs() < 1e-5);
    }

    #[test]
    fn test_smoothing_across_north() {
        let mut filter = HeadingFilter::new();
        filter.update(10.0);

        // Shortest path from 10 to 350 is -20: 10 - 3 = 7
        let heading = filter.update(350.0);
        assert!((heading - 7.0).abs() < 1e-5);
    }

    #[test]
    fn test_converges_without_overshoot() {
        let mut filter = HeadingFilter::new();
        filter.update(0.0);

        let mut previous = 0.0;
        for _ in 0..200 {
            let heading = filter.update(90.0);
            assert!(heading >= previous, "filter moved backwards");
            assert!(heading <= 90.0, "filter overshot: {}", heading);
            previous = heading;
        }
        assert!((previous - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_reseed_and_reset() {
        let mut filter = HeadingFilter::new();
        filter.update(100.0);

        filter.reseed(-45.0);
        assert_eq!(filter.heading(), Some(315.0));

        // Smoothing continues from the reseeded value
        let heading = filter.update(315.0);
        assert_eq!(heading, 315.0);

        filter.reset();
        assert!(!filter.is_seeded());
        assert_eq!(filter.update(42.0), 42.0);
    }
}
