//! Display refresh rate limiting

use crate::math::{normalize, shortest_delta};
use crate::types::DisplayUpdate;

/// Decides when the compass needle and readout should be redrawn
///
/// A refresh is due when more than `interval_ms` passed since the last one,
/// or when the needle would move by more than `threshold` degrees. The
/// needle rotation is the negated heading, and the comparison is made
/// against the rotation last applied.
///
/// # Example
/// ```
/// use fusion_compass::UpdateGate;
///
/// let mut gate = UpdateGate::new(100, 1.0);
///
/// let update = gate.evaluate(42.4, 1000).unwrap();
/// assert_eq!(update.heading_rounded, 42);
/// assert_eq!(update.visual_rotation, -42.4);
///
/// // 10 ms later with a tiny change: nothing to redraw
/// assert!(gate.evaluate(42.6, 1010).is_none());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct UpdateGate {
    interval_ms: u64,
    threshold: f32,
    /// Time of the last refresh
    last_update_ms: u64,
    /// Needle rotation applied at the last refresh
    visual_rotation: f32,
}

impl UpdateGate {
    /// Create a gate whose needle starts at rotation 0 at time 0
    pub fn new(interval_ms: u64, threshold: f32) -> Self {
        Self {
            interval_ms,
            threshold,
            last_update_ms: 0,
            visual_rotation: 0.0,
        }
    }

    /// Decide whether `heading` should be pushed to the display at `now_ms`
    pub fn evaluate(&mut self, heading: f32, now_ms: u64) -> Option<DisplayUpdate> {
        let rotation = -heading;
        let elapsed = now_ms.saturating_sub(self.last_update_ms);
        let movement = shortest_delta(self.visual_rotation, rotation).abs();

        if elapsed <= self.interval_ms && movement <= self.threshold {
            return None;
        }

        self.last_update_ms = now_ms;
        self.visual_rotation = rotation;

        Some(DisplayUpdate {
            heading_rounded: round_heading(heading),
            visual_rotation: rotation,
        })
    }

    /// Needle rotation applied at the last refresh
    pub fn visual_rotation(&self) -> f32 {
        self.visual_rotation
    }

    /// Time of the last refresh in milliseconds
    pub fn last_update_ms(&self) -> u64 {
        self.last_update_ms
    }
}

/// Whole-degree readout; 359.6 reads as 0
fn round_heading(heading: f32) -> u16 {
    normalize(heading.round()) as u16
}
