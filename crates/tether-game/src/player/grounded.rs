//! Debounced ground contact

use tether_core::seconds_to_ticks;

/// Ground contact with a short grace window.
///
/// Losing contact for a few ticks on uneven geometry should not count as
/// leaving the ground. Time is counted in simulation ticks.
#[derive(Debug, Clone)]
pub struct GroundedTracker {
    grace_ticks: u64,
    raw: bool,
    /// Tick on which contact was last lost
    left_ground_at: Option<u64>,
}

impl GroundedTracker {
    pub fn new(grace_ticks: u64) -> Self {
        Self {
            grace_ticks,
            raw: false,
            left_ground_at: None,
        }
    }

    /// Grace window given in seconds, rounded to whole ticks
    pub fn from_seconds(grace: f32, fixed_timestep: f32) -> Self {
        Self::new(seconds_to_ticks(grace, fixed_timestep))
    }

    /// Record this tick's sensor reading
    pub fn update(&mut self, raw: bool, tick: u64) {
        if self.raw && !raw {
            self.left_ground_at = Some(tick);
        }
        self.raw = raw;
    }

    /// The sensor reading from the last update
    pub fn is_raw_grounded(&self) -> bool {
        self.raw
    }

    /// Grounded, or within the grace window while not moving upward
    pub fn is_effectively_grounded(&self, tick: u64, vertical_velocity: f32) -> bool {
        if self.raw {
            return true;
        }
        vertical_velocity <= 0.0
            && self
                .left_ground_at
                .is_some_and(|left| tick.saturating_sub(left) <= self.grace_ticks)
    }

    /// Forget the contact and any grace window, so leaving the ground
    /// after a jump does not open a new one
    pub fn clear_grace(&mut self) {
        self.raw = false;
        self.left_ground_at = None;
    }

    pub fn grace_ticks(&self) -> u64 {
        self.grace_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grace_window_ticks() {
        let grace = 12;
        let mut tracker = GroundedTracker::new(grace);
        for tick in 0..10 {
            tracker.update(true, tick);
        }

        let lost = 10;
        tracker.update(false, lost);
        for tick in lost + 1..=lost + grace {
            tracker.update(false, tick);
            assert!(tracker.is_effectively_grounded(tick, -1.0), "tick {tick}");
        }
        tracker.update(false, lost + grace + 1);
        assert!(!tracker.is_effectively_grounded(lost + grace + 1, -1.0));
    }

    #[test]
    fn test_rising_is_not_grounded() {
        let mut tracker = GroundedTracker::new(12);
        tracker.update(true, 0);
        tracker.update(false, 1);
        assert!(tracker.is_effectively_grounded(2, 0.0));
        assert!(!tracker.is_effectively_grounded(2, 4.0));
    }

    #[test]
    fn test_never_grounded() {
        let mut tracker = GroundedTracker::new(12);
        tracker.update(false, 0);
        assert!(!tracker.is_effectively_grounded(1, -1.0));
    }

    #[test]
    fn test_renewed_contact_resets_window() {
        let mut tracker = GroundedTracker::new(3);
        tracker.update(true, 0);
        tracker.update(false, 1);
        tracker.update(true, 2);
        assert!(tracker.is_effectively_grounded(2, -1.0));
        tracker.update(false, 10);
        assert!(tracker.is_effectively_grounded(13, -1.0));
        assert!(!tracker.is_effectively_grounded(14, -1.0));
    }

    #[test]
    fn test_jump_opens_no_grace_window() {
        let mut tracker = GroundedTracker::new(12);
        tracker.update(true, 0);
        tracker.clear_grace();
        assert!(!tracker.is_effectively_grounded(0, 5.0));

        // Contact lost on the next tick, as the jump lifts off
        tracker.update(false, 1);
        assert!(!tracker.is_raw_grounded());
        assert!(!tracker.is_effectively_grounded(2, -0.1));
    }

    #[test]
    fn test_from_seconds() {
        let tracker = GroundedTracker::from_seconds(0.2, 1.0 / 60.0);
        assert_eq!(tracker.grace_ticks(), 12);
    }
}
