//! Fixed-step simulation clock
//!
//! Variable frame deltas accumulate here and are paid out as whole
//! simulation ticks.

/// Configuration for the simulation clock
#[derive(Debug, Clone, Copy)]
pub struct TimeConfig {
    /// Length of one simulation tick in seconds
    pub fixed_timestep: f32,
    /// Longest frame delta accepted; a stall does not turn into a burst of ticks
    pub max_delta_time: f32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            max_delta_time: 0.25,
        }
    }
}

/// Frame time and the tick accumulator
#[derive(Debug, Clone, Default)]
pub struct GameTime {
    pub config: TimeConfig,
    /// Seconds simulated since start
    pub total_time: f64,
    /// Clamped delta of the last frame
    pub delta_time: f32,
    accumulator: f32,
}

impl GameTime {
    pub fn new(config: TimeConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Feed the raw delta of the frame that just ended
    pub fn update(&mut self, raw_delta: f32) {
        self.delta_time = raw_delta.clamp(0.0, self.config.max_delta_time);
        self.total_time += f64::from(self.delta_time);
        self.accumulator += self.delta_time;
    }

    /// Number of ticks due this frame; consumes them from the accumulator
    pub fn fixed_steps(&mut self) -> u32 {
        let mut steps = 0;
        while self.accumulator >= self.config.fixed_timestep {
            self.accumulator -= self.config.fixed_timestep;
            steps += 1;
        }
        steps
    }
}

/// Convert a duration in seconds to a whole number of fixed ticks
pub fn seconds_to_ticks(seconds: f32, fixed_timestep: f32) -> u64 {
    if fixed_timestep <= 0.0 || seconds <= 0.0 {
        return 0;
    }
    (seconds / fixed_timestep).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_steps_accumulate() {
        let mut time = GameTime::default();
        time.update(0.06);
        assert_eq!(time.fixed_steps(), 3);
        assert_eq!(time.fixed_steps(), 0);

        // The remainder carries into the next frame
        time.update(0.01);
        assert_eq!(time.fixed_steps(), 1);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut time = GameTime::default();
        time.update(2.0);
        assert_eq!(time.delta_time, 0.25);
        let steps = time.fixed_steps();
        assert!((14..=15).contains(&steps), "{steps} steps");
        assert!((time.total_time - 0.25).abs() < 1.0e-6);
    }

    #[test]
    fn test_seconds_to_ticks() {
        assert_eq!(seconds_to_ticks(0.2, 1.0 / 60.0), 12);
        assert_eq!(seconds_to_ticks(0.0, 1.0 / 60.0), 0);
    }
}
