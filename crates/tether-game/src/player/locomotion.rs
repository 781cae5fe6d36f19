//! Movement modes and ground/air velocity composition

use std::fmt;

use glam::Vec3;

use crate::config::LocomotionConfig;

/// The character's movement mode; exactly one applies per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementMode {
    /// Locomotion locked (grapple wind-up)
    Frozen,
    /// Flying a grapple arc
    Grappling,
    /// On a swing cable, physics-driven
    Swinging,
    #[default]
    Walking,
    Running,
    Crouching,
    /// Not effectively grounded
    Airborne,
}

impl MovementMode {
    /// Pick the mode by priority: lock, then traversal, then ground state
    pub fn derive(flags: &ModeFlags) -> Self {
        if flags.locked {
            Self::Frozen
        } else if flags.grappling {
            Self::Grappling
        } else if flags.swinging {
            Self::Swinging
        } else if !flags.grounded {
            Self::Airborne
        } else if flags.crouching {
            Self::Crouching
        } else if flags.running {
            Self::Running
        } else {
            Self::Walking
        }
    }
}

impl fmt::Display for MovementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Frozen => "frozen",
            Self::Grappling => "grappling",
            Self::Swinging => "swinging",
            Self::Walking => "walking",
            Self::Running => "running",
            Self::Crouching => "crouching",
            Self::Airborne => "airborne",
        };
        f.write_str(name)
    }
}

/// Everything the mode depends on, sampled once per tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeFlags {
    pub locked: bool,
    pub grappling: bool,
    pub swinging: bool,
    /// Effectively grounded (grace window applied)
    pub grounded: bool,
    pub crouching: bool,
    /// Run modifier with forward input
    pub running: bool,
}

/// Current mode and the speed it implies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionState {
    pub mode: MovementMode,
    /// Base move speed for this mode
    pub speed: f32,
}

impl LocomotionState {
    pub fn new(config: &LocomotionConfig) -> Self {
        Self {
            mode: MovementMode::Walking,
            speed: config.walk_speed,
        }
    }

    /// Re-derive mode and speed; returns the previous mode if it changed
    pub fn update(
        &mut self,
        flags: &ModeFlags,
        config: &LocomotionConfig,
    ) -> Option<MovementMode> {
        let mode = MovementMode::derive(flags);
        self.speed = match mode {
            MovementMode::Frozen => 0.0,
            MovementMode::Grappling | MovementMode::Swinging => config.traversal_speed,
            MovementMode::Crouching => config.walk_speed * config.crouch_speed_factor,
            MovementMode::Running => config.run_speed,
            MovementMode::Walking => config.walk_speed,
            // Keeps whatever speed it took off with
            MovementMode::Airborne => self.speed,
        };

        let previous = self.mode;
        self.mode = mode;
        (previous != mode).then_some(previous)
    }
}

/// Planar velocity for a grounded tick.
///
/// Carried momentum decays with friction and snaps to zero when slow;
/// input adds on top instead of replacing it, and halves carried
/// momentum that is already fast so input cannot amplify it.
pub fn ground_velocity(
    velocity: &mut Vec3,
    wish: Vec3,
    speed: f32,
    config: &LocomotionConfig,
    dt: f32,
) -> Vec3 {
    let mut planar = Vec3::ZERO;
    let carried = Vec3::new(velocity.x, 0.0, velocity.z).length();

    if carried > config.friction_cutoff_speed {
        planar += Vec3::new(velocity.x, 0.0, velocity.z);
        let friction = config.ground_friction.powf(dt);
        velocity.x *= friction;
        velocity.z *= friction;
    } else {
        velocity.x = 0.0;
        velocity.z = 0.0;
    }

    if wish.length() > 0.1 {
        planar += wish * speed;
        if carried > speed * config.carried_speed_threshold {
            velocity.x *= config.carried_speed_damping;
            velocity.z *= config.carried_speed_damping;
        }
    }
    planar
}

/// Planar velocity for an airborne tick: reduced control, near-frictionless momentum
pub fn air_velocity(
    velocity: &mut Vec3,
    wish: Vec3,
    speed: f32,
    config: &LocomotionConfig,
) -> Vec3 {
    let planar = Vec3::new(velocity.x, 0.0, velocity.z) + wish * speed * config.air_control;
    velocity.x *= config.air_drag;
    velocity.z *= config.air_drag;
    planar
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn grounded() -> ModeFlags {
        ModeFlags {
            grounded: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_mode_priority() {
        let all = ModeFlags {
            locked: true,
            grappling: true,
            swinging: false,
            grounded: true,
            crouching: true,
            running: true,
        };
        assert_eq!(MovementMode::derive(&all), MovementMode::Frozen);
        assert_eq!(
            MovementMode::derive(&ModeFlags { locked: false, ..all }),
            MovementMode::Grappling
        );
        assert_eq!(
            MovementMode::derive(&ModeFlags {
                swinging: true,
                grounded: false,
                ..Default::default()
            }),
            MovementMode::Swinging
        );
        assert_eq!(MovementMode::derive(&ModeFlags::default()), MovementMode::Airborne);
        assert_eq!(
            MovementMode::derive(&ModeFlags { crouching: true, running: true, ..grounded() }),
            MovementMode::Crouching
        );
        assert_eq!(
            MovementMode::derive(&ModeFlags { running: true, ..grounded() }),
            MovementMode::Running
        );
        assert_eq!(MovementMode::derive(&grounded()), MovementMode::Walking);
    }

    #[test]
    fn test_speed_per_mode() {
        let config = LocomotionConfig::default();
        let mut state = LocomotionState::new(&config);

        state.update(&ModeFlags { running: true, ..grounded() }, &config);
        assert_eq!(state.speed, 14.0);

        // Leaving the ground keeps the running speed
        assert_eq!(state.update(&ModeFlags::default(), &config), Some(MovementMode::Running));
        assert_eq!(state.mode, MovementMode::Airborne);
        assert_eq!(state.speed, 14.0);

        state.update(&ModeFlags { crouching: true, ..grounded() }, &config);
        assert_eq!(state.speed, 3.0);

        state.update(&ModeFlags { locked: true, ..grounded() }, &config);
        assert_eq!(state.speed, 0.0);

        assert_eq!(state.update(&ModeFlags { locked: true, ..grounded() }, &config), None);
    }

    #[test]
    fn test_ground_friction_decay() {
        let config = LocomotionConfig::default();
        let mut velocity = Vec3::new(10.0, 0.0, 0.0);

        let planar = ground_velocity(&mut velocity, Vec3::ZERO, 6.0, &config, DT);
        assert_eq!(planar, Vec3::new(10.0, 0.0, 0.0));
        assert!(velocity.x < 10.0 && velocity.x > 9.0);

        // One simulated second leaves ~30%
        let mut velocity = Vec3::new(10.0, 0.0, 0.0);
        for _ in 0..60 {
            ground_velocity(&mut velocity, Vec3::ZERO, 6.0, &config, DT);
        }
        assert!((velocity.x - 3.0).abs() < 0.05);
    }

    #[test]
    fn test_slow_carry_snaps_to_zero() {
        let config = LocomotionConfig::default();
        let mut velocity = Vec3::new(0.3, -2.0, 0.2);
        let planar = ground_velocity(&mut velocity, Vec3::ZERO, 6.0, &config, DT);
        assert_eq!(planar, Vec3::ZERO);
        assert_eq!(velocity, Vec3::new(0.0, -2.0, 0.0));
    }

    #[test]
    fn test_input_blends_and_damps_fast_carry() {
        let config = LocomotionConfig::default();
        let mut velocity = Vec3::new(0.0, 0.0, -10.0);
        let planar = ground_velocity(&mut velocity, Vec3::NEG_Z, 6.0, &config, DT);

        assert!((planar - Vec3::new(0.0, 0.0, -16.0)).length() < 1.0e-5);
        let friction = 0.3_f32.powf(DT);
        assert!((velocity.z - (-10.0 * friction * 0.5)).abs() < 1.0e-5);
    }

    #[test]
    fn test_air_preserves_momentum() {
        let config = LocomotionConfig::default();
        let mut velocity = Vec3::new(8.0, 3.0, 0.0);
        let planar = air_velocity(&mut velocity, Vec3::X, 6.0, &config);

        assert_eq!(planar, Vec3::new(11.0, 0.0, 0.0));
        assert!((velocity.x - 7.92).abs() < 1.0e-5);
        assert_eq!(velocity.y, 3.0);
    }
}
