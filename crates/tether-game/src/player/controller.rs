//! First-person player controller: locomotion, crouch, grapple and swing

use glam::{Vec2, Vec3};
use tether_core::LookAngles;
use tether_physics::{
    CharacterController, CharacterControllerConfig, PhysicsConfig, PhysicsWorld, QueryMask,
    RaycastHit,
};
use tracing::debug;

use super::crouch::{CrouchController, CrouchState};
use super::grounded::GroundedTracker;
use super::locomotion::{air_velocity, ground_velocity, LocomotionState, ModeFlags, MovementMode};
use crate::config::ControllerConfig;
use crate::error::{ConfigError, TraversalError};
use crate::input::MovementInput;
use crate::traversal::{GrappleController, SwingController, SwingInput, SwingSession};

/// Player controller arbitrating locomotion and the two traversal mechanics.
///
/// Owns the only [`MovementMode`]. The grapple and swing controllers never
/// reach into each other: starting one stops the other here first, so at
/// most one traversal session exists at a time.
pub struct PlayerController {
    config: ControllerConfig,
    /// Physics character controller
    pub character: CharacterController,
    /// View angles; facing and aim derive from them
    pub look: LookAngles,
    locomotion: LocomotionState,
    grounded: GroundedTracker,
    crouch: CrouchController,
    grapple: GrappleController,
    swing: SwingController,
    fixed_timestep: f32,
    /// Simulation ticks run so far
    tick: u64,
}

impl PlayerController {
    /// Create a player controller with default tuning at the default physics rate
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default(), PhysicsConfig::default().timestep)
    }

    /// Create a player controller with custom tuning.
    ///
    /// `fixed_timestep` is the simulation tick length; time windows given in
    /// seconds are converted to ticks with it.
    pub fn with_config(config: ControllerConfig, fixed_timestep: f32) -> Self {
        let character = CharacterController::with_config(CharacterControllerConfig {
            height: config.crouch.standing_height,
            ..Default::default()
        });

        Self {
            character,
            look: LookAngles::default(),
            locomotion: LocomotionState::new(&config.locomotion),
            grounded: GroundedTracker::from_seconds(
                config.locomotion.grounded_grace,
                fixed_timestep,
            ),
            crouch: CrouchController::new(config.crouch.clone()),
            grapple: GrappleController::new(config.grapple.clone()),
            swing: SwingController::new(config.swing.clone()),
            config,
            fixed_timestep,
            tick: 0,
        }
    }

    /// Spawn the player in the world at a position (feet)
    pub fn spawn(&mut self, physics: &mut PhysicsWorld, position: Vec3) {
        self.sync_world_gravity(physics);
        self.character.spawn(physics, position);
        self.character.velocity = Vec3::ZERO;
    }

    /// Apply a look delta (frame-rate callback, not part of the tick)
    pub fn apply_look(&mut self, delta: Vec2) {
        let loco = &self.config.locomotion;
        self.look.apply_delta(
            delta,
            loco.look_sensitivity.to_radians(),
            loco.max_look_down.to_radians(),
            loco.max_look_up.to_radians(),
        );
    }

    /// Run one simulation tick. Step the physics world afterwards.
    pub fn fixed_update(&mut self, physics: &mut PhysicsWorld, input: &MovementInput, dt: f32) {
        self.tick += 1;
        let gravity = self.config.locomotion.gravity;
        self.sync_world_gravity(physics);

        // The solver moved the body last step
        if self.swing.is_active() {
            self.character.sync_from_body(physics);
        }

        self.grapple.tick(self.character.position, gravity, dt);
        self.sense_ground();

        self.swing.update_prediction(
            &*physics,
            self.character.eye_position(),
            self.look.aim(),
            self.query_mask(),
        );

        if input.swing_released && self.stop_swing(physics) {
            debug!("Swing released");
        }
        if input.swing_pressed {
            if let Err(err) = self.try_start_swing(physics) {
                debug!("Swing unavailable: {err}");
            }
        }
        if input.grapple_pressed {
            if let Err(err) = self.try_start_grapple(physics) {
                debug!("Grapple unavailable: {err}");
            }
        }

        self.update_crouch(physics, input, dt);

        let flags = ModeFlags {
            locked: self.grapple.is_winding_up(),
            grappling: self.grapple.is_in_flight(),
            swinging: self.swing.is_active(),
            grounded: self.is_grounded(),
            crouching: self.crouch.is_crouching(),
            running: input.wants_to_run(),
        };
        if let Some(previous) = self.locomotion.update(&flags, &self.config.locomotion) {
            debug!("Movement mode {} -> {}", previous, self.locomotion.mode);
        }

        match self.locomotion.mode {
            MovementMode::Frozen => self.character.velocity = Vec3::ZERO,
            MovementMode::Grappling => self.fly(physics, input, dt),
            MovementMode::Swinging => {
                let steering = SwingInput {
                    axis: input.axis(),
                    pull: input.pull_held,
                    forward: self.look.forward(),
                    right: self.look.right(),
                };
                self.swing.physics_tick(physics, &steering);
            }
            MovementMode::Walking
            | MovementMode::Running
            | MovementMode::Crouching
            | MovementMode::Airborne => self.walk(physics, input, flags.grounded, dt),
        }
    }

    /// The swinging body falls under the world gravity, so it follows the tuning
    fn sync_world_gravity(&self, physics: &mut PhysicsWorld) {
        let gravity = self.config.locomotion.gravity;
        if (physics.gravity_magnitude() - gravity).abs() > 1.0e-4 {
            debug!("World gravity set to {}", gravity);
            physics.set_gravity(Vec3::NEG_Y * gravity);
        }
    }

    fn sense_ground(&mut self) {
        let raw = self.character.is_grounded() && self.character.is_enabled();
        if raw && !self.grounded.is_raw_grounded() && !self.grapple.is_in_flight() {
            debug!("Landed at {}", self.character.position);
        }
        self.grounded.update(raw, self.tick);

        if raw && self.character.velocity.y < 0.0 && !self.grapple.is_active() {
            self.character.velocity.y = self.config.locomotion.grounded_stick_velocity;
        }
    }

    fn update_crouch(&mut self, physics: &mut PhysicsWorld, input: &MovementInput, dt: f32) {
        // Releasing always counts, so a key let go mid-grapple cannot stick
        if input.crouch_released {
            self.crouch.release();
        }
        if !self.grapple.is_active() {
            if input.crouch_pressed {
                self.crouch.press();
            }
            self.crouch
                .update(&*physics, self.character.position, self.character.body_handle, dt);
        }

        let step = self.crouch.adjust_height(dt);
        if (step.height - self.character.height()).abs() > 1.0e-5 {
            self.character.set_height(physics, step.height);
            if step.lift > 0.0 {
                self.character.move_character(physics, Vec3::Y * step.lift, dt);
            }
        }
    }

    /// Normal kinematic movement on the ground or in the air
    fn walk(
        &mut self,
        physics: &mut PhysicsWorld,
        input: &MovementInput,
        grounded: bool,
        dt: f32,
    ) {
        let config = self.config.locomotion.clone();
        let wish = input.wish_direction(&self.look);
        let speed = self.locomotion.speed;
        let mut velocity = self.character.velocity;

        if input.jump_pressed && grounded && !self.crouch.is_crouching() {
            velocity.y = (2.0 * config.gravity * config.jump_height).sqrt();
            self.grounded.clear_grace();
            debug!("Jump");
        }

        let planar = if grounded {
            ground_velocity(&mut velocity, wish, speed, &config, dt)
        } else {
            air_velocity(&mut velocity, wish, speed, &config)
        };
        velocity.y -= config.gravity * dt;

        self.character.velocity = velocity;
        self.character
            .move_character(physics, (planar + Vec3::Y * velocity.y) * dt, dt);
    }

    /// Grapple flight: ballistic arc plus light steering
    fn fly(&mut self, physics: &mut PhysicsWorld, input: &MovementInput, dt: f32) {
        let speed = self.locomotion.speed * self.config.grapple.air_control;
        let steering = input.wish_direction(&self.look) * speed;
        let displacement =
            steering * dt + self.grapple.advance_flight(self.config.locomotion.gravity, dt);

        let outcome = self.character.move_character(physics, displacement, dt);
        if outcome.collided && self.grapple.notify_arrival() {
            debug!("Grapple arrived at {}", self.character.position);
        }
    }

    /// Fire the grapple along the current aim, stopping any swing first
    pub fn try_start_grapple(&mut self, physics: &mut PhysicsWorld) -> Result<(), TraversalError> {
        let target = self.grapple.acquire_target(
            &*physics,
            self.character.eye_position(),
            self.look.aim(),
            self.query_mask(),
        )?;

        if self.stop_swing(physics) {
            debug!("Swing cancelled by grapple");
        }
        self.grapple.begin(target);
        self.character.velocity = Vec3::ZERO;
        Ok(())
    }

    /// Start swinging from the current prediction, stopping any grapple first
    pub fn try_start_swing(&mut self, physics: &mut PhysicsWorld) -> Result<(), TraversalError> {
        let target = self.swing.ready(&*physics, self.character.body_handle)?;

        if self.grapple.stop() {
            debug!("Grapple cancelled by swing");
        }
        self.character.sync_body(physics);
        self.character.set_enabled(false);
        self.swing.begin(physics, target, self.character.velocity);
        Ok(())
    }

    /// End the grapple; false if none was active
    pub fn stop_grapple(&mut self) -> bool {
        self.grapple.stop()
    }

    /// Release the swing and give the body back to the character controller
    pub fn stop_swing(&mut self, physics: &mut PhysicsWorld) -> bool {
        let Some(velocity) = self.swing.stop(physics) else {
            return false;
        };
        self.character.sync_from_body(physics);
        self.character.set_enabled(true);
        self.character.velocity = velocity;
        true
    }

    fn query_mask(&self) -> QueryMask {
        QueryMask::default().excluding(self.character.body_handle)
    }

    /// Current movement mode
    pub fn mode(&self) -> MovementMode {
        self.locomotion.mode
    }

    /// Base speed of the current mode
    pub fn speed(&self) -> f32 {
        self.locomotion.speed
    }

    /// Get the player's current position (feet)
    pub fn position(&self) -> Vec3 {
        self.character.position
    }

    /// Velocity of the kinematic controller (stale while swinging)
    pub fn velocity(&self) -> Vec3 {
        self.character.velocity
    }

    /// Get the player's eye position (for camera)
    pub fn eye_position(&self) -> Vec3 {
        self.character.eye_position()
    }

    /// Grounded with the grace window applied
    pub fn is_grounded(&self) -> bool {
        self.grounded
            .is_effectively_grounded(self.tick, self.character.velocity.y)
    }

    pub fn grapple(&self) -> &GrappleController {
        &self.grapple
    }

    pub fn swing(&self) -> &SwingController {
        &self.swing
    }

    /// Anchor of the live grapple
    pub fn grapple_point(&self) -> Option<Vec3> {
        self.grapple.grapple_point()
    }

    /// Best swing anchor candidate, for a reticle
    pub fn swing_prediction(&self) -> Option<&RaycastHit> {
        self.swing.prediction()
    }

    pub fn swing_session(&self) -> Option<&SwingSession> {
        self.swing.session()
    }

    pub fn crouch_state(&self) -> CrouchState {
        self.crouch.state()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Replace the tuning; live sessions keep running under the new values.
    ///
    /// A changed gravity reaches the physics world on the next tick.
    pub fn set_config(&mut self, config: ControllerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.grounded =
            GroundedTracker::from_seconds(config.locomotion.grounded_grace, self.fixed_timestep);
        self.crouch.set_config(config.crouch.clone());
        self.grapple.set_config(config.grapple.clone());
        self.swing.set_config(config.swing.clone());
        self.config = config;
        Ok(())
    }

    /// Change one named option, see [`ControllerConfig::set_option`]
    pub fn set_option(&mut self, name: &str, value: f32) -> Result<(), ConfigError> {
        let mut config = self.config.clone();
        config.set_option(name, value)?;
        self.set_config(config)
    }
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_physics::{BodyDynamics, LayerMask};

    const DT: f32 = 1.0 / 60.0;

    /// Flat ground with a grappleable pillar 19m ahead
    fn scene() -> (PhysicsWorld, PlayerController) {
        let mut physics = PhysicsWorld::new();
        physics.create_ground(0.0);
        physics.create_static_box_on_layer(
            Vec3::new(1.0, 5.0, 1.0),
            Vec3::new(0.0, 5.0, -20.0),
            LayerMask::GRAPPLEABLE,
        );

        let mut player = PlayerController::new();
        player.spawn(&mut physics, Vec3::new(0.0, 0.05, 0.0));
        physics.refresh_queries();
        (physics, player)
    }

    /// Open floor with nothing to grapple, the player dropped in at `height`
    fn floor(height: f32) -> (PhysicsWorld, PlayerController) {
        let mut physics = PhysicsWorld::new();
        physics.create_ground(0.0);
        physics.refresh_queries();

        let mut player = PlayerController::new();
        player.spawn(&mut physics, Vec3::new(0.0, height, 0.0));
        (physics, player)
    }

    fn run(
        player: &mut PlayerController,
        physics: &mut PhysicsWorld,
        input: MovementInput,
        ticks: usize,
    ) {
        for _ in 0..ticks {
            player.fixed_update(physics, &input, DT);
            physics.step();
        }
    }

    fn press(player: &mut PlayerController, physics: &mut PhysicsWorld, input: MovementInput) {
        run(player, physics, input, 1);
    }

    fn body_is_kinematic(player: &PlayerController, physics: &PhysicsWorld) -> bool {
        player
            .character
            .body_handle
            .is_some_and(|body| physics.is_kinematic(body))
    }

    #[test]
    fn test_player_controller_creation() {
        let player = PlayerController::new();
        assert_eq!(player.position(), Vec3::ZERO);
        assert_eq!(player.mode(), MovementMode::Walking);
        assert!(!player.grapple().is_active());
        assert!(!player.swing().is_active());
    }

    #[test]
    fn test_settles_on_ground_and_runs() {
        let (mut physics, mut player) = scene();
        run(&mut player, &mut physics, MovementInput::default(), 30);
        assert!(player.is_grounded());
        assert_eq!(player.mode(), MovementMode::Walking);
        assert!(player.position().y.abs() < 0.1);

        let sprint = MovementInput {
            forward: true,
            run: true,
            ..Default::default()
        };
        run(&mut player, &mut physics, sprint, 30);
        assert_eq!(player.mode(), MovementMode::Running);
        assert_eq!(player.speed(), 14.0);
        assert!(player.position().z < -5.0, "at {}", player.position());
    }

    #[test]
    fn test_grapple_freezes_then_flies() {
        let (mut physics, mut player) = scene();
        run(&mut player, &mut physics, MovementInput::default(), 10);

        let fire = MovementInput { grapple_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, fire);
        assert_eq!(player.mode(), MovementMode::Frozen);
        assert_eq!(player.velocity(), Vec3::ZERO);
        let anchor = player.grapple_point().unwrap();
        assert!((anchor.z + 19.0).abs() < 0.05);

        let start = player.position();
        let mut ticks = 0;
        while player.mode() != MovementMode::Grappling && ticks < 20 {
            run(&mut player, &mut physics, MovementInput::default(), 1);
            ticks += 1;
        }
        assert_eq!(player.mode(), MovementMode::Grappling);

        run(&mut player, &mut physics, MovementInput::default(), 10);
        assert!(player.position().y > start.y + 0.5);
        assert!(player.position().z < start.z - 1.0);
    }

    #[test]
    fn test_grapple_miss_costs_half_cooldown() {
        let (mut physics, mut player) = scene();
        player.look = LookAngles::new(std::f32::consts::PI, 0.0);

        let fire = MovementInput { grapple_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, fire);
        assert!(!player.grapple().is_active());
        assert!((player.grapple().cooldown_remaining() - 0.5).abs() < 1.0e-4);
        assert_ne!(player.mode(), MovementMode::Frozen);

        // Even facing the pillar, the retry is refused while cooling down
        player.look = LookAngles::default();
        assert!(matches!(
            player.try_start_grapple(&mut physics),
            Err(TraversalError::OnCooldown { .. })
        ));
    }

    #[test]
    fn test_swing_cancels_grapple() {
        let (mut physics, mut player) = scene();
        run(&mut player, &mut physics, MovementInput::default(), 10);

        let fire = MovementInput { grapple_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, fire);
        assert!(player.grapple().is_winding_up());
        assert!(player.swing_prediction().is_some());

        let swing = MovementInput { swing_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, swing);
        assert!(!player.grapple().is_active());
        assert!(player.grapple_point().is_none());
        assert!(player.grapple().cooldown_remaining() > 0.9);
        assert!(player.swing().is_active());
        assert_eq!(player.mode(), MovementMode::Swinging);
        assert!(!player.character.is_enabled());
        assert!(!body_is_kinematic(&player, &physics));
    }

    #[test]
    fn test_grapple_cancels_swing() {
        let (mut physics, mut player) = scene();
        run(&mut player, &mut physics, MovementInput::default(), 10);

        let swing = MovementInput { swing_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, swing);
        assert_eq!(player.mode(), MovementMode::Swinging);
        let body = player.character.body_handle.unwrap();
        assert!(physics.spring(body).is_some());

        run(&mut player, &mut physics, MovementInput::default(), 3);
        let fire = MovementInput { grapple_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, fire);

        assert!(!player.swing().is_active());
        assert!(physics.spring(body).is_none());
        assert!(body_is_kinematic(&player, &physics));
        assert!(player.character.is_enabled());
        assert!(player.grapple().is_winding_up());
        assert_eq!(player.mode(), MovementMode::Frozen);
    }

    #[test]
    fn test_swing_release_hands_back_velocity() {
        let (mut physics, mut player) = scene();
        run(&mut player, &mut physics, MovementInput::default(), 10);
        let swing = MovementInput { swing_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, swing);
        run(&mut player, &mut physics, MovementInput::default(), 10);

        let body = player.character.body_handle.unwrap();
        let swing_velocity = physics.linear_velocity(body).unwrap();
        assert!(swing_velocity.length() > 0.1);

        assert!(player.stop_swing(&mut physics));
        let expected = Vec3::new(
            swing_velocity.x * 0.6,
            swing_velocity.y * 0.8,
            swing_velocity.z * 0.6,
        );
        assert!((player.velocity() - expected).length() < 1.0e-4);
        assert!(body_is_kinematic(&player, &physics));
        assert_eq!(physics.linear_velocity(body), Some(Vec3::ZERO));
        assert!(player.character.is_enabled());

        // Second release changes nothing
        let position = player.position();
        assert!(!player.stop_swing(&mut physics));
        assert_eq!(player.velocity(), expected);
        assert_eq!(player.position(), position);
    }

    #[test]
    fn test_swing_without_prediction_does_nothing() {
        let (mut physics, mut player) = scene();
        player.look = LookAngles::new(std::f32::consts::PI, 0.0);
        run(&mut player, &mut physics, MovementInput::default(), 5);

        let swing = MovementInput { swing_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, swing);
        assert!(!player.swing().is_active());
        assert!(player.character.is_enabled());
        assert!(body_is_kinematic(&player, &physics));
    }

    #[test]
    fn test_crouch_and_stand() {
        let (mut physics, mut player) = scene();
        run(&mut player, &mut physics, MovementInput::default(), 10);

        let crouch = MovementInput { crouch_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, crouch);
        run(&mut player, &mut physics, MovementInput::default(), 60);
        assert_eq!(player.crouch_state(), CrouchState::Crouching);
        assert_eq!(player.mode(), MovementMode::Crouching);
        assert_eq!(player.speed(), 3.0);
        assert!((player.character.height() - 1.2).abs() < 0.01);

        let stand = MovementInput { crouch_released: true, ..Default::default() };
        press(&mut player, &mut physics, stand);
        run(&mut player, &mut physics, MovementInput::default(), 90);
        assert_eq!(player.crouch_state(), CrouchState::Standing);
        assert!((player.character.height() - 1.8).abs() < 0.01);
        assert!(player.position().y.abs() < 0.1);
    }

    #[test]
    fn test_crouch_ignored_while_grappling() {
        let (mut physics, mut player) = scene();
        run(&mut player, &mut physics, MovementInput::default(), 10);
        let fire = MovementInput { grapple_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, fire);
        let crouch = MovementInput { crouch_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, crouch);
        assert_eq!(player.crouch_state(), CrouchState::Standing);
    }

    #[test]
    fn test_set_option_applies_to_mechanics() {
        let (mut physics, mut player) = scene();
        player.set_option("maxGrappleDistance", 10.0).unwrap();
        assert!(player.set_option("gravity", -1.0).is_err());
        assert_eq!(player.config().locomotion.gravity, 9.81);

        // The pillar is 19m away, now out of range
        assert!(matches!(
            player.try_start_grapple(&mut physics),
            Err(TraversalError::NoTarget { range }) if range == 10.0
        ));
    }

    #[test]
    fn test_grounded_velocity_sticks_to_floor() {
        let (mut physics, mut player) = floor(0.05);
        run(&mut player, &mut physics, MovementInput::default(), 30);
        assert!(player.is_grounded());

        // Reset to the stick velocity, then one tick of gravity on top
        let expected = -2.0 - 9.81 * DT;
        assert!((player.velocity().y - expected).abs() < 1.0e-4, "vy {}", player.velocity().y);

        let resting = player.position().y;
        run(&mut player, &mut physics, MovementInput::default(), 30);
        assert!((player.position().y - resting).abs() < 1.0e-3);
        assert_eq!(player.mode(), MovementMode::Walking);
    }

    #[test]
    fn test_jump_reaches_jump_height_and_lands() {
        let (mut physics, mut player) = floor(0.05);
        run(&mut player, &mut physics, MovementInput::default(), 30);
        let resting = player.position().y;

        let jump = MovementInput { jump_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, jump);
        let launch = (2.0_f32 * 9.81 * 2.0).sqrt() - 9.81 * DT;
        assert!((player.velocity().y - launch).abs() < 1.0e-4, "vy {}", player.velocity().y);
        // No grace window is left behind to jump again from
        assert!(!player.is_grounded());

        press(&mut player, &mut physics, MovementInput::default());
        assert_eq!(player.mode(), MovementMode::Airborne);

        let mut peak = 0.0_f32;
        for _ in 0..120 {
            press(&mut player, &mut physics, MovementInput::default());
            peak = peak.max(player.position().y - resting);
        }
        assert!((peak - 2.0).abs() < 0.2, "peak {peak}");
        assert_eq!(player.mode(), MovementMode::Walking);
        assert!(player.is_grounded());
    }

    #[test]
    fn test_no_jump_while_crouched() {
        let (mut physics, mut player) = floor(0.05);
        run(&mut player, &mut physics, MovementInput::default(), 10);
        let crouch = MovementInput { crouch_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, crouch);
        run(&mut player, &mut physics, MovementInput::default(), 30);
        assert_eq!(player.mode(), MovementMode::Crouching);

        let jump = MovementInput { jump_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, jump);
        assert!(player.velocity().y < 0.0);
        run(&mut player, &mut physics, MovementInput::default(), 10);
        assert!(player.position().y < 0.1);
        assert_eq!(player.mode(), MovementMode::Crouching);
    }

    #[test]
    fn test_no_jump_while_airborne() {
        let (mut physics, mut player) = floor(3.0);
        let jump = MovementInput { jump_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, jump);
        assert_eq!(player.mode(), MovementMode::Airborne);
        assert!((player.velocity().y + 9.81 * DT).abs() < 1.0e-4);
    }

    #[test]
    fn test_fall_lands_walking() {
        let (mut physics, mut player) = floor(2.0);
        press(&mut player, &mut physics, MovementInput::default());
        assert_eq!(player.mode(), MovementMode::Airborne);

        let mut ticks = 0;
        while player.mode() == MovementMode::Airborne && ticks < 120 {
            press(&mut player, &mut physics, MovementInput::default());
            ticks += 1;
        }
        assert_eq!(player.mode(), MovementMode::Walking);
        assert!(player.position().y < 0.1);
        // About the time a 2m drop takes
        assert!((30..60).contains(&ticks), "landed after {ticks} ticks");
    }

    #[test]
    fn test_grapple_arrival_hands_back_to_walking() {
        let (mut physics, mut player) = scene();
        run(&mut player, &mut physics, MovementInput::default(), 10);
        let fire = MovementInput { grapple_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, fire);

        let mut flew = false;
        let mut ticks = 0;
        while player.grapple().is_active() && ticks < 400 {
            press(&mut player, &mut physics, MovementInput::default());
            flew |= player.mode() == MovementMode::Grappling;
            ticks += 1;
        }
        assert!(flew);
        assert!(!player.grapple().is_active());
        // Contact with the pillar ended it, not the flight timeout
        assert!(ticks < 170, "grapple ended after {ticks} ticks");
        assert!(player.position().z < -10.0, "at {}", player.position());

        run(&mut player, &mut physics, MovementInput::default(), 180);
        assert_eq!(player.mode(), MovementMode::Walking);
        assert!(player.is_grounded());
    }

    #[test]
    fn test_swing_release_hands_back_to_walking() {
        let (mut physics, mut player) = scene();
        run(&mut player, &mut physics, MovementInput::default(), 10);
        let swing = MovementInput { swing_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, swing);
        run(&mut player, &mut physics, MovementInput::default(), 10);
        assert_eq!(player.mode(), MovementMode::Swinging);

        let release = MovementInput { swing_released: true, ..Default::default() };
        press(&mut player, &mut physics, release);
        assert!(!player.swing().is_active());
        assert_ne!(player.mode(), MovementMode::Swinging);
        assert!(body_is_kinematic(&player, &physics));

        run(&mut player, &mut physics, MovementInput::default(), 180);
        assert_eq!(player.mode(), MovementMode::Walking);
        assert!(player.is_grounded());
    }

    /// Vertical velocity the swinging body gains over its first step
    fn first_swing_step_dv(gravity: f32) -> f32 {
        let mut physics = PhysicsWorld::new();
        physics.create_static_box_on_layer(
            Vec3::new(2.0, 2.0, 0.5),
            Vec3::new(0.0, 6.7, -10.0),
            LayerMask::GRAPPLEABLE,
        );
        physics.refresh_queries();

        let mut player = PlayerController::new();
        player.set_option("locomotion.gravity", gravity).unwrap();
        player.spawn(&mut physics, Vec3::new(0.0, 5.0, 0.0));
        assert!((physics.gravity_magnitude() - gravity).abs() < 1.0e-4);

        let swing = MovementInput { swing_pressed: true, ..Default::default() };
        press(&mut player, &mut physics, swing);
        assert_eq!(player.mode(), MovementMode::Swinging);
        let body = player.character.body_handle.unwrap();
        physics.linear_velocity(body).unwrap().y
    }

    #[test]
    fn test_swing_falls_at_configured_gravity() {
        let default = first_swing_step_dv(9.81);
        let heavy = first_swing_step_dv(20.0);
        let expected = -(20.0 - 9.81) * DT;
        assert!(((heavy - default) - expected).abs() < 0.01, "{default} vs {heavy}");
    }

    #[test]
    fn test_gravity_change_reaches_world() {
        let (mut physics, mut player) = floor(0.05);
        player.set_option("gravity", 15.0).unwrap();
        assert!((physics.gravity_magnitude() - 9.81).abs() < 1.0e-4);

        press(&mut player, &mut physics, MovementInput::default());
        assert_eq!(physics.config.gravity, Vec3::new(0.0, -15.0, 0.0));
    }

    #[test]
    fn test_look_clamps_pitch() {
        let mut player = PlayerController::new();
        player.apply_look(Vec2::new(0.0, -10_000.0));
        assert!((player.look.pitch - std::f32::consts::FRAC_PI_2).abs() < 1.0e-5);
    }
}
