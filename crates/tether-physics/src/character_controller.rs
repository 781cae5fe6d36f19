//! Character controller using rapier3d's kinematic character controller

use glam::Vec3;
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude::*;

use crate::{to_vec3, LayerMask, PhysicsWorld};

/// Character controller configuration
#[derive(Debug, Clone)]
pub struct CharacterControllerConfig {
    /// Capsule height (default: 1.8m)
    pub height: f32,
    /// Capsule radius (default: 0.4m)
    pub radius: f32,
    /// Maximum slope angle in degrees (default: 45)
    pub max_slope_angle: f32,
    /// Step height for climbing stairs (default: 0.25m)
    pub step_height: f32,
    /// Skin width for collision detection (default: 0.02m)
    pub skin_width: f32,
    /// Whether to snap to ground when walking down slopes
    pub snap_to_ground: bool,
    /// Maximum ground snap distance
    pub ground_snap_distance: f32,
    /// Layers the character's collider belongs to
    pub layer: LayerMask,
}

impl Default for CharacterControllerConfig {
    fn default() -> Self {
        Self {
            height: 1.8,
            radius: 0.4,
            max_slope_angle: 45.0,
            step_height: 0.25,
            skin_width: 0.02,
            snap_to_ground: true,
            ground_snap_distance: 0.2,
            layer: LayerMask::CHARACTER,
        }
    }
}

/// Result of one kinematic move
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveOutcome {
    /// Translation actually applied after collision resolution
    pub translation: Vec3,
    /// Whether the character ended the move on the ground
    pub grounded: bool,
    /// Whether the move touched any geometry
    pub collided: bool,
}

/// Kinematic capsule that walks the character through the world.
///
/// `position` is the bottom of the capsule. The capsule sits on a rigid
/// body that stays kinematic while this controller is enabled; when a
/// mechanic hands the body to the solver the controller is disabled and
/// follows the body instead.
pub struct CharacterController {
    /// Configuration
    pub config: CharacterControllerConfig,
    /// Current position (feet)
    pub position: Vec3,
    /// Current velocity
    pub velocity: Vec3,
    /// Whether the character is on the ground
    pub grounded: bool,
    /// The rigid body carrying the capsule
    pub body_handle: Option<RigidBodyHandle>,
    /// The collider handle for this character
    pub collider_handle: Option<ColliderHandle>,
    /// Current capsule height (may differ from `config.height` while crouching)
    height: f32,
    /// Whether kinematic moves are applied
    enabled: bool,
    /// Rapier's kinematic character controller
    controller: KinematicCharacterController,
}

impl CharacterController {
    /// Create a new character controller with default config
    pub fn new() -> Self {
        Self::with_config(CharacterControllerConfig::default())
    }

    /// Create a new character controller with custom config
    pub fn with_config(config: CharacterControllerConfig) -> Self {
        let mut controller = KinematicCharacterController::default();
        controller.max_slope_climb_angle = config.max_slope_angle.to_radians();
        controller.min_slope_slide_angle = config.max_slope_angle.to_radians();
        controller.autostep = Some(CharacterAutostep {
            max_height: CharacterLength::Absolute(config.step_height),
            min_width: CharacterLength::Relative(0.5),
            include_dynamic_bodies: true,
        });
        controller.snap_to_ground = if config.snap_to_ground {
            Some(CharacterLength::Absolute(config.ground_snap_distance))
        } else {
            None
        };
        controller.offset = CharacterLength::Absolute(config.skin_width);

        Self {
            height: config.height,
            config,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            grounded: false,
            body_handle: None,
            collider_handle: None,
            enabled: true,
            controller,
        }
    }

    /// Spawn the character in the physics world
    pub fn spawn(
        &mut self,
        physics: &mut PhysicsWorld,
        position: Vec3,
    ) -> (RigidBodyHandle, ColliderHandle) {
        self.position = position;

        let center = self.center_position();
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(vector![center.x, center.y, center.z])
            .lock_rotations()
            .build();
        let collider = ColliderBuilder::capsule_y(self.half_segment(), self.config.radius)
            .friction(0.0) // Smooth sliding against walls
            .restitution(0.0)
            .collision_groups(self.config.layer.collider_groups())
            .build();

        let (body_handle, collider_handle) = physics.add_kinematic_body(body, collider);
        self.body_handle = Some(body_handle);
        self.collider_handle = Some(collider_handle);
        (body_handle, collider_handle)
    }

    /// Move the character with collision detection
    pub fn move_character(
        &mut self,
        physics: &mut PhysicsWorld,
        desired_translation: Vec3,
        dt: f32,
    ) -> MoveOutcome {
        if !self.enabled {
            return MoveOutcome::default();
        }
        let (Some(body_handle), Some(collider_handle)) = (self.body_handle, self.collider_handle)
        else {
            return MoveOutcome::default();
        };
        let Some(collider) = physics.collider_set.get(collider_handle) else {
            return MoveOutcome::default();
        };

        let shape = collider.shape();
        let center = self.center_position();
        let current_pos = Isometry::translation(center.x, center.y, center.z);

        let mut collided = false;
        let movement = self.controller.move_shape(
            dt,
            &physics.rigid_body_set,
            &physics.collider_set,
            &physics.query_pipeline,
            shape,
            &current_pos,
            vector![desired_translation.x, desired_translation.y, desired_translation.z],
            QueryFilter::default().exclude_rigid_body(body_handle),
            |_| collided = true,
        );

        self.grounded = movement.grounded;
        let translation = to_vec3(&movement.translation);
        self.position += translation;
        self.sync_body(physics);

        MoveOutcome {
            translation,
            grounded: movement.grounded,
            collided,
        }
    }

    /// Resize the capsule about its centre.
    ///
    /// Growing pushes the feet down by half the change; callers that want
    /// the feet to stay put move the character up by that amount afterwards.
    pub fn set_height(&mut self, physics: &mut PhysicsWorld, height: f32) {
        let center = self.center_position();
        self.height = height.max(2.0 * self.config.radius + 0.02);
        self.position.y = center.y - self.height / 2.0;
        if let Some(collider) = self.collider_handle.and_then(|h| physics.collider_set.get_mut(h)) {
            collider.set_shape(SharedShape::capsule_y(self.half_segment(), self.config.radius));
        }
        self.sync_body(physics);
    }

    /// Current capsule height
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Enable or disable kinematic moves
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether kinematic moves are applied
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Push the tracked position onto the rigid body
    pub fn sync_body(&self, physics: &mut PhysicsWorld) {
        let center = self.center_position();
        if let Some(body) = self.body_handle.and_then(|h| physics.rigid_body_set.get_mut(h)) {
            body.set_translation(vector![center.x, center.y, center.z], true);
        }
    }

    /// Follow the rigid body while the solver owns it
    pub fn sync_from_body(&mut self, physics: &PhysicsWorld) {
        if let Some(body) = self.body_handle.and_then(|h| physics.rigid_body_set.get(h)) {
            let center = to_vec3(body.translation());
            self.position = center - Vec3::Y * (self.height / 2.0);
        }
    }

    /// Get the eye position (top of capsule)
    pub fn eye_position(&self) -> Vec3 {
        Vec3::new(
            self.position.x,
            self.position.y + self.height - 0.1, // Slightly below top
            self.position.z,
        )
    }

    /// Get the center position (middle of capsule)
    pub fn center_position(&self) -> Vec3 {
        Vec3::new(
            self.position.x,
            self.position.y + self.height / 2.0,
            self.position.z,
        )
    }

    /// Check if standing on ground
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    fn half_segment(&self) -> f32 {
        ((self.height - 2.0 * self.config.radius) / 2.0).max(0.01)
    }
}

impl Default for CharacterController {
    fn default() -> Self {
        Self::new()
    }
}
