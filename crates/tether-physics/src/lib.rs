//! Tether Physics - Physics simulation using rapier3d
//!
//! Provides the physics world, spatial queries against it, rigid body
//! authority switches for the character, and the kinematic character controller.

mod body;
mod character_controller;
mod query;

pub use body::{BodyDynamics, DistanceSpring, DynamicSettings};
pub use character_controller::{CharacterController, CharacterControllerConfig, MoveOutcome};
pub use query::{LayerMask, OverlapHit, QueryMask, RaycastHit, SpatialQuery};

pub use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};

use std::collections::HashMap;

use glam::Vec3;
use nalgebra::Unit;
use rapier3d::prelude::*;

/// Physics world configuration
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    /// Gravity vector (default: -9.81 on Y axis)
    pub gravity: Vec3,
    /// Physics timestep (default: 1/60)
    pub timestep: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            timestep: 1.0 / 60.0,
        }
    }
}

/// The main physics world containing all simulation state
pub struct PhysicsWorld {
    /// Configuration
    pub config: PhysicsConfig,

    /// Rigid body storage
    pub rigid_body_set: RigidBodySet,
    /// Collider storage
    pub collider_set: ColliderSet,
    /// Impulse joint storage
    pub impulse_joint_set: ImpulseJointSet,
    /// Multi-body joint storage
    pub multibody_joint_set: MultibodyJointSet,

    /// Distance springs keyed by the body they pull on
    springs: HashMap<RigidBodyHandle, DistanceSpring>,

    /// Integration parameters
    integration_parameters: IntegrationParameters,
    /// Physics pipeline
    physics_pipeline: PhysicsPipeline,
    /// Island manager
    island_manager: IslandManager,
    /// Broad phase collision detection
    broad_phase: DefaultBroadPhase,
    /// Narrow phase collision detection
    narrow_phase: NarrowPhase,
    /// Continuous collision detection solver
    ccd_solver: CCDSolver,
    /// Query pipeline for raycasts and shape casts
    query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    /// Create a new physics world with default configuration
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    /// Create a new physics world with custom configuration
    pub fn with_config(config: PhysicsConfig) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.timestep;

        Self {
            config,
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            springs: HashMap::new(),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Step the physics simulation
    pub fn step(&mut self) {
        self.apply_springs();

        let gravity = vector![self.config.gravity.x, self.config.gravity.y, self.config.gravity.z];

        self.physics_pipeline.step(
            &gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );

        // Update query pipeline after physics step
        self.query_pipeline.update(&self.collider_set);
    }

    /// Rebuild the query acceleration structure without stepping.
    ///
    /// Needed after inserting static geometry when queries must see it
    /// before the first step.
    pub fn refresh_queries(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Spring constraints act on dynamic bodies only, as a velocity change per step
    fn apply_springs(&mut self) {
        let dt = self.integration_parameters.dt;
        for (handle, spring) in &self.springs {
            let Some(body) = self.rigid_body_set.get_mut(*handle) else {
                continue;
            };
            if !body.is_dynamic() {
                continue;
            }

            let acceleration =
                spring.acceleration(to_vec3(body.translation()), to_vec3(body.linvel()));
            if acceleration != Vec3::ZERO {
                let velocity = *body.linvel() + to_vector(acceleration * dt);
                body.set_linvel(velocity, true);
            }
        }
    }

    /// Add a static collider (ground, walls, etc.)
    pub fn add_static_collider(&mut self, collider: Collider) -> ColliderHandle {
        self.collider_set.insert(collider)
    }

    /// Add a kinematic rigid body with a collider
    pub fn add_kinematic_body(
        &mut self,
        rigid_body: RigidBody,
        collider: Collider,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let rb_handle = self.rigid_body_set.insert(rigid_body);
        let col_handle =
            self.collider_set
                .insert_with_parent(collider, rb_handle, &mut self.rigid_body_set);
        (rb_handle, col_handle)
    }

    /// Magnitude of the world gravity
    pub fn gravity_magnitude(&self) -> f32 {
        self.config.gravity.length()
    }

    /// Replace the gravity applied to dynamic bodies from the next step on
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.config.gravity = gravity;
    }

    /// Create a ground plane collider
    pub fn create_ground(&mut self, y: f32) -> ColliderHandle {
        let normal = Unit::new_normalize(vector![0.0, 1.0, 0.0]);
        let ground = ColliderBuilder::halfspace(normal)
            .translation(vector![0.0, y, 0.0])
            .friction(0.7)
            .restitution(0.0)
            .collision_groups(LayerMask::DEFAULT.collider_groups())
            .build();
        self.add_static_collider(ground)
    }

    /// Create a static box collider on the default layer
    pub fn create_static_box(&mut self, half_extents: Vec3, position: Vec3) -> ColliderHandle {
        self.create_static_box_on_layer(half_extents, position, LayerMask::DEFAULT)
    }

    /// Create a static box collider that belongs to `layer`
    pub fn create_static_box_on_layer(
        &mut self,
        half_extents: Vec3,
        position: Vec3,
        layer: LayerMask,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(vector![position.x, position.y, position.z])
            .friction(0.7)
            .collision_groups(layer.collider_groups())
            .build();
        self.add_static_collider(collider)
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn to_vec3(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub(crate) fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}
