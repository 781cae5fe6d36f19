//! Rigid body authority switches and the distance spring constraint

use glam::Vec3;
use rapier3d::prelude::*;

use crate::{to_vec3, to_vector, PhysicsWorld};

/// A distance constraint to a fixed world anchor.
///
/// Inside `[min_distance, max_distance]` it exerts nothing; outside it pulls
/// (or pushes) along the rope with a damped spring. Coefficients are per
/// unit mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSpring {
    /// World-space anchor point
    pub anchor: Vec3,
    /// Distance below which the spring pushes away
    pub min_distance: f32,
    /// Distance above which the spring pulls in
    pub max_distance: f32,
    /// Spring stiffness
    pub spring: f32,
    /// Damping along the rope direction
    pub damper: f32,
}

impl DistanceSpring {
    /// Acceleration the spring applies to a body at `position` moving at `velocity`
    pub fn acceleration(&self, position: Vec3, velocity: Vec3) -> Vec3 {
        let offset = self.anchor - position;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return Vec3::ZERO;
        }

        let stretch = if distance > self.max_distance {
            distance - self.max_distance
        } else if distance < self.min_distance {
            distance - self.min_distance
        } else {
            return Vec3::ZERO;
        };

        let direction = offset / distance;
        let closing_speed = velocity.dot(direction);
        direction * (self.spring * stretch - self.damper * closing_speed)
    }
}

/// Body settings applied when a body becomes physics-driven
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicSettings {
    /// Linear velocity damping
    pub linear_damping: f32,
    /// Continuous collision detection
    pub ccd: bool,
}

impl Default for DynamicSettings {
    fn default() -> Self {
        Self {
            linear_damping: 0.1,
            ccd: true,
        }
    }
}

/// The rigid body operations the movement controllers need from a physics engine.
///
/// Calls on a missing body are ignored; getters return `None`.
pub trait BodyDynamics {
    /// World-space position of the body origin
    fn body_translation(&self, body: RigidBodyHandle) -> Option<Vec3>;
    /// Current linear velocity
    fn linear_velocity(&self, body: RigidBodyHandle) -> Option<Vec3>;
    /// Overwrite the linear velocity
    fn set_linear_velocity(&mut self, body: RigidBodyHandle, velocity: Vec3);
    /// Whether the body is moved by code rather than by the solver
    fn is_kinematic(&self, body: RigidBodyHandle) -> bool;
    /// Switch between kinematic and dynamic
    fn set_kinematic(&mut self, body: RigidBodyHandle, kinematic: bool);
    /// Enable or disable world gravity on the body
    fn set_gravity_enabled(&mut self, body: RigidBodyHandle, enabled: bool);
    /// Zero angular velocity and lock all rotations
    fn freeze_rotation(&mut self, body: RigidBodyHandle);
    /// Apply damping and CCD settings for physics-driven motion
    fn configure_dynamic(&mut self, body: RigidBodyHandle, settings: DynamicSettings);
    /// Apply an acceleration for one step
    fn apply_acceleration(&mut self, body: RigidBodyHandle, acceleration: Vec3);
    /// Attach (or replace) the distance spring on a body
    fn attach_spring(&mut self, body: RigidBodyHandle, spring: DistanceSpring);
    /// Update the distance bounds of an attached spring; false when none is attached
    fn set_spring_limits(
        &mut self,
        body: RigidBodyHandle,
        min_distance: f32,
        max_distance: f32,
    ) -> bool;
    /// The spring attached to a body
    fn spring(&self, body: RigidBodyHandle) -> Option<DistanceSpring>;
    /// Remove the spring from a body
    fn detach_spring(&mut self, body: RigidBodyHandle) -> Option<DistanceSpring>;
}

impl BodyDynamics for PhysicsWorld {
    fn body_translation(&self, body: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(body).map(|rb| to_vec3(rb.translation()))
    }

    fn linear_velocity(&self, body: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(body).map(|rb| to_vec3(rb.linvel()))
    }

    fn set_linear_velocity(&mut self, body: RigidBodyHandle, velocity: Vec3) {
        if let Some(rb) = self.rigid_body_set.get_mut(body) {
            rb.set_linvel(to_vector(velocity), true);
        }
    }

    fn is_kinematic(&self, body: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .get(body)
            .is_some_and(|rb| rb.is_kinematic())
    }

    fn set_kinematic(&mut self, body: RigidBodyHandle, kinematic: bool) {
        if let Some(rb) = self.rigid_body_set.get_mut(body) {
            let body_type = if kinematic {
                RigidBodyType::KinematicPositionBased
            } else {
                RigidBodyType::Dynamic
            };
            rb.set_body_type(body_type, true);
        }
    }

    fn set_gravity_enabled(&mut self, body: RigidBodyHandle, enabled: bool) {
        if let Some(rb) = self.rigid_body_set.get_mut(body) {
            rb.set_gravity_scale(if enabled { 1.0 } else { 0.0 }, true);
        }
    }

    fn freeze_rotation(&mut self, body: RigidBodyHandle) {
        if let Some(rb) = self.rigid_body_set.get_mut(body) {
            rb.set_angvel(vector![0.0, 0.0, 0.0], true);
            rb.lock_rotations(true, true);
        }
    }

    fn configure_dynamic(&mut self, body: RigidBodyHandle, settings: DynamicSettings) {
        if let Some(rb) = self.rigid_body_set.get_mut(body) {
            rb.set_linear_damping(settings.linear_damping);
            rb.enable_ccd(settings.ccd);
        }
    }

    fn apply_acceleration(&mut self, body: RigidBodyHandle, acceleration: Vec3) {
        let dt = self.integration_parameters.dt;
        if let Some(rb) = self.rigid_body_set.get_mut(body) {
            let velocity = *rb.linvel() + to_vector(acceleration * dt);
            rb.set_linvel(velocity, true);
        }
    }

    fn attach_spring(&mut self, body: RigidBodyHandle, spring: DistanceSpring) {
        self.springs.insert(body, spring);
    }

    fn set_spring_limits(
        &mut self,
        body: RigidBodyHandle,
        min_distance: f32,
        max_distance: f32,
    ) -> bool {
        match self.springs.get_mut(&body) {
            Some(spring) => {
                spring.min_distance = min_distance;
                spring.max_distance = max_distance;
                true
            }
            None => false,
        }
    }

    fn spring(&self, body: RigidBodyHandle) -> Option<DistanceSpring> {
        self.springs.get(&body).copied()
    }

    fn detach_spring(&mut self, body: RigidBodyHandle) -> Option<DistanceSpring> {
        self.springs.remove(&body)
    }
}
