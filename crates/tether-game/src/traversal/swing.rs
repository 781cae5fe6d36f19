//! Rope swing: a spring cable to a predicted anchor, driven by thrust
//!
//! While a swing is active the physics engine owns the character's body;
//! this controller only adds thrust and retunes the cable each tick.

use glam::{Vec2, Vec3};
use tether_physics::{
    BodyDynamics, DistanceSpring, DynamicSettings, QueryMask, RaycastHit, RigidBodyHandle,
    SpatialQuery,
};
use tracing::{debug, trace};

use crate::config::SwingConfig;
use crate::error::TraversalError;

/// Input threshold below which an axis counts as released
const AXIS_DEADZONE: f32 = 0.1;

/// A live swing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingSession {
    /// Body being swung
    pub body: RigidBodyHandle,
    /// Where the cable is attached
    pub anchor: Vec3,
    /// Current cable bounds
    pub min_distance: f32,
    pub max_distance: f32,
}

/// A validated swing start, ready to hand to [`SwingController::begin`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingTarget {
    pub body: RigidBodyHandle,
    pub anchor: Vec3,
    /// Body-to-anchor distance when validated
    pub distance: f32,
}

/// Per-tick swing steering
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SwingInput {
    /// x: right minus left, y: forward minus back
    pub axis: Vec2,
    /// Reel the cable in
    pub pull: bool,
    /// Facing on the ground plane
    pub forward: Vec3,
    pub right: Vec3,
}

/// Rope swing state machine: idle (predicting) or active
#[derive(Debug)]
pub struct SwingController {
    config: SwingConfig,
    prediction: Option<RaycastHit>,
    session: Option<SwingSession>,
}

impl SwingController {
    pub fn new(config: SwingConfig) -> Self {
        Self {
            config,
            prediction: None,
            session: None,
        }
    }

    /// Refresh the predicted anchor from the current view.
    ///
    /// A precise ray hit wins over the forgiving sphere cast. Does nothing
    /// while swinging.
    pub fn update_prediction<Q: SpatialQuery + ?Sized>(
        &mut self,
        query: &Q,
        origin: Vec3,
        aim: Vec3,
        mask: QueryMask,
    ) {
        if self.session.is_some() {
            return;
        }

        let mask = QueryMask {
            layers: self.config.grappleable,
            ..mask
        };
        let range = self.config.max_swing_distance;
        self.prediction = query
            .raycast(origin, aim, range, mask)
            .or_else(|| query.sphere_cast(origin, aim, self.config.prediction_radius, range, mask));
    }

    /// Check that a swing could start now
    pub fn ready<P: BodyDynamics + ?Sized>(
        &self,
        physics: &P,
        body: Option<RigidBodyHandle>,
    ) -> Result<SwingTarget, TraversalError> {
        if self.session.is_some() {
            return Err(TraversalError::AlreadyActive);
        }
        let prediction = self.prediction.ok_or(TraversalError::NoPrediction)?;
        let body = body.ok_or(TraversalError::MissingBody)?;
        let position = physics
            .body_translation(body)
            .ok_or(TraversalError::MissingBody)?;

        let distance = position.distance(prediction.point);
        if distance <= f32::EPSILON {
            return Err(TraversalError::NoPrediction);
        }

        Ok(SwingTarget {
            body,
            anchor: prediction.point,
            distance,
        })
    }

    /// Hand the body to the solver and attach the cable.
    ///
    /// `velocity` is the character's current kinematic velocity; the body
    /// continues with it.
    pub fn begin<P: BodyDynamics + ?Sized>(
        &mut self,
        physics: &mut P,
        target: SwingTarget,
        velocity: Vec3,
    ) {
        let body = target.body;
        physics.set_kinematic(body, false);
        physics.set_gravity_enabled(body, true);
        physics.set_linear_velocity(body, velocity);
        physics.freeze_rotation(body);
        physics.configure_dynamic(
            body,
            DynamicSettings {
                linear_damping: self.config.linear_damping,
                ccd: true,
            },
        );

        let max_distance = target.distance * self.config.max_ratio;
        let min_distance = target.distance * self.config.min_ratio;
        physics.attach_spring(
            body,
            DistanceSpring {
                anchor: target.anchor,
                min_distance,
                max_distance,
                spring: self.config.spring,
                damper: self.config.damper,
            },
        );

        self.session = Some(SwingSession {
            body,
            anchor: target.anchor,
            min_distance,
            max_distance,
        });
        self.prediction = None;
        debug!("Swing started at {} ({:.1}m)", target.anchor, target.distance);
    }

    /// Validate and begin in one step
    pub fn try_start<P: BodyDynamics + ?Sized>(
        &mut self,
        physics: &mut P,
        body: Option<RigidBodyHandle>,
        velocity: Vec3,
    ) -> Result<(), TraversalError> {
        let target = self.ready(physics, body)?;
        self.begin(physics, target, velocity);
        Ok(())
    }

    /// Apply one physics tick of swing steering
    pub fn physics_tick<P: BodyDynamics + ?Sized>(&mut self, physics: &mut P, input: &SwingInput) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let body = session.body;
        let (Some(position), Some(velocity)) =
            (physics.body_translation(body), physics.linear_velocity(body))
        else {
            return;
        };

        let config = &self.config;
        let can_thrust = velocity.length() < config.max_swing_speed;
        let mut acceleration = Vec3::ZERO;

        if can_thrust && input.axis.x.abs() > AXIS_DEADZONE {
            acceleration += input.right * input.axis.x * config.horizontal_thrust;
        }
        if can_thrust && input.axis.y > AXIS_DEADZONE {
            acceleration += input.forward * config.horizontal_thrust;
        }

        let to_anchor = session.anchor - position;
        let distance = to_anchor.length();
        let (min_distance, max_distance) = if input.pull {
            acceleration += to_anchor.normalize_or_zero() * config.forward_thrust;
            (
                (distance * config.min_ratio).max(config.pull_min_floor),
                (distance * config.max_ratio).max(config.pull_max_floor),
            )
        } else if input.axis.y < -AXIS_DEADZONE {
            let extended = distance + config.extend_cable_speed;
            (extended * config.min_ratio, extended * config.max_ratio)
        } else {
            (distance * config.min_ratio, distance * config.max_ratio)
        };

        if can_thrust && input.axis.length() > AXIS_DEADZONE {
            // Steer in the plane perpendicular to the rope
            let rope = to_anchor.normalize_or_zero();
            let side = rope.cross(Vec3::Y).normalize_or_zero();
            let along = side.cross(rope).normalize_or_zero();
            let assist = (side * input.axis.x + along * input.axis.y).normalize_or_zero();
            acceleration += assist * config.horizontal_thrust * config.assist_factor;
        }

        session.min_distance = min_distance;
        session.max_distance = max_distance;
        physics.set_spring_limits(body, min_distance, max_distance);
        if acceleration != Vec3::ZERO {
            physics.apply_acceleration(body, acceleration);
        }

        trace!(
            "Swing: distance {:.2} bounds [{:.2}, {:.2}] speed {:.2}",
            distance,
            min_distance,
            max_distance,
            velocity.length()
        );
    }

    /// Release the cable and take the body back from the solver.
    ///
    /// Returns the attenuated velocity the kinematic controller should
    /// continue with, or `None` if no swing was active.
    pub fn stop<P: BodyDynamics + ?Sized>(&mut self, physics: &mut P) -> Option<Vec3> {
        let session = self.session.take()?;
        let body = session.body;

        let velocity = physics.linear_velocity(body).unwrap_or_default();
        let retained = Vec3::new(
            velocity.x * self.config.release_horizontal_retain,
            velocity.y * self.config.release_vertical_retain,
            velocity.z * self.config.release_horizontal_retain,
        );

        physics.set_linear_velocity(body, Vec3::ZERO);
        physics.set_kinematic(body, true);
        physics.set_gravity_enabled(body, false);
        physics.detach_spring(body);

        debug!("Swing released with velocity {}", retained);
        Some(retained)
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&SwingSession> {
        self.session.as_ref()
    }

    /// Best anchor candidate for a reticle, while idle
    pub fn prediction(&self) -> Option<&RaycastHit> {
        self.prediction.as_ref()
    }

    pub fn config(&self) -> &SwingConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SwingConfig) {
        self.config = config;
    }
}
