//! Crouching and the stand-up clearance check

use glam::Vec3;
use tether_core::smooth_damp;
use tether_physics::{QueryMask, RigidBodyHandle, SpatialQuery};
use tracing::debug;

use crate::config::CrouchConfig;

/// Logical crouch state; the capsule height follows it smoothly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrouchState {
    Standing,
    Crouching,
    /// Crouched with the key released, waiting for headroom
    WantsToStand,
}

/// Result of one height smoothing step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightStep {
    /// New capsule height
    pub height: f32,
    /// Upward displacement that keeps the feet on the floor (half the growth)
    pub lift: f32,
}

/// Crouch state machine and height smoothing
#[derive(Debug, Clone)]
pub struct CrouchController {
    config: CrouchConfig,
    state: CrouchState,
    key_held: bool,
    height: f32,
    height_velocity: f32,
    since_stand_check: f32,
}

impl CrouchController {
    pub fn new(config: CrouchConfig) -> Self {
        Self {
            height: config.standing_height,
            config,
            state: CrouchState::Standing,
            key_held: false,
            height_velocity: 0.0,
            since_stand_check: f32::INFINITY,
        }
    }

    /// Crouch key pressed: always crouches immediately
    pub fn press(&mut self) {
        self.key_held = true;
        if self.state != CrouchState::Crouching {
            debug!("Crouching");
        }
        self.state = CrouchState::Crouching;
    }

    /// Crouch key released: stand once there is room
    pub fn release(&mut self) {
        self.key_held = false;
        if self.state == CrouchState::Crouching {
            self.state = CrouchState::WantsToStand;
        }
    }

    /// Try to stand up if waiting to.
    ///
    /// The clearance check runs at most once per `stand_check_cooldown`.
    /// Returns true when the character stood up this tick.
    pub fn update<Q: SpatialQuery + ?Sized>(
        &mut self,
        query: &Q,
        feet: Vec3,
        exclude: Option<RigidBodyHandle>,
        dt: f32,
    ) -> bool {
        self.since_stand_check += dt;
        if self.state != CrouchState::WantsToStand || self.key_held {
            return false;
        }
        if self.since_stand_check <= self.config.stand_check_cooldown {
            return false;
        }

        self.since_stand_check = 0.0;
        if self.can_stand_up(query, feet, exclude) {
            self.state = CrouchState::Standing;
            debug!("Standing up");
            true
        } else {
            false
        }
    }

    /// Whether the space a standing character occupies is clear
    pub fn can_stand_up<Q: SpatialQuery + ?Sized>(
        &self,
        query: &Q,
        feet: Vec3,
        exclude: Option<RigidBodyHandle>,
    ) -> bool {
        let marker = feet + Vec3::Y * self.config.stand_marker_height;
        let mask = QueryMask::layers(self.config.obstacle_layers).excluding(exclude);
        query
            .overlap_sphere(marker, self.config.stand_check_radius, mask)
            .iter()
            .all(|hit| hit.bounds_min.y >= marker.y + self.config.stand_clearance)
    }

    /// Move the height one tick toward the target
    pub fn adjust_height(&mut self, dt: f32) -> HeightStep {
        let previous = self.height;
        self.height = smooth_damp(
            self.height,
            self.target_height(),
            &mut self.height_velocity,
            self.config.smooth_time,
            dt,
        );
        let growth = self.height - previous;
        HeightStep {
            height: self.height,
            lift: if growth > 0.0 { growth * 0.5 } else { 0.0 },
        }
    }

    pub fn target_height(&self) -> f32 {
        match self.state {
            CrouchState::Standing => self.config.standing_height,
            CrouchState::Crouching | CrouchState::WantsToStand => self.config.crouch_height,
        }
    }

    pub fn state(&self) -> CrouchState {
        self.state
    }

    /// Crouched, including while waiting to stand
    pub fn is_crouching(&self) -> bool {
        self.state != CrouchState::Standing
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn set_config(&mut self, config: CrouchConfig) {
        self.config = config;
    }
}
