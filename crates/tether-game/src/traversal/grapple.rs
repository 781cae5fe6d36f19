//! Grapple-jump: hook a surface, wind up, then fly a ballistic arc onto it

use glam::Vec3;
use tether_core::DelayedTasks;
use tether_physics::{QueryMask, RaycastHit, SpatialQuery};
use tracing::debug;

use super::trajectory::TrajectorySolver;
use crate::config::GrappleConfig;
use crate::error::TraversalError;

/// World-space apex for an arc from `start_y` to `target_y`.
///
/// The arc always peaks `overshoot` above the higher endpoint, so for any
/// positive overshoot the solver's two legs are well defined.
pub fn arc_apex(start_y: f32, target_y: f32, overshoot: f32) -> f32 {
    if target_y < start_y {
        start_y + overshoot
    } else {
        target_y + overshoot
    }
}

/// Where a grapple is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrapplePhase {
    /// Nothing hooked
    Idle,
    /// Target hooked, character frozen until launch
    WindUp,
    /// Flying toward the anchor
    Flight,
}

/// State of a live grapple
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrappleSession {
    /// The point being flown to
    pub anchor: Vec3,
    /// World-space apex of the arc (set at launch)
    pub apex_y: f32,
    /// Solved launch velocity (set at launch)
    pub launch_velocity: Vec3,
    /// Ballistic velocity currently applied to the character
    pub velocity: Vec3,
    /// Whether touching geometry ends the flight
    pub armed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrappleTask {
    Launch,
    HandoffVelocity,
    Failsafe,
}

/// Grapple state machine.
///
/// Timed steps (launch after the wind-up, the velocity handoff and the
/// flight failsafe) are deferred tasks owned by this controller; `stop`
/// cancels all of them so a stale timer can never touch a later session.
#[derive(Debug)]
pub struct GrappleController {
    config: GrappleConfig,
    phase: GrapplePhase,
    session: Option<GrappleSession>,
    cooldown: f32,
    tasks: DelayedTasks<GrappleTask>,
}

impl GrappleController {
    pub fn new(config: GrappleConfig) -> Self {
        Self {
            config,
            phase: GrapplePhase::Idle,
            session: None,
            cooldown: 0.0,
            tasks: DelayedTasks::new(),
        }
    }

    /// Look for a target along `aim` without committing to it.
    ///
    /// A miss still costs the reduced cooldown. Callers follow a successful
    /// acquisition with [`begin`](Self::begin) once any conflicting
    /// mechanic has been stopped.
    pub fn acquire_target<Q: SpatialQuery + ?Sized>(
        &mut self,
        query: &Q,
        origin: Vec3,
        aim: Vec3,
        mask: QueryMask,
    ) -> Result<RaycastHit, TraversalError> {
        if self.is_active() {
            return Err(TraversalError::AlreadyActive);
        }
        if self.cooldown > 0.0 {
            return Err(TraversalError::OnCooldown {
                remaining: self.cooldown,
            });
        }

        let range = self.config.max_grapple_distance;
        let layers = QueryMask {
            layers: self.config.grappleable,
            ..mask
        };
        match query.raycast(origin, aim, range, layers) {
            Some(hit) => Ok(hit),
            None => {
                self.cooldown = self.config.grapple_cooldown * self.config.failed_cooldown_factor;
                Err(TraversalError::NoTarget { range })
            }
        }
    }

    /// Hook `target` and start the wind-up
    pub fn begin(&mut self, target: RaycastHit) {
        self.tasks.cancel_all();
        self.session = Some(GrappleSession {
            anchor: target.point,
            apex_y: target.point.y,
            launch_velocity: Vec3::ZERO,
            velocity: Vec3::ZERO,
            armed: false,
        });
        self.phase = GrapplePhase::WindUp;
        self.tasks.schedule(self.config.grapple_delay, GrappleTask::Launch);
        debug!("Grapple hooked at {} ({:.1}m)", target.point, target.distance);
    }

    /// Acquire and begin in one step
    pub fn try_start<Q: SpatialQuery + ?Sized>(
        &mut self,
        query: &Q,
        origin: Vec3,
        aim: Vec3,
        mask: QueryMask,
    ) -> Result<(), TraversalError> {
        let target = self.acquire_target(query, origin, aim, mask)?;
        self.begin(target);
        Ok(())
    }

    /// Advance cooldown and timers by one tick.
    ///
    /// `position` is where the character stands now; a launch firing this
    /// tick solves its arc from there.
    pub fn tick(&mut self, position: Vec3, gravity: f32, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);

        for task in self.tasks.advance(dt) {
            match task {
                GrappleTask::Launch => self.launch(position, gravity),
                GrappleTask::HandoffVelocity => {
                    if let Some(session) = self.session.as_mut() {
                        session.velocity = session.launch_velocity;
                        session.armed = true;
                    }
                }
                GrappleTask::Failsafe => {
                    if self.stop() {
                        debug!("Grapple flight timed out");
                    }
                }
            }
        }
    }

    fn launch(&mut self, position: Vec3, gravity: f32) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let apex_y = arc_apex(position.y, session.anchor.y, self.config.overshoot_y_axis);
        let solver = TrajectorySolver::new(gravity, self.config.speed_multiplier);
        session.apex_y = apex_y;
        session.launch_velocity = solver.solve(position, session.anchor, apex_y - position.y);

        self.phase = GrapplePhase::Flight;
        self.tasks
            .schedule(self.config.velocity_handoff_delay, GrappleTask::HandoffVelocity);
        self.tasks.schedule(self.config.flight_timeout, GrappleTask::Failsafe);
        debug!(
            "Grapple launched toward {} at {:.1} m/s",
            session.anchor,
            session.launch_velocity.length()
        );
    }

    /// Ballistic displacement for this tick; integrates gravity afterwards
    pub fn advance_flight(&mut self, gravity: f32, dt: f32) -> Vec3 {
        match (self.phase, self.session.as_mut()) {
            (GrapplePhase::Flight, Some(session)) => {
                let displacement = session.velocity * dt;
                session.velocity.y -= gravity * dt;
                displacement
            }
            _ => Vec3::ZERO,
        }
    }

    /// The character touched geometry; ends an armed flight
    pub fn notify_arrival(&mut self) -> bool {
        let armed = self.phase == GrapplePhase::Flight
            && self.session.as_ref().is_some_and(|s| s.armed);
        armed && self.stop()
    }

    /// End the grapple and start the full cooldown; false if nothing was active
    pub fn stop(&mut self) -> bool {
        if self.phase == GrapplePhase::Idle {
            return false;
        }
        self.tasks.cancel_all();
        self.session = None;
        self.phase = GrapplePhase::Idle;
        self.cooldown = self.config.grapple_cooldown;
        debug!("Grapple stopped");
        true
    }

    pub fn phase(&self) -> GrapplePhase {
        self.phase
    }

    /// A session exists (winding up or flying)
    pub fn is_active(&self) -> bool {
        self.phase != GrapplePhase::Idle
    }

    /// Locomotion is locked during the wind-up
    pub fn is_winding_up(&self) -> bool {
        self.phase == GrapplePhase::WindUp
    }

    pub fn is_in_flight(&self) -> bool {
        self.phase == GrapplePhase::Flight
    }

    pub fn session(&self) -> Option<&GrappleSession> {
        self.session.as_ref()
    }

    /// Current anchor, if hooked
    pub fn grapple_point(&self) -> Option<Vec3> {
        self.session.map(|s| s.anchor)
    }

    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown
    }

    pub fn config(&self) -> &GrappleConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GrappleConfig) {
        self.config = config;
    }
}
