//! Ballistic launch solver

use glam::Vec3;

/// A solved two-leg arc: rise to the apex, then fall onto the target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchArc {
    /// Launch velocity, before any power multiplier
    pub velocity: Vec3,
    /// Time from launch to the apex
    pub ascent_time: f32,
    /// Time from the apex to the target
    pub descent_time: f32,
}

impl LaunchArc {
    /// Total time from launch to the target
    pub fn flight_time(&self) -> f32 {
        self.ascent_time + self.descent_time
    }

    /// Closed-form position `t` seconds after launch from `start`
    pub fn position_at(&self, start: Vec3, gravity: f32, t: f32) -> Vec3 {
        start + self.velocity * t - Vec3::Y * (0.5 * gravity * t * t)
    }
}

/// Computes launch velocities for projectile arcs under constant gravity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectorySolver {
    /// Gravity magnitude (positive, pulls along -Y)
    pub gravity: f32,
    /// Multiplier applied to the solved velocity
    pub power: f32,
}

impl TrajectorySolver {
    pub fn new(gravity: f32, power: f32) -> Self {
        Self { gravity, power }
    }

    /// Solve the arc from `start` to `end` peaking `apex_height` above `start`.
    ///
    /// The vertical speed reaches zero exactly at the apex; the horizontal
    /// speed covers the planar distance over ascent plus descent. An apex
    /// below either endpoint has no exact solution and yields a finite but
    /// inexact arc.
    pub fn arc(&self, start: Vec3, end: Vec3, apex_height: f32) -> LaunchArc {
        let g = self.gravity;
        let rise = apex_height.max(0.0);
        let drop = (apex_height - (end.y - start.y)).max(0.0);

        let ascent_time = (2.0 * rise / g).sqrt();
        let descent_time = (2.0 * drop / g).sqrt();
        let total = ascent_time + descent_time;

        let planar = Vec3::new(end.x - start.x, 0.0, end.z - start.z);
        let horizontal = if total > f32::EPSILON { planar / total } else { Vec3::ZERO };
        let vertical = (2.0 * g * rise).sqrt();

        LaunchArc {
            velocity: horizontal + Vec3::Y * vertical,
            ascent_time,
            descent_time,
        }
    }

    /// Launch velocity for the arc, scaled by `power`
    pub fn solve(&self, start: Vec3, end: Vec3, apex_height: f32) -> Vec3 {
        self.arc(start, end, apex_height).velocity * self.power
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const G: f32 = 9.81;

    #[test]
    fn test_reference_arc() {
        let solver = TrajectorySolver::new(G, 1.0);
        let start = Vec3::ZERO;
        let end = Vec3::new(0.0, 10.0, 20.0);
        let arc = solver.arc(start, end, 13.0);

        assert!((arc.velocity.y - (2.0 * G * 13.0).sqrt()).abs() < 1.0e-4);
        assert_eq!(arc.velocity.x, 0.0);

        let landed = arc.position_at(start, G, arc.flight_time());
        assert!((landed - end).length() < 1.0e-3, "landed at {landed}");
    }

    #[test]
    fn test_apex_reached_at_ascent_time() {
        let solver = TrajectorySolver::new(G, 1.0);
        let start = Vec3::new(3.0, 2.0, -1.0);
        let end = Vec3::new(-12.0, -4.0, 9.0);
        let arc = solver.arc(start, end, 5.0);

        let apex = arc.position_at(start, G, arc.ascent_time);
        assert!((apex.y - (start.y + 5.0)).abs() < 1.0e-3);
        let vertical_speed_at_apex = arc.velocity.y - G * arc.ascent_time;
        assert!(vertical_speed_at_apex.abs() < 1.0e-3);
    }

    #[test]
    fn test_reaches_target_for_many_pairs() {
        let solver = TrajectorySolver::new(G, 1.0);
        let offsets = [
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(-5.0, 8.0, 30.0),
            Vec3::new(0.0, -15.0, -7.0),
            Vec3::new(40.0, 20.0, 40.0),
            Vec3::new(0.5, 0.0, 0.5),
        ];

        for offset in offsets {
            let start = Vec3::new(1.0, 4.0, -2.0);
            let end = start + offset;
            let apex = offset.y.max(0.0) + 2.0;
            let arc = solver.arc(start, end, apex);
            let landed = arc.position_at(start, G, arc.flight_time());
            assert!((landed - end).length() < 1.0e-2, "offset {offset}: landed at {landed}");
        }
    }

    #[test]
    fn test_euler_integration_lands_near_target() {
        let solver = TrajectorySolver::new(G, 1.0);
        let start = Vec3::ZERO;
        let end = Vec3::new(6.0, 3.0, -8.0);
        let arc = solver.arc(start, end, 6.0);

        let steps = 10_000;
        let dt = arc.flight_time() / steps as f32;
        let mut position = start;
        let mut velocity = arc.velocity;
        for _ in 0..steps {
            // Constant-acceleration step, exact up to rounding
            position += velocity * dt - Vec3::Y * (0.5 * G * dt * dt);
            velocity.y -= G * dt;
        }
        assert!((position - end).length() < 0.05, "landed at {position}");
    }

    #[test]
    fn test_power_scales_velocity() {
        let start = Vec3::ZERO;
        let end = Vec3::new(4.0, 1.0, 4.0);
        let base = TrajectorySolver::new(G, 1.0).solve(start, end, 4.0);
        let boosted = TrajectorySolver::new(G, 1.5).solve(start, end, 4.0);
        assert!((boosted - base * 1.5).length() < 1.0e-5);
    }

    #[test]
    fn test_degenerate_apex_stays_finite() {
        let solver = TrajectorySolver::new(G, 1.0);
        let velocity = solver.solve(Vec3::ZERO, Vec3::new(5.0, 10.0, 0.0), 2.0);
        assert!(velocity.is_finite());
        let velocity = solver.solve(Vec3::ZERO, Vec3::ZERO, 0.0);
        assert!(velocity.is_finite());
    }
}
