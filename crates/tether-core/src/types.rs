//! Core types shared by the physics and movement crates

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// First-person look angles.
///
/// Yaw turns the body (positive = turn right), pitch tilts the view
/// (positive = look up). Forward at zero yaw is negative Z.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LookAngles {
    /// Horizontal rotation in radians
    pub yaw: f32,
    /// Vertical rotation in radians
    pub pitch: f32,
}

impl LookAngles {
    /// Create look angles from yaw and pitch in radians
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }

    /// Apply a look delta (x = yaw, y = screen-down) scaled by sensitivity,
    /// clamping pitch to `[min_pitch, max_pitch]` (radians)
    pub fn apply_delta(&mut self, delta: Vec2, sensitivity: f32, min_pitch: f32, max_pitch: f32) {
        if delta.length_squared() < 1.0e-8 {
            return;
        }
        self.yaw += delta.x * sensitivity;
        self.pitch = (self.pitch - delta.y * sensitivity).clamp(min_pitch, max_pitch);
    }

    /// Body forward direction on the ground plane
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// Body right direction on the ground plane
    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin())
    }

    /// View direction including pitch (unit length)
    pub fn aim(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(
            self.yaw.sin() * cos_pitch,
            sin_pitch,
            -self.yaw.cos() * cos_pitch,
        )
    }
}

/// Critically damped smoothing of `current` toward `target`.
///
/// `velocity` carries the smoothing state between calls. Never overshoots
/// the target.
pub fn smooth_damp(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    let smooth_time = smooth_time.max(1.0e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let mut output = target + (change + temp) * decay;

    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }
    output
}
