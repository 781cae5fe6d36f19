//! Tether Core - Core types and utilities for the Tether movement stack
//!
//! This crate provides the foundational types used throughout the workspace:
//! - Mathematical primitives (re-exported from glam)
//! - Look angles and critically damped smoothing
//! - Fixed-timestep game time
//! - Deferred one-shot tasks

pub mod schedule;
pub mod time;
pub mod types;

pub use glam::{Quat, Vec2, Vec3};
pub use schedule::DelayedTasks;
pub use time::{seconds_to_ticks, GameTime, TimeConfig};
pub use types::{smooth_damp, LookAngles};
