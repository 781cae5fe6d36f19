//! Player controller module
//!
//! First-person locomotion with crouching, and the orchestration of the
//! traversal mechanics on top of it.

mod controller;
mod crouch;
mod grounded;
mod locomotion;

pub use controller::PlayerController;
pub use crouch::{CrouchController, CrouchState, HeightStep};
pub use grounded::GroundedTracker;
pub use locomotion::{air_velocity, ground_velocity, LocomotionState, ModeFlags, MovementMode};
