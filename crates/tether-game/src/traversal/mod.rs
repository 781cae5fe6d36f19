//! Traversal mechanics that take over the character's motion
//!
//! The grapple flies a ballistic arc onto a hooked point; the swing hands
//! the body to the physics engine on a spring cable. Neither knows about
//! the other: the player controller arbitrates between them.

mod grapple;
mod swing;
mod trajectory;

pub use grapple::{arc_apex, GrappleController, GrapplePhase, GrappleSession};
pub use swing::{SwingController, SwingInput, SwingSession, SwingTarget};
pub use trajectory::{LaunchArc, TrajectorySolver};
