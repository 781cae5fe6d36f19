//! Tether Game - First-person movement with grapple and swing traversal
//!
//! Provides input handling, movement configuration, the traversal
//! mechanics and the player controller that arbitrates between them.

pub mod config;
pub mod error;
pub mod input;
pub mod player;
pub mod traversal;

pub use config::{ControllerConfig, CrouchConfig, GrappleConfig, LocomotionConfig, SwingConfig};
pub use error::{ConfigError, TraversalError};
pub use input::{InputAction, InputBindings, InputHandler, InputState, MovementInput};
pub use player::{CrouchState, MovementMode, PlayerController};
pub use traversal::{GrappleController, GrapplePhase, SwingController, TrajectorySolver};
