//! Input system with action-based mapping
//!
//! Raw winit events become [`InputAction`]s through [`InputBindings`];
//! once per simulation tick the held/pressed/released sets are folded into
//! a [`MovementInput`], which is all the movement controllers ever see.

use std::collections::{HashMap, HashSet};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tether_core::LookAngles;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Game actions that can be triggered by input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAction {
    /// Move forward (W by default)
    MoveForward,
    /// Move backward (S by default)
    MoveBackward,
    /// Move left (A by default)
    MoveLeft,
    /// Move right (D by default)
    MoveRight,
    /// Jump, and reel in while swinging (Space by default)
    Jump,
    /// Run modifier (Shift by default)
    Sprint,
    /// Crouch while held (C by default)
    Crouch,
    /// Fire the grapple (left mouse button or G by default)
    Grapple,
    /// Swing while held (right mouse button by default)
    Swing,
}

/// Current state of all inputs for a frame
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Actions currently held down
    pub held: HashSet<InputAction>,
    /// Actions that were just pressed this frame
    pub just_pressed: HashSet<InputAction>,
    /// Actions that were just released this frame
    pub just_released: HashSet<InputAction>,
    /// Mouse movement delta for this frame
    pub mouse_delta: Vec2,
    /// Whether the cursor is captured (invisible, locked)
    pub cursor_captured: bool,
}

impl InputState {
    /// Create a new empty input state
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an action is currently held
    pub fn is_held(&self, action: InputAction) -> bool {
        self.held.contains(&action)
    }

    /// Check if an action was just pressed this frame
    pub fn is_just_pressed(&self, action: InputAction) -> bool {
        self.just_pressed.contains(&action)
    }

    /// Check if an action was just released this frame
    pub fn is_just_released(&self, action: InputAction) -> bool {
        self.just_released.contains(&action)
    }

    /// Clear frame-specific data (call at end of frame)
    pub fn clear_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
        self.mouse_delta = Vec2::ZERO;
    }
}

/// Binding of a physical key to an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputBinding {
    /// Keyboard key
    Key(KeyCode),
    /// Mouse button
    Mouse(u32), // 0 = left, 1 = right, 2 = middle
}

impl From<KeyCode> for InputBinding {
    fn from(key: KeyCode) -> Self {
        Self::Key(key)
    }
}

/// Maps physical inputs to game actions
#[derive(Debug, Clone)]
pub struct InputBindings {
    /// Key/button to action mappings
    bindings: HashMap<InputBinding, InputAction>,
    /// Reverse lookup: action to all bindings
    reverse: HashMap<InputAction, Vec<InputBinding>>,
}

impl Default for InputBindings {
    fn default() -> Self {
        let mut bindings = Self {
            bindings: HashMap::new(),
            reverse: HashMap::new(),
        };

        bindings.bind(KeyCode::KeyW, InputAction::MoveForward);
        bindings.bind(KeyCode::KeyS, InputAction::MoveBackward);
        bindings.bind(KeyCode::KeyA, InputAction::MoveLeft);
        bindings.bind(KeyCode::KeyD, InputAction::MoveRight);

        bindings.bind(KeyCode::ArrowUp, InputAction::MoveForward);
        bindings.bind(KeyCode::ArrowDown, InputAction::MoveBackward);
        bindings.bind(KeyCode::ArrowLeft, InputAction::MoveLeft);
        bindings.bind(KeyCode::ArrowRight, InputAction::MoveRight);

        bindings.bind(KeyCode::Space, InputAction::Jump);
        bindings.bind(KeyCode::ShiftLeft, InputAction::Sprint);
        bindings.bind(KeyCode::ShiftRight, InputAction::Sprint);
        bindings.bind(KeyCode::KeyC, InputAction::Crouch);
        bindings.bind(KeyCode::KeyG, InputAction::Grapple);

        bindings.bind_mouse(0, InputAction::Grapple);
        bindings.bind_mouse(1, InputAction::Swing);

        bindings
    }
}

impl InputBindings {
    /// Create new input bindings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a key to an action
    pub fn bind(&mut self, key: KeyCode, action: InputAction) {
        self.insert(InputBinding::Key(key), action);
    }

    /// Bind a mouse button to an action
    pub fn bind_mouse(&mut self, button: u32, action: InputAction) {
        self.insert(InputBinding::Mouse(button), action);
    }

    fn insert(&mut self, binding: InputBinding, action: InputAction) {
        if let Some(previous) = self.bindings.insert(binding, action) {
            if let Some(bindings) = self.reverse.get_mut(&previous) {
                bindings.retain(|b| *b != binding);
            }
        }
        self.reverse.entry(action).or_default().push(binding);
    }

    /// Get the action for a binding, if any
    pub fn get_action(&self, binding: &InputBinding) -> Option<InputAction> {
        self.bindings.get(binding).copied()
    }

    /// Get the action for a key, if any
    pub fn get_key_action(&self, key: KeyCode) -> Option<InputAction> {
        self.get_action(&InputBinding::Key(key))
    }

    /// All bindings for an action
    pub fn bindings_for(&self, action: InputAction) -> &[InputBinding] {
        self.reverse.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Input handler that processes raw events and updates state
#[derive(Debug)]
pub struct InputHandler {
    /// Current input state
    pub state: InputState,
    /// Input bindings
    pub bindings: InputBindings,
    /// Mouse sensitivity multiplier
    pub mouse_sensitivity: f32,
    /// Invert Y axis
    pub invert_y: bool,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    /// Create a new input handler with default bindings
    pub fn new() -> Self {
        Self {
            state: InputState::new(),
            bindings: InputBindings::default(),
            mouse_sensitivity: 1.0,
            invert_y: false,
        }
    }

    /// Handle a keyboard event
    pub fn handle_keyboard(&mut self, physical_key: PhysicalKey, element_state: ElementState) {
        if let PhysicalKey::Code(key_code) = physical_key {
            if let Some(action) = self.bindings.get_key_action(key_code) {
                self.apply(action, element_state);
            }
        }
    }

    /// Handle a mouse button event
    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let button_id = match button {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
            MouseButton::Middle => 2,
            MouseButton::Back => 3,
            MouseButton::Forward => 4,
            MouseButton::Other(id) => id as u32,
        };

        if let Some(action) = self.bindings.get_action(&InputBinding::Mouse(button_id)) {
            self.apply(action, state);
        }
    }

    fn apply(&mut self, action: InputAction, element_state: ElementState) {
        match element_state {
            ElementState::Pressed => {
                if !self.state.held.contains(&action) {
                    self.state.just_pressed.insert(action);
                }
                self.state.held.insert(action);
            }
            ElementState::Released => {
                if self.state.held.remove(&action) {
                    self.state.just_released.insert(action);
                }
            }
        }
    }

    /// Handle mouse movement
    pub fn handle_mouse_motion(&mut self, delta: (f64, f64)) {
        if self.state.cursor_captured {
            let y_mult = if self.invert_y { -1.0 } else { 1.0 };
            self.state.mouse_delta += Vec2::new(
                delta.0 as f32 * self.mouse_sensitivity,
                delta.1 as f32 * self.mouse_sensitivity * y_mult,
            );
        }
    }

    /// Snapshot the state for one simulation tick
    pub fn movement_input(&self) -> MovementInput {
        MovementInput::from_state(&self.state)
    }

    /// Clear frame-specific input data
    pub fn end_frame(&mut self) {
        self.state.clear_frame();
    }

    /// Set cursor capture state
    pub fn set_cursor_captured(&mut self, captured: bool) {
        self.state.cursor_captured = captured;
    }
}

/// What the movement controllers read each tick.
///
/// Directional input is presence only: holding two opposite directions
/// cancels out, and there is no analogue magnitude.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Run modifier held
    pub run: bool,
    /// Jump pressed this tick
    pub jump_pressed: bool,
    /// Jump held (reels the cable in while swinging)
    pub pull_held: bool,
    pub crouch_pressed: bool,
    pub crouch_released: bool,
    pub grapple_pressed: bool,
    pub swing_pressed: bool,
    pub swing_released: bool,
}

impl MovementInput {
    /// Fold an input state into per-tick movement input
    pub fn from_state(state: &InputState) -> Self {
        Self {
            forward: state.is_held(InputAction::MoveForward),
            backward: state.is_held(InputAction::MoveBackward),
            left: state.is_held(InputAction::MoveLeft),
            right: state.is_held(InputAction::MoveRight),
            run: state.is_held(InputAction::Sprint),
            jump_pressed: state.is_just_pressed(InputAction::Jump),
            pull_held: state.is_held(InputAction::Jump),
            crouch_pressed: state.is_just_pressed(InputAction::Crouch),
            crouch_released: state.is_just_released(InputAction::Crouch),
            grapple_pressed: state.is_just_pressed(InputAction::Grapple),
            swing_pressed: state.is_just_pressed(InputAction::Swing),
            swing_released: state.is_just_released(InputAction::Swing),
        }
    }

    /// Directional axes: x is right minus left, y is forward minus back
    pub fn axis(&self) -> Vec2 {
        let x = f32::from(u8::from(self.right)) - f32::from(u8::from(self.left));
        let y = f32::from(u8::from(self.forward)) - f32::from(u8::from(self.backward));
        Vec2::new(x, y)
    }

    /// Running needs the modifier and forward input together
    pub fn wants_to_run(&self) -> bool {
        self.run && self.forward
    }

    /// Unit move direction on the ground plane relative to `look`
    pub fn wish_direction(&self, look: &LookAngles) -> Vec3 {
        let axis = self.axis();
        (look.right() * axis.x + look.forward() * axis.y).normalize_or_zero()
    }
}
