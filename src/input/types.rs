//! Input types and event structures
//!
//! Events captured on the console's render surface, before they are
//! handed to the desktop engine for encoding onto the wire.

use serde::{Deserialize, Serialize};

/// Mouse button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MouseButton {
    /// Left mouse button
    Left = 1,
    /// Right mouse button
    Right = 2,
    /// Middle mouse button (wheel click)
    Middle = 3,
}

impl MouseButton {
    /// Maps a host button index (0 = primary) to a button
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(MouseButton::Left),
            1 => Some(MouseButton::Middle),
            2 => Some(MouseButton::Right),
            _ => None,
        }
    }
}

/// Pointer event on the render surface, in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerEvent {
    /// Pointer moved
    Move {
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
    },
    /// Button pressed
    ButtonDown {
        /// Button that was pressed
        button: MouseButton,
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
    },
    /// Button released
    ButtonUp {
        /// Button that was released
        button: MouseButton,
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
    },
}

impl PointerEvent {
    /// Returns true for pointer-move events
    pub fn is_move(&self) -> bool {
        matches!(self, PointerEvent::Move { .. })
    }
}

/// Keyboard event, keyed by X11 keysym as the redirection protocol expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Keysym
    pub keysym: u32,
    /// True on press, false on release
    pub pressed: bool,
}

impl KeyEvent {
    /// Creates a key press event
    pub fn press(keysym: u32) -> Self {
        Self {
            keysym,
            pressed: true,
        }
    }

    /// Creates a key release event
    pub fn release(keysym: u32) -> Self {
        Self {
            keysym,
            pressed: false,
        }
    }
}

/// Input event forwarded to the desktop engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Pointer event
    Pointer(PointerEvent),
    /// Keyboard event
    Key(KeyEvent),
}

impl From<PointerEvent> for InputEvent {
    fn from(event: PointerEvent) -> Self {
        InputEvent::Pointer(event)
    }
}

impl From<KeyEvent> for InputEvent {
    fn from(event: KeyEvent) -> Self {
        InputEvent::Key(event)
    }
}
