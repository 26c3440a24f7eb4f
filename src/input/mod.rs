//! Input module for RedirectConsole
//!
//! This module handles console-side input for desktop sessions:
//! - Pointer and keyboard event types
//! - Pointer-move throttling
//! - Keyboard grab bound to the session lifecycle

pub mod capture;
pub mod types;

pub use capture::{CaptureAction, InputCapture, MoveThrottle, ThrottleDecision};
pub use types::{InputEvent, KeyEvent, MouseButton, PointerEvent};
