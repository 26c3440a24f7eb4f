//! Input capture glue for desktop sessions
//!
//! Binds render-surface pointer events and keyboard events to the desktop
//! engine. Pointer moves pass through a [`MoveThrottle`]; button presses
//! and releases are never throttled. Keyboard events are forwarded only
//! while the keyboard grab is held.

use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::input::types::{InputEvent, KeyEvent, PointerEvent};

/// Outcome of offering a pointer move to the throttle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Forward the move now
    Forward,
    /// Held back; a flush is due at the given instant
    Deferred {
        /// When the held move may be forwarded
        flush_at: Instant,
    },
    /// Replaced a move that was already held back
    Coalesced,
}

/// Timer-gated pointer-move filter
///
/// At most one move is forwarded per interval. The first move after a quiet
/// period goes out immediately; moves inside the window replace each other
/// and the last one is released when the window closes.
#[derive(Debug, Clone)]
pub struct MoveThrottle {
    interval: Duration,
    last_forwarded: Option<Instant>,
    pending: Option<PointerEvent>,
}

impl MoveThrottle {
    /// Creates a throttle with the given window
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_forwarded: None,
            pending: None,
        }
    }

    /// Offers a move event observed at `now`
    pub fn offer(&mut self, event: PointerEvent, now: Instant) -> ThrottleDecision {
        let window_open = match self.last_forwarded {
            None => true,
            Some(last) => now.duration_since(last) >= self.interval,
        };

        if window_open && self.pending.is_none() {
            self.last_forwarded = Some(now);
            return ThrottleDecision::Forward;
        }

        if self.pending.replace(event).is_some() {
            return ThrottleDecision::Coalesced;
        }

        let flush_at = self
            .last_forwarded
            .map(|last| last + self.interval)
            .unwrap_or(now);
        ThrottleDecision::Deferred { flush_at }
    }

    /// Releases the held move, if any, and restarts the window at `now`
    pub fn flush(&mut self, now: Instant) -> Option<PointerEvent> {
        let event = self.pending.take()?;
        self.last_forwarded = Some(now);
        Some(event)
    }

    /// Returns true if a move is held back
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops any held move and forgets the window
    pub fn reset(&mut self) {
        self.last_forwarded = None;
        self.pending = None;
    }
}

/// What the controller should do with a captured pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureAction {
    /// Send the event to the engine now
    Send(InputEvent),
    /// Schedule a throttle flush at the given instant
    ScheduleFlush(Instant),
    /// Nothing to do
    Nothing,
}

/// Pointer and keyboard capture bound to one desktop session
#[derive(Debug)]
pub struct InputCapture {
    throttle: MoveThrottle,
    keyboard_grabbed: bool,
}

impl InputCapture {
    /// Creates a capture adapter with the given pointer throttle window
    pub fn new(pointer_throttle: Duration) -> Self {
        Self {
            throttle: MoveThrottle::new(pointer_throttle),
            keyboard_grabbed: false,
        }
    }

    /// Grabs keyboard input for the session
    pub fn grab_keyboard(&mut self) {
        self.keyboard_grabbed = true;
    }

    /// Returns true while keyboard input is grabbed
    pub fn is_keyboard_grabbed(&self) -> bool {
        self.keyboard_grabbed
    }

    /// Releases the keyboard grab and drops any held pointer move
    pub fn release(&mut self) {
        self.keyboard_grabbed = false;
        self.throttle.reset();
    }

    /// Routes a pointer event through the throttle
    pub fn pointer(&mut self, event: PointerEvent, now: Instant) -> CaptureAction {
        if !event.is_move() {
            return CaptureAction::Send(event.into());
        }

        match self.throttle.offer(event, now) {
            ThrottleDecision::Forward => CaptureAction::Send(event.into()),
            ThrottleDecision::Deferred { flush_at } => CaptureAction::ScheduleFlush(flush_at),
            ThrottleDecision::Coalesced => {
                trace!("Coalesced pointer move");
                CaptureAction::Nothing
            }
        }
    }

    /// Releases the held pointer move when its window closes
    pub fn flush_pointer(&mut self, now: Instant) -> Option<InputEvent> {
        self.throttle.flush(now).map(InputEvent::from)
    }

    /// Passes a key event through while the keyboard is grabbed
    pub fn key(&self, event: KeyEvent) -> Option<InputEvent> {
        self.keyboard_grabbed.then_some(InputEvent::Key(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::types::MouseButton;

    const WINDOW: Duration = Duration::from_millis(200);

    fn mv(x: i32, y: i32) -> PointerEvent {
        PointerEvent::Move { x, y }
    }

    #[test]
    fn test_first_move_forwarded() {
        let mut throttle = MoveThrottle::new(WINDOW);
        assert_eq!(throttle.offer(mv(1, 1), Instant::now()), ThrottleDecision::Forward);
    }

    #[test]
    fn test_moves_inside_window_last_value_wins() {
        let mut throttle = MoveThrottle::new(WINDOW);
        let t0 = Instant::now();

        assert_eq!(throttle.offer(mv(1, 1), t0), ThrottleDecision::Forward);
        assert_eq!(
            throttle.offer(mv(2, 2), t0 + Duration::from_millis(50)),
            ThrottleDecision::Deferred {
                flush_at: t0 + WINDOW
            }
        );
        assert_eq!(
            throttle.offer(mv(3, 3), t0 + Duration::from_millis(120)),
            ThrottleDecision::Coalesced
        );

        assert_eq!(throttle.flush(t0 + WINDOW), Some(mv(3, 3)));
        assert!(!throttle.has_pending());
        assert_eq!(throttle.flush(t0 + WINDOW), None);
    }

    #[test]
    fn test_flush_restarts_window() {
        let mut throttle = MoveThrottle::new(WINDOW);
        let t0 = Instant::now();

        throttle.offer(mv(1, 1), t0);
        throttle.offer(mv(2, 2), t0 + Duration::from_millis(10));
        throttle.flush(t0 + WINDOW);

        // Still inside the window opened by the flush
        assert!(matches!(
            throttle.offer(mv(4, 4), t0 + Duration::from_millis(300)),
            ThrottleDecision::Deferred { flush_at } if flush_at == t0 + WINDOW * 2
        ));
    }

    #[test]
    fn test_move_after_window_forwarded() {
        let mut throttle = MoveThrottle::new(WINDOW);
        let t0 = Instant::now();

        throttle.offer(mv(1, 1), t0);
        assert_eq!(
            throttle.offer(mv(2, 2), t0 + WINDOW),
            ThrottleDecision::Forward
        );
    }

    #[test]
    fn test_buttons_bypass_throttle() {
        let mut capture = InputCapture::new(WINDOW);
        let t0 = Instant::now();

        capture.pointer(mv(1, 1), t0);
        let down = PointerEvent::ButtonDown {
            button: MouseButton::Left,
            x: 1,
            y: 1,
        };
        assert_eq!(
            capture.pointer(down, t0 + Duration::from_millis(1)),
            CaptureAction::Send(InputEvent::Pointer(down))
        );
    }

    #[test]
    fn test_keyboard_requires_grab() {
        let mut capture = InputCapture::new(WINDOW);
        assert_eq!(capture.key(KeyEvent::press(0x61)), None);

        capture.grab_keyboard();
        assert!(capture.key(KeyEvent::press(0x61)).is_some());

        capture.release();
        assert!(!capture.is_keyboard_grabbed());
        assert_eq!(capture.key(KeyEvent::press(0x61)), None);
    }

    #[test]
    fn test_release_drops_pending_move() {
        let mut capture = InputCapture::new(WINDOW);
        let t0 = Instant::now();

        capture.pointer(mv(1, 1), t0);
        assert!(matches!(
            capture.pointer(mv(2, 2), t0 + Duration::from_millis(5)),
            CaptureAction::ScheduleFlush(_)
        ));
        capture.release();
        assert_eq!(capture.flush_pointer(t0 + WINDOW), None);
    }
}
