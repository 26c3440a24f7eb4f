//! Session state machine for the redirection lifecycle
//!
//! Provides a state machine that tracks session states and validates transitions.
//!
//! ```text
//! Idle -> Instantiated -> AwaitingStart -> Active -> Resetting -> Idle
//!               ^                            |
//!               +------- encoding change ----+
//! ```

use std::collections::VecDeque;
use std::fmt;

use tokio::time::Instant;

use crate::error::SessionError;

/// Lifecycle states of a redirection session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No engine adapter exists
    Idle,
    /// Adapter created and wired; waiting for the start timer
    Instantiated,
    /// Start timer fired; transport open in progress
    AwaitingStart,
    /// Transport open, data flowing
    Active,
    /// Tearing down the adapter
    Resetting,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Instantiated => write!(f, "Instantiated"),
            SessionState::AwaitingStart => write!(f, "AwaitingStart"),
            SessionState::Active => write!(f, "Active"),
            SessionState::Resetting => write!(f, "Resetting"),
        }
    }
}

impl SessionState {
    /// Returns true if this state allows data transmission
    pub fn is_data_ready(&self) -> bool {
        matches!(self, SessionState::Active)
    }

    /// Returns valid transitions from this state
    pub fn valid_transitions(&self) -> &'static [SessionState] {
        match self {
            SessionState::Idle => &[SessionState::Instantiated],
            SessionState::Instantiated => &[SessionState::AwaitingStart, SessionState::Resetting],
            SessionState::AwaitingStart => &[SessionState::Active, SessionState::Resetting],
            SessionState::Active => &[SessionState::Resetting, SessionState::Instantiated],
            SessionState::Resetting => &[SessionState::Idle],
        }
    }
}

/// Record of a state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    /// Previous state
    pub from: SessionState,
    /// New state
    pub to: SessionState,
    /// When the transition occurred
    pub timestamp: Instant,
}

/// State machine for managing session lifecycle
#[derive(Debug)]
pub struct SessionStateMachine {
    current: SessionState,
    state_entered_at: Instant,
    history: VecDeque<StateTransition>,
    max_history: usize,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    /// Default maximum history entries
    const DEFAULT_MAX_HISTORY: usize = 100;

    /// Creates a new state machine in Idle state
    pub fn new() -> Self {
        Self {
            current: SessionState::Idle,
            state_entered_at: Instant::now(),
            history: VecDeque::new(),
            max_history: Self::DEFAULT_MAX_HISTORY,
        }
    }

    /// Returns the current state
    pub fn current(&self) -> SessionState {
        self.current
    }

    /// Returns true if the transition is valid
    pub fn can_transition(&self, to: SessionState) -> bool {
        self.current.valid_transitions().contains(&to)
    }

    /// Attempts to transition to a new state
    pub fn transition(&mut self, to: SessionState) -> Result<(), SessionError> {
        if !self.can_transition(to) {
            return Err(SessionError::InvalidStateTransition {
                from: self.current.to_string(),
                to: to.to_string(),
            });
        }

        let transition = StateTransition {
            from: self.current,
            to,
            timestamp: Instant::now(),
        };

        self.current = to;
        self.state_entered_at = transition.timestamp;

        self.history.push_back(transition);
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }

        Ok(())
    }

    /// Returns how long we've been in the current state
    pub fn time_in_state(&self) -> std::time::Duration {
        self.state_entered_at.elapsed()
    }

    /// Returns the last transition, if any
    pub fn last_transition(&self) -> Option<&StateTransition> {
        self.history.back()
    }

    /// Returns true if the session is in an active data-transmitting state
    pub fn is_active(&self) -> bool {
        self.current.is_data_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let sm = SessionStateMachine::new();
        assert_eq!(sm.current(), SessionState::Idle);
        assert!(!sm.is_active());
        assert!(sm.last_transition().is_none());
    }

    #[test]
    fn test_connect_path() {
        let mut sm = SessionStateMachine::new();

        assert!(sm.transition(SessionState::Instantiated).is_ok());
        assert!(sm.transition(SessionState::AwaitingStart).is_ok());
        assert!(sm.transition(SessionState::Active).is_ok());
        assert!(sm.is_active());
    }

    #[test]
    fn test_invalid_transition() {
        let mut sm = SessionStateMachine::new();

        let result = sm.transition(SessionState::Active);
        assert_eq!(
            result,
            Err(SessionError::InvalidStateTransition {
                from: "Idle".to_string(),
                to: "Active".to_string(),
            })
        );
        assert_eq!(sm.current(), SessionState::Idle);
    }

    #[test]
    fn test_encoding_reentry() {
        let mut sm = SessionStateMachine::new();
        sm.transition(SessionState::Instantiated).unwrap();
        sm.transition(SessionState::AwaitingStart).unwrap();
        sm.transition(SessionState::Active).unwrap();

        assert!(sm.transition(SessionState::Instantiated).is_ok());
        assert!(!sm.is_active());
    }

    #[test]
    fn test_teardown_from_each_live_state() {
        for path in [
            &[SessionState::Instantiated][..],
            &[SessionState::Instantiated, SessionState::AwaitingStart][..],
            &[
                SessionState::Instantiated,
                SessionState::AwaitingStart,
                SessionState::Active,
            ][..],
        ] {
            let mut sm = SessionStateMachine::new();
            for state in path {
                sm.transition(*state).unwrap();
            }
            assert!(sm.transition(SessionState::Resetting).is_ok());
            assert!(sm.transition(SessionState::Idle).is_ok());
        }
    }

    #[test]
    fn test_resetting_only_returns_to_idle() {
        let mut sm = SessionStateMachine::new();
        sm.transition(SessionState::Instantiated).unwrap();
        sm.transition(SessionState::Resetting).unwrap();
        assert!(!sm.can_transition(SessionState::Instantiated));
        assert!(sm.can_transition(SessionState::Idle));
    }

    #[test]
    fn test_history_tracking() {
        let mut sm = SessionStateMachine::new();

        sm.transition(SessionState::Instantiated).unwrap();
        sm.transition(SessionState::AwaitingStart).unwrap();
        sm.transition(SessionState::Active).unwrap();

        assert_eq!(sm.history.len(), 3);

        let last = sm.last_transition().unwrap();
        assert_eq!(last.from, SessionState::AwaitingStart);
        assert_eq!(last.to, SessionState::Active);
    }

    #[test]
    fn test_history_trimming() {
        let mut sm = SessionStateMachine::new();

        for _ in 0..40 {
            sm.transition(SessionState::Instantiated).unwrap();
            sm.transition(SessionState::Resetting).unwrap();
            sm.transition(SessionState::Idle).unwrap();
        }

        assert_eq!(sm.history.len(), SessionStateMachine::DEFAULT_MAX_HISTORY);
        assert_eq!(sm.history.front().map(|t| t.from), Some(SessionState::Resetting));
        assert_eq!(sm.last_transition().map(|t| t.to), Some(SessionState::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_in_state_resets_on_transition() {
        let mut sm = SessionStateMachine::new();
        tokio::time::advance(std::time::Duration::from_millis(300)).await;
        assert!(sm.time_in_state() >= std::time::Duration::from_millis(300));

        sm.transition(SessionState::Instantiated).unwrap();
        assert!(sm.time_in_state() < std::time::Duration::from_millis(300));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Active.to_string(), "Active");
        assert_eq!(SessionState::AwaitingStart.to_string(), "AwaitingStart");
    }
}
