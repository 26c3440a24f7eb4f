//! Internal events delivered to the session controller

use bytes::Bytes;

use crate::error::EngineError;
use crate::session::stats::SectorOperation;
use crate::session::timer::Generation;

/// Callback raised by an engine adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Transport state changed; the code is engine-defined and forwarded as-is
    StateChanged(u8),
    /// Fatal engine or transport error
    Error(EngineError),
    /// Inbound transport data for the engine's decoder
    ProcessData(Bytes),
    /// Encoded output the desktop engine wants written to the transport
    Send(Bytes),
    /// Block operation completed by the media engine
    SectorOperation(SectorOperation),
}

/// Timer purposes owned by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Handshake grace period or encoding cool-down elapsed
    ///
    /// `seq` identifies the schedule within one generation; a rescheduled
    /// start supersedes every earlier one.
    Start {
        /// Schedule number, starting at 0 for each generation
        seq: u32,
    },
    /// Pointer throttle window closed
    PointerFlush,
}

/// Anything the controller reacts to besides host commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Engine callback
    Engine {
        /// Generation of the adapter that raised it
        generation: Generation,
        /// The callback
        event: EngineEvent,
    },
    /// Timer firing
    Timer {
        /// Generation of the session that scheduled it
        generation: Generation,
        /// What the timer was for
        kind: TimerKind,
    },
}

impl SessionEvent {
    /// Generation the event is tagged with
    pub fn generation(&self) -> Generation {
        match self {
            SessionEvent::Engine { generation, .. } | SessionEvent::Timer { generation, .. } => {
                *generation
            }
        }
    }
}
