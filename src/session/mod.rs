//! Redirection session module
//!
//! This module owns the lifecycle of one redirection session: the state
//! machine, the generation-tagged timers and callbacks, the media transfer
//! counters, and the controller task that ties them to an engine adapter.

pub mod controller;
pub mod encoding;
pub mod event;
pub mod host;
pub mod state;
pub mod stats;
pub mod timer;

pub use controller::{ControllerSnapshot, SessionBuilder, SessionController, StartDelay};
pub use encoding::Encoding;
pub use event::{EngineEvent, SessionEvent, TimerKind};
pub use host::{HostCommand, HostNotification, SessionHandle};
pub use state::{SessionState, SessionStateMachine, StateTransition};
pub use stats::{
    DeviceClass, IoDirection, SectorOperation, StatisticsAggregator, StatisticsSnapshot,
};
pub use timer::{Generation, ScheduledTask};
