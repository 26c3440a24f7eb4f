//! Generation tokens and session-owned timers
//!
//! Every engine callback handle and every timer carries the generation that
//! was current when it was created. The controller drops anything whose
//! generation is no longer current.

use std::fmt;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

/// Monotonic tag distinguishing successive sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// The generation that follows this one
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }

    /// Raw counter value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// A message posted to a channel at a fixed deadline unless cancelled first
///
/// Dropping the task cancels it.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
    deadline: Instant,
}

impl ScheduledTask {
    /// Schedules `message` to be sent on `tx` at `deadline`
    pub fn at<T>(deadline: Instant, tx: UnboundedSender<T>, message: T) -> Self
    where
        T: Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if tx.send(message).is_err() {
                trace!("Timer fired after its receiver closed");
            }
        });

        Self { handle, deadline }
    }

    /// When the message is due
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
