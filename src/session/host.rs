//! Host-facing interface of a session controller
//!
//! The embedding console talks to a running controller through a
//! [`SessionHandle`] and listens for [`HostNotification`]s on the receiver
//! returned by [`SessionBuilder::build`](crate::session::SessionBuilder::build).

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::{SessionError, SessionResult};
use crate::input::{KeyEvent, PointerEvent};
use crate::session::controller::{ControllerSnapshot, SessionController};
use crate::session::stats::StatisticsSnapshot;

/// Capacity of the host command channel
pub const COMMAND_BUFFER: usize = 64;

/// Requests from the host to the controller
#[derive(Debug)]
pub enum HostCommand {
    /// Connection trigger: true connects, false stops
    Connection(bool),
    /// Encoding trigger carrying a catalog id
    Encoding(u8),
    /// Pointer event from the render surface
    Pointer(PointerEvent),
    /// Keyboard event
    Key(KeyEvent),
    /// Diagnostic snapshot request
    Inspect(oneshot::Sender<ControllerSnapshot>),
    /// Stops the session and ends the controller task
    Shutdown,
}

/// Outputs from the controller to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostNotification {
    /// Engine-defined transport status, forwarded unchanged
    StatusChanged(u8),
    /// Updated media counters
    StatisticsUpdated(StatisticsSnapshot),
}

/// Cloneable handle to a running controller
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<HostCommand>,
}

impl SessionHandle {
    /// Spawns `controller` on the current runtime
    pub fn spawn(controller: SessionController) -> (Self, JoinHandle<()>) {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let task = tokio::spawn(controller.run(rx));
        (Self { commands }, task)
    }

    async fn send(&self, command: HostCommand) -> SessionResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::ControllerClosed)
    }

    /// Raises the connection trigger
    pub async fn connection_trigger(&self, connect: bool) -> SessionResult<()> {
        self.send(HostCommand::Connection(connect)).await
    }

    /// Raises the encoding trigger
    pub async fn encoding_trigger(&self, id: u8) -> SessionResult<()> {
        self.send(HostCommand::Encoding(id)).await
    }

    /// Forwards a pointer event
    pub async fn pointer(&self, event: PointerEvent) -> SessionResult<()> {
        self.send(HostCommand::Pointer(event)).await
    }

    /// Forwards a keyboard event
    pub async fn key(&self, event: KeyEvent) -> SessionResult<()> {
        self.send(HostCommand::Key(event)).await
    }

    /// Asks the controller for a diagnostic snapshot
    pub async fn snapshot(&self) -> SessionResult<ControllerSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(HostCommand::Inspect(tx)).await?;
        rx.await.map_err(|_| SessionError::ControllerClosed)
    }

    /// Stops the session and ends the controller task
    pub async fn shutdown(&self) {
        if self.send(HostCommand::Shutdown).await.is_err() {
            warn!("Shutdown requested but the controller already exited");
        }
    }

    /// Returns true once the controller task has exited
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}
