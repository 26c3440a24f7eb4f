//! Boundary to the external redirection engine
//!
//! The wire codec, frame decoding and block transfer live in an external
//! engine. This module defines the narrow capability set the session
//! controller needs from it, and the adapters that wrap one engine instance
//! per session:
//! - [`DesktopAdapter`] for keyboard/video/mouse sessions
//! - [`MediaAdapter`] for virtual removable-media sessions
//!
//! Engines report back through an [`EngineSink`] that tags every callback
//! with the generation of the session that created it.

mod adapter;
mod desktop;
mod media;

pub use adapter::{EngineAdapter, EngineBindings};
pub use desktop::DesktopAdapter;
pub use media::{MediaAdapter, MediaSources};

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

use crate::config::{RelayEndpoint, TransportConfig};
use crate::error::{EngineError, EngineResult};
use crate::input::InputEvent;
use crate::session::event::{EngineEvent, SessionEvent};
use crate::session::stats::SectorOperation;
use crate::session::{Encoding, Generation};

/// An open connection to the relay
pub trait RelayTransport: Send {
    /// Writes one buffer to the relay
    fn send(&mut self, data: &[u8]) -> EngineResult<()>;

    /// Closes the connection
    fn close(&mut self);
}

/// Opens relay connections on the engine's behalf
pub trait TransportFactory: Send + Sync {
    /// Opens a connection to `endpoint`
    fn open(&self, endpoint: &RelayEndpoint) -> EngineResult<Box<dyn RelayTransport>>;
}

/// Console-side drawing target for a desktop session
///
/// The desktop engine draws decoded frames onto the surface it is bound to.
/// The controller only resets it when a session is torn down.
pub trait RenderSurface: Send + Sync {
    /// Restores the surface to its initial size and clears it
    fn reset(&self);
}

/// Operations common to both engine variants
pub trait RedirectionEngine: Send {
    /// Opens the transport and begins exchanging frames
    fn start(&mut self, transport: Arc<dyn TransportFactory>) -> EngineResult<()>;

    /// Closes the transport
    fn stop(&mut self);

    /// Feeds inbound transport data to the engine's decoder
    fn process_data(&mut self, data: Bytes);
}

/// Keyboard, video and mouse engine
pub trait DesktopEngine: RedirectionEngine {
    /// Selects the frame encoding requested from the device
    fn set_encoding(&mut self, encoding: Encoding);

    /// Writes encoded output to the transport
    fn send(&mut self, data: Bytes) -> EngineResult<()>;

    /// Encodes and sends a captured input event
    fn send_input(&mut self, input: InputEvent) -> EngineResult<()>;
}

/// Virtual removable-media engine
pub trait MediaEngine: RedirectionEngine {}

/// Everything a desktop engine is bound to at construction
pub struct DesktopBinding {
    /// Target device
    pub config: TransportConfig,
    /// Initial encoding
    pub encoding: Encoding,
    /// Surface to draw on, if the host has one
    pub surface: Option<Arc<dyn RenderSurface>>,
    /// Callback handle
    pub sink: EngineSink,
}

/// Everything a media engine is bound to at construction
pub struct MediaBinding {
    /// Target device
    pub config: TransportConfig,
    /// Images to expose to the device
    pub sources: MediaSources,
    /// Callback handle
    pub sink: EngineSink,
}

/// Creates engine instances; implemented by the external engine
pub trait EngineProvider: Send + Sync {
    /// Creates a desktop engine
    fn desktop(&self, binding: DesktopBinding) -> Box<dyn DesktopEngine>;

    /// Creates a media engine
    fn media(&self, binding: MediaBinding) -> Box<dyn MediaEngine>;
}

/// Callback handle given to one engine instance
///
/// Cloneable and cheap. Callbacks raised after the session that created the
/// sink has been reset are delivered but ignored by the controller.
#[derive(Debug, Clone)]
pub struct EngineSink {
    generation: Generation,
    tx: UnboundedSender<SessionEvent>,
}

impl EngineSink {
    pub(crate) fn new(generation: Generation, tx: UnboundedSender<SessionEvent>) -> Self {
        Self { generation, tx }
    }

    /// Generation this sink reports under
    pub fn generation(&self) -> Generation {
        self.generation
    }

    fn emit(&self, event: EngineEvent) {
        let event = SessionEvent::Engine {
            generation: self.generation,
            event,
        };
        if self.tx.send(event).is_err() {
            trace!(generation = %self.generation, "Engine callback after controller shut down");
        }
    }

    /// Reports a transport state change
    pub fn state_changed(&self, status: u8) {
        self.emit(EngineEvent::StateChanged(status));
    }

    /// Reports a fatal error
    pub fn error(&self, error: EngineError) {
        self.emit(EngineEvent::Error(error));
    }

    /// Hands inbound transport data to the decoder
    pub fn process_data(&self, data: impl Into<Bytes>) {
        self.emit(EngineEvent::ProcessData(data.into()));
    }

    /// Asks for encoded output to be written to the transport
    pub fn send(&self, data: impl Into<Bytes>) {
        self.emit(EngineEvent::Send(data.into()));
    }

    /// Reports a block operation using the engine's raw codes
    pub fn sector_operation(
        &self,
        mode: u8,
        device: u8,
        total_sectors: u64,
        start_sector: u64,
        length: u64,
    ) {
        self.emit(EngineEvent::SectorOperation(SectorOperation::from_raw(
            mode,
            device,
            total_sectors,
            start_sector,
            length,
        )));
    }
}
