//! Variant dispatch over the two engine adapters

use std::sync::Arc;

use bytes::Bytes;

use super::{DesktopAdapter, EngineProvider, EngineSink, MediaAdapter, MediaSources, RenderSurface, TransportFactory};
use crate::config::{RedirectionMode, TransportConfig};
use crate::error::EngineResult;
use crate::session::{Encoding, Generation};

/// Host-provided resources bound into every new adapter
#[derive(Clone, Default)]
pub struct EngineBindings {
    /// Render surface for desktop sessions
    pub surface: Option<Arc<dyn RenderSurface>>,
    /// Images for media sessions
    pub media: MediaSources,
}

/// The single live engine adapter of a session, selected by mode
pub enum EngineAdapter {
    /// Keyboard, video and mouse
    Desktop(DesktopAdapter),
    /// Virtual removable media
    Media(MediaAdapter),
}

impl EngineAdapter {
    /// Creates the adapter variant matching the config's mode
    pub fn instantiate(
        provider: &dyn EngineProvider,
        config: &TransportConfig,
        bindings: &EngineBindings,
        encoding: Encoding,
        sink: EngineSink,
    ) -> Self {
        match config.mode() {
            RedirectionMode::Desktop => EngineAdapter::Desktop(DesktopAdapter::new(
                provider,
                config,
                encoding,
                bindings.surface.clone(),
                sink,
            )),
            RedirectionMode::Media => EngineAdapter::Media(MediaAdapter::new(
                provider,
                config,
                bindings.media.clone(),
                sink,
            )),
        }
    }

    /// Mode of the wrapped engine
    pub fn mode(&self) -> RedirectionMode {
        match self {
            EngineAdapter::Desktop(_) => RedirectionMode::Desktop,
            EngineAdapter::Media(_) => RedirectionMode::Media,
        }
    }

    /// Generation the adapter was created under
    pub fn generation(&self) -> Generation {
        match self {
            EngineAdapter::Desktop(adapter) => adapter.generation(),
            EngineAdapter::Media(adapter) => adapter.generation(),
        }
    }

    /// Opens the transport
    pub fn start(&mut self, transport: Arc<dyn TransportFactory>) -> EngineResult<()> {
        match self {
            EngineAdapter::Desktop(adapter) => adapter.start(transport),
            EngineAdapter::Media(adapter) => adapter.start(transport),
        }
    }

    /// Closes the transport
    pub fn stop(&mut self) {
        match self {
            EngineAdapter::Desktop(adapter) => adapter.stop(),
            EngineAdapter::Media(adapter) => adapter.stop(),
        }
    }

    /// Feeds inbound data to the engine's decoder
    pub fn process_data(&mut self, data: Bytes) {
        match self {
            EngineAdapter::Desktop(adapter) => adapter.process_data(data),
            EngineAdapter::Media(adapter) => adapter.process_data(data),
        }
    }

    /// Desktop capabilities, if this is a desktop adapter
    pub fn as_desktop_mut(&mut self) -> Option<&mut DesktopAdapter> {
        match self {
            EngineAdapter::Desktop(adapter) => Some(adapter),
            EngineAdapter::Media(_) => None,
        }
    }

    /// Releases host resources bound to the adapter and drops it
    pub fn release(self) {
        match self {
            EngineAdapter::Desktop(adapter) => adapter.release(),
            EngineAdapter::Media(_) => {}
        }
    }
}
