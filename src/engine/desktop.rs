//! Desktop (KVM) engine adapter

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use super::{DesktopBinding, DesktopEngine, EngineProvider, EngineSink, RenderSurface, TransportFactory};
use crate::config::TransportConfig;
use crate::error::EngineResult;
use crate::input::InputEvent;
use crate::session::{Encoding, Generation};

/// Wraps one desktop engine instance for the lifetime of one session
pub struct DesktopAdapter {
    engine: Box<dyn DesktopEngine>,
    surface: Option<Arc<dyn RenderSurface>>,
    encoding: Encoding,
    generation: Generation,
}

impl DesktopAdapter {
    /// Creates the engine and binds it to the surface and callback sink
    pub fn new(
        provider: &dyn EngineProvider,
        config: &TransportConfig,
        encoding: Encoding,
        surface: Option<Arc<dyn RenderSurface>>,
        sink: EngineSink,
    ) -> Self {
        let generation = sink.generation();
        let engine = provider.desktop(DesktopBinding {
            config: config.clone(),
            encoding,
            surface: surface.clone(),
            sink,
        });

        Self {
            engine,
            surface,
            encoding,
            generation,
        }
    }

    /// Generation the adapter was created under
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Changes the encoding of a not-yet-started engine
    pub fn set_encoding(&mut self, encoding: Encoding) {
        if self.encoding != encoding {
            debug!(generation = %self.generation, %encoding, "Desktop encoding updated");
            self.encoding = encoding;
            self.engine.set_encoding(encoding);
        }
    }

    pub(super) fn start(&mut self, transport: Arc<dyn TransportFactory>) -> EngineResult<()> {
        self.engine.start(transport)
    }

    pub(super) fn stop(&mut self) {
        self.engine.stop();
    }

    pub(super) fn process_data(&mut self, data: Bytes) {
        self.engine.process_data(data);
    }

    /// Writes encoded output to the transport
    pub fn send(&mut self, data: Bytes) -> EngineResult<()> {
        self.engine.send(data)
    }

    /// Forwards a captured input event
    pub fn send_input(&mut self, input: InputEvent) -> EngineResult<()> {
        self.engine.send_input(input)
    }

    pub(super) fn release(self) {
        if let Some(surface) = &self.surface {
            surface.reset();
        }
    }
}
