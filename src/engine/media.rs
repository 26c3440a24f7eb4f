//! Virtual media (IDE redirection) engine adapter

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;

use super::{EngineProvider, EngineSink, MediaBinding, MediaEngine, TransportFactory};
use crate::config::{MediaConfig, TransportConfig};
use crate::error::EngineResult;
use crate::session::Generation;

/// Images exposed to the managed device, at most one of each kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaSources {
    /// Optical disc image
    pub optical: Option<PathBuf>,
    /// Floppy disk image
    pub floppy: Option<PathBuf>,
}

impl MediaSources {
    /// Takes the image paths from the application config
    pub fn from_config(config: &MediaConfig) -> Self {
        Self {
            optical: config.optical_image.clone(),
            floppy: config.floppy_image.clone(),
        }
    }

    /// Returns true if no image is attached
    pub fn is_empty(&self) -> bool {
        self.optical.is_none() && self.floppy.is_none()
    }
}

/// Wraps one media engine instance for the lifetime of one session
pub struct MediaAdapter {
    engine: Box<dyn MediaEngine>,
    generation: Generation,
}

impl MediaAdapter {
    /// Creates the engine and binds it to the images and callback sink
    pub fn new(
        provider: &dyn EngineProvider,
        config: &TransportConfig,
        sources: MediaSources,
        sink: EngineSink,
    ) -> Self {
        let generation = sink.generation();
        let engine = provider.media(MediaBinding {
            config: config.clone(),
            sources,
            sink,
        });

        Self { engine, generation }
    }

    /// Generation the adapter was created under
    pub fn generation(&self) -> Generation {
        self.generation
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
}
