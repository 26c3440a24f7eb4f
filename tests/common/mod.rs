//! Recording fake engine shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

use redirect_console::config::{RedirectionMode, RelayEndpoint, SessionTiming, TransportConfig};
use redirect_console::engine::{
    DesktopBinding, DesktopEngine, EngineProvider, EngineSink, MediaBinding, MediaEngine,
    RedirectionEngine, RelayTransport, RenderSurface, TransportFactory,
};
use redirect_console::error::{EngineError, EngineResult};
use redirect_console::input::InputEvent;
use redirect_console::session::{Encoding, Generation};

pub const HANDSHAKE: Duration = Duration::from_millis(4000);
pub const COOLDOWN: Duration = Duration::from_millis(1000);
pub const THROTTLE: Duration = Duration::from_millis(200);

/// Something the fake engine was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Created {
        generation: Generation,
        mode: RedirectionMode,
        encoding: Option<Encoding>,
    },
    Start {
        generation: Generation,
        encoding: Option<Encoding>,
        at: Instant,
        url: String,
    },
    Stop {
        generation: Generation,
    },
    SetEncoding {
        generation: Generation,
        encoding: Encoding,
    },
    Input {
        generation: Generation,
        event: InputEvent,
    },
    Data {
        generation: Generation,
        bytes: Bytes,
    },
    Sent {
        generation: Generation,
        bytes: Bytes,
    },
}

#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
    sinks: Mutex<Vec<EngineSink>>,
    failing_starts: AtomicUsize,
}

impl Recorder {
    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Sink handed to the `n`th engine created
    pub fn sink(&self, n: usize) -> EngineSink {
        self.sinks.lock().unwrap()[n].clone()
    }

    pub fn created(&self) -> usize {
        self.sinks.lock().unwrap().len()
    }

    /// Makes the next `n` engine starts fail
    pub fn fail_next_starts(&self, n: usize) {
        self.failing_starts.store(n, Ordering::SeqCst);
    }

    pub fn starts(&self) -> Vec<(Generation, Option<Encoding>, Instant)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Start {
                    generation,
                    encoding,
                    at,
                    ..
                } => Some((generation, encoding, at)),
                _ => None,
            })
            .collect()
    }

    pub fn stops(&self) -> Vec<Generation> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Stop { generation } => Some(generation),
                _ => None,
            })
            .collect()
    }

    pub fn inputs(&self) -> Vec<InputEvent> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Input { event, .. } => Some(event),
                _ => None,
            })
            .collect()
    }

    fn take_start_failure(&self) -> bool {
        self.failing_starts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

struct FakeEngine {
    recorder: Arc<Recorder>,
    config: TransportConfig,
    generation: Generation,
    encoding: Option<Encoding>,
    transport: Option<Box<dyn RelayTransport>>,
}

impl RedirectionEngine for FakeEngine {
    fn start(&mut self, transport: Arc<dyn TransportFactory>) -> EngineResult<()> {
        let endpoint = self.config.endpoint();
        self.recorder.push(Call::Start {
            generation: self.generation,
            encoding: self.encoding,
            at: Instant::now(),
            url: endpoint.url().to_string(),
        });
        if self.recorder.take_start_failure() {
            return Err(EngineError::StartFailed("relay refused".into()));
        }
        self.transport = Some(transport.open(&endpoint)?);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.recorder.push(Call::Stop {
            generation: self.generation,
        });
    }

    fn process_data(&mut self, data: Bytes) {
        self.recorder.push(Call::Data {
            generation: self.generation,
            bytes: data,
        });
    }
}

impl DesktopEngine for FakeEngine {
    fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = Some(encoding);
        self.recorder.push(Call::SetEncoding {
            generation: self.generation,
            encoding,
        });
    }

    fn send(&mut self, data: Bytes) -> EngineResult<()> {
        let transport = self.transport.as_mut().ok_or(EngineError::TransportClosed(
            "not started".into(),
        ))?;
        transport.send(&data)?;
        self.recorder.push(Call::Sent {
            generation: self.generation,
            bytes: data,
        });
        Ok(())
    }

    fn send_input(&mut self, input: InputEvent) -> EngineResult<()> {
        self.recorder.push(Call::Input {
            generation: self.generation,
            event: input,
        });
        Ok(())
    }
}

impl MediaEngine for FakeEngine {}

pub struct FakeProvider(pub Arc<Recorder>);

impl FakeProvider {
    fn create(
        &self,
        config: TransportConfig,
        encoding: Option<Encoding>,
        sink: EngineSink,
    ) -> FakeEngine {
        let generation = sink.generation();
        self.0.push(Call::Created {
            generation,
            mode: config.mode(),
            encoding,
        });
        self.0.sinks.lock().unwrap().push(sink);
        FakeEngine {
            recorder: Arc::clone(&self.0),
            config,
            generation,
            encoding,
            transport: None,
        }
    }
}

impl EngineProvider for FakeProvider {
    fn desktop(&self, binding: DesktopBinding) -> Box<dyn DesktopEngine> {
        Box::new(self.create(binding.config, Some(binding.encoding), binding.sink))
    }

    fn media(&self, binding: MediaBinding) -> Box<dyn MediaEngine> {
        Box::new(self.create(binding.config, None, binding.sink))
    }
}

struct NullTransport;

impl RelayTransport for NullTransport {
    fn send(&mut self, _data: &[u8]) -> EngineResult<()> {
        Ok(())
    }

    fn close(&mut self) {}
}

pub struct NullTransportFactory;

impl TransportFactory for NullTransportFactory {
    fn open(&self, _endpoint: &RelayEndpoint) -> EngineResult<Box<dyn RelayTransport>> {
        Ok(Box::new(NullTransport))
    }
}

#[derive(Default)]
pub struct CountingSurface {
    resets: AtomicUsize,
}

impl CountingSurface {
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl RenderSurface for CountingSurface {
    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn timing() -> SessionTiming {
    SessionTiming {
        handshake_delay: HANDSHAKE,
        encoding_cooldown: COOLDOWN,
        pointer_throttle: THROTTLE,
    }
}

pub fn transport_config(mode: RedirectionMode) -> TransportConfig {
    TransportConfig::new(mode, "4c4c4544-0035", "wss://relay.example.com", "token-1")
}

/// Sleeps until `offset` after `t0` on the paused clock
pub async fn at(t0: Instant, offset_ms: u64) {
    tokio::time::sleep_until(t0 + Duration::from_millis(offset_ms)).await;
}
