//! Redirection session controller
//!
//! Owns one session's transport config and its single live engine adapter,
//! and drives the lifecycle:
//!
//! - `connect` instantiates an adapter and starts it after the handshake
//!   grace period
//! - `stop` closes the transport and releases the adapter
//! - engine errors reset the session and reconnect with the same config
//! - encoding changes stop the desktop engine and restart it after a
//!   cool-down
//!
//! All state lives on one task. Engine callbacks and timers reach it as
//! [`SessionEvent`]s tagged with a [`Generation`]; anything tagged with a
//! generation other than the live session's is dropped in
//! [`SessionController::handle_event`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::config::{RedirectionMode, SessionTiming, TransportConfig};
use crate::engine::{
    EngineAdapter, EngineBindings, EngineProvider, EngineSink, MediaSources, RenderSurface,
    TransportFactory,
};
use crate::error::EngineError;
use crate::input::{CaptureAction, InputCapture, InputEvent, KeyEvent, PointerEvent};
use crate::session::encoding::Encoding;
use crate::session::event::{EngineEvent, SessionEvent, TimerKind};
use crate::session::host::{HostCommand, HostNotification};
use crate::session::state::{SessionState, SessionStateMachine, StateTransition};
use crate::session::stats::{StatisticsAggregator, StatisticsSnapshot};
use crate::session::timer::{Generation, ScheduledTask};

/// Why the start timer of a session was scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDelay {
    /// Initial handshake grace period after connect or error recovery
    Handshake,
    /// Cool-down after an encoding change
    Cooldown,
}

struct PendingStart {
    delay: StartDelay,
    seq: u32,
    task: ScheduledTask,
}

/// Everything owned by one generation of the session
///
/// Dropping it cancels every timer the session scheduled.
struct LiveSession {
    generation: Generation,
    adapter: EngineAdapter,
    capture: Option<InputCapture>,
    stats: Option<StatisticsAggregator>,
    start_attempted: bool,
    pending_start: Option<PendingStart>,
    pointer_flush: Option<ScheduledTask>,
}

/// Point-in-time view of a controller, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSnapshot {
    /// Lifecycle state
    pub state: SessionState,
    /// Current generation
    pub generation: Generation,
    /// Selected desktop encoding
    pub encoding: Encoding,
    /// Pending start timer, if any
    pub pending_start: Option<StartDelay>,
    /// When the pending start timer fires
    pub start_deadline: Option<Instant>,
    /// Time spent in the current state
    pub time_in_state: Duration,
    /// Most recent state change
    pub last_transition: Option<StateTransition>,
    /// Whether keyboard input is grabbed
    pub keyboard_grabbed: bool,
    /// Media counters of the live session
    pub statistics: Option<StatisticsSnapshot>,
    /// Sector operations counted by the live session
    pub sector_operations: Option<u64>,
}

/// Builder for [`SessionController`]
pub struct SessionBuilder {
    config: TransportConfig,
    provider: Arc<dyn EngineProvider>,
    transport: Arc<dyn TransportFactory>,
    timing: SessionTiming,
    bindings: EngineBindings,
    encoding: Encoding,
}

impl SessionBuilder {
    /// Overrides the default timing
    pub fn timing(mut self, timing: SessionTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Binds a render surface for desktop sessions
    pub fn surface(mut self, surface: Arc<dyn RenderSurface>) -> Self {
        self.bindings.surface = Some(surface);
        self
    }

    /// Binds virtual media images for media sessions
    pub fn media(mut self, sources: MediaSources) -> Self {
        self.bindings.media = sources;
        self
    }

    /// Sets the initial desktop encoding
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Builds the controller and the receiver for its notifications
    pub fn build(self) -> (SessionController, UnboundedReceiver<HostNotification>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();

        let controller = SessionController {
            id: Uuid::new_v4(),
            config: self.config,
            timing: self.timing,
            provider: self.provider,
            transport: self.transport,
            bindings: self.bindings,
            state: SessionStateMachine::new(),
            generation: Generation::default(),
            encoding: self.encoding,
            live: None,
            events_tx,
            events_rx,
            notifications: notify_tx,
        };

        (controller, notify_rx)
    }
}

/// Lifecycle controller for one redirection session
pub struct SessionController {
    id: Uuid,
    config: TransportConfig,
    timing: SessionTiming,
    provider: Arc<dyn EngineProvider>,
    transport: Arc<dyn TransportFactory>,
    bindings: EngineBindings,
    state: SessionStateMachine,
    generation: Generation,
    encoding: Encoding,
    live: Option<LiveSession>,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
    notifications: UnboundedSender<HostNotification>,
}

impl SessionController {
    /// Starts building a controller for `config`
    pub fn builder(
        config: TransportConfig,
        provider: Arc<dyn EngineProvider>,
        transport: Arc<dyn TransportFactory>,
    ) -> SessionBuilder {
        SessionBuilder {
            config,
            provider,
            transport,
            timing: SessionTiming::default(),
            bindings: EngineBindings::default(),
            encoding: Encoding::default(),
        }
    }

    /// Controller id used in logs
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Transport config of this session
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state.current()
    }

    /// Current generation
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Diagnostic snapshot
    pub fn snapshot(&self) -> ControllerSnapshot {
        let live = self.live.as_ref();
        let pending = live.and_then(|l| l.pending_start.as_ref());
        let stats = live.and_then(|l| l.stats.as_ref());
        ControllerSnapshot {
            state: self.state.current(),
            generation: self.generation,
            encoding: self.encoding,
            pending_start: pending.map(|p| p.delay),
            start_deadline: pending.map(|p| p.task.deadline()),
            time_in_state: self.state.time_in_state(),
            last_transition: self.state.last_transition().copied(),
            keyboard_grabbed: live
                .and_then(|l| l.capture.as_ref())
                .is_some_and(InputCapture::is_keyboard_grabbed),
            statistics: stats.map(StatisticsAggregator::snapshot),
            sector_operations: stats.map(StatisticsAggregator::operations),
        }
    }

    /// Runs the controller until shutdown or until every command sender is gone
    pub async fn run(mut self, mut commands: mpsc::Receiver<HostCommand>) {
        info!(session = %self.id, device = %self.config.device_id(), mode = %self.config.mode(), "Session controller running");

        loop {
            // Queued engine callbacks and timers go before newer host commands
            tokio::select! {
                biased;
                Some(event) = self.events_rx.recv() => self.handle_event(event),
                command = commands.recv() => match command {
                    Some(HostCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
            }
        }

        self.stop();
        info!(session = %self.id, "Session controller stopped");
    }

    /// Applies one host command
    pub fn handle_command(&mut self, command: HostCommand) {
        match command {
            HostCommand::Connection(true) => self.connect(),
            HostCommand::Connection(false) | HostCommand::Shutdown => self.stop(),
            HostCommand::Encoding(id) => self.change_encoding(id),
            HostCommand::Pointer(event) => self.pointer(event),
            HostCommand::Key(event) => self.key(event),
            HostCommand::Inspect(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    /// Dispatches an engine callback or timer, dropping stale ones
    pub fn handle_event(&mut self, event: SessionEvent) {
        let generation = event.generation();
        if self.live.as_ref().map(|l| l.generation) != Some(generation) {
            debug!(session = %self.id, stale = %generation, current = %self.generation, "Dropping stale session event");
            return;
        }

        match event {
            SessionEvent::Timer {
                kind: TimerKind::Start { seq },
                ..
            } => self.start(seq),
            SessionEvent::Timer {
                kind: TimerKind::PointerFlush,
                ..
            } => self.flush_pointer(),
            SessionEvent::Engine { event, .. } => self.on_engine_event(event),
        }
    }

    /// Receives the next internal event, for hosts driving the controller themselves
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    /// Instantiates the engine adapter and schedules its start
    ///
    /// Ignored unless the session is idle.
    pub fn connect(&mut self) {
        if self.state.current() != SessionState::Idle {
            warn!(session = %self.id, state = %self.state.current(), "Connect ignored; session not idle");
            return;
        }
        self.instantiate(StartDelay::Handshake);
    }

    /// Closes the transport and releases the adapter
    ///
    /// Calling it on an idle session does nothing.
    pub fn stop(&mut self) {
        match self.state.current() {
            SessionState::Idle | SessionState::Resetting => {
                trace!(session = %self.id, "Stop ignored; nothing to tear down");
            }
            _ => {
                self.teardown();
                info!(session = %self.id, "Session stopped");
            }
        }
    }

    /// Selects a new desktop encoding
    ///
    /// A started session is stopped once and restarted after the cool-down.
    /// Further changes during the cool-down update the pending adapter and
    /// restart the cool-down; the last request wins.
    pub fn change_encoding(&mut self, id: u8) {
        let Some(encoding) = Encoding::from_id(id) else {
            warn!(session = %self.id, id, "Encoding change ignored; unknown encoding");
            return;
        };
        if self.config.mode() != RedirectionMode::Desktop {
            warn!(session = %self.id, "Encoding change ignored; not a desktop session");
            return;
        }

        self.encoding = encoding;
        info!(session = %self.id, %encoding, state = %self.state.current(), "Encoding selected");

        match self.state.current() {
            SessionState::Idle | SessionState::Resetting => {}
            SessionState::Instantiated => {
                let cooldown = self.timing.encoding_cooldown;
                let events_tx = self.events_tx.clone();
                let Some(live) = self.live.as_mut() else {
                    return;
                };
                if let Some(desktop) = live.adapter.as_desktop_mut() {
                    desktop.set_encoding(encoding);
                }
                let superseded = live
                    .pending_start
                    .as_ref()
                    .filter(|p| p.delay == StartDelay::Cooldown)
                    .map(|p| p.seq);
                if let Some(seq) = superseded {
                    live.pending_start = Some(schedule_start(
                        events_tx,
                        live.generation,
                        seq.wrapping_add(1),
                        StartDelay::Cooldown,
                        cooldown,
                    ));
                    debug!(session = %self.id, seq = seq.wrapping_add(1), "Encoding cool-down restarted");
                }
            }
            SessionState::Active => {
                self.release_live();
                self.instantiate(StartDelay::Cooldown);
            }
            SessionState::AwaitingStart => {
                self.teardown();
                self.instantiate(StartDelay::Cooldown);
            }
        }
    }

    /// Routes a pointer event from the render surface
    pub fn pointer(&mut self, event: PointerEvent) {
        if !self.state.is_active() {
            return;
        }
        let events_tx = self.events_tx.clone();
        let Some(live) = self.live.as_mut() else {
            return;
        };
        let Some(capture) = live.capture.as_mut() else {
            return;
        };

        match capture.pointer(event, Instant::now()) {
            CaptureAction::Send(input) => forward_input(&mut live.adapter, input),
            CaptureAction::ScheduleFlush(at) => {
                let message = SessionEvent::Timer {
                    generation: live.generation,
                    kind: TimerKind::PointerFlush,
                };
                live.pointer_flush = Some(ScheduledTask::at(at, events_tx, message));
            }
            CaptureAction::Nothing => {}
        }
    }

    /// Routes a key event while the keyboard is grabbed
    pub fn key(&mut self, event: KeyEvent) {
        if !self.state.is_active() {
            return;
        }
        let Some(live) = self.live.as_mut() else {
            return;
        };
        if let Some(input) = live.capture.as_ref().and_then(|c| c.key(event)) {
            forward_input(&mut live.adapter, input);
        }
    }

    fn instantiate(&mut self, delay: StartDelay) {
        let generation = self.generation;
        let sink = EngineSink::new(generation, self.events_tx.clone());
        let adapter = EngineAdapter::instantiate(
            self.provider.as_ref(),
            &self.config,
            &self.bindings,
            self.encoding,
            sink,
        );

        let (capture, stats) = match self.config.mode() {
            RedirectionMode::Desktop => (Some(InputCapture::new(self.timing.pointer_throttle)), None),
            RedirectionMode::Media => (None, Some(StatisticsAggregator::new())),
        };

        let wait = match delay {
            StartDelay::Handshake => self.timing.handshake_delay,
            StartDelay::Cooldown => self.timing.encoding_cooldown,
        };

        self.live = Some(LiveSession {
            generation,
            adapter,
            capture,
            stats,
            start_attempted: false,
            pending_start: Some(schedule_start(
                self.events_tx.clone(),
                generation,
                0,
                delay,
                wait,
            )),
            pointer_flush: None,
        });
        self.enter(SessionState::Instantiated);

        info!(session = %self.id, %generation, ?delay, wait_ms = wait.as_millis() as u64, "Engine adapter instantiated");
    }

    fn start(&mut self, seq: u32) {
        if self.state.current() != SessionState::Instantiated {
            debug!(session = %self.id, state = %self.state.current(), "Start timer ignored");
            return;
        }
        let pending = self
            .live
            .as_ref()
            .and_then(|l| l.pending_start.as_ref())
            .map(|p| p.seq);
        if pending != Some(seq) {
            debug!(session = %self.id, seq, ?pending, "Dropping superseded start timer");
            return;
        }
        self.enter(SessionState::AwaitingStart);

        let transport = Arc::clone(&self.transport);
        let Some(live) = self.live.as_mut() else {
            return;
        };
        live.pending_start = None;
        live.start_attempted = true;

        match live.adapter.start(transport) {
            Ok(()) => {
                if let Some(capture) = live.capture.as_mut() {
                    capture.grab_keyboard();
                }
                let generation = live.generation;
                self.enter(SessionState::Active);
                info!(session = %self.id, %generation, "Engine started");
            }
            Err(e) => {
                error!(session = %self.id, "Engine failed to start: {}", e);
                self.recover(e);
            }
        }
    }

    fn on_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::StateChanged(status) => {
                debug!(session = %self.id, status, "Engine state changed");
                self.notify(HostNotification::StatusChanged(status));
            }
            EngineEvent::Error(e) => {
                warn!(session = %self.id, "Engine reported error: {}", e);
                self.recover(e);
            }
            EngineEvent::ProcessData(data) => {
                if let Some(live) = self.live.as_mut() {
                    trace!(session = %self.id, bytes = data.len(), "Inbound engine data");
                    live.adapter.process_data(data);
                }
            }
            EngineEvent::Send(data) => {
                let Some(live) = self.live.as_mut() else {
                    return;
                };
                match live.adapter.as_desktop_mut() {
                    Some(desktop) => {
                        if let Err(e) = desktop.send(data) {
                            warn!(session = %self.id, "Failed to send engine output: {}", e);
                        }
                    }
                    None => warn!(session = %self.id, "Send callback ignored on media session"),
                }
            }
            EngineEvent::SectorOperation(operation) => {
                let snapshot = self
                    .live
                    .as_mut()
                    .and_then(|l| l.stats.as_mut())
                    .map(|stats| stats.record(&operation));
                match snapshot {
                    Some(snapshot) => self.notify(HostNotification::StatisticsUpdated(snapshot)),
                    None => warn!(session = %self.id, "Sector operation ignored on desktop session"),
                }
            }
        }
    }

    fn flush_pointer(&mut self) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        live.pointer_flush.take();
        if let Some(input) = live
            .capture
            .as_mut()
            .and_then(|c| c.flush_pointer(Instant::now()))
        {
            forward_input(&mut live.adapter, input);
        }
    }

    /// Full reset followed by an immediate reconnect with the same config
    ///
    /// No limit or backoff: every error event reconnects once.
    fn recover(&mut self, cause: EngineError) {
        info!(session = %self.id, generation = %self.generation, "Resetting session after error: {}", cause);
        self.teardown();
        self.instantiate(StartDelay::Handshake);
    }

    fn teardown(&mut self) {
        self.enter(SessionState::Resetting);
        self.release_live();
        self.enter(SessionState::Idle);
    }

    /// Stops and drops the live adapter, cancels its timers and retires its generation
    fn release_live(&mut self) {
        if let Some(mut live) = self.live.take() {
            if live.start_attempted {
                live.adapter.stop();
            }
            if let Some(capture) = live.capture.as_mut() {
                capture.release();
            }
            let LiveSession { adapter, .. } = live;
            debug!(session = %self.id, generation = %adapter.generation(), mode = %adapter.mode(), "Releasing engine adapter");
            adapter.release();
        }
        self.generation = self.generation.next();
    }

    fn enter(&mut self, to: SessionState) {
        if let Err(e) = self.state.transition(to) {
            error!(session = %self.id, "{}", e);
        }
    }

    fn notify(&self, notification: HostNotification) {
        if self.notifications.send(notification).is_err() {
            trace!(session = %self.id, "Host stopped listening for notifications");
        }
    }
}

fn schedule_start(
    events_tx: UnboundedSender<SessionEvent>,
    generation: Generation,
    seq: u32,
    delay: StartDelay,
    wait: Duration,
) -> PendingStart {
    let message = SessionEvent::Timer {
        generation,
        kind: TimerKind::Start { seq },
    };
    PendingStart {
        delay,
        seq,
        task: ScheduledTask::at(Instant::now() + wait, events_tx, message),
    }
}

fn forward_input(adapter: &mut EngineAdapter, input: InputEvent) {
    if let Some(desktop) = adapter.as_desktop_mut() {
        if let Err(e) = desktop.send_input(input) {
            warn!("Failed to forward input: {}", e);
        }
    }
}
