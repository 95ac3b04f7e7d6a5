//! Tokio event loop executing engine actions.

use std::pin::Pin;
use std::time::{Duration, Instant};

use tallyline_client::transport::{self, ConnectedGateway, TransportEvent};
use tallyline_client::{Engine, EngineAction, EngineConfig, EngineEvent};
use tallyline_core::TallyEntry;
use tallyline_core::env::SystemEnv;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Interval, Sleep};
use tracing::{debug, warn};

use crate::handle::{ControlCommand, EngineHandle};

/// Liveness tick cadence; the engine decides what (if anything) is due.
const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Engine configuration (gateway URL, liveness windows).
    pub engine: EngineConfig,
    /// Give up on a WebSocket dial after this long.
    pub dial_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { engine: EngineConfig::default(), dial_timeout: Duration::from_secs(10) }
    }
}

/// Which pending timer is armed.
///
/// There is at most one: a newly scheduled delay supersedes whatever was
/// armed before, which is what keeps a close-plus-error burst from
/// stacking reconnect attempts.
#[derive(Debug, Clone, Copy)]
enum PendingKind {
    Reconnect,
    Rejoin,
}

/// Production runtime around the Sans-IO engine.
///
/// Owns the WebSocket transport and the single pending timer, executes
/// the actions the engine returns, and publishes status and tally on
/// watch channels.
pub struct Runtime {
    config: RuntimeConfig,
    engine: Engine<SystemEnv>,
    commands: mpsc::Receiver<ControlCommand>,
    gateway: Option<ConnectedGateway>,
    /// In-flight dial task; at most one, superseded by the next open.
    dial: Option<JoinHandle<Result<ConnectedGateway, String>>>,
    pending: Option<(PendingKind, Pin<Box<Sleep>>)>,
    ticker: Interval,
    status: watch::Sender<String>,
    tally: watch::Sender<Vec<TallyEntry>>,
}

impl Runtime {
    /// Create a runtime and the handle that controls it.
    #[must_use]
    pub fn new(config: RuntimeConfig) -> (Self, EngineHandle) {
        let engine = Engine::new(SystemEnv, config.engine.clone());
        let (command_tx, command_rx) = mpsc::channel(32);
        let (status_tx, status_rx) = watch::channel("disconnected".to_owned());
        let (tally_tx, tally_rx) = watch::channel(Vec::new());

        let runtime = Self {
            config,
            engine,
            commands: command_rx,
            gateway: None,
            dial: None,
            pending: None,
            ticker: tokio::time::interval(TICK_PERIOD),
            status: status_tx,
            tally: tally_tx,
        };
        let handle = EngineHandle::new(command_tx, status_rx, tally_rx);
        (runtime, handle)
    }

    /// Run until every [`EngineHandle`] is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    self.dispatch(Self::command_event(command)).await;
                },
                event = Self::transport_event(&mut self.gateway) => {
                    let event = match event {
                        Some(TransportEvent::Line(raw)) => {
                            EngineEvent::LineReceived { raw, now: Instant::now() }
                        },
                        Some(TransportEvent::Failed(reason)) => {
                            self.drop_gateway();
                            EngineEvent::TransportFailed { reason }
                        },
                        Some(TransportEvent::Closed) | None => {
                            self.drop_gateway();
                            EngineEvent::TransportClosed
                        },
                    };
                    self.dispatch(event).await;
                },
                outcome = Self::dial_complete(&mut self.dial) => {
                    self.dial = None;
                    let event = match outcome {
                        Ok(gateway) => {
                            self.gateway = Some(gateway);
                            EngineEvent::TransportOpened { now: Instant::now() }
                        },
                        Err(reason) => {
                            warn!("gateway dial failed: {reason}");
                            EngineEvent::TransportFailed { reason }
                        },
                    };
                    self.dispatch(event).await;
                },
                kind = Self::pending_elapsed(&mut self.pending) => {
                    self.pending = None;
                    let event = match kind {
                        PendingKind::Reconnect => EngineEvent::BackoffElapsed,
                        PendingKind::Rejoin => EngineEvent::RejoinDue,
                    };
                    self.dispatch(event).await;
                },
                _ = self.ticker.tick() => {
                    self.dispatch(EngineEvent::Tick { now: Instant::now() }).await;
                },
            }
        }

        debug!("all handles dropped; runtime stopping");
        self.drop_gateway();
        self.abort_dial();
    }

    /// Feed one event through the engine, executing actions as they come.
    ///
    /// Transport dials produce follow-up events (opened or failed), which
    /// loop back through the engine here rather than recursing.
    async fn dispatch(&mut self, event: EngineEvent<Instant>) {
        let mut queue = vec![event];
        while let Some(event) = queue.pop() {
            for action in self.engine.handle(event) {
                if let Some(follow_up) = self.execute(action).await {
                    queue.push(follow_up);
                }
            }
        }
    }

    async fn execute(&mut self, action: EngineAction) -> Option<EngineEvent<Instant>> {
        match action {
            EngineAction::OpenTransport { url } => {
                // The dial must not block the select loop: control commands
                // and ticks keep flowing while it resolves, and its outcome
                // comes back through the loop as opened/failed.
                self.drop_gateway();
                self.abort_dial();
                let timeout = self.config.dial_timeout;
                self.dial = Some(tokio::spawn(async move {
                    match tokio::time::timeout(timeout, transport::connect(&url)).await {
                        Ok(Ok(gateway)) => Ok(gateway),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(_) => Err("dial timed out".to_owned()),
                    }
                }));
                None
            },
            EngineAction::SendLine(line) => {
                if let Some(gateway) = &self.gateway
                    && gateway.to_gateway.send(line).await.is_err()
                {
                    // The I/O task reports the failure on its own channel.
                    warn!("transport task gone; outbound line dropped");
                }
                None
            },
            EngineAction::CloseTransport => {
                self.drop_gateway();
                self.abort_dial();
                None
            },
            EngineAction::ScheduleReconnect { delay, reason } => {
                debug!(?delay, reason, "reconnect scheduled");
                self.pending =
                    Some((PendingKind::Reconnect, Box::pin(tokio::time::sleep(delay))));
                None
            },
            EngineAction::ScheduleRejoin { delay } => {
                debug!(?delay, "rejoin scheduled");
                self.pending = Some((PendingKind::Rejoin, Box::pin(tokio::time::sleep(delay))));
                None
            },
            EngineAction::CancelPending => {
                self.pending = None;
                None
            },
            EngineAction::Status(status) => {
                debug!(%status);
                self.status.send_replace(status);
                None
            },
            EngineAction::PublishTally => {
                self.tally.send_replace(self.engine.tally());
                None
            },
        }
    }

    fn drop_gateway(&mut self) {
        if let Some(gateway) = self.gateway.take() {
            gateway.stop();
        }
    }

    fn abort_dial(&mut self) {
        if let Some(dial) = self.dial.take() {
            dial.abort();
        }
    }

    fn command_event(command: ControlCommand) -> EngineEvent<Instant> {
        match command {
            ControlCommand::Connect { channel, terms } => EngineEvent::Connect { channel, terms },
            ControlCommand::Disconnect => EngineEvent::Disconnect,
            ControlCommand::Reset => EngineEvent::Reset,
            ControlCommand::UpdateTerms { channel, terms } => {
                EngineEvent::UpdateTerms { channel, terms }
            },
            ControlCommand::NetworkOnline => EngineEvent::NetworkOnline,
            ControlCommand::NetworkOffline => EngineEvent::NetworkOffline,
        }
    }

    async fn transport_event(gateway: &mut Option<ConnectedGateway>) -> Option<TransportEvent> {
        match gateway {
            Some(gateway) => gateway.from_gateway.recv().await,
            None => std::future::pending().await,
        }
    }

    async fn dial_complete(
        dial: &mut Option<JoinHandle<Result<ConnectedGateway, String>>>,
    ) -> Result<ConnectedGateway, String> {
        match dial {
            Some(handle) => match handle.await {
                Ok(outcome) => outcome,
                Err(_) => Err("dial task aborted".to_owned()),
            },
            None => std::future::pending().await,
        }
    }

    async fn pending_elapsed(pending: &mut Option<(PendingKind, Pin<Box<Sleep>>)>) -> PendingKind {
        match pending {
            Some((kind, sleep)) => {
                sleep.as_mut().await;
                *kind
            },
            None => std::future::pending().await,
        }
    }
}
