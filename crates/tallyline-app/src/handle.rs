//! Control surface for the running engine.

use tallyline_core::TallyEntry;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

/// Control errors.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The runtime task has stopped and can take no more commands.
    #[error("engine runtime stopped")]
    RuntimeStopped,
}

/// One control request, forwarded verbatim to the engine.
#[derive(Debug, Clone)]
pub(crate) enum ControlCommand {
    Connect { channel: String, terms: String },
    Disconnect,
    Reset,
    UpdateTerms { channel: Option<String>, terms: String },
    NetworkOnline,
    NetworkOffline,
}

/// Cloneable handle to a [`Runtime`](crate::Runtime).
///
/// Commands are serialized through the runtime's control channel;
/// status strings and tally snapshots come back on watch channels.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<ControlCommand>,
    status: watch::Receiver<String>,
    tally: watch::Receiver<Vec<TallyEntry>>,
}

impl EngineHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<ControlCommand>,
        status: watch::Receiver<String>,
        tally: watch::Receiver<Vec<TallyEntry>>,
    ) -> Self {
        Self { commands, status, tally }
    }

    /// Start a session: set the channel and term list, then connect.
    pub async fn connect(&self, channel: String, terms: String) -> Result<(), ControlError> {
        self.send(ControlCommand::Connect { channel, terms }).await
    }

    /// Stop the session. No reconnection follows until the next connect.
    pub async fn disconnect(&self) -> Result<(), ControlError> {
        self.send(ControlCommand::Disconnect).await
    }

    /// Zero all counters and forget vote assignments.
    pub async fn reset(&self) -> Result<(), ControlError> {
        self.send(ControlCommand::Reset).await
    }

    /// Replace the term list (and optionally the channel for future
    /// connects) without touching the connection.
    pub async fn update_terms(
        &self,
        channel: Option<String>,
        terms: String,
    ) -> Result<(), ControlError> {
        self.send(ControlCommand::UpdateTerms { channel, terms }).await
    }

    /// Report that network connectivity returned.
    pub async fn network_online(&self) -> Result<(), ControlError> {
        self.send(ControlCommand::NetworkOnline).await
    }

    /// Report that network connectivity was lost.
    pub async fn network_offline(&self) -> Result<(), ControlError> {
        self.send(ControlCommand::NetworkOffline).await
    }

    /// Watch channel carrying the human-readable status line.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<String> {
        self.status.clone()
    }

    /// Watch channel carrying tally snapshots, sorted for rendering.
    #[must_use]
    pub fn tally(&self) -> watch::Receiver<Vec<TallyEntry>> {
        self.tally.clone()
    }

    async fn send(&self, command: ControlCommand) -> Result<(), ControlError> {
        self.commands.send(command).await.map_err(|_| ControlError::RuntimeStopped)
    }
}
