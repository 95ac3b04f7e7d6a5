//! Engine state machine.
//!
//! The `Engine` owns the term registry, the vote tracker, and the session
//! lifecycle, and converts the driver's event stream into actions. It holds
//! no transport handle and arms no timers itself; the driver executes every
//! side effect, which keeps the whole protocol path deterministic under
//! test.

use tallyline_core::{
    Session, SessionConfig, SessionState, TermRegistry, VoteTracker,
    backoff,
    env::Environment,
    registry::TallyEntry,
    session::LivenessSignal,
};
use tallyline_proto::{CMD_JOIN, CMD_PART, CMD_PING, CMD_RECONNECT, Line, ParticipantKey, wire};

use crate::event::{EngineAction, EngineEvent};

/// Default gateway endpoint.
pub const GATEWAY_URL: &str = "wss://irc-ws.chat.twitch.tv:443";

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// WebSocket URL of the chat gateway.
    pub gateway_url: String,
    /// Liveness windows and delays.
    pub session: SessionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { gateway_url: GATEWAY_URL.to_owned(), session: SessionConfig::default() }
    }
}

/// Top-level state machine converting events into actions.
pub struct Engine<E: Environment> {
    /// Environment for randomness (nicknames, backoff jitter).
    env: E,
    config: EngineConfig,
    session: Session<E::Instant>,
    registry: TermRegistry,
    tracker: VoteTracker,
}

impl<E: Environment> Engine<E> {
    /// Create an idle engine.
    pub fn new(env: E, config: EngineConfig) -> Self {
        let session = Session::new(config.session.clone());
        Self { env, config, session, registry: TermRegistry::new(), tracker: VoteTracker::new() }
    }

    /// Current session lifecycle state.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Anonymous nickname of the current connection attempt.
    pub fn nick(&self) -> Option<&str> {
        self.session.nick()
    }

    /// Canonical joined-channel token, when a session was requested.
    pub fn channel(&self) -> Option<&str> {
        self.session.channel()
    }

    /// Current counters, sorted for rendering.
    pub fn tally(&self) -> Vec<TallyEntry> {
        self.registry.snapshot()
    }

    /// Process an event and return the actions to execute.
    ///
    /// Never fails: user-input problems and connectivity failures surface as
    /// [`EngineAction::Status`] and the reconnection policy, per the error
    /// taxonomy of this system.
    pub fn handle(&mut self, event: EngineEvent<E::Instant>) -> Vec<EngineAction> {
        match event {
            EngineEvent::Connect { channel, terms } => self.handle_connect(&channel, &terms),
            EngineEvent::Disconnect => self.handle_disconnect(),
            EngineEvent::Reset => self.handle_reset(),
            EngineEvent::UpdateTerms { channel, terms } => self.handle_update_terms(channel, &terms),
            EngineEvent::TransportOpened { now } => self.handle_transport_opened(now),
            EngineEvent::LineReceived { raw, now } => self.handle_line(&raw, now),
            EngineEvent::TransportClosed => self.handle_transport_closed(),
            EngineEvent::TransportFailed { reason } => self.handle_transport_failed(&reason),
            EngineEvent::BackoffElapsed => self.handle_backoff_elapsed(),
            EngineEvent::RejoinDue => self.handle_rejoin_due(),
            EngineEvent::Tick { now } => self.handle_tick(now),
            EngineEvent::NetworkOnline => self.handle_network_online(),
            EngineEvent::NetworkOffline => {
                vec![EngineAction::Status("offline, waiting for network".to_owned())]
            },
        }
    }

    fn handle_connect(&mut self, channel: &str, terms: &str) -> Vec<EngineAction> {
        let channel = channel.trim();
        if channel.is_empty() {
            return vec![EngineAction::Status("channel is empty".to_owned())];
        }

        // A fresh connect replaces the whole vote: new registry, no
        // assignments, attempt counter from zero.
        self.registry.rebuild(terms);
        self.tracker.clear();
        self.session.begin_connect(wire::channel_token(channel));

        vec![
            EngineAction::CancelPending,
            EngineAction::CloseTransport,
            EngineAction::PublishTally,
            EngineAction::Status("connecting".to_owned()),
            EngineAction::OpenTransport { url: self.config.gateway_url.clone() },
        ]
    }

    fn handle_disconnect(&mut self) -> Vec<EngineAction> {
        let mut actions = vec![EngineAction::CancelPending];

        if self.session.transport_open()
            && let Some(channel) = self.session.channel()
        {
            // Best effort; the connection is going away either way.
            actions.push(EngineAction::SendLine(wire::part(channel)));
        }

        self.session.begin_close();
        self.session.closed();

        actions.push(EngineAction::CloseTransport);
        actions.push(EngineAction::Status("disconnected".to_owned()));
        actions
    }

    fn handle_reset(&mut self) -> Vec<EngineAction> {
        self.tracker.reset(&mut self.registry);
        vec![EngineAction::PublishTally]
    }

    fn handle_update_terms(&mut self, channel: Option<String>, terms: &str) -> Vec<EngineAction> {
        if let Some(channel) = channel {
            let channel = channel.trim();
            if !channel.is_empty() {
                // Takes effect on the next (re)connect; the live join is
                // left alone.
                self.session.set_channel(wire::channel_token(channel));
            }
        }

        self.registry.rebuild(terms);
        self.tracker.clear();

        vec![EngineAction::PublishTally, EngineAction::Status("terms updated".to_owned())]
    }

    fn handle_transport_opened(&mut self, now: E::Instant) -> Vec<EngineAction> {
        if self.session.state() != SessionState::Connecting {
            // The operator disconnected while the dial was in flight.
            return vec![EngineAction::CloseTransport];
        }

        let nick = wire::anon_nick(self.env.random_u64());
        self.session.transport_opened(nick.clone(), now);

        let Some(channel) = self.session.channel().map(str::to_owned) else {
            return vec![EngineAction::CloseTransport];
        };

        vec![
            EngineAction::SendLine(wire::CAP_REQUEST.to_owned()),
            EngineAction::SendLine(wire::ANON_PASS.to_owned()),
            EngineAction::SendLine(wire::nick(&nick)),
            EngineAction::SendLine(wire::join(&channel)),
            EngineAction::Status(format!("connected as {nick}, joining {channel}")),
        ]
    }

    fn handle_line(&mut self, raw: &str, now: E::Instant) -> Vec<EngineAction> {
        if !self.session.transport_open() {
            return Vec::new();
        }

        // Every inbound line, parseable or not, resets the watchdog.
        self.session.note_activity(now);

        if raw.starts_with(CMD_PING) {
            return vec![EngineAction::SendLine(wire::PONG.to_owned())];
        }

        if raw.starts_with(CMD_RECONNECT) {
            return self.force_reconnect("server reconnect directive");
        }

        let Some(line) = Line::parse(raw) else {
            // Noise from an uncontrolled peer; not an error.
            return Vec::new();
        };

        match line.command.as_str() {
            cmd if cmd == CMD_RECONNECT => self.force_reconnect("server reconnect directive"),
            cmd if cmd == CMD_JOIN => self.handle_join_echo(&line),
            cmd if cmd == CMD_PART => self.handle_part(raw),
            _ if line.is_chat() => self.handle_chat(&line),
            _ => Vec::new(),
        }
    }

    /// Promote `Joining` to `Active` when the server echoes our own join.
    fn handle_join_echo(&mut self, line: &Line) -> Vec<EngineAction> {
        if self.session.state() != SessionState::Joining {
            return Vec::new();
        }

        let ours = match (self.session.nick(), self.session.channel()) {
            (Some(nick), Some(channel)) => {
                line.login.as_deref() == Some(nick)
                    && line.params.first().map(String::as_str) == Some(channel)
            },
            _ => false,
        };

        if !ours {
            return Vec::new();
        }

        self.session.joined();

        let nick = self.session.nick().unwrap_or_default().to_owned();
        let channel = self.session.channel().unwrap_or_default().to_owned();
        vec![EngineAction::Status(format!("connected as {nick} -> {channel}"))]
    }

    /// Any PART line ending in the joined channel token triggers a delayed
    /// re-join. Deliberately no self-identity check; see DESIGN notes.
    fn handle_part(&mut self, raw: &str) -> Vec<EngineAction> {
        let Some(channel) = self.session.channel() else {
            return Vec::new();
        };

        if raw.ends_with(channel) {
            return vec![EngineAction::ScheduleRejoin { delay: self.session.rejoin_delay() }];
        }

        Vec::new()
    }

    fn handle_chat(&mut self, line: &Line) -> Vec<EngineAction> {
        let Some(key) = ParticipantKey::from_line(line) else {
            // Unattributable message; discard.
            return Vec::new();
        };

        let Some(text) = line.trailing.as_deref() else {
            return Vec::new();
        };

        if self.tracker.observe(&mut self.registry, key, text) {
            return vec![EngineAction::PublishTally];
        }

        Vec::new()
    }

    fn handle_transport_closed(&mut self) -> Vec<EngineAction> {
        match self.session.state() {
            // Stale notification for a transport we already dropped.
            SessionState::Idle => Vec::new(),
            SessionState::Closing => {
                self.session.closed();
                vec![EngineAction::Status("disconnected".to_owned())]
            },
            _ => {
                self.session.closed();
                self.schedule_reconnect("socket closed")
            },
        }
    }

    fn handle_transport_failed(&mut self, reason: &str) -> Vec<EngineAction> {
        if self.session.state() == SessionState::Idle {
            return Vec::new();
        }

        self.session.closed();

        let mut actions = vec![EngineAction::Status(format!("connection error: {reason}"))];
        actions.extend(self.schedule_reconnect(reason));
        actions
    }

    fn handle_backoff_elapsed(&mut self) -> Vec<EngineAction> {
        if !self.session.reconnect_eligible() || self.session.state() != SessionState::Idle {
            return Vec::new();
        }

        self.session.begin_retry();
        vec![
            EngineAction::Status("reconnecting".to_owned()),
            EngineAction::OpenTransport { url: self.config.gateway_url.clone() },
        ]
    }

    fn handle_rejoin_due(&mut self) -> Vec<EngineAction> {
        if !self.session.transport_open() {
            return Vec::new();
        }

        match self.session.channel() {
            Some(channel) => vec![EngineAction::SendLine(wire::join(channel))],
            None => Vec::new(),
        }
    }

    fn handle_tick(&mut self, now: E::Instant) -> Vec<EngineAction> {
        let mut actions = Vec::new();

        for signal in self.session.tick(now) {
            match signal {
                LivenessSignal::WatchdogExpired => {
                    self.session.closed();
                    actions.push(EngineAction::CloseTransport);
                    actions.extend(self.schedule_reconnect("inactivity"));
                },
                LivenessSignal::KeepaliveDue => {
                    actions.push(EngineAction::SendLine(wire::KEEPALIVE_PING.to_owned()));
                },
            }
        }

        actions
    }

    fn handle_network_online(&mut self) -> Vec<EngineAction> {
        if !self.session.reconnect_eligible() {
            return Vec::new();
        }

        // Bypass the backoff delay entirely: drop whatever is in flight and
        // dial now. The attempt counter is left alone.
        self.session.begin_retry();
        vec![
            EngineAction::CancelPending,
            EngineAction::CloseTransport,
            EngineAction::Status("reconnecting (network online)".to_owned()),
            EngineAction::OpenTransport { url: self.config.gateway_url.clone() },
        ]
    }

    /// Tear the transport down and schedule a retry.
    fn force_reconnect(&mut self, reason: &str) -> Vec<EngineAction> {
        self.session.closed();

        let mut actions = vec![EngineAction::CloseTransport];
        actions.extend(self.schedule_reconnect(reason));
        actions
    }

    /// Arm the backoff timer for the next attempt, if still eligible.
    fn schedule_reconnect(&mut self, reason: &str) -> Vec<EngineAction> {
        if !self.session.reconnect_eligible() {
            return vec![EngineAction::Status("disconnected".to_owned())];
        }

        let attempt = self.session.next_attempt();
        let delay = backoff::reconnect_delay(attempt, self.env.random_u64());
        let rounded_secs = (delay.as_millis() + 500) / 1000;

        vec![
            EngineAction::Status(format!("reconnecting in {rounded_secs}s ({reason})")),
            EngineAction::ScheduleReconnect { delay, reason: reason.to_owned() },
        ]
    }
}
