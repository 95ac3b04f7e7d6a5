//! Session lifecycle and liveness state machine.
//!
//! Tracks the single live connection context: lifecycle state, joined
//! channel, ephemeral anonymous identity, reconnect eligibility, and the
//! inactivity/keepalive clocks. Pure state machine in the action style:
//! time arrives as method parameters and [`Session::tick`] returns signals
//! for the driver to execute.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ connect  ┌────────────┐ transport ┌─────────┐ join   ┌────────┐
//! │ Idle │─────────>│ Connecting │──opened──>│ Joining │─echo──>│ Active │
//! └──────┘          └────────────┘           └─────────┘        └────────┘
//!    ↑                    │                       │                  │
//!    │   close/failure    │                       │                  │
//!    ├────<───────────────┴───────<───────────────┴────────<─────────┤
//!    │                                                               │
//!    │              ┌─────────┐        user disconnect               │
//!    └──────<───────│ Closing │<──────────────────<───────────────────┘
//!                   └─────────┘
//! ```

use std::time::Duration;

/// No inbound line for this long forces a reconnect.
pub const DEFAULT_INACTIVITY_WINDOW: Duration = Duration::from_secs(180);

/// Outbound keepalive interval while the transport is open.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(240);

/// Delay before re-joining after a PART naming the joined channel.
pub const DEFAULT_REJOIN_DELAY: Duration = Duration::from_secs(1);

/// Signals returned by [`Session::tick`] for the driver to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessSignal {
    /// No inbound line within the inactivity window; force a reconnect.
    WatchdogExpired,

    /// Time to send the application-level keepalive.
    KeepaliveDue,
}

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport.
    Idle,
    /// Transport dial in flight.
    Connecting,
    /// Transport open, anonymous handshake and join sent, awaiting the
    /// server's join echo.
    Joining,
    /// Joined and counting.
    Active,
    /// User-initiated disconnect in progress; no reconnect will follow.
    Closing,
}

/// Liveness configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Inactivity watchdog window.
    pub inactivity_window: Duration,
    /// Outbound keepalive interval.
    pub keepalive_interval: Duration,
    /// Delay before the automatic re-join after a PART.
    pub rejoin_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_window: DEFAULT_INACTIVITY_WINDOW,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            rejoin_delay: DEFAULT_REJOIN_DELAY,
        }
    }
}

/// The single live connection context.
///
/// Generic over `I` (instant type) so tests can drive virtual time.
/// Created on a connect request; replaced on every reconnect or explicit
/// disconnect. The term registry and vote tracker live outside and survive
/// reconnects.
#[derive(Debug, Clone)]
pub struct Session<I>
where
    I: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>,
{
    state: SessionState,
    config: SessionConfig,
    /// Canonical joined-channel token (`#name`), set on connect.
    channel: Option<String>,
    /// Anonymous nickname, regenerated on every connection attempt.
    nick: Option<String>,
    /// Whether automatic reconnection is currently allowed.
    reconnect_eligible: bool,
    /// Reconnect attempt counter (0-indexed into the backoff schedule).
    attempt: u32,
    last_activity: Option<I>,
    last_keepalive: Option<I>,
}

impl<I> Session<I>
where
    I: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>,
{
    /// New idle session.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            state: SessionState::Idle,
            config,
            channel: None,
            nick: None,
            reconnect_eligible: false,
            attempt: 0,
            last_activity: None,
            last_keepalive: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Canonical joined-channel token, when a session was requested.
    #[must_use]
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// Replace the channel used for future (re)connects.
    pub fn set_channel(&mut self, channel_token: String) {
        self.channel = Some(channel_token);
    }

    /// Anonymous nickname of the current connection attempt.
    #[must_use]
    pub fn nick(&self) -> Option<&str> {
        self.nick.as_deref()
    }

    /// Whether automatic reconnection is currently allowed.
    #[must_use]
    pub fn reconnect_eligible(&self) -> bool {
        self.reconnect_eligible
    }

    /// Whether the transport is currently open (handshake sent or joined).
    #[must_use]
    pub fn transport_open(&self) -> bool {
        matches!(self.state, SessionState::Joining | SessionState::Active)
    }

    /// Begin a connection attempt toward `channel_token`.
    ///
    /// Any connect request (re)enables reconnect eligibility and restarts
    /// the backoff schedule; only retries carry the attempt counter.
    pub fn begin_connect(&mut self, channel_token: String) {
        self.channel = Some(channel_token);
        self.nick = None;
        self.reconnect_eligible = true;
        self.attempt = 0;
        self.state = SessionState::Connecting;
    }

    /// Begin a retry toward the already-configured channel.
    pub fn begin_retry(&mut self) {
        self.nick = None;
        self.state = SessionState::Connecting;
    }

    /// Transport opened; handshake with `nick` goes out now.
    pub fn transport_opened(&mut self, nick: String, now: I) {
        self.nick = Some(nick);
        self.state = SessionState::Joining;
        self.last_activity = Some(now);
        self.last_keepalive = Some(now);
    }

    /// Server echoed our join: the session is live.
    ///
    /// Resets the backoff attempt counter (successful post-handshake join).
    pub fn joined(&mut self) {
        self.state = SessionState::Active;
        self.attempt = 0;
    }

    /// Record inbound traffic (resets the inactivity watchdog).
    pub fn note_activity(&mut self, now: I) {
        self.last_activity = Some(now);
    }

    /// User-initiated disconnect: suppress all future reconnection until the
    /// next connect request.
    pub fn begin_close(&mut self) {
        self.reconnect_eligible = false;
        self.state = SessionState::Closing;
    }

    /// Transport is gone; the session returns to idle.
    pub fn closed(&mut self) {
        self.state = SessionState::Idle;
        self.nick = None;
        self.last_activity = None;
        self.last_keepalive = None;
    }

    /// Current attempt index, then advance the counter.
    ///
    /// Call once per scheduled retry; the counter resets on [`Self::joined`].
    pub fn next_attempt(&mut self) -> u32 {
        let attempt = self.attempt;
        self.attempt = self.attempt.saturating_add(1);
        attempt
    }

    /// Configured rejoin delay.
    #[must_use]
    pub fn rejoin_delay(&self) -> Duration {
        self.config.rejoin_delay
    }

    /// Periodic liveness maintenance.
    ///
    /// While the transport is open: reports [`LivenessSignal::WatchdogExpired`]
    /// once the inactivity window elapses, and [`LivenessSignal::KeepaliveDue`]
    /// on the keepalive cadence. Idle and closing sessions report nothing.
    pub fn tick(&mut self, now: I) -> Vec<LivenessSignal> {
        if !self.transport_open() {
            return Vec::new();
        }

        let mut signals = Vec::new();

        if let Some(last) = self.last_activity
            && now - last > self.config.inactivity_window
        {
            signals.push(LivenessSignal::WatchdogExpired);
            // One firing per silence; the reconnect tears the session down.
            self.last_activity = Some(now);
            return signals;
        }

        if let Some(last) = self.last_keepalive
            && now - last >= self.config.keepalive_interval
        {
            signals.push(LivenessSignal::KeepaliveDue);
            self.last_keepalive = Some(now);
        }

        signals
    }
}

impl<I> Default for Session<I>
where
    I: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>,
{
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn open_session(t0: Instant) -> Session<Instant> {
        let mut session = Session::default();
        session.begin_connect("#chan".to_owned());
        session.transport_opened("justinfan1234".to_owned(), t0);
        session
    }

    #[test]
    fn lifecycle_to_active() {
        let t0 = Instant::now();
        let mut session: Session<Instant> = Session::default();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.reconnect_eligible());

        session.begin_connect("#chan".to_owned());
        assert_eq!(session.state(), SessionState::Connecting);
        assert!(session.reconnect_eligible());

        session.transport_opened("justinfan42".to_owned(), t0);
        assert_eq!(session.state(), SessionState::Joining);
        assert_eq!(session.nick(), Some("justinfan42"));

        session.joined();
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn join_resets_attempt_counter() {
        let mut session: Session<Instant> = Session::default();
        session.begin_connect("#chan".to_owned());
        assert_eq!(session.next_attempt(), 0);
        assert_eq!(session.next_attempt(), 1);
        session.joined();
        assert_eq!(session.next_attempt(), 0);
    }

    #[test]
    fn connect_request_restarts_the_backoff_schedule() {
        let mut session: Session<Instant> = Session::default();
        session.begin_connect("#chan".to_owned());
        assert_eq!(session.next_attempt(), 0);
        assert_eq!(session.next_attempt(), 1);
        assert_eq!(session.next_attempt(), 2);

        session.begin_close();
        session.closed();

        // A brand-new connect must not inherit the old attempt index.
        session.begin_connect("#chan".to_owned());
        assert_eq!(session.next_attempt(), 0);
    }

    #[test]
    fn watchdog_fires_after_silence() {
        let t0 = Instant::now();
        let mut session = open_session(t0);
        session.joined();

        let quiet = t0 + DEFAULT_INACTIVITY_WINDOW + Duration::from_secs(1);
        assert_eq!(session.tick(quiet), vec![LivenessSignal::WatchdogExpired]);
    }

    #[test]
    fn activity_resets_watchdog() {
        let t0 = Instant::now();
        let mut session = open_session(t0);
        session.joined();

        let t1 = t0 + Duration::from_secs(170);
        session.note_activity(t1);

        let t2 = t0 + DEFAULT_INACTIVITY_WINDOW + Duration::from_secs(1);
        assert!(session.tick(t2).is_empty());
    }

    #[test]
    fn keepalive_on_cadence() {
        let t0 = Instant::now();
        let mut session = open_session(t0);
        session.joined();
        // Keep the watchdog quiet; only the keepalive clock should fire.
        let t1 = t0 + Duration::from_secs(120);
        session.note_activity(t1);
        let t2 = t0 + DEFAULT_KEEPALIVE_INTERVAL;
        session.note_activity(t2);

        assert_eq!(session.tick(t2), vec![LivenessSignal::KeepaliveDue]);
        // Not due again immediately.
        assert!(session.tick(t2 + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn idle_session_reports_nothing() {
        let t0 = Instant::now();
        let mut session: Session<Instant> = Session::default();
        assert!(session.tick(t0 + Duration::from_secs(600)).is_empty());
    }

    #[test]
    fn close_clears_eligibility() {
        let t0 = Instant::now();
        let mut session = open_session(t0);
        session.begin_close();
        assert_eq!(session.state(), SessionState::Closing);
        assert!(!session.reconnect_eligible());

        session.closed();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.nick().is_none());
    }
}
