//! Engine events and actions.

use std::time::Duration;

/// Events the driver feeds into the engine.
///
/// The driver is responsible for:
/// - Forwarding control-surface requests (connect, disconnect, reset, terms)
/// - Delivering transport lifecycle changes and inbound lines
/// - Driving time forward via ticks and firing scheduled timers
///
/// Generic over `I` (instant type) to support both production time and
/// virtual time in tests.
#[derive(Debug, Clone)]
pub enum EngineEvent<I = std::time::Instant> {
    /// Operator asked to begin a session.
    Connect {
        /// Channel name (raw operator input, not yet canonicalized).
        channel: String,
        /// Comma-separated term list.
        terms: String,
    },

    /// Operator asked to end the session without reconnection.
    Disconnect,

    /// Operator asked to zero all counts and assignments.
    Reset,

    /// Operator replaced the term list (and optionally the channel used for
    /// future reconnects).
    UpdateTerms {
        /// New channel, when provided.
        channel: Option<String>,
        /// New comma-separated term list.
        terms: String,
    },

    /// Transport dial completed; the connection is open.
    TransportOpened {
        /// Current time.
        now: I,
    },

    /// One inbound protocol line (no trailing newline).
    LineReceived {
        /// Raw line text.
        raw: String,
        /// Arrival time.
        now: I,
    },

    /// The transport closed without the engine asking for it.
    TransportClosed,

    /// The transport failed to open or errored mid-stream.
    TransportFailed {
        /// Human-readable failure description.
        reason: String,
    },

    /// A scheduled reconnect backoff timer fired.
    BackoffElapsed,

    /// A scheduled channel re-join timer fired.
    RejoinDue,

    /// Periodic liveness maintenance (watchdog, keepalive).
    Tick {
        /// Current time.
        now: I,
    },

    /// The host reported the network came back.
    NetworkOnline,

    /// The host reported the network went away.
    NetworkOffline,
}

/// Actions the engine produces for the driver to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineAction {
    /// Open a transport to the gateway, replacing any existing one.
    OpenTransport {
        /// WebSocket URL of the gateway.
        url: String,
    },

    /// Send one line on the open transport, best effort.
    SendLine(String),

    /// Drop the transport, if any.
    CloseTransport,

    /// Arm the single pending timer as a reconnect backoff.
    ///
    /// Supersedes any pending reconnect or rejoin timer; fires back as
    /// [`EngineEvent::BackoffElapsed`].
    ScheduleReconnect {
        /// Delay before the attempt.
        delay: Duration,
        /// Why the reconnect was scheduled (for diagnostics).
        reason: String,
    },

    /// Arm the single pending timer as a delayed channel re-join.
    ///
    /// Fires back as [`EngineEvent::RejoinDue`].
    ScheduleRejoin {
        /// Delay before re-sending the join.
        delay: Duration,
    },

    /// Disarm any pending reconnect or rejoin timer.
    CancelPending,

    /// Publish a new human-readable connectivity status.
    Status(String),

    /// Counters changed; publish a fresh tally snapshot.
    PublishTally,
}
