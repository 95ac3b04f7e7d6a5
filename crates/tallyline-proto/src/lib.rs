//! Wire protocol for the anonymous IRC-over-WebSocket chat gateway.
//!
//! The gateway speaks a tag-extended IRC dialect over WebSocket text
//! messages. This crate is the pure protocol layer: it decodes raw lines
//! into structured [`Line`] records, derives stable [`ParticipantKey`]
//! identities from chat lines, and builds the handful of outbound command
//! strings the session engine sends. No I/O lives here.
//!
//! Parsing is total: chat traffic comes from an uncontrolled third party,
//! so malformed input yields `None` (or degraded tag data) rather than an
//! error.

mod line;
mod participant;
pub mod wire;

pub use line::Line;
pub use participant::ParticipantKey;

/// Command token for chat messages.
pub const CMD_PRIVMSG: &str = "PRIVMSG";

/// Command token for channel departure notices.
pub const CMD_PART: &str = "PART";

/// Command token for channel join notices (and our own join echo).
pub const CMD_JOIN: &str = "JOIN";

/// Server keepalive probe; must be answered with [`wire::PONG`].
pub const CMD_PING: &str = "PING";

/// Server directive requesting the client drop and re-establish the
/// connection.
pub const CMD_RECONNECT: &str = "RECONNECT";
