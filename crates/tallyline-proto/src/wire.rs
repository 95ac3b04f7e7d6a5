//! Outbound command strings.
//!
//! The anonymous handshake and channel commands are fixed wire strings; the
//! only variable parts are the randomized nickname digits and the channel
//! name. Channel names always go out as `#<lowercased name>`.

/// Capability negotiation request sent first after the transport opens.
pub const CAP_REQUEST: &str = "CAP REQ :twitch.tv/tags twitch.tv/commands twitch.tv/membership";

/// Shared password token accepted for anonymous read-only sessions.
pub const ANON_PASS: &str = "PASS SCHMOOPIIE";

/// Prefix of the randomized anonymous nickname.
pub const ANON_NICK_PREFIX: &str = "justinfan";

/// Fixed reply to a server `PING`.
pub const PONG: &str = "PONG :tmi.twitch.tv";

/// Application-level keepalive, sent on a fixed interval to exercise the
/// connection independently of server pings.
pub const KEEPALIVE_PING: &str = "PING :keepalive";

/// Anonymous nickname for this connection attempt.
///
/// `digits` should come from the session's randomness source; it is reduced
/// to the six-digit space the gateway expects.
#[must_use]
pub fn anon_nick(digits: u64) -> String {
    format!("{ANON_NICK_PREFIX}{}", digits % 1_000_000)
}

/// `NICK` command for an anonymous nickname.
#[must_use]
pub fn nick(nick: &str) -> String {
    format!("NICK {nick}")
}

/// Canonical joined-channel token: `#<lowercased name>`.
#[must_use]
pub fn channel_token(channel: &str) -> String {
    format!("#{}", channel.trim().to_ascii_lowercase())
}

/// `JOIN` command for an already-canonical channel token.
#[must_use]
pub fn join(channel_token: &str) -> String {
    format!("JOIN {channel_token}")
}

/// `PART` command for an already-canonical channel token.
#[must_use]
pub fn part(channel_token: &str) -> String {
    format!("PART {channel_token}")
}
