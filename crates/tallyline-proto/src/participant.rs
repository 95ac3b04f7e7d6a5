//! Participant identity derivation.

use std::fmt;

use crate::Line;

/// Tag carrying the gateway's stable numeric sender identifier.
const USER_ID_TAG: &str = "user-id";

/// Stable identity for a chat sender, used to enforce one vote per user.
///
/// Prefers the gateway's opaque `user-id` tag when present (stable across
/// login renames); falls back to the lowercased login from the prefix. Two
/// messages map to the same key iff they carry the same identity signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParticipantKey {
    /// Keyed by the `user-id` tag value.
    Id(String),

    /// Keyed by lowercased login name (no usable `user-id` tag).
    Login(String),
}

impl ParticipantKey {
    /// Derive the key for a decoded line.
    ///
    /// Returns `None` when the line carries neither identity signal; such a
    /// message is unattributable and must not be counted.
    #[must_use]
    pub fn from_line(line: &Line) -> Option<Self> {
        if let Some(id) = line.tag(USER_ID_TAG) {
            return Some(Self::Id(id.to_owned()));
        }
        line.login.clone().map(Self::Login)
    }
}

impl fmt::Display for ParticipantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id:{id}"),
            Self::Login(login) => write!(f, "login:{login}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_user_id_tag() {
        let line = Line::parse("@user-id=123 :alice!alice@h PRIVMSG #c :no").unwrap();
        let key = ParticipantKey::from_line(&line).unwrap();
        assert_eq!(key, ParticipantKey::Id("123".to_owned()));
        assert_eq!(key.to_string(), "id:123");
    }

    #[test]
    fn falls_back_to_login() {
        let line = Line::parse(":alice!alice@h PRIVMSG #c :no").unwrap();
        let key = ParticipantKey::from_line(&line).unwrap();
        assert_eq!(key, ParticipantKey::Login("alice".to_owned()));
        assert_eq!(key.to_string(), "login:alice");
    }

    #[test]
    fn empty_user_id_tag_falls_back_to_login() {
        let line = Line::parse("@user-id= :alice!alice@h PRIVMSG #c :no").unwrap();
        let key = ParticipantKey::from_line(&line).unwrap();
        assert_eq!(key, ParticipantKey::Login("alice".to_owned()));
    }

    #[test]
    fn no_identity_signal_is_unattributable() {
        let line = Line::parse("PRIVMSG #c :no").unwrap();
        assert!(ParticipantKey::from_line(&line).is_none());
    }

    #[test]
    fn same_id_different_logins_collide() {
        let a = Line::parse("@user-id=9 :old!o@h PRIVMSG #c :x").unwrap();
        let b = Line::parse("@user-id=9 :renamed!r@h PRIVMSG #c :x").unwrap();
        assert_eq!(ParticipantKey::from_line(&a), ParticipantKey::from_line(&b));
    }
}
