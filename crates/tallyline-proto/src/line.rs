//! Raw line decoding.
//!
//! A gateway line has up to four parts, in order:
//!
//! ```text
//! @key=value;key2=value2 :nick!user@host COMMAND param param :trailing text
//! └─ tags (optional) ──┘ └─ prefix ────┘ └─ command/params ┘ └─ trailing ─┘
//! ```
//!
//! Decoding never fails with an error: a line that carries no command token
//! is simply not a protocol line (`None`), and malformed tags degrade to
//! empty values.

use std::collections::HashMap;

/// One decoded protocol line.
///
/// # Invariants
///
/// - `command` is never empty.
/// - `login` is lowercase when present.
/// - `trailing` is only `Some` when the raw line contained a ` :` delimiter
///   after the prefix; a chat-looking line without one is not a chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Tag key/value pairs from a leading `@…` block. Empty when absent.
    pub tags: HashMap<String, String>,

    /// Sender login from the `:nick!user@host` prefix, lowercased.
    pub login: Option<String>,

    /// Command token (e.g. `PRIVMSG`, `PING`, `353`).
    pub command: String,

    /// Middle parameters between the command and the trailing delimiter.
    pub params: Vec<String>,

    /// Message text after the first ` :` following the prefix.
    pub trailing: Option<String>,
}

impl Line {
    /// Decode one raw line (no trailing newline).
    ///
    /// Returns `None` for empty or unparseable input. Never panics,
    /// whatever the input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut rest = raw;

        let tags = if let Some(stripped) = rest.strip_prefix('@') {
            let (tag_block, after) = match stripped.split_once(' ') {
                Some((block, after)) => (block, after),
                None => (stripped, ""),
            };
            rest = after;
            parse_tags(tag_block)
        } else {
            HashMap::new()
        };

        let login = if let Some(stripped) = rest.strip_prefix(':') {
            let (prefix, after) = match stripped.split_once(' ') {
                Some((prefix, after)) => (prefix, after),
                None => (stripped, ""),
            };
            rest = after;
            let nick = prefix.split('!').next().unwrap_or(prefix);
            Some(nick.to_ascii_lowercase())
        } else {
            None
        };

        // Trailing text starts at the first " :" after the prefix. Everything
        // before it is the command and its middle parameters.
        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trail)) => (head, Some(trail.to_owned())),
            None => (rest, None),
        };

        let mut words = head.split_ascii_whitespace();
        let command = words.next()?.to_owned();
        let params = words.map(str::to_owned).collect();

        Some(Self { tags, login, command, params, trailing })
    }

    /// Tag value for `key`, if present and non-empty after trimming.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    /// Whether this is a chat line: `PRIVMSG` with message text.
    #[must_use]
    pub fn is_chat(&self) -> bool {
        self.command == crate::CMD_PRIVMSG && self.trailing.is_some()
    }
}

/// Parse a tag block (the part after `@`, before the first space).
///
/// A bare key with no `=` yields an empty value; empty segments contribute
/// nothing. This mirrors the gateway's lenient tag grammar.
fn parse_tags(block: &str) -> HashMap<String, String> {
    let mut tags = HashMap::new();
    for part in block.split(';') {
        if part.is_empty() {
            continue;
        }
        match part.split_once('=') {
            Some((k, v)) => tags.insert(k.to_owned(), v.to_owned()),
            None => tags.insert(part.to_owned(), String::new()),
        };
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tagged_privmsg() {
        let raw = "@user-id=123;badge-info= :alice!alice@alice.tmi.twitch.tv PRIVMSG #chan :no";
        let line = Line::parse(raw).unwrap();

        assert_eq!(line.tag("user-id"), Some("123"));
        assert_eq!(line.tags.get("badge-info").map(String::as_str), Some(""));
        assert_eq!(line.login.as_deref(), Some("alice"));
        assert_eq!(line.command, "PRIVMSG");
        assert_eq!(line.params, vec!["#chan"]);
        assert_eq!(line.trailing.as_deref(), Some("no"));
        assert!(line.is_chat());
    }

    #[test]
    fn prefix_without_bang_is_whole_nick() {
        let line = Line::parse(":tmi.twitch.tv RECONNECT").unwrap();
        assert_eq!(line.login.as_deref(), Some("tmi.twitch.tv"));
        assert_eq!(line.command, "RECONNECT");
        assert!(line.params.is_empty());
    }

    #[test]
    fn login_is_lowercased() {
        let line = Line::parse(":Alice!Alice@host PRIVMSG #c :hi").unwrap();
        assert_eq!(line.login.as_deref(), Some("alice"));
    }

    #[test]
    fn privmsg_without_trailing_delimiter_is_not_chat() {
        let line = Line::parse(":a!a@h PRIVMSG #chan").unwrap();
        assert_eq!(line.command, "PRIVMSG");
        assert!(line.trailing.is_none());
        assert!(!line.is_chat());
    }

    #[test]
    fn trailing_preserves_inner_colons() {
        let line = Line::parse(":a!a@h PRIVMSG #chan :see: this :works").unwrap();
        assert_eq!(line.trailing.as_deref(), Some("see: this :works"));
    }

    #[test]
    fn bare_tag_key_yields_empty_value() {
        let line = Line::parse("@solo :a!a@h PRIVMSG #c :x").unwrap();
        assert_eq!(line.tags.get("solo").map(String::as_str), Some(""));
        assert_eq!(line.tag("solo"), None);
    }

    #[test]
    fn empty_and_garbage_lines_are_none() {
        assert!(Line::parse("").is_none());
        assert!(Line::parse("   ").is_none());
        assert!(Line::parse("@only-tags").is_none());
        assert!(Line::parse(":only-prefix").is_none());
    }

    #[test]
    fn ping_line() {
        let line = Line::parse("PING :tmi.twitch.tv").unwrap();
        assert_eq!(line.command, "PING");
        assert_eq!(line.trailing.as_deref(), Some("tmi.twitch.tv"));
    }

    #[test]
    fn numeric_reply_with_params() {
        let line = Line::parse(":tmi.twitch.tv 353 justinfan1 = #chan :justinfan1").unwrap();
        assert_eq!(line.command, "353");
        assert_eq!(line.params, vec!["justinfan1", "=", "#chan"]);
        assert_eq!(line.trailing.as_deref(), Some("justinfan1"));
    }
}
