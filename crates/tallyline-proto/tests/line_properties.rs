//! Property-based tests for line decoding.
//!
//! Chat traffic comes from an uncontrolled third party, so the parser must
//! be total: any input either decodes or yields `None`, and decoded fields
//! always uphold the documented invariants.

use proptest::prelude::*;
use tallyline_proto::{Line, ParticipantKey};

proptest! {
    /// Decoding never panics, whatever bytes arrive on the wire.
    #[test]
    fn parse_is_total(raw in "\\PC*") {
        let _ = Line::parse(&raw);
    }

    /// A decoded line never has an empty command, and its login (when
    /// present) is already lowercase.
    #[test]
    fn decoded_invariants(raw in "\\PC{0,200}") {
        if let Some(line) = Line::parse(&raw) {
            prop_assert!(!line.command.is_empty());
            if let Some(login) = &line.login {
                prop_assert_eq!(login.clone(), login.to_lowercase());
            }
        }
    }

    /// Well-formed tagged chat lines round-trip their parts.
    #[test]
    fn chat_line_roundtrip(
        user_id in "[0-9]{1,9}",
        login in "[a-z][a-z0-9_]{0,15}",
        chan in "[a-z][a-z0-9_]{0,15}",
        text in "[^\r\n\0]{1,50}",
    ) {
        let raw = format!("@user-id={user_id} :{login}!{login}@{login}.host PRIVMSG #{chan} :{text}");
        let line = Line::parse(&raw).unwrap();

        prop_assert!(line.is_chat());
        prop_assert_eq!(line.trailing.as_deref(), Some(text.as_str()));
        prop_assert_eq!(line.login.as_deref(), Some(login.as_str()));
        prop_assert_eq!(
            ParticipantKey::from_line(&line),
            Some(ParticipantKey::Id(user_id))
        );
    }

    /// Tag parsing degrades gracefully: arbitrary tag blocks never prevent
    /// the rest of the line from decoding.
    #[test]
    fn malformed_tags_do_not_block_parse(tags in "[a-z=;-]{0,40}") {
        let raw = format!("@{tags} :a!a@h PRIVMSG #c :x");
        let line = Line::parse(&raw).unwrap();
        prop_assert_eq!(line.command.as_str(), "PRIVMSG");
        prop_assert_eq!(line.trailing.as_deref(), Some("x"));
    }
}
