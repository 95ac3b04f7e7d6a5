//! Property-based tests for the engine state machine.
//!
//! The engine sits between an operator and an uncontrolled network peer, so
//! it must absorb any interleaving of control requests, transport lifecycle
//! changes, and inbound lines without panicking, and its published tally
//! must always be internally consistent.

use std::time::Instant;

use proptest::prelude::*;
use tallyline_client::{Engine, EngineConfig, EngineEvent};
use tallyline_core::env::test_utils::MockEnv;

#[derive(Debug, Clone)]
enum Script {
    Connect,
    Disconnect,
    Reset,
    UpdateTerms,
    Opened,
    Closed,
    Failed,
    BackoffElapsed,
    RejoinDue,
    Tick,
    Online,
    Offline,
    Line(String),
}

fn script_strategy() -> impl Strategy<Value = Script> {
    prop_oneof![
        2 => Just(Script::Connect),
        1 => Just(Script::Disconnect),
        1 => Just(Script::Reset),
        1 => Just(Script::UpdateTerms),
        2 => Just(Script::Opened),
        2 => Just(Script::Closed),
        1 => Just(Script::Failed),
        1 => Just(Script::BackoffElapsed),
        1 => Just(Script::RejoinDue),
        1 => Just(Script::Tick),
        1 => Just(Script::Online),
        1 => Just(Script::Offline),
        4 => "\\PC{0,80}".prop_map(Script::Line),
        2 => ("[0-9]{1,4}", "[a-z]{1,8}", "(yes|no|maybe|junk)").prop_map(
            |(id, login, text)| Script::Line(format!(
                "@user-id={id} :{login}!{login}@h PRIVMSG #chan :{text}"
            ))
        ),
    ]
}

fn event(script: Script, now: Instant) -> EngineEvent<Instant> {
    match script {
        Script::Connect => {
            EngineEvent::Connect { channel: "chan".to_owned(), terms: "yes,no".to_owned() }
        },
        Script::Disconnect => EngineEvent::Disconnect,
        Script::Reset => EngineEvent::Reset,
        Script::UpdateTerms => {
            EngineEvent::UpdateTerms { channel: None, terms: "yes,no,maybe".to_owned() }
        },
        Script::Opened => EngineEvent::TransportOpened { now },
        Script::Closed => EngineEvent::TransportClosed,
        Script::Failed => EngineEvent::TransportFailed { reason: "io".to_owned() },
        Script::BackoffElapsed => EngineEvent::BackoffElapsed,
        Script::RejoinDue => EngineEvent::RejoinDue,
        Script::Tick => EngineEvent::Tick { now },
        Script::Online => EngineEvent::NetworkOnline,
        Script::Offline => EngineEvent::NetworkOffline,
        Script::Line(raw) => EngineEvent::LineReceived { raw, now },
    }
}

proptest! {
    /// Any interleaving of events is absorbed without panicking, and the
    /// tally stays consistent: counts bounded by the number of distinct
    /// chatters the script can produce, snapshot sorted descending.
    #[test]
    fn engine_absorbs_any_event_sequence(scripts in prop::collection::vec(script_strategy(), 0..120)) {
        let mut engine = Engine::new(MockEnv::new(), EngineConfig::default());
        let now = Instant::now();

        for (seen, script) in scripts.into_iter().enumerate() {
            let _ = engine.handle(event(script, now));

            let tally = engine.tally();
            for pair in tally.windows(2) {
                prop_assert!(pair[0].count >= pair[1].count);
            }
            // Each event credits at most one new participant.
            let total: u64 = tally.iter().map(|e| e.count).sum();
            prop_assert!(total <= (seen as u64) + 1);
        }
    }
}
