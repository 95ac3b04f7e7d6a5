//! Property-based tests for the counting invariants.
//!
//! The central invariant: for any sequence of observations, the sum of all
//! counters equals the number of distinct participants whose latest message
//! matched a registered term (and was not wiped by a reset), and no counter
//! ever dips below zero.

use proptest::prelude::*;
use tallyline_core::{TermRegistry, VoteTracker, backoff};
use tallyline_proto::ParticipantKey;

/// One step in a generated observation sequence.
#[derive(Debug, Clone)]
enum Step {
    /// Participant index says term index (or off-registry text).
    Observe { participant: u8, term: u8 },
    /// Operator reset.
    Reset,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        8 => (any::<u8>(), any::<u8>()).prop_map(|(participant, term)| Step::Observe {
            participant: participant % 8,
            term,
        }),
        1 => Just(Step::Reset),
    ]
}

proptest! {
    #[test]
    fn counter_sum_tracks_assigned_participants(steps in prop::collection::vec(step_strategy(), 0..200)) {
        let mut registry = TermRegistry::new();
        registry.rebuild("alpha,beta,gamma,delta");
        let mut tracker = VoteTracker::new();

        for step in steps {
            match step {
                Step::Observe { participant, term } => {
                    let key = ParticipantKey::Login(format!("viewer{participant}"));
                    // Indexes beyond the registry produce unmatched text.
                    let text = match term % 6 {
                        0 => "alpha",
                        1 => "beta",
                        2 => "gamma",
                        3 => "delta",
                        4 => "off-topic chatter",
                        _ => "ALPHA extra words",
                    };
                    tracker.observe(&mut registry, key, text);
                },
                Step::Reset => tracker.reset(&mut registry),
            }

            prop_assert_eq!(registry.total(), tracker.len() as u64);
            for entry in registry.snapshot() {
                prop_assert!(entry.count <= tracker.len() as u64);
            }
        }
    }

    /// Observing the same text twice in a row never changes counts after the
    /// first call.
    #[test]
    fn observe_is_idempotent(participant in 0u8..8, term in 0u8..4) {
        let mut registry = TermRegistry::new();
        registry.rebuild("alpha,beta,gamma,delta");
        let mut tracker = VoteTracker::new();

        let key = ParticipantKey::Login(format!("viewer{participant}"));
        let text = ["alpha", "beta", "gamma", "delta"][term as usize];

        tracker.observe(&mut registry, key.clone(), text);
        let before = registry.snapshot();
        let changed = tracker.observe(&mut registry, key, text);

        prop_assert!(!changed);
        prop_assert_eq!(registry.snapshot(), before);
    }

    /// Backoff delay for attempt `n` lies in
    /// `[min(1000*2^n, 30000), min(1000*2^n, 30000) + 1000)` milliseconds.
    #[test]
    fn backoff_delay_in_bounds(attempt in 0u32..64, entropy in any::<u64>()) {
        let delay = backoff::reconnect_delay(attempt, entropy);
        let base = 1000u128.checked_shl(attempt).unwrap_or(u128::MAX).min(30_000);
        prop_assert!(delay.as_millis() >= base);
        prop_assert!(delay.as_millis() < base + 1000);
    }
}
