//! Vote assignment tracking: at most one credited term per participant.

use std::collections::HashMap;

use tallyline_proto::ParticipantKey;

use crate::registry::TermRegistry;

/// Maps each observed participant to the normalized term currently credited
/// to them.
///
/// # Invariant
///
/// At any instant the sum of all registry counters equals the number of
/// distinct participants with a standing assignment, and no participant
/// contributes to more than one counter.
#[derive(Debug, Clone, Default)]
pub struct VoteTracker {
    assignments: HashMap<ParticipantKey, String>,
}

impl VoteTracker {
    /// Empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one chat message from `key` with raw `text`.
    ///
    /// Returns `true` when any counter changed (the caller should re-render).
    ///
    /// - Text that does not normalize to a registered term is ignored
    ///   entirely, even from participants holding an assignment.
    /// - Repeating the current assignment is a no-op (idempotent).
    /// - Switching terms decrements the prior term (floored at 0) before
    ///   crediting the new one.
    pub fn observe(&mut self, registry: &mut TermRegistry, key: ParticipantKey, text: &str) -> bool {
        let norm = TermRegistry::normalize(text);
        if !registry.contains(&norm) {
            return false;
        }

        if self.assignments.get(&key).map(String::as_str) == Some(norm.as_str()) {
            return false;
        }

        if let Some(prior) = self.assignments.get(&key) {
            registry.decrement(prior);
        }

        registry.increment(&norm);
        self.assignments.insert(key, norm);
        true
    }

    /// Zero every counter and discard every assignment.
    ///
    /// Term identities survive; use this for operator resets and as the
    /// mandatory companion to [`TermRegistry::rebuild`].
    pub fn reset(&mut self, registry: &mut TermRegistry) {
        registry.reset_counts();
        self.assignments.clear();
    }

    /// Discard assignments without touching counters.
    ///
    /// Only valid right after a rebuild, which already restarted counts.
    pub fn clear(&mut self) {
        self.assignments.clear();
    }

    /// Number of participants holding an assignment.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether no participant holds an assignment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}
