//! Term registry: configured terms, canonical casing, and current counts.

use std::collections::HashMap;

/// One operator-configured term.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Term {
    /// Canonical display casing (last-seen wins on duplicate input).
    display: String,
    /// Lowercased, trimmed form used for matching.
    norm: String,
    /// Current vote count.
    count: u64,
}

/// Rendered counter entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyEntry {
    /// Canonical display form.
    pub term: String,
    /// Current count.
    pub count: u64,
}

/// The configured term set with a case-insensitive lookup and live counts.
///
/// # Invariants
///
/// - Normalized forms are unique within the registry.
/// - Counts never go negative (decrement floors at 0).
/// - Registration order is stable: snapshot ties break by the order a term
///   first appeared in the operator's list.
#[derive(Debug, Clone, Default)]
pub struct TermRegistry {
    terms: Vec<Term>,
    index: HashMap<String, usize>,
}

impl TermRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trim surrounding whitespace and lowercase.
    ///
    /// Used for both registry keys and incoming message comparison.
    #[must_use]
    pub fn normalize(text: &str) -> String {
        text.trim().to_lowercase()
    }

    /// Replace the entire registry from a comma-separated operator string.
    ///
    /// Entries are trimmed; empty entries are dropped; case-insensitive
    /// duplicates collapse to one term keeping the last-seen casing. All
    /// counts restart at 0.
    ///
    /// Standing assignments refer to a registry that no longer exists, so
    /// callers must clear their [`VoteTracker`](crate::VoteTracker).
    pub fn rebuild(&mut self, raw: &str) {
        self.terms.clear();
        self.index.clear();

        for entry in raw.split(',') {
            let display = entry.trim();
            if display.is_empty() {
                continue;
            }
            let norm = Self::normalize(display);
            if let Some(&pos) = self.index.get(&norm) {
                // Last write wins on the casing; position stays stable.
                self.terms[pos].display = display.to_owned();
            } else {
                self.index.insert(norm.clone(), self.terms.len());
                self.terms.push(Term { display: display.to_owned(), norm, count: 0 });
            }
        }
    }

    /// Canonical display form for an exact normalized match.
    ///
    /// Matching is whole-message: the normalized text must equal a
    /// registered term exactly, not contain one.
    #[must_use]
    pub fn canonical(&self, normalized: &str) -> Option<&str> {
        self.index.get(normalized).map(|&pos| self.terms[pos].display.as_str())
    }

    /// Whether `normalized` names a registered term.
    #[must_use]
    pub fn contains(&self, normalized: &str) -> bool {
        self.index.contains_key(normalized)
    }

    /// Increment a term's count. Unknown terms are a no-op.
    pub fn increment(&mut self, normalized: &str) {
        if let Some(&pos) = self.index.get(normalized) {
            self.terms[pos].count += 1;
        }
    }

    /// Decrement a term's count, floored at 0. Unknown terms are a no-op.
    pub fn decrement(&mut self, normalized: &str) {
        if let Some(&pos) = self.index.get(normalized) {
            self.terms[pos].count = self.terms[pos].count.saturating_sub(1);
        }
    }

    /// Zero all counts. Term identities are untouched.
    pub fn reset_counts(&mut self) {
        for term in &mut self.terms {
            term.count = 0;
        }
    }

    /// Counters ordered by count descending, ties by registration order.
    ///
    /// Read-only projection for rendering.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TallyEntry> {
        let mut entries: Vec<TallyEntry> = self
            .terms
            .iter()
            .map(|t| TallyEntry { term: t.display.clone(), count: t.count })
            .collect();
        // Stable sort preserves registration order among equal counts.
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries
    }

    /// Sum of all counters.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.terms.iter().map(|t| t.count).sum()
    }

    /// Number of registered terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether no terms are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
