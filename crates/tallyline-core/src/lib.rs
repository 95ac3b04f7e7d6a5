//! Domain state for the chat vote tally engine.
//!
//! Everything here is sans-IO: time arrives as method parameters, randomness
//! comes through the [`env::Environment`] trait, and state machines return
//! signals for a driver to execute. This keeps the counting invariants
//! directly unit-testable with deterministic inputs.

pub mod backoff;
pub mod env;
pub mod registry;
pub mod session;
pub mod tracker;

pub use registry::{TallyEntry, TermRegistry};
pub use session::{Session, SessionConfig, SessionState};
pub use tracker::VoteTracker;
