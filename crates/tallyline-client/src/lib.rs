//! Session engine for the chat vote tally.
//!
//! [`Engine`] is the top-level state machine: the driver feeds it typed
//! [`EngineEvent`]s (control requests, transport lifecycle, inbound lines,
//! time ticks) and executes the [`EngineAction`]s it returns (transport
//! I/O, timer scheduling, status and tally publication). The engine itself
//! performs no I/O, so every protocol and counting behavior is testable
//! with a deterministic environment.

mod engine;
mod event;

#[cfg(feature = "transport")]
pub mod transport;

pub use engine::{Engine, EngineConfig, GATEWAY_URL};
pub use event::{EngineAction, EngineEvent};
