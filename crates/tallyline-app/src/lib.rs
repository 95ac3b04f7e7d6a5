//! Production runtime for the chat vote tally.
//!
//! This crate provides the glue that wraps the Sans-IO
//! [`Engine`](tallyline_client::Engine) with real I/O: a Tokio task that
//! owns the WebSocket transport and the backoff/rejoin timers, executes
//! the engine's actions, and publishes status and tally snapshots on
//! watch channels.
//!
//! # Components
//!
//! - [`Runtime`]: Tokio event loop executing engine actions
//! - [`EngineHandle`]: cloneable control surface for callers
//! - [`tallyline_core::env::SystemEnv`]: production environment (real time,
//!   thread RNG)

mod handle;
mod runtime;

pub use handle::{ControlError, EngineHandle};
pub use runtime::{Runtime, RuntimeConfig};
