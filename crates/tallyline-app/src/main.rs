//! Chat vote tally binary.
//!
//! # Usage
//!
//! ```bash
//! # Count "yes" vs "no" in a channel's chat
//! tallyline --channel somechannel
//!
//! # Custom term list
//! tallyline --channel somechannel --terms "rust,go,zig"
//! ```
//!
//! Runs until interrupted; status changes and tally updates are logged.

use clap::Parser;
use tallyline_app::{Runtime, RuntimeConfig};
use tallyline_client::EngineConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Anonymous chat vote tally
#[derive(Parser, Debug)]
#[command(name = "tallyline")]
#[command(about = "Tallies one vote per chatter for a fixed list of terms")]
#[command(version)]
struct Args {
    /// Channel whose chat to join
    #[arg(short, long)]
    channel: String,

    /// Comma-separated list of vote terms
    #[arg(short, long, default_value = "yes,no")]
    terms: String,

    /// Chat gateway WebSocket URL
    #[arg(long, default_value = tallyline_client::GATEWAY_URL)]
    url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("tallyline starting");

    let config = RuntimeConfig {
        engine: EngineConfig { gateway_url: args.url, ..Default::default() },
        ..Default::default()
    };
    let (runtime, handle) = Runtime::new(config);
    let runtime_task = tokio::spawn(runtime.run());

    handle.connect(args.channel, args.terms).await?;

    let mut status = handle.status();
    let mut tally = handle.tally();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received; disconnecting");
                handle.disconnect().await?;
                break;
            },
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let line = status.borrow_and_update().clone();
                tracing::info!(status = %line);
            },
            changed = tally.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = tally.borrow_and_update().clone();
                for entry in &snapshot {
                    tracing::info!(term = %entry.term, count = entry.count);
                }
            },
        }
    }

    drop(handle);
    runtime_task.await?;

    Ok(())
}
