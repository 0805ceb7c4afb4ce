//! Courier - push notification relay
//!
//! # Usage
//!
//! ```bash
//! # HTTP front-end
//! courier api --config configs/courier.toml
//!
//! # Pub/sub broker forwarder
//! courier broker
//!
//! # Edge node holding live client connections
//! courier edge
//! ```
//!
//! All three roles read the same configuration file; each uses its own
//! section plus `[storage]` and `[log]`.

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Courier - push notification relay
#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP front-end
    Api,

    /// Run the pub/sub broker forwarder
    Broker,

    /// Run an edge node holding live client connections
    Edge,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = cmd::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Api => cmd::api::run(config).await,
        Command::Broker => cmd::broker::run(config).await,
        Command::Edge => cmd::edge::run(config).await,
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}
