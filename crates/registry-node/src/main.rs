//! # Agent Registry Node
//!
//! Serves the identity registry over a JSON-lines protocol on stdin/stdout.
//! Logs go to stderr so stdout carries only protocol replies.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`RUST_LOG`, default `info`)
//! 2. Load configuration from environment
//! 3. Warn if the configuration is not production-ready
//! 4. Open the ledger and serve commands until EOF or Ctrl+C

use anyhow::{Context, Result};
use registry_node::{load_config, RegistryNode};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to initialize logging")
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = load_config().context("Failed to load configuration")?;
    if let Err(e) = config.validate_for_production() {
        warn!("{}", e);
    }

    let node = RegistryNode::new(&config).context("Failed to start registry node")?;
    info!("Registry node is running. Reading commands from stdin.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    info!("stdin closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let reply = node.handle_line(&line);
                stdout.write_all(reply.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Shutdown complete");
    Ok(())
}
