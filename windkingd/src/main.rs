//! Windking Daemon
//!
//! Tick-to-decision trading loop with stub collaborators.
//!
//! # Usage
//!
//! ```bash
//! # Start with default configuration
//! cargo run -p windkingd
//!
//! # Start with custom environment
//! WINDKING_ENV=test WINDKING_METRICS_PORT=9110 cargo run -p windkingd
//! ```
//!
//! # Environment Variables
//!
//! - `WINDKING_ENV`: Environment (test, development, production)
//! - `WINDKING_SYMBOL`: Instrument (default: ETH-USDT)
//! - `WINDKING_CAPITAL`: Account capital (default: 300)
//! - `WINDKING_RISK_PCT`: Risk per trade (default: 0.01)
//! - `WINDKING_PCT_TRIGGER`: Aggregator trigger (default: 0.003)
//! - `WINDKING_METRICS_HOST`/`WINDKING_METRICS_PORT`: Metrics endpoint

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use windkingd::{Config, Daemon};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("windkingd=info".parse()?))
        .init();

    // Load configuration
    let config = Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        symbol = %config.trading.symbol,
        metrics_host = %config.metrics.host,
        metrics_port = config.metrics.port,
        "Windking Daemon"
    );

    // Create and run daemon
    let (daemon, _ticks) = Daemon::new_stub(config).await?;
    daemon.run().await?;

    Ok(())
}
