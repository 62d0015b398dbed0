//! Windking Daemon Library
//!
//! Runtime for the tick-to-decision trading loop.
//!
//! # Architecture
//!
//! ```text
//! producers -> TickSender -> Daemon (pipeline stages)
//!                               |
//!                     DecisionOrchestrator -> broker / trade log
//!                               |
//!                        Metrics (/metrics, /health)
//! ```
//!
//! # Components
//!
//! - **Daemon**: the single decision loop and its bounded tick queue
//! - **DecisionOrchestrator**: signal execution under the
//!   single-position invariant
//! - **Metrics**: Prometheus registry and its axum endpoint
//! - **Config**: environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use windkingd::{Config, Daemon};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("Failed to load config");
//!     let (daemon, ticks) = Daemon::new_stub(config).await.expect("wiring");
//!     daemon.run().await.expect("Daemon error");
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod daemon;
pub mod error;
pub mod metrics;
pub mod orchestrator;

// Re-exports for convenience
pub use config::{Config, Environment, MetricsConfig, PipelineConfig, TradingConfig};
pub use daemon::{Daemon, Tick, TickSender};
pub use error::{DaemonError, DaemonResult};
pub use metrics::Metrics;
pub use orchestrator::{DecisionOrchestrator, Outcome};
