//! Windking Pipeline Layer
//!
//! The synchronous stream stages between raw ticks and the decision
//! orchestrator:
//!
//! ```text
//! ticks -> PriceAggregator -> DirectionFilter -> SignificanceGate/IntentCache -> orchestrator
//! ```
//!
//! Every stage here is clockless or takes an explicit `now`, so the whole
//! chain is unit-testable without a runtime. Window timing and queueing
//! live in the daemon.

#![warn(clippy::all)]

pub mod aggregator;
pub mod filter;
pub mod intent;
pub mod significance;

// Re-exports for convenience
pub use aggregator::PriceAggregator;
pub use filter::DirectionFilter;
pub use intent::{IntentCache, IntentKey};
pub use significance::SignificanceGate;
