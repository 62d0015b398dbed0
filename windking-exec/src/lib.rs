//! Windking Execution Layer
//!
//! Ports and test doubles for the decision loop's external collaborators.
//!
//! # Architecture
//!
//! ```text
//! Decision Loop -> BrokerPort    -> venue
//!               -> SignalSource  -> advisor (primary or fallback)
//!               -> TradeLogSink  -> causal trade log
//! ```
//!
//! # Components
//!
//! - **Ports**: Traits for broker, signal source and trade log
//! - **Records**: `OrderAck`, `Advice`, `DecisionRecord` wire types
//! - **Stubs**: In-memory implementations with call journals for tests

#![warn(clippy::all)]

pub mod error;
pub mod ports;
pub mod stub;

// Re-exports for convenience
pub use error::{ExecError, ExecResult};
pub use ports::{
    Advice, BrokerPort, DecisionRecord, OrderAck, OrderStatus, SignalSource, TradeLogSink,
};
pub use stub::{BrokerCall, FailingTradeLog, MemoryTradeLog, ScriptedSignalSource, StubBroker};
