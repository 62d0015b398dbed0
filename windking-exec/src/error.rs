//! Execution layer error types.

use thiserror::Error;

/// Errors that can occur at the execution boundary.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Broker communication error
    #[error("Broker error: {0}")]
    Broker(String),

    /// Order was rejected by the broker
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// Signal source error (network, parse, provider outage)
    #[error("Signal source error: {0}")]
    SignalSource(String),

    /// Trade-log sink error
    #[error("Trade log error: {0}")]
    TradeLog(String),

    /// Timeout waiting for an operation
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Domain error
    #[error("Domain error: {0}")]
    Domain(#[from] windking_domain::DomainError),
}

/// Result type for execution operations.
pub type ExecResult<T> = Result<T, ExecError>;
