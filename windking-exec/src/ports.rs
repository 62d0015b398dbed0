//! Execution layer port definitions.
//!
//! Ports define the interfaces the decision loop depends on: a broker
//! capability, a signal source capability, and a causal trade-log sink.
//! Adapters implement these ports for specific services; stubs implement
//! them for tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use windking_domain::{Price, Quantity, Signal, Symbol};

use crate::error::ExecError;

// =============================================================================
// Broker Port
// =============================================================================

/// Port for position operations against a broker account.
///
/// The broker owns the instrument and leverage it trades; callers only
/// choose a side and optionally a size. `close_all` flattens whatever is
/// open for the instrument.
///
/// Implementations:
/// - `StubBroker` - For testing (immediate fills, size validation)
#[async_trait]
pub trait BrokerPort: Send + Sync {
    /// Open a long position.
    ///
    /// `qty` of `None` lets the broker use its account default size.
    /// `limit` of `None` places a market order.
    async fn open_long(
        &self,
        qty: Option<Quantity>,
        limit: Option<Price>,
    ) -> Result<OrderAck, ExecError>;

    /// Open a short position. Same size/limit semantics as `open_long`.
    async fn open_short(
        &self,
        qty: Option<Quantity>,
        limit: Option<Price>,
    ) -> Result<OrderAck, ExecError>;

    /// Close every open position on the broker's instrument.
    async fn close_all(&self) -> Result<(), ExecError>;

    /// The instrument this broker trades.
    fn symbol(&self) -> &Symbol;

    /// Account leverage multiplier.
    fn leverage(&self) -> u8;
}

/// Broker acknowledgement of an accepted order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAck {
    /// Broker-assigned order ID
    pub order_id: String,
    /// Terminal status reported by the broker
    pub status: OrderStatus,
}

/// Terminal status of a decision's order leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order accepted and filled
    Filled,
    /// Computed size fell below the instrument minimum; no order sent
    SizeTooSmall,
    /// Broker refused the order
    Rejected,
}

// =============================================================================
// Signal Source Port
// =============================================================================

/// Port for side advice given current price and position.
///
/// Two implementations run side by side in the daemon: an expensive
/// primary consulted only for significant ticks, and a cheap fallback
/// for the rest.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Advise a side for the given price and currently held direction.
    async fn decide(
        &self,
        price: Price,
        position: Option<Signal>,
    ) -> Result<Advice, ExecError>;

    /// Short identifier for log fields.
    fn name(&self) -> &'static str;
}

/// Advice returned by a signal source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advice {
    /// Recommended side
    pub signal: Signal,
    /// The query that produced the advice, when the source has one
    pub prompt: Option<String>,
    /// Free-form source context (model metadata, account equity, ...)
    pub extra: serde_json::Value,
}

impl Advice {
    /// A bare recommendation with no context.
    pub fn of(signal: Signal) -> Self {
        Self {
            signal,
            prompt: None,
            extra: serde_json::Value::Null,
        }
    }
}

// =============================================================================
// Trade Log Port
// =============================================================================

/// Port for the causal trade log.
///
/// The log records every executed decision and every meaningful
/// rejection; it never records a HOLD. Appends are best-effort from the
/// caller's point of view: the decision loop warns and continues when a
/// sink fails.
#[async_trait]
pub trait TradeLogSink: Send + Sync {
    /// Append one decision record.
    async fn append(&self, record: &DecisionRecord) -> Result<(), ExecError>;

    /// Mark the most recently appended record as closed by the trailing
    /// stop.
    async fn mark_last_stop_hit(&self) -> Result<(), ExecError>;
}

/// One unit of the causal trade log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Time-ordered record ID
    pub id: Uuid,
    /// When the decision was taken
    pub timestamp: DateTime<Utc>,
    /// Instrument
    pub symbol: String,
    /// Executed side
    pub signal: Signal,
    /// Representative price at decision time
    pub price: Price,
    /// Order size, when one was computed
    pub size: Option<Quantity>,
    /// Stop-loss price, when one was computed
    pub stop: Option<Price>,
    /// Account leverage at execution
    pub leverage: u8,
    /// Trailing-stop drawdown fraction, when armed
    pub trail_sl_pct: Option<Decimal>,
    /// Broker order ID, absent for rejections
    pub order_id: Option<String>,
    /// Terminal status
    pub status: OrderStatus,
    /// Signal-source prompt, when the source had one
    pub prompt: Option<String>,
    /// Free-form decision context
    pub extra: serde_json::Value,
    /// Set retroactively when the trailing stop closes this position
    pub trail_sl_hit: bool,
}

impl DecisionRecord {
    /// Start a record for an executed or rejected decision.
    pub fn new(symbol: &Symbol, signal: Signal, price: Price, leverage: u8) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            symbol: symbol.as_pair(),
            signal,
            price,
            size: None,
            stop: None,
            leverage,
            trail_sl_pct: None,
            order_id: None,
            status: OrderStatus::Rejected,
            prompt: None,
            extra: serde_json::Value::Null,
            trail_sl_hit: false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
