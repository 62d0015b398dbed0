//! Stub implementations for testing.
//!
//! These implementations simulate broker, signal-source and trade-log
//! behavior without touching the network. The broker keeps an ordered
//! call journal so tests can assert sequencing (close strictly before
//! open on a flip).

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::RwLock;

use windking_domain::{InstrumentSpec, Price, Quantity, Signal, Symbol};

use crate::error::ExecError;
use crate::ports::{
    Advice, BrokerPort, DecisionRecord, OrderAck, OrderStatus, SignalSource, TradeLogSink,
};

// =============================================================================
// Stub Broker
// =============================================================================

/// One entry in the stub broker's call journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerCall {
    /// `open_long` was called with this quantity
    OpenLong(Option<Quantity>),
    /// `open_short` was called with this quantity
    OpenShort(Option<Quantity>),
    /// `close_all` was called
    CloseAll,
}

/// Stub broker for testing.
///
/// Fills immediately, validates sizes against the instrument spec the
/// way a real venue would, and journals every call in order.
pub struct StubBroker {
    symbol: Symbol,
    leverage: u8,
    spec: InstrumentSpec,
    /// Ordered journal of every call received
    calls: RwLock<Vec<BrokerCall>>,
    /// Order counter for generating IDs
    order_counter: RwLock<u64>,
    /// Whether to fail the next open
    fail_next_open: RwLock<bool>,
    /// Whether to fail the next close
    fail_next_close: RwLock<bool>,
}

impl StubBroker {
    /// Create a stub broker for the given instrument.
    pub fn new(symbol: Symbol, leverage: u8, spec: InstrumentSpec) -> Self {
        Self {
            symbol,
            leverage,
            spec,
            calls: RwLock::new(Vec::new()),
            order_counter: RwLock::new(0),
            fail_next_open: RwLock::new(false),
            fail_next_close: RwLock::new(false),
        }
    }

    /// Configure the next open to fail.
    pub fn set_fail_next_open(&self, fail: bool) {
        *self.fail_next_open.write().unwrap() = fail;
    }

    /// Configure the next close to fail.
    pub fn set_fail_next_close(&self, fail: bool) {
        *self.fail_next_close.write().unwrap() = fail;
    }

    /// Snapshot of the call journal.
    pub fn calls(&self) -> Vec<BrokerCall> {
        self.calls.read().unwrap().clone()
    }

    fn journal(&self, call: BrokerCall) {
        self.calls.write().unwrap().push(call);
    }

    fn next_order_id(&self) -> String {
        let mut counter = self.order_counter.write().unwrap();
        *counter += 1;
        format!("STUB-{}", *counter)
    }

    fn take_flag(flag: &RwLock<bool>) -> bool {
        let mut guard = flag.write().unwrap();
        std::mem::take(&mut *guard)
    }

    /// Venue-style size validation: below minimum or off the lot grid
    /// is a rejection, not a silent adjustment.
    fn validate_size(&self, qty: Option<Quantity>) -> Result<(), ExecError> {
        let Some(qty) = qty else { return Ok(()) };
        let qty = qty.as_decimal();
        if qty < self.spec.min_sz {
            return Err(ExecError::OrderRejected(format!(
                "SIZE_TOO_SMALL: {} < min {}",
                qty, self.spec.min_sz
            )));
        }
        if !(qty % self.spec.lot_sz).is_zero() {
            return Err(ExecError::OrderRejected(format!(
                "size {} not a multiple of lot {}",
                qty, self.spec.lot_sz
            )));
        }
        Ok(())
    }

    fn open(&self, call: BrokerCall, qty: Option<Quantity>) -> Result<OrderAck, ExecError> {
        self.journal(call);

        if Self::take_flag(&self.fail_next_open) {
            return Err(ExecError::Broker("Simulated open failure".to_string()));
        }
        self.validate_size(qty)?;

        Ok(OrderAck {
            order_id: self.next_order_id(),
            status: OrderStatus::Filled,
        })
    }
}

#[async_trait]
impl BrokerPort for StubBroker {
    async fn open_long(
        &self,
        qty: Option<Quantity>,
        _limit: Option<Price>,
    ) -> Result<OrderAck, ExecError> {
        self.open(BrokerCall::OpenLong(qty), qty)
    }

    async fn open_short(
        &self,
        qty: Option<Quantity>,
        _limit: Option<Price>,
    ) -> Result<OrderAck, ExecError> {
        self.open(BrokerCall::OpenShort(qty), qty)
    }

    async fn close_all(&self) -> Result<(), ExecError> {
        self.journal(BrokerCall::CloseAll);

        if Self::take_flag(&self.fail_next_close) {
            return Err(ExecError::Broker("Simulated close failure".to_string()));
        }
        tracing::debug!(symbol = %self.symbol, "Stub: positions closed");
        Ok(())
    }

    fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    fn leverage(&self) -> u8 {
        self.leverage
    }
}

// =============================================================================
// Scripted Signal Source
// =============================================================================

/// Signal source that replays a prepared script of outcomes.
///
/// Each `decide` call pops the next scripted outcome; an exhausted
/// script holds.
pub struct ScriptedSignalSource {
    name: &'static str,
    script: RwLock<VecDeque<Result<Advice, ExecError>>>,
}

impl ScriptedSignalSource {
    /// Create an empty source (always holds).
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            script: RwLock::new(VecDeque::new()),
        }
    }

    /// Queue a successful advice.
    pub fn push_advice(&self, advice: Advice) {
        self.script.write().unwrap().push_back(Ok(advice));
    }

    /// Queue a bare signal.
    pub fn push_signal(&self, signal: Signal) {
        self.push_advice(Advice::of(signal));
    }

    /// Queue a failure.
    pub fn push_error(&self, message: &str) {
        self.script
            .write()
            .unwrap()
            .push_back(Err(ExecError::SignalSource(message.to_string())));
    }
}

#[async_trait]
impl SignalSource for ScriptedSignalSource {
    async fn decide(
        &self,
        _price: Price,
        _position: Option<Signal>,
    ) -> Result<Advice, ExecError> {
        self.script
            .write()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Advice::of(Signal::Hold)))
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

// =============================================================================
// Trade Log Stubs
// =============================================================================

/// In-memory trade log for testing.
pub struct MemoryTradeLog {
    records: RwLock<Vec<DecisionRecord>>,
}

impl MemoryTradeLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of the appended records.
    pub fn records(&self) -> Vec<DecisionRecord> {
        self.records.read().unwrap().clone()
    }
}

impl Default for MemoryTradeLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TradeLogSink for MemoryTradeLog {
    async fn append(&self, record: &DecisionRecord) -> Result<(), ExecError> {
        self.records.write().unwrap().push(record.clone());
        Ok(())
    }

    async fn mark_last_stop_hit(&self) -> Result<(), ExecError> {
        let mut records = self.records.write().unwrap();
        match records.last_mut() {
            Some(last) => {
                last.trail_sl_hit = true;
                Ok(())
            }
            None => Err(ExecError::TradeLog("no record to mark".to_string())),
        }
    }
}

/// Trade log that always fails, for exercising the degraded path.
pub struct FailingTradeLog;

#[async_trait]
impl TradeLogSink for FailingTradeLog {
    async fn append(&self, _record: &DecisionRecord) -> Result<(), ExecError> {
        Err(ExecError::TradeLog("Simulated log failure".to_string()))
    }

    async fn mark_last_stop_hit(&self) -> Result<(), ExecError> {
        Err(ExecError::TradeLog("Simulated log failure".to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
