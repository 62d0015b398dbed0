//! Decision Orchestrator
//!
//! Executes admitted Buy/Sell signals against the broker while holding
//! the single-position invariant: at most one open direction per
//! instrument, trailing stop armed exactly when a position is open, and
//! a flip closes the old side strictly before opening the new one.
//!
//! The causal trade log records every executed decision and every
//! meaningful rejection. It never records a HOLD: absence of a record
//! means nothing happened.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use windking_domain::{
    calc_size, calc_sl_tp, InstrumentSpec, Price, RiskConfig, Signal, TrailingStop,
};
use windking_exec::{Advice, BrokerPort, DecisionRecord, OrderStatus, TradeLogSink};
use windking_store::PositionStore;

use crate::config::TradingConfig;
use crate::error::DaemonResult;
use crate::metrics::Metrics;

/// What a signal execution amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Signal was Hold or matched the held direction; nothing done,
    /// nothing recorded
    Unchanged,
    /// Position opened (after a close when flipping)
    Opened,
    /// Computed size fell below the instrument minimum; recorded, no
    /// broker call
    SizeTooSmall,
}

/// Signal executor guarding the single-position invariant.
pub struct DecisionOrchestrator<B: BrokerPort, L: TradeLogSink> {
    broker: Arc<B>,
    log: Arc<L>,
    position: Arc<PositionStore>,
    trailing: Mutex<TrailingStop>,
    metrics: Arc<Metrics>,
    spec: InstrumentSpec,
    risk: RiskConfig,
    trading: TradingConfig,
    /// Set after the first sink failure; later appends are skipped
    log_degraded: AtomicBool,
}

impl<B: BrokerPort, L: TradeLogSink> DecisionOrchestrator<B, L> {
    /// Wire an orchestrator to its collaborators.
    pub fn new(
        broker: Arc<B>,
        log: Arc<L>,
        position: Arc<PositionStore>,
        metrics: Arc<Metrics>,
        spec: InstrumentSpec,
        risk: RiskConfig,
        trading: TradingConfig,
    ) -> Self {
        Self {
            broker,
            log,
            position,
            trailing: Mutex::new(TrailingStop::new()),
            metrics,
            spec,
            risk,
            trading,
            log_degraded: AtomicBool::new(false),
        }
    }

    /// Execute one admitted signal at the given representative price.
    pub async fn execute(&self, advice: &Advice, price: Price) -> DaemonResult<Outcome> {
        let signal = advice.signal;
        if !signal.is_actionable() {
            return Ok(Outcome::Unchanged);
        }

        let held = self.position.get().await;
        if held == Some(signal) {
            debug!(%signal, "Direction already held, nothing to do");
            return Ok(Outcome::Unchanged);
        }

        if let Some(old) = held {
            self.flip_close(old, signal).await;
        }

        // Size from the fixed-percentage stop
        let (stop, _take_profit) = calc_sl_tp(
            price,
            self.trading.sl_pct,
            self.trading.tp_pct,
            signal,
        );
        let Some(size) = calc_size(
            self.risk.capital(),
            self.risk.risk_pct(),
            price,
            stop,
            &self.spec,
        ) else {
            warn!(
                %signal,
                price = %price.as_decimal(),
                stop = %stop.as_decimal(),
                "Computed size below instrument minimum, abandoning order"
            );
            let mut record = self.record_for(advice, price);
            record.stop = Some(stop);
            record.status = OrderStatus::SizeTooSmall;
            self.append(record).await;
            return Ok(Outcome::SizeTooSmall);
        };

        let started = Instant::now();
        let ack = match signal {
            Signal::Buy => self.broker.open_long(Some(size), None).await?,
            Signal::Sell => self.broker.open_short(Some(size), None).await?,
            Signal::Hold => unreachable!("actionable check above"),
        };
        self.metrics
            .order_latency_seconds
            .observe(started.elapsed().as_secs_f64());
        self.metrics
            .orders_total
            .with_label_values(&[&signal.to_string()])
            .inc();

        info!(
            %signal,
            price = %price.as_decimal(),
            size = %size.as_decimal(),
            order_id = %ack.order_id,
            "Position opened"
        );

        // Trailing armed and position recorded together: the invariant
        // holds because only the decision loop calls into here. Once the
        // order filled, a bad trailing percentage must not derail the
        // position update or the causal record.
        let trail_pct = self.trading.trail_sl_pct;
        let mut trail_armed = false;
        if trail_pct > rust_decimal::Decimal::ZERO {
            match self.trailing.lock().await.start(signal, price, trail_pct) {
                Ok(()) => trail_armed = true,
                Err(error) => {
                    warn!(%error, "Could not arm trailing stop, position runs without one");
                }
            }
        }
        self.position.update(signal).await;

        self.report_equity(advice);

        let mut record = self.record_for(advice, price);
        record.size = Some(size);
        record.stop = Some(stop);
        if trail_armed {
            record.trail_sl_pct = Some(trail_pct);
        }
        record.order_id = Some(ack.order_id);
        record.status = ack.status;
        self.append(record).await;

        Ok(Outcome::Opened)
    }

    /// Update the trailing stop with a representative price. Returns
    /// true when the stop fired and the position was flattened; the
    /// caller must then reset its filter and skip signal evaluation for
    /// this price.
    pub async fn check_trailing(&self, price: Price) -> bool {
        let hit = self.trailing.lock().await.update(price);
        if !hit {
            return false;
        }

        self.metrics.trailing_stop_hits_total.inc();
        warn!(price = %price.as_decimal(), "Trailing stop hit, closing position");

        if let Err(error) = self.broker.close_all().await {
            // The venue-side position may survive; the next decision
            // will flip-close it again.
            warn!(%error, "Close after trailing stop failed");
        }
        self.position.reset().await;

        if !self.log_degraded.load(Ordering::Relaxed) {
            if let Err(error) = self.log.mark_last_stop_hit().await {
                warn!(%error, "Could not mark stop hit on trade log");
            }
        }

        true
    }

    /// Whether the trailing stop is currently armed.
    pub async fn trailing_armed(&self) -> bool {
        self.trailing.lock().await.is_armed()
    }

    /// Currently held direction, after lazy expiry.
    pub async fn position(&self) -> Option<Signal> {
        self.position.get().await
    }

    /// Close the opposite side ahead of a flip. A failed close is
    /// counted and logged but does not stop the flip.
    async fn flip_close(&self, old: Signal, new: Signal) {
        info!(%old, %new, "Direction flip, closing current position first");

        if let Err(error) = self.broker.close_all().await {
            self.metrics.flip_close_failures_total.inc();
            error!(%old, %new, %error, "Close before flip failed, proceeding with open");
        }
        self.trailing.lock().await.cancel();
        self.position.reset().await;
    }

    fn record_for(&self, advice: &Advice, price: Price) -> DecisionRecord {
        let mut record = DecisionRecord::new(
            self.broker.symbol(),
            advice.signal,
            price,
            self.broker.leverage(),
        );
        record.prompt = advice.prompt.clone();
        record.extra = advice.extra.clone();
        record
    }

    /// Best-effort append; the first failure flips the sink into
    /// degraded mode and trading continues without a log.
    async fn append(&self, record: DecisionRecord) {
        if self.log_degraded.load(Ordering::Relaxed) {
            debug!(record_id = %record.id, "Trade log degraded, skipping append");
            return;
        }
        if let Err(error) = self.log.append(&record).await {
            self.log_degraded.store(true, Ordering::Relaxed);
            warn!(
                %error,
                "Trade log append failed, continuing without causal log"
            );
        }
    }

    /// Mirror equity from the advice context into the gauge.
    fn report_equity(&self, advice: &Advice) {
        if let Some(equity) = advice.extra.get("equity").and_then(|v| v.as_f64()) {
            self.metrics.equity_usdt.set(equity);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
