//! Daemon: the single decision loop.
//!
//! Producers push raw ticks into a bounded queue; one loop drains it
//! through the pipeline stages and hands admitted signals to the
//! orchestrator:
//!
//! ```text
//! ticks -> queue -> aggregator -> trailing check -> direction ->
//!     filter -> significance/dedupe -> signal source -> orchestrator
//! ```
//!
//! # Lifecycle
//!
//! 1. Load configuration
//! 2. Start the metrics server
//! 3. Main loop: queue read with aggregation-window deadline
//! 4. Graceful shutdown on ctrl-c or cancellation
//!
//! Shutdown leaves persisted position state as-is; the daemon never
//! auto-flattens on exit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use windking_domain::{Direction, Price, Signal, Symbol};
use windking_exec::{Advice, BrokerPort, ExecError, SignalSource, TradeLogSink};
use windking_pipeline::{
    DirectionFilter, IntentCache, IntentKey, PriceAggregator, SignificanceGate,
};

use crate::config::Config;
use crate::error::DaemonResult;
use crate::metrics::{start_metrics_server, Metrics};
use crate::orchestrator::DecisionOrchestrator;

// =============================================================================
// Tick Queue
// =============================================================================

/// One raw market tick.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    /// Trade or mark price
    pub price: Price,
    /// Traded volume for the tick; producers without volume report 1
    pub volume: Decimal,
    /// Exchange timestamp
    pub timestamp: DateTime<Utc>,
}

impl Tick {
    /// A tick carrying only a price (volume defaults to 1).
    pub fn at_price(price: Price) -> Self {
        Self {
            price,
            volume: Decimal::ONE,
            timestamp: Utc::now(),
        }
    }
}

/// Producer-side handle to the tick queue.
///
/// Sends block for at most the configured timeout; a full queue drops
/// the tick with a warning rather than stalling ingestion.
#[derive(Clone)]
pub struct TickSender {
    tx: mpsc::Sender<Tick>,
    timeout: Duration,
}

impl TickSender {
    /// Offer a tick to the decision loop.
    pub async fn send(&self, tick: Tick) {
        if let Err(error) = self.tx.send_timeout(tick, self.timeout).await {
            warn!(%error, "Tick queue saturated, dropping tick");
        }
    }
}

// =============================================================================
// Daemon
// =============================================================================

/// The decision loop and its pipeline state.
pub struct Daemon<B: BrokerPort + 'static, L: TradeLogSink + 'static> {
    config: Config,
    orchestrator: Arc<DecisionOrchestrator<B, L>>,
    primary: Arc<dyn SignalSource>,
    fallback: Arc<dyn SignalSource>,
    metrics: Arc<Metrics>,
    shutdown: CancellationToken,

    rx: mpsc::Receiver<Tick>,
    symbol: Symbol,
    aggregator: PriceAggregator,
    filter: DirectionFilter,
    gate: SignificanceGate,
    intents: IntentCache,
    prev_representative: Option<Price>,
    last_volume: Decimal,
}

impl<B: BrokerPort + 'static, L: TradeLogSink + 'static> Daemon<B, L> {
    /// Wire a daemon from its collaborators. Returns the daemon and the
    /// producer handle for its tick queue.
    pub fn new(
        config: Config,
        orchestrator: Arc<DecisionOrchestrator<B, L>>,
        primary: Arc<dyn SignalSource>,
        fallback: Arc<dyn SignalSource>,
        metrics: Arc<Metrics>,
    ) -> DaemonResult<(Self, TickSender)> {
        let symbol = Symbol::from_pair(&config.trading.symbol)?;
        let p = &config.pipeline;

        let (tx, rx) = mpsc::channel(p.queue_capacity);
        let sender = TickSender {
            tx,
            timeout: Duration::from_millis(p.send_timeout_ms),
        };

        let daemon = Self {
            aggregator: PriceAggregator::new(p.pct_trigger),
            filter: DirectionFilter::new(p.n_same, chrono::Duration::seconds(p.throttle_secs)),
            gate: SignificanceGate::new(
                p.price_window,
                p.vol_window,
                p.pct_th,
                p.accel_th,
                p.vol_th,
            ),
            intents: IntentCache::new(chrono::Duration::seconds(p.intent_ttl_secs)),
            config,
            orchestrator,
            primary,
            fallback,
            metrics,
            shutdown: CancellationToken::new(),
            rx,
            symbol,
            prev_representative: None,
            last_volume: Decimal::ONE,
        };
        Ok((daemon, sender))
    }

    /// Token that stops the loop when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the decision loop until shutdown.
    pub async fn run(mut self) -> DaemonResult<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.config.environment,
            symbol = %self.symbol,
            "Starting windking daemon"
        );

        let metrics_addr =
            start_metrics_server(&self.config.metrics, self.metrics.clone()).await?;
        info!(%metrics_addr, "Metrics server started");

        let window = Duration::from_millis(self.config.pipeline.agg_window_ms);
        let mut deadline = Instant::now() + window;

        info!("Entering decision loop");
        loop {
            tokio::select! {
                tick = self.rx.recv() => {
                    match tick {
                        Some(tick) => self.process_tick(tick).await,
                        None => {
                            info!("Tick producers gone, stopping");
                            break;
                        }
                    }
                }

                _ = tokio::time::sleep_until(deadline) => {
                    self.flush_window().await;
                    deadline = Instant::now() + window;
                }

                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        info!("Decision loop stopped, persisted state left as-is");
        Ok(())
    }

    /// Feed one tick through the aggregator; a triggered emission runs
    /// the full decision path.
    pub async fn process_tick(&mut self, tick: Tick) {
        self.last_volume = tick.volume;
        if let Some(representative) = self.aggregator.push(tick.price) {
            self.handle_representative(representative, tick.volume).await;
        }
    }

    /// Close the aggregation window, emitting the buffered price if any.
    pub async fn flush_window(&mut self) {
        if let Some(representative) = self.aggregator.flush() {
            let volume = self.last_volume;
            self.handle_representative(representative, volume).await;
        }
    }

    async fn handle_representative(&mut self, price: Price, volume: Decimal) {
        debug!(price = %price.as_decimal(), "Representative price");

        // Rolling windows see every representative price, whether or
        // not a signal is admitted this round.
        let significant = self.gate.push(price, volume);

        // Trailing stop runs ahead of signal evaluation; on a hit the
        // filter starts over and this price produces no signal.
        if self.orchestrator.check_trailing(price).await {
            self.filter.reset();
            self.prev_representative = Some(price);
            return;
        }

        let candidate = match self.prev_representative {
            Some(previous) => Direction::from_prices(previous, price).as_signal(),
            None => Signal::Hold,
        };
        self.prev_representative = Some(price);

        let Some(admitted) = self.filter.push(candidate) else {
            return;
        };

        let key = IntentKey::new(&self.symbol, admitted, price);
        if self.intents.hit_or_set(&key) {
            debug!(%admitted, "Duplicate intent inside TTL, skipping");
            return;
        }

        let held = self.orchestrator.position().await;
        let advice = self.consult(significant, price, held).await;
        if !advice.signal.is_actionable() {
            return;
        }

        if let Err(error) = self.orchestrator.execute(&advice, price).await {
            error!(%error, "Decision execution failed");
        }
    }

    /// Ask the primary source for significant ticks, the fallback for
    /// the rest. Any failure or timeout holds.
    async fn consult(
        &self,
        significant: bool,
        price: Price,
        held: Option<Signal>,
    ) -> Advice {
        let source = if significant {
            &self.primary
        } else {
            &self.fallback
        };
        self.metrics
            .signal_requests_total
            .with_label_values(&[source.name()])
            .inc();

        let started = Instant::now();
        let result = if significant {
            let deadline = Duration::from_secs(self.config.pipeline.decide_timeout_secs);
            match tokio::time::timeout(deadline, source.decide(price, held)).await {
                Ok(result) => result,
                Err(_) => Err(ExecError::Timeout(format!(
                    "{} exceeded {:?}",
                    source.name(),
                    deadline
                ))),
            }
        } else {
            source.decide(price, held).await
        };
        self.metrics
            .signal_latency_seconds
            .observe(started.elapsed().as_secs_f64());

        match result {
            Ok(advice) => advice,
            Err(error) => {
                warn!(source = source.name(), %error, "Signal source failed, holding");
                Advice::of(Signal::Hold)
            }
        }
    }
}

// =============================================================================
// Stub wiring
// =============================================================================

impl Daemon<windking_exec::StubBroker, windking_exec::MemoryTradeLog> {
    /// Create a daemon wired entirely with stubs (development mode).
    pub async fn new_stub(config: Config) -> DaemonResult<(Self, TickSender)> {
        use rust_decimal_macros::dec;
        use windking_domain::{InstrumentSpec, RiskConfig};
        use windking_exec::{MemoryTradeLog, ScriptedSignalSource, StubBroker};
        use windking_store::PositionStore;

        let symbol = Symbol::from_pair(&config.trading.symbol)?;
        let spec = InstrumentSpec::new(dec!(1), dec!(0.01), dec!(0.01))?;
        let risk = RiskConfig::new(config.trading.capital, config.trading.risk_pct)?;

        let broker = Arc::new(StubBroker::new(symbol, config.trading.leverage, spec));
        let log = Arc::new(MemoryTradeLog::new());
        let position = Arc::new(
            PositionStore::open(
                &config.trading.position_cache,
                chrono::Duration::seconds(config.trading.expire_secs),
            )
            .await,
        );
        let metrics = Arc::new(Metrics::new()?);

        let orchestrator = Arc::new(DecisionOrchestrator::new(
            broker,
            log,
            position,
            metrics.clone(),
            spec,
            risk,
            config.trading.clone(),
        ));

        let primary: Arc<dyn SignalSource> = Arc::new(ScriptedSignalSource::new("primary"));
        let fallback: Arc<dyn SignalSource> = Arc::new(ScriptedSignalSource::new("fallback"));

        Self::new(config, orchestrator, primary, fallback, metrics)
    }
}
