//! E2E test: the trailing stop flattens a position from inside the loop.
//!
//! Flow:
//! 1. Open a long through the full pipeline (aggregator -> filter ->
//!    fallback source -> orchestrator), arming the 5% trailing stop
//! 2. Price rises: the stop follows the new high silently
//! 3. Price draws down past 5% from the high: the loop closes the
//!    position, marks the causal record and resets the filter
//! 4. The next admitted signal opens a fresh position

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use windking_domain::{InstrumentSpec, Price, RiskConfig, Signal, Symbol};
use windking_exec::{
    BrokerCall, MemoryTradeLog, ScriptedSignalSource, SignalSource, StubBroker,
};
use windking_store::PositionStore;
use windkingd::{Config, Daemon, DecisionOrchestrator, Metrics, Tick};

fn tick(price: Decimal) -> Tick {
    Tick::at_price(Price::new(price).unwrap())
}

#[tokio::test]
async fn test_trailing_stop_e2e() {
    // Single-signal filter, no cooldown, quiet gate, 5% trail
    let mut config = Config::test();
    config.pipeline.n_same = 1;
    config.pipeline.throttle_secs = 0;
    config.pipeline.pct_th = dec!(1000);
    config.pipeline.accel_th = dec!(1000);
    config.pipeline.vol_th = dec!(1000);
    config.trading.trail_sl_pct = dec!(0.05);

    let dir = tempfile::tempdir().unwrap();
    config.trading.position_cache = dir.path().join("position.json");

    let symbol = Symbol::from_pair(&config.trading.symbol).unwrap();
    let spec = InstrumentSpec::new(dec!(1), dec!(0.01), dec!(0.01)).unwrap();
    let risk = RiskConfig::new(config.trading.capital, config.trading.risk_pct).unwrap();

    let broker = Arc::new(StubBroker::new(symbol, config.trading.leverage, spec));
    let log = Arc::new(MemoryTradeLog::new());
    let position = Arc::new(
        PositionStore::open(
            &config.trading.position_cache,
            chrono::Duration::seconds(config.trading.expire_secs),
        )
        .await,
    );
    let metrics = Arc::new(Metrics::new().unwrap());

    let orchestrator = Arc::new(DecisionOrchestrator::new(
        broker.clone(),
        log.clone(),
        position,
        metrics.clone(),
        spec,
        risk,
        config.trading.clone(),
    ));

    let fallback = Arc::new(ScriptedSignalSource::new("fallback"));
    fallback.push_signal(Signal::Buy);

    let (mut daemon, _ticks) = Daemon::new(
        config,
        orchestrator.clone(),
        Arc::new(ScriptedSignalSource::new("primary")) as Arc<dyn SignalSource>,
        fallback.clone() as Arc<dyn SignalSource>,
        metrics,
    )
    .unwrap();

    // Open: 100 emits (Hold), 101 emits an admitted Buy
    daemon.process_tick(tick(dec!(100))).await;
    daemon.process_tick(tick(dec!(101))).await;

    assert_eq!(orchestrator.position().await, Some(Signal::Buy));
    assert!(orchestrator.trailing_armed().await);
    assert_eq!(broker.calls().len(), 1);

    // New high: best moves to 110, no trigger. The Buy it also admits
    // is a duplicate direction and changes nothing.
    fallback.push_signal(Signal::Buy);
    daemon.process_tick(tick(dec!(110))).await;
    assert!(orchestrator.trailing_armed().await);
    assert_eq!(broker.calls().len(), 1);

    // Drawdown (110 - 104) / 110 ~= 5.45% >= 5%: stop fires inside the
    // loop, before any signal evaluation for this price
    daemon.process_tick(tick(dec!(104))).await;

    assert_eq!(orchestrator.position().await, None);
    assert!(!orchestrator.trailing_armed().await);
    assert_eq!(broker.calls(), vec![
        BrokerCall::OpenLong(Some(windking_domain::Quantity::new(dec!(2.97)).unwrap())),
        BrokerCall::CloseAll,
    ]);

    // The causal record of the stopped position is marked
    let records = log.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].trail_sl_hit);

    // Recovery: the filter was reset, so a fresh Buy admits and opens
    fallback.push_signal(Signal::Buy);
    daemon.process_tick(tick(dec!(105))).await;

    assert_eq!(orchestrator.position().await, Some(Signal::Buy));
    assert!(orchestrator.trailing_armed().await);
    assert_eq!(broker.calls().len(), 3);
    assert!(matches!(broker.calls()[2], BrokerCall::OpenLong(_)));
    assert_eq!(log.records().len(), 2);
    assert!(!log.records()[1].trail_sl_hit);
}
