//! Prometheus metrics and their HTTP endpoint.
//!
//! One `Metrics` struct owns the registry and every instrument the
//! decision loop updates; handlers only read. Served by axum on a
//! spawned task (`/metrics` text encoding, `/health`).

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use prometheus::{
    Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::error;

use crate::config::MetricsConfig;
use crate::error::{DaemonError, DaemonResult};

// =============================================================================
// Metrics
// =============================================================================

/// All daemon instruments, registered on one registry.
pub struct Metrics {
    registry: Registry,

    /// Orders placed, labelled by side (`BUY`/`SELL`)
    pub orders_total: IntCounterVec,
    /// Positions closed by the trailing stop
    pub trailing_stop_hits_total: IntCounter,
    /// Signal-source calls, labelled by source name
    pub signal_requests_total: IntCounterVec,
    /// Failed closes during a direction flip
    pub flip_close_failures_total: IntCounter,
    /// Broker round-trip latency
    pub order_latency_seconds: Histogram,
    /// Signal-source round-trip latency
    pub signal_latency_seconds: Histogram,
    /// Last reported account equity
    pub equity_usdt: Gauge,
}

impl Metrics {
    /// Build and register every instrument.
    pub fn new() -> DaemonResult<Self> {
        let registry = Registry::new();

        let orders_total = IntCounterVec::new(
            Opts::new("orders_total", "Orders placed, by side"),
            &["side"],
        )?;
        let trailing_stop_hits_total = IntCounter::new(
            "trailing_stop_hits_total",
            "Positions closed by the trailing stop",
        )?;
        let signal_requests_total = IntCounterVec::new(
            Opts::new("signal_requests_total", "Signal-source calls, by source"),
            &["source"],
        )?;
        let flip_close_failures_total = IntCounter::new(
            "flip_close_failures_total",
            "Failed closes during a direction flip",
        )?;
        let order_latency_seconds = Histogram::with_opts(HistogramOpts::new(
            "order_latency_seconds",
            "Broker round-trip latency",
        ))?;
        let signal_latency_seconds = Histogram::with_opts(HistogramOpts::new(
            "signal_latency_seconds",
            "Signal-source round-trip latency",
        ))?;
        let equity_usdt = Gauge::new("equity_usdt", "Last reported account equity")?;

        registry.register(Box::new(orders_total.clone()))?;
        registry.register(Box::new(trailing_stop_hits_total.clone()))?;
        registry.register(Box::new(signal_requests_total.clone()))?;
        registry.register(Box::new(flip_close_failures_total.clone()))?;
        registry.register(Box::new(order_latency_seconds.clone()))?;
        registry.register(Box::new(signal_latency_seconds.clone()))?;
        registry.register(Box::new(equity_usdt.clone()))?;

        Ok(Self {
            registry,
            orders_total,
            trailing_stop_hits_total,
            signal_requests_total,
            flip_close_failures_total,
            order_latency_seconds,
            signal_latency_seconds,
            equity_usdt,
        })
    }

    /// Text exposition of every registered instrument.
    pub fn render(&self) -> DaemonResult<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        encoder
            .encode_to_string(&families)
            .map_err(DaemonError::from)
    }
}

// =============================================================================
// HTTP Endpoint
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Create the metrics router.
pub fn create_router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn metrics_handler(
    State(metrics): State<Arc<Metrics>>,
) -> Result<String, (StatusCode, String)> {
    metrics
        .render()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// Bind and spawn the metrics server, returning the bound address.
pub async fn start_metrics_server(
    config: &MetricsConfig,
    metrics: Arc<Metrics>,
) -> DaemonResult<SocketAddr> {
    let router = create_router(metrics);
    let addr = format!("{}:{}", config.host, config.port);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| DaemonError::Config(format!("Failed to bind to {}: {}", addr, e)))?;

    let local_addr = listener
        .local_addr()
        .map_err(|e| DaemonError::Config(format!("Failed to get local address: {}", e)))?;

    // Spawn the server task
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "Metrics server error");
        }
    });

    Ok(local_addr)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_once() {
        let metrics = Metrics::new().unwrap();

        metrics.orders_total.with_label_values(&["BUY"]).inc();
        metrics.trailing_stop_hits_total.inc();
        metrics.equity_usdt.set(1234.5);

        assert_eq!(metrics.orders_total.with_label_values(&["BUY"]).get(), 1);
        assert_eq!(metrics.trailing_stop_hits_total.get(), 1);
    }

    #[test]
    fn test_render_contains_instruments() {
        let metrics = Metrics::new().unwrap();
        metrics.orders_total.with_label_values(&["SELL"]).inc();

        let text = metrics.render().unwrap();
        assert!(text.contains("orders_total"));
        assert!(text.contains("side=\"SELL\""));
        assert!(text.contains("trailing_stop_hits_total"));
    }

    #[tokio::test]
    async fn test_metrics_server_binds_ephemeral_port() {
        let config = MetricsConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        let metrics = Arc::new(Metrics::new().unwrap());

        let addr = start_metrics_server(&config, metrics).await.unwrap();
        assert!(addr.port() > 0);
    }
}
