//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Metrics server configuration
    pub metrics: MetricsConfig,

    /// Pipeline stage tuning
    pub pipeline: PipelineConfig,

    /// Trading and risk parameters
    pub trading: TradingConfig,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// Metrics server configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Pipeline stage tuning.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Aggregator immediate-emit trigger (0.003 = 0.3%)
    pub pct_trigger: Decimal,
    /// Aggregation window in milliseconds
    pub agg_window_ms: u64,
    /// Consecutive identical signals required by the filter
    pub n_same: usize,
    /// Filter cooldown between admissions, in seconds
    pub throttle_secs: i64,
    /// Significance: relative price delta threshold (0.004 = 0.4%)
    pub pct_th: Decimal,
    /// Significance: normalized acceleration threshold
    pub accel_th: Decimal,
    /// Significance: volume-over-mean ratio threshold
    pub vol_th: Decimal,
    /// Significance: price window length in samples
    pub price_window: usize,
    /// Significance: volume window length in samples
    pub vol_window: usize,
    /// Intent dedupe TTL in seconds
    pub intent_ttl_secs: i64,
    /// Tick queue capacity
    pub queue_capacity: usize,
    /// Producer-side send timeout before a tick is dropped, in milliseconds
    pub send_timeout_ms: u64,
    /// Primary signal source deadline, in seconds
    pub decide_timeout_secs: u64,
}

/// Trading and risk parameters.
#[derive(Debug, Clone)]
pub struct TradingConfig {
    /// Instrument to trade (e.g. "ETH-USDT")
    pub symbol: String,
    /// Account capital in quote currency
    pub capital: Decimal,
    /// Fraction of capital risked per trade (0.01 = 1%)
    pub risk_pct: Decimal,
    /// Fixed stop-loss fraction used for sizing (0.01 = 1%)
    pub sl_pct: Decimal,
    /// Fixed take-profit fraction (0.02 = 2%)
    pub tp_pct: Decimal,
    /// Trailing-stop drawdown fraction; zero disables trailing
    pub trail_sl_pct: Decimal,
    /// Account leverage multiplier
    pub leverage: u8,
    /// Cached position lifetime in seconds
    pub expire_secs: i64,
    /// Path of the durable position cache file
    pub position_cache: PathBuf,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment (uses stubs)
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let environment = Self::load_environment()?;
        let metrics = Self::load_metrics_config()?;
        let pipeline = Self::load_pipeline_config()?;
        let trading = Self::load_trading_config()?;

        Ok(Self {
            metrics,
            pipeline,
            trading,
            environment,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        let mut config = Self::default();
        config.environment = Environment::Test;
        config.metrics.host = "127.0.0.1".to_string();
        config.metrics.port = 0; // Let OS assign port
        config
    }

    fn load_environment() -> DaemonResult<Environment> {
        let env_str = env::var("WINDKING_ENV").unwrap_or_else(|_| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(DaemonError::Config(format!(
                "Invalid WINDKING_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }

    fn load_metrics_config() -> DaemonResult<MetricsConfig> {
        let host = env::var("WINDKING_METRICS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = Self::load_parsed_env("WINDKING_METRICS_PORT", 9109u16)?;
        Ok(MetricsConfig { host, port })
    }

    fn load_pipeline_config() -> DaemonResult<PipelineConfig> {
        Ok(PipelineConfig {
            pct_trigger: Self::load_decimal_env("WINDKING_PCT_TRIGGER", Decimal::new(3, 3))?,
            agg_window_ms: Self::load_parsed_env("WINDKING_AGG_WINDOW_MS", 1000)?,
            n_same: Self::load_parsed_env("WINDKING_N_SAME", 2)?,
            throttle_secs: Self::load_parsed_env("WINDKING_THROTTLE_SECS", 30)?,
            pct_th: Self::load_decimal_env("WINDKING_PCT_TH", Decimal::new(4, 3))?,
            accel_th: Self::load_decimal_env("WINDKING_ACCEL_TH", Decimal::from(2))?,
            vol_th: Self::load_decimal_env("WINDKING_VOL_TH", Decimal::from(3))?,
            price_window: Self::load_parsed_env("WINDKING_PRICE_WINDOW", 60)?,
            vol_window: Self::load_parsed_env("WINDKING_VOL_WINDOW", 30)?,
            intent_ttl_secs: Self::load_parsed_env("WINDKING_INTENT_TTL_SECS", 120)?,
            queue_capacity: Self::load_parsed_env("WINDKING_QUEUE_CAPACITY", 1000)?,
            send_timeout_ms: Self::load_parsed_env("WINDKING_SEND_TIMEOUT_MS", 100)?,
            decide_timeout_secs: Self::load_parsed_env("WINDKING_DECIDE_TIMEOUT_SECS", 6)?,
        })
    }

    fn load_trading_config() -> DaemonResult<TradingConfig> {
        let symbol = env::var("WINDKING_SYMBOL").unwrap_or_else(|_| "ETH-USDT".to_string());
        let position_cache = env::var("WINDKING_POSITION_CACHE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("position_cache.json"));

        Ok(TradingConfig {
            symbol,
            capital: Self::load_decimal_env("WINDKING_CAPITAL", Decimal::from(300))?,
            risk_pct: Self::load_fraction_env("WINDKING_RISK_PCT", Decimal::new(1, 2))?,
            sl_pct: Self::load_fraction_env("WINDKING_SL_PCT", Decimal::new(1, 2))?,
            tp_pct: Self::load_fraction_env("WINDKING_TP_PCT", Decimal::new(2, 2))?,
            trail_sl_pct: Self::load_fraction_env("WINDKING_TRAIL_SL_PCT", Decimal::new(5, 3))?,
            leverage: Self::load_parsed_env("WINDKING_LEVERAGE", 10u8)?,
            expire_secs: Self::load_parsed_env("WINDKING_EXPIRE_SECS", 3600)?,
            position_cache,
        })
    }

    /// Percentage knobs are fractions (0.01 = 1%) and must stay inside
    /// [0, 1); a value of 1 or more is a misconfiguration, not a rate.
    fn load_fraction_env(key: &str, default: Decimal) -> DaemonResult<Decimal> {
        let value = Self::load_decimal_env(key, default)?;
        if value < Decimal::ZERO || value >= Decimal::ONE {
            return Err(DaemonError::Config(format!(
                "{} must be a fraction in [0, 1), got {}",
                key, value
            )));
        }
        Ok(value)
    }

    fn load_decimal_env(key: &str, default: Decimal) -> DaemonResult<Decimal> {
        match env::var(key) {
            Ok(val) => Decimal::from_str(&val)
                .map_err(|_| DaemonError::Config(format!("Invalid {} value: {}", key, val))),
            Err(_) => Ok(default),
        }
    }

    fn load_parsed_env<T: FromStr>(key: &str, default: T) -> DaemonResult<T> {
        match env::var(key) {
            Ok(val) => val
                .parse::<T>()
                .map_err(|_| DaemonError::Config(format!("Invalid {} value: {}", key, val))),
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metrics: MetricsConfig {
                host: "0.0.0.0".to_string(),
                port: 9109,
            },
            pipeline: PipelineConfig {
                pct_trigger: Decimal::new(3, 3), // 0.3%
                agg_window_ms: 1000,
                n_same: 2,
                throttle_secs: 30,
                pct_th: Decimal::new(4, 3), // 0.4%
                accel_th: Decimal::from(2),
                vol_th: Decimal::from(3),
                price_window: 60,
                vol_window: 30,
                intent_ttl_secs: 120,
                queue_capacity: 1000,
                send_timeout_ms: 100,
                decide_timeout_secs: 6,
            },
            trading: TradingConfig {
                symbol: "ETH-USDT".to_string(),
                capital: Decimal::from(300),
                risk_pct: Decimal::new(1, 2),     // 1%
                sl_pct: Decimal::new(1, 2),       // 1%
                tp_pct: Decimal::new(2, 2),       // 2%
                trail_sl_pct: Decimal::new(5, 3), // 0.5%
                leverage: 10,
                expire_secs: 3600,
                position_cache: PathBuf::from("position_cache.json"),
            },
            environment: Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
