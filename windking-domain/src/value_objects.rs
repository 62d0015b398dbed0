//! Value Objects for the Windking Domain
//!
//! Immutable, validated domain primitives.
//! All value objects enforce invariants at construction time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain errors for value object validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Price must be positive
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Quantity must be positive
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Symbol must be a valid instrument id
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Instrument spec validation error
    #[error("Invalid instrument spec: {0}")]
    InvalidInstrumentSpec(String),

    /// RiskConfig validation error
    #[error("Invalid risk config: {0}")]
    InvalidRiskConfig(String),

    /// Trailing-stop parameter validation error
    #[error("Invalid trailing stop: {0}")]
    InvalidTrailingStop(String),
}

// =============================================================================
// Price
// =============================================================================

/// Price represents a positive decimal price
///
/// # Invariants
/// - Must be > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPrice` if value <= 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidPrice("Price must be positive".to_string()));
        }
        Ok(Self(value))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Quantity
// =============================================================================

/// Quantity represents a positive contract count (fractions allowed)
///
/// # Invariants
/// - Must be > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Create a new Quantity with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidQuantity` if value <= 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidQuantity("Quantity must be positive".to_string()));
        }
        Ok(Self(value))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Symbol
// =============================================================================

/// Symbol represents a swap instrument id (e.g., ETH-USDT)
///
/// # Invariants
/// - Base and quote must be non-empty
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    base: String,
    quote: String,
}

impl Symbol {
    /// Create a Symbol from a dash-separated instrument id
    ///
    /// # Examples
    /// ```
    /// # use windking_domain::value_objects::Symbol;
    /// let symbol = Symbol::from_pair("ETH-USDT").unwrap();
    /// assert_eq!(symbol.base(), "ETH");
    /// assert_eq!(symbol.quote(), "USDT");
    /// ```
    ///
    /// # Errors
    /// Returns `DomainError::InvalidSymbol` if the format is invalid
    pub fn from_pair(pair: &str) -> Result<Self, DomainError> {
        match pair.split_once('-') {
            Some((base, quote)) if !base.is_empty() && !quote.is_empty() => Ok(Self {
                base: base.to_string(),
                quote: quote.to_string(),
            }),
            _ => Err(DomainError::InvalidSymbol(format!(
                "Cannot parse instrument id: {}",
                pair
            ))),
        }
    }

    /// Get the base currency
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Get the quote currency
    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Get the instrument id as a string (e.g., "ETH-USDT")
    pub fn as_pair(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_pair())
    }
}

// =============================================================================
// Signal
// =============================================================================

/// Signal is a candidate trading action.
///
/// Only `Buy` and `Sell` ever reach the orchestrator; `Hold` is filtered
/// upstream by the direction filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Open or hold a long position
    Buy,
    /// Open or hold a short position
    Sell,
    /// Do nothing this cycle
    Hold,
}

impl Signal {
    /// True for Buy/Sell, false for Hold.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Signal::Hold)
    }

    /// Parse from the wire form (`BUY`/`SELL`/`HOLD`, case-insensitive).
    ///
    /// Anything unrecognized is treated as `Hold`, the safe default for
    /// free-form signal-source output.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Signal::Buy,
            "SELL" => Signal::Sell,
            _ => Signal::Hold,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

// =============================================================================
// Direction
// =============================================================================

/// Direction of a price move between two representative prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Price rose
    Up,
    /// Price fell
    Down,
    /// No change
    Flat,
}

impl Direction {
    /// Derive the direction from the previous and current price.
    pub fn from_prices(previous: Price, current: Price) -> Self {
        if current.as_decimal() > previous.as_decimal() {
            Direction::Up
        } else if current.as_decimal() < previous.as_decimal() {
            Direction::Down
        } else {
            Direction::Flat
        }
    }

    /// Map to the candidate signal (Up -> Buy, Down -> Sell, Flat -> Hold).
    pub fn as_signal(&self) -> Signal {
        match self {
            Direction::Up => Signal::Buy,
            Direction::Down => Signal::Sell,
            Direction::Flat => Signal::Hold,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
            Direction::Flat => write!(f, "FLAT"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
