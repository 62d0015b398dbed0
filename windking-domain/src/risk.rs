//! Risk Sizing (Pure Functions)
//!
//! Position sizing follows the risk-unit method:
//!
//! ```text
//! r = capital × risk_pct
//! contracts_raw = r / (|entry - stop| × ct_val)
//! ```
//!
//! The raw count is floored to the instrument's lot step; a result below
//! the minimum order size means the order is abandoned, not shrunk.

use crate::value_objects::{DomainError, Price, Quantity, Signal};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// InstrumentSpec
// =============================================================================

/// Contract specification of a swap instrument.
///
/// # Invariants
/// - `ct_val`, `min_sz`, `lot_sz` must all be positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    /// Face value of one contract in base currency
    pub ct_val: Decimal,
    /// Minimum order size in contracts (fractions allowed)
    pub min_sz: Decimal,
    /// Order size step in contracts
    pub lot_sz: Decimal,
}

impl InstrumentSpec {
    /// Create a spec with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidInstrumentSpec` if any field is <= 0
    pub fn new(ct_val: Decimal, min_sz: Decimal, lot_sz: Decimal) -> Result<Self, DomainError> {
        if ct_val <= Decimal::ZERO || min_sz <= Decimal::ZERO || lot_sz <= Decimal::ZERO {
            return Err(DomainError::InvalidInstrumentSpec(
                "ct_val, min_sz and lot_sz must all be positive".to_string(),
            ));
        }
        Ok(Self { ct_val, min_sz, lot_sz })
    }
}

// =============================================================================
// RiskConfig
// =============================================================================

/// Capital and per-trade risk used for position sizing.
///
/// `risk_pct` is a fraction (0.01 = 1%), capped at 5%.
///
/// # Example
///
/// ```
/// # use windking_domain::risk::RiskConfig;
/// # use rust_decimal_macros::dec;
/// let config = RiskConfig::new(dec!(300), dec!(0.01)).unwrap();
/// assert_eq!(config.risk_unit(), dec!(3)); // 1% of 300
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskConfig {
    capital: Decimal,
    risk_pct: Decimal,
}

impl RiskConfig {
    /// Create a new RiskConfig with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidRiskConfig` if:
    /// - Capital <= 0
    /// - risk_pct <= 0 or > 0.05
    pub fn new(capital: Decimal, risk_pct: Decimal) -> Result<Self, DomainError> {
        if capital <= Decimal::ZERO {
            return Err(DomainError::InvalidRiskConfig("Capital must be positive".to_string()));
        }
        if risk_pct <= Decimal::ZERO {
            return Err(DomainError::InvalidRiskConfig(
                "Risk fraction must be positive".to_string(),
            ));
        }
        if risk_pct > Decimal::new(5, 2) {
            return Err(DomainError::InvalidRiskConfig(
                "Risk fraction cannot exceed 5%".to_string(),
            ));
        }
        Ok(Self { capital, risk_pct })
    }

    /// Get capital
    pub fn capital(&self) -> Decimal {
        self.capital
    }

    /// Get the risk fraction
    pub fn risk_pct(&self) -> Decimal {
        self.risk_pct
    }

    /// The amount of quote currency at risk per trade: capital × risk_pct
    pub fn risk_unit(&self) -> Decimal {
        self.capital * self.risk_pct
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            capital: Decimal::from(1000),
            risk_pct: Decimal::new(1, 2), // 1%
        }
    }
}

// =============================================================================
// Sizing
// =============================================================================

/// Calculate the contract count for a trade from the risk unit.
///
/// ```text
/// contracts = (capital × risk_pct) / (|entry - stop| × ct_val)
/// ```
///
/// The count is floored to `lot_sz`. Returns `None` when the stop distance
/// is zero or the floored count falls below `min_sz`; the caller must
/// abandon the order rather than round it up.
///
/// # Examples
///
/// ```
/// # use windking_domain::risk::{calc_size, InstrumentSpec};
/// # use windking_domain::value_objects::Price;
/// # use rust_decimal_macros::dec;
/// let spec = InstrumentSpec::new(dec!(1), dec!(0.01), dec!(0.01)).unwrap();
/// let size = calc_size(
///     dec!(300),
///     dec!(0.01),
///     Price::new(dec!(2000)).unwrap(),
///     Price::new(dec!(1980)).unwrap(),
///     &spec,
/// );
/// // risk unit = 3, stop distance = 20 -> 0.15 contracts
/// assert_eq!(size.unwrap().as_decimal(), dec!(0.15));
/// ```
pub fn calc_size(
    capital: Decimal,
    risk_pct: Decimal,
    entry_price: Price,
    stop_price: Price,
    spec: &InstrumentSpec,
) -> Option<Quantity> {
    let stop_dist = (entry_price.as_decimal() - stop_price.as_decimal()).abs();
    if stop_dist.is_zero() {
        return None;
    }

    let raw = (capital * risk_pct) / (stop_dist * spec.ct_val);

    // Floor to the lot step
    let contracts = (raw / spec.lot_sz).floor() * spec.lot_sz;

    if contracts >= spec.min_sz {
        // contracts >= min_sz > 0, so the constructor cannot fail
        Quantity::new(contracts).ok()
    } else {
        None
    }
}

/// Fixed-percentage stop-loss / take-profit levels around an entry price.
///
/// For `Buy` the stop is below and the target above; for `Sell` the
/// opposite. `Hold` is treated as `Buy` (callers never pass it).
/// Levels are rounded to 8 decimal places.
pub fn calc_sl_tp(
    entry_price: Price,
    sl_pct: Decimal,
    tp_pct: Decimal,
    side: Signal,
) -> (Price, Price) {
    let entry = entry_price.as_decimal();
    let (sl, tp) = match side {
        Signal::Sell => (
            entry * (Decimal::ONE + sl_pct),
            entry * (Decimal::ONE - tp_pct),
        ),
        _ => (
            entry * (Decimal::ONE - sl_pct),
            entry * (Decimal::ONE + tp_pct),
        ),
    };
    (
        Price::new(sl.round_dp(8)).unwrap_or(entry_price),
        Price::new(tp.round_dp(8)).unwrap_or(entry_price),
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn eth_spec() -> InstrumentSpec {
        InstrumentSpec::new(dec!(1), dec!(0.01), dec!(0.01)).unwrap()
    }

    #[test]
    fn test_instrument_spec_validation() {
        assert!(InstrumentSpec::new(dec!(1), dec!(0.01), dec!(0.01)).is_ok());
        assert!(InstrumentSpec::new(dec!(0), dec!(0.01), dec!(0.01)).is_err());
        assert!(InstrumentSpec::new(dec!(1), dec!(-0.01), dec!(0.01)).is_err());
        assert!(InstrumentSpec::new(dec!(1), dec!(0.01), dec!(0)).is_err());
    }

    #[test]
    fn test_risk_config_validation() {
        assert!(RiskConfig::new(dec!(300), dec!(0.01)).is_ok());
        assert!(RiskConfig::new(dec!(300), dec!(0.05)).is_ok());
        assert!(RiskConfig::new(dec!(0), dec!(0.01)).is_err());
        assert!(RiskConfig::new(dec!(-300), dec!(0.01)).is_err());
        assert!(RiskConfig::new(dec!(300), dec!(0)).is_err());
        assert!(RiskConfig::new(dec!(300), dec!(0.06)).is_err());
    }

    #[test]
    fn test_risk_unit() {
        let config = RiskConfig::new(dec!(300), dec!(0.01)).unwrap();
        assert_eq!(config.risk_unit(), dec!(3));

        let config2 = RiskConfig::new(dec!(50000), dec!(0.02)).unwrap();
        assert_eq!(config2.risk_unit(), dec!(1000));
    }

    #[test]
    fn test_calc_size_risk_unit_method() {
        // capital 300, risk 1% -> risk unit 3; entry 2000, stop 1980 -> distance 20
        // 3 / 20 = 0.15 contracts
        let size = calc_size(
            dec!(300),
            dec!(0.01),
            Price::new(dec!(2000)).unwrap(),
            Price::new(dec!(1980)).unwrap(),
            &eth_spec(),
        );
        assert_eq!(size.unwrap().as_decimal(), dec!(0.15));
    }

    #[test]
    fn test_calc_size_floors_to_lot_step() {
        // raw = 3 / (19 * 1) = 0.15789... -> floored to 0.15
        let size = calc_size(
            dec!(300),
            dec!(0.01),
            Price::new(dec!(2000)).unwrap(),
            Price::new(dec!(1981)).unwrap(),
            &eth_spec(),
        );
        assert_eq!(size.unwrap().as_decimal(), dec!(0.15));
    }

    #[test]
    fn test_calc_size_below_min_rejected() {
        // raw 0.15 but min_sz 0.2 -> abandoned
        let spec = InstrumentSpec::new(dec!(1), dec!(0.2), dec!(0.01)).unwrap();
        let size = calc_size(
            dec!(300),
            dec!(0.01),
            Price::new(dec!(2000)).unwrap(),
            Price::new(dec!(1980)).unwrap(),
            &spec,
        );
        assert!(size.is_none());
    }

    #[test]
    fn test_calc_size_zero_stop_distance_rejected() {
        let size = calc_size(
            dec!(300),
            dec!(0.01),
            Price::new(dec!(2000)).unwrap(),
            Price::new(dec!(2000)).unwrap(),
            &eth_spec(),
        );
        assert!(size.is_none());
    }

    #[test]
    fn test_calc_size_contract_face_value() {
        // ct_val 0.1: each contract carries a tenth of the exposure,
        // so the count is 10x larger: 3 / (20 * 0.1) = 1.5
        let spec = InstrumentSpec::new(dec!(0.1), dec!(0.01), dec!(0.01)).unwrap();
        let size = calc_size(
            dec!(300),
            dec!(0.01),
            Price::new(dec!(2000)).unwrap(),
            Price::new(dec!(1980)).unwrap(),
            &spec,
        );
        assert_eq!(size.unwrap().as_decimal(), dec!(1.5));
    }

    #[test]
    fn test_calc_sl_tp_buy() {
        let entry = Price::new(dec!(2000)).unwrap();
        let (sl, tp) = calc_sl_tp(entry, dec!(0.01), dec!(0.02), Signal::Buy);
        assert_eq!(sl.as_decimal(), dec!(1980));
        assert_eq!(tp.as_decimal(), dec!(2040));
    }

    #[test]
    fn test_calc_sl_tp_sell() {
        let entry = Price::new(dec!(2000)).unwrap();
        let (sl, tp) = calc_sl_tp(entry, dec!(0.01), dec!(0.02), Signal::Sell);
        assert_eq!(sl.as_decimal(), dec!(2020));
        assert_eq!(tp.as_decimal(), dec!(1960));
    }
}
