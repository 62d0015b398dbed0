//! Trailing Stop State Machine
//!
//! Tracks the best price seen since arming and signals a one-shot trigger
//! when the drawdown from that extreme exceeds a configured fraction.
//!
//! # States
//!
//! ```text
//! Idle -> Armed -> { Triggered -> Idle | Cancelled -> Idle }
//! ```
//!
//! Key invariants:
//! - The favorable extreme is monotonic (best only rises for Buy, only falls for Sell)
//! - A trigger is one-shot: the engine is Idle immediately after returning true
//! - `update` while Idle and `cancel` while Idle are no-ops, not errors

use crate::value_objects::{DomainError, Price, Signal};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Armed {
    side: Signal,
    best: Decimal,
    pct: Decimal,
}

/// Local trailing stop for a single instrument, single open direction.
///
/// Drawdown is measured as a fraction of the best price seen since arming:
///
/// ```text
/// Buy:  drawdown = (best - price) / best,   best = max(best, price)
/// Sell: drawdown = (price - best) / best,   best = min(best, price)
/// ```
///
/// # Example
///
/// ```
/// # use windking_domain::trailing::TrailingStop;
/// # use windking_domain::value_objects::{Price, Signal};
/// # use rust_decimal_macros::dec;
/// let mut trailing = TrailingStop::new();
/// trailing.start(Signal::Buy, Price::new(dec!(100)).unwrap(), dec!(0.05)).unwrap();
///
/// // New high: best moves to 110, no trigger
/// assert!(!trailing.update(Price::new(dec!(110)).unwrap()));
///
/// // Drawdown (110 - 104) / 110 ~= 5.45% >= 5% -> trigger, back to Idle
/// assert!(trailing.update(Price::new(dec!(104)).unwrap()));
/// assert!(!trailing.update(Price::new(dec!(104)).unwrap()));
/// ```
#[derive(Debug, Default)]
pub struct TrailingStop {
    armed: Option<Armed>,
}

impl TrailingStop {
    /// Create a new engine in the Idle state.
    pub fn new() -> Self {
        Self { armed: None }
    }

    /// Arm (or overwrite) the trailing stop.
    ///
    /// Starting while already Armed silently replaces the prior state; the
    /// orchestrator cancels before flipping, per the single-position
    /// invariant.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidTrailingStop` if `side` is `Hold` or
    /// `pct` is not in (0, 1).
    pub fn start(&mut self, side: Signal, entry: Price, pct: Decimal) -> Result<(), DomainError> {
        if !side.is_actionable() {
            return Err(DomainError::InvalidTrailingStop(
                "Trailing stop side must be BUY or SELL".to_string(),
            ));
        }
        if pct <= Decimal::ZERO || pct >= Decimal::ONE {
            return Err(DomainError::InvalidTrailingStop(format!(
                "Trailing fraction must be in (0, 1), got {}",
                pct
            )));
        }

        self.armed = Some(Armed {
            side,
            best: entry.as_decimal(),
            pct,
        });
        Ok(())
    }

    /// Push the latest price; returns true when the drawdown triggers.
    ///
    /// A trigger resets the engine to Idle (one-shot). Idle is a no-op
    /// returning false.
    pub fn update(&mut self, price: Price) -> bool {
        let Some(state) = self.armed.as_mut() else {
            return false;
        };

        let price = price.as_decimal();

        // 1) Refresh the favorable extreme
        match state.side {
            Signal::Buy => {
                if price > state.best {
                    state.best = price;
                }
            }
            _ => {
                if price < state.best {
                    state.best = price;
                }
            }
        }

        // 2) Drawdown as a fraction of the extreme
        let drawdown = match state.side {
            Signal::Buy => (state.best - price) / state.best,
            _ => (price - state.best) / state.best,
        };

        if drawdown >= state.pct {
            self.armed = None;
            return true;
        }
        false
    }

    /// Disarm unconditionally. Idempotent on Idle.
    pub fn cancel(&mut self) {
        self.armed = None;
    }

    /// True while Armed.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// The side the stop is armed for, if Armed.
    pub fn armed_side(&self) -> Option<Signal> {
        self.armed.map(|a| a.side)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn price(value: Decimal) -> Price {
        Price::new(value).unwrap()
    }

    #[test]
    fn test_start_validation() {
        let mut trailing = TrailingStop::new();
        assert!(trailing.start(Signal::Hold, price(dec!(100)), dec!(0.05)).is_err());
        assert!(trailing.start(Signal::Buy, price(dec!(100)), dec!(0)).is_err());
        assert!(trailing.start(Signal::Buy, price(dec!(100)), dec!(1)).is_err());
        assert!(!trailing.is_armed());

        assert!(trailing.start(Signal::Buy, price(dec!(100)), dec!(0.05)).is_ok());
        assert!(trailing.is_armed());
        assert_eq!(trailing.armed_side(), Some(Signal::Buy));
    }

    #[test]
    fn test_update_while_idle_is_noop() {
        let mut trailing = TrailingStop::new();
        assert!(!trailing.update(price(dec!(100))));
        assert!(!trailing.is_armed());
    }

    #[test]
    fn test_buy_trigger_sequence() {
        // start(BUY, 100, 0.05); update(110) -> false (best=110);
        // update(104) -> (110-104)/110 ~= 5.45% >= 5% -> true;
        // immediate repeat -> false (Idle).
        let mut trailing = TrailingStop::new();
        trailing.start(Signal::Buy, price(dec!(100)), dec!(0.05)).unwrap();

        assert!(!trailing.update(price(dec!(110))));
        assert!(trailing.update(price(dec!(104))));
        assert!(!trailing.is_armed());
        assert!(!trailing.update(price(dec!(104))));
    }

    #[test]
    fn test_buy_best_is_monotonic() {
        let mut trailing = TrailingStop::new();
        trailing.start(Signal::Buy, price(dec!(100)), dec!(0.10)).unwrap();

        // Rises, then pulls back less than 10% from the high
        assert!(!trailing.update(price(dec!(120))));
        assert!(!trailing.update(price(dec!(112))));
        // Drawdown measured from 120, not 112: (120 - 107) / 120 > 10%
        assert!(trailing.update(price(dec!(107))));
    }

    #[test]
    fn test_sell_trigger_sequence() {
        let mut trailing = TrailingStop::new();
        trailing.start(Signal::Sell, price(dec!(100)), dec!(0.05)).unwrap();

        // New low: best = 90
        assert!(!trailing.update(price(dec!(90))));
        // (94.5 - 90) / 90 = 5% -> trigger
        assert!(trailing.update(price(dec!(94.5))));
        assert!(!trailing.is_armed());
    }

    #[test]
    fn test_sell_best_is_monotonic() {
        let mut trailing = TrailingStop::new();
        trailing.start(Signal::Sell, price(dec!(100)), dec!(0.10)).unwrap();

        assert!(!trailing.update(price(dec!(80))));
        assert!(!trailing.update(price(dec!(85))));
        // Still measured from the low at 80: 88 is a 10% bounce
        assert!(trailing.update(price(dec!(88))));
    }

    #[test]
    fn test_restart_overwrites_armed_state() {
        let mut trailing = TrailingStop::new();
        trailing.start(Signal::Buy, price(dec!(100)), dec!(0.05)).unwrap();
        assert!(!trailing.update(price(dec!(110))));

        // Re-arm at a new entry: the old best is gone
        trailing.start(Signal::Sell, price(dec!(200)), dec!(0.05)).unwrap();
        assert_eq!(trailing.armed_side(), Some(Signal::Sell));

        // 210 is a 5% rise from 200 -> trigger on the new state
        assert!(trailing.update(price(dec!(210))));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut trailing = TrailingStop::new();
        trailing.cancel();
        assert!(!trailing.is_armed());

        trailing.start(Signal::Buy, price(dec!(100)), dec!(0.05)).unwrap();
        trailing.cancel();
        assert!(!trailing.is_armed());
        trailing.cancel();
        assert!(!trailing.update(price(dec!(50))));
    }
}
