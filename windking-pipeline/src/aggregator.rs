//! Price Aggregator
//!
//! Collapses a high-frequency tick stream into a lower-frequency sequence
//! of representative prices. A tick that moves far enough from the last
//! emission is emitted immediately; everything else buffers until the
//! aggregation window expires, at which point the last buffered price
//! speaks for the window.
//!
//! The aggregator itself is synchronous; the daemon owns the window clock
//! and calls `flush()` on expiry.

use rust_decimal::Decimal;
use windking_domain::Price;

/// Tick-stream aggregator with a percentage-move trigger.
///
/// # Contract
///
/// - `push(price)` emits immediately when there is no prior emission or
///   the relative move from it is >= `pct_trigger`, clearing the buffer.
/// - `flush()` emits the last buffered price, if any; never emits on an
///   empty buffer.
/// - Exactly one emission per trigger event.
#[derive(Debug)]
pub struct PriceAggregator {
    pct_trigger: Decimal,
    last_emitted: Option<Decimal>,
    buffer: Vec<Price>,
}

impl PriceAggregator {
    /// Create an aggregator with the given trigger fraction (e.g. 0.003).
    pub fn new(pct_trigger: Decimal) -> Self {
        Self {
            pct_trigger,
            last_emitted: None,
            buffer: Vec::new(),
        }
    }

    /// Push a tick price. Returns the representative price when the tick
    /// triggers an immediate emission.
    pub fn push(&mut self, price: Price) -> Option<Price> {
        if self.should_emit(price) {
            self.emit(price);
            return Some(price);
        }
        self.buffer.push(price);
        None
    }

    /// Flush the aggregation window. Returns the last buffered price, if
    /// the window saw any ticks that did not trigger.
    pub fn flush(&mut self) -> Option<Price> {
        let last = self.buffer.last().copied()?;
        self.emit(last);
        Some(last)
    }

    fn should_emit(&self, price: Price) -> bool {
        match self.last_emitted {
            None => true,
            Some(last) => (price.as_decimal() - last).abs() / last >= self.pct_trigger,
        }
    }

    fn emit(&mut self, price: Price) {
        self.last_emitted = Some(price.as_decimal());
        self.buffer.clear();
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
    fn test_first_tick_emits_immediately() {
        let mut agg = PriceAggregator::new(dec!(0.003));
        assert_eq!(agg.push(price(dec!(2000))), Some(price(dec!(2000))));
    }

    #[test]
    fn test_small_moves_buffer_until_flush() {
        let mut agg = PriceAggregator::new(dec!(0.003));
        agg.push(price(dec!(2000)));

        // 0.05% and 0.1% moves: below the 0.3% trigger
        assert_eq!(agg.push(price(dec!(2001))), None);
        assert_eq!(agg.push(price(dec!(2002))), None);

        // Window expiry: the last buffered price speaks for the window
        assert_eq!(agg.flush(), Some(price(dec!(2002))));
    }

    #[test]
    fn test_large_move_emits_immediately_and_clears_buffer() {
        let mut agg = PriceAggregator::new(dec!(0.003));
        agg.push(price(dec!(2000)));
        agg.push(price(dec!(2001)));

        // 0.5% move from the last emission
        assert_eq!(agg.push(price(dec!(2010))), Some(price(dec!(2010))));

        // Buffer was cleared by the trigger
        assert_eq!(agg.flush(), None);
    }

    #[test]
    fn test_trigger_is_relative_to_last_emission_not_last_tick() {
        let mut agg = PriceAggregator::new(dec!(0.003));
        agg.push(price(dec!(2000)));

        // Creep upward in sub-trigger steps; each is < 0.3% from the
        // previous tick but the last is >= 0.3% from the emission at 2000.
        assert_eq!(agg.push(price(dec!(2003))), None);
        assert_eq!(agg.push(price(dec!(2006))), Some(price(dec!(2006))));
    }

    #[test]
    fn test_downward_move_also_triggers() {
        let mut agg = PriceAggregator::new(dec!(0.003));
        agg.push(price(dec!(2000)));
        assert_eq!(agg.push(price(dec!(1993))), Some(price(dec!(1993))));
    }

    #[test]
    fn test_flush_on_empty_buffer_emits_nothing() {
        let mut agg = PriceAggregator::new(dec!(0.003));
        assert_eq!(agg.flush(), None);

        agg.push(price(dec!(2000)));
        assert_eq!(agg.flush(), None);
    }

    #[test]
    fn test_at_most_one_emission_per_flush() {
        let mut agg = PriceAggregator::new(dec!(0.003));
        agg.push(price(dec!(2000)));
        agg.push(price(dec!(2001)));
        agg.push(price(dec!(2002)));

        assert!(agg.flush().is_some());
        assert_eq!(agg.flush(), None);
    }

    #[test]
    fn test_window_flush_updates_emission_baseline() {
        let mut agg = PriceAggregator::new(dec!(0.003));
        agg.push(price(dec!(2000)));
        agg.push(price(dec!(2004)));
        assert_eq!(agg.flush(), Some(price(dec!(2004))));

        // 2007 is only 0.15% from 2004: buffered, not emitted
        assert_eq!(agg.push(price(dec!(2007))), None);
    }
}
