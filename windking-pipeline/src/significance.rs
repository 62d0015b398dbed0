//! Significance Gate
//!
//! Rolling price/volume anomaly detector. An admitted signal only earns an
//! expensive decision when the tick that produced it looks anomalous under
//! at least one of three tests:
//!
//! 1. relative price delta vs. the previous sample
//! 2. second-difference acceleration, normalized by the mean absolute
//!    first difference over the window
//! 3. volume vs. the volume-window mean (only once the window is full)

use rust_decimal::Decimal;
use std::collections::VecDeque;
use windking_domain::Price;

/// Windowed price/volume significance detector.
///
/// Tests that need 2 (delta) or 3 (acceleration) samples are skipped until
/// the windows hold enough history. All three tests are evaluated on every
/// push; any single pass marks the tick significant.
#[derive(Debug)]
pub struct SignificanceGate {
    prices: VecDeque<Decimal>,
    vols: VecDeque<Decimal>,
    price_window: usize,
    vol_window: usize,
    pct_th: Decimal,
    accel_th: Decimal,
    vol_th: Decimal,
}

impl SignificanceGate {
    /// Create a gate with explicit window sizes and thresholds.
    pub fn new(
        price_window: usize,
        vol_window: usize,
        pct_th: Decimal,
        accel_th: Decimal,
        vol_th: Decimal,
    ) -> Self {
        let price_window = price_window.max(3);
        let vol_window = vol_window.max(1);
        Self {
            prices: VecDeque::with_capacity(price_window),
            vols: VecDeque::with_capacity(vol_window),
            price_window,
            vol_window,
            pct_th,
            accel_th,
            vol_th,
        }
    }

    /// Push a price/volume sample; true when the tick is significant.
    pub fn push(&mut self, price: Price, volume: Decimal) -> bool {
        if self.prices.len() == self.price_window {
            self.prices.pop_front();
        }
        self.prices.push_back(price.as_decimal());

        if self.vols.len() == self.vol_window {
            self.vols.pop_front();
        }
        self.vols.push_back(volume);

        let delta = self.price_delta_test();
        let accel = self.acceleration_test();
        let vol = self.volume_test(volume);

        delta || accel || vol
    }

    /// Relative move vs. the previous sample.
    fn price_delta_test(&self) -> bool {
        let n = self.prices.len();
        if n < 2 {
            return false;
        }
        let curr = self.prices[n - 1];
        let prev = self.prices[n - 2];
        if prev.is_zero() {
            return false;
        }
        (curr - prev).abs() / prev >= self.pct_th
    }

    /// Second difference normalized by the mean absolute first difference.
    fn acceleration_test(&self) -> bool {
        let n = self.prices.len();
        if n < 3 {
            return false;
        }
        let accel =
            (self.prices[n - 1] - self.prices[n - 2]) - (self.prices[n - 2] - self.prices[n - 3]);

        let mut sum = Decimal::ZERO;
        for i in 1..n {
            sum += (self.prices[i] - self.prices[i - 1]).abs();
        }
        let mu = sum / Decimal::from(n as u64 - 1);
        if mu.is_zero() {
            return false;
        }
        accel.abs() / mu >= self.accel_th
    }

    /// Volume vs. the window mean, once the window is full.
    fn volume_test(&self, volume: Decimal) -> bool {
        if self.vols.len() < self.vol_window {
            return false;
        }
        let sum: Decimal = self.vols.iter().copied().sum();
        let mean = sum / Decimal::from(self.vol_window as u64);
        if mean.is_zero() {
            return false;
        }
        volume / mean >= self.vol_th
    }
}

impl Default for SignificanceGate {
    fn default() -> Self {
        Self::new(
            60,
            30,
            Decimal::new(4, 3), // 0.4%
            Decimal::from(2),
            Decimal::from(3),
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
