//! Intent Deduplication
//!
//! A candidate trading action is identified by instrument, side and a
//! price bucket; the same intent re-emerging inside a short TTL window is
//! a duplicate and must not trigger another expensive decision or order.
//!
//! Keys are SHA-256 content hashes so the cache never stores raw intents.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use windking_domain::{Price, Signal, Symbol};

/// Price-bucket grid: 500 zones per quote unit (0.002 wide).
const ZONE_GRID: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// A candidate trading action identified by symbol, side and price zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentKey {
    symbol: String,
    side: Signal,
    zone: Decimal,
}

impl IntentKey {
    /// Build a key, bucketing the price to the fixed grid.
    pub fn new(symbol: &Symbol, side: Signal, price: Price) -> Self {
        let zone = (price.as_decimal() * ZONE_GRID).round() / ZONE_GRID;
        Self {
            symbol: symbol.as_pair(),
            side,
            zone,
        }
    }

    /// Deterministic cache key: `intent:` + hex SHA-256 of the content.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.symbol.as_bytes());
        hasher.update(b"|");
        hasher.update(self.side.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(self.zone.to_string().as_bytes());
        format!("intent:{}", hex::encode(hasher.finalize()))
    }
}

/// In-process TTL cache for intent keys.
///
/// # Contract
///
/// - `hit_or_set` returns true for a key seen within the TTL, without
///   refreshing it; a miss records the key and returns false.
/// - Expired entries are pruned lazily on access.
#[derive(Debug)]
pub struct IntentCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl IntentCache {
    /// Create a cache with the given time-to-live.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Check-and-record an intent using the wall clock.
    pub fn hit_or_set(&self, key: &IntentKey) -> bool {
        self.hit_or_set_at(key, Utc::now())
    }

    /// Check-and-record an intent at an explicit instant.
    pub fn hit_or_set_at(&self, key: &IntentKey, now: DateTime<Utc>) -> bool {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let ttl = self.ttl;
        entries.retain(|_, stored_at| now - *stored_at < ttl);

        let cache_key = key.cache_key();
        if entries.contains_key(&cache_key) {
            return true;
        }
        entries.insert(cache_key, now);
        false
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn eth() -> Symbol {
        Symbol::from_pair("ETH-USDT").unwrap()
    }

    fn key(side: Signal, price: Decimal) -> IntentKey {
        IntentKey::new(&eth(), side, Price::new(price).unwrap())
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_zone_bucketing() {
        // 0.002-wide buckets: prices within one bucket share a key
        let a = key(Signal::Buy, dec!(2000.0004));
        let b = key(Signal::Buy, dec!(2000.0006));
        assert_eq!(a.cache_key(), b.cache_key());

        let c = key(Signal::Buy, dec!(2000.004));
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn test_side_and_symbol_distinguish_keys() {
        let buy = key(Signal::Buy, dec!(2000));
        let sell = key(Signal::Sell, dec!(2000));
        assert_ne!(buy.cache_key(), sell.cache_key());

        let btc = Symbol::from_pair("BTC-USDT").unwrap();
        let other = IntentKey::new(&btc, Signal::Buy, Price::new(dec!(2000)).unwrap());
        assert_ne!(buy.cache_key(), other.cache_key());
    }

    #[test]
    fn test_first_push_is_a_miss_second_is_a_hit() {
        let cache = IntentCache::new(Duration::seconds(120));
        let k = key(Signal::Buy, dec!(2000));

        assert!(!cache.hit_or_set_at(&k, at(0)));
        assert!(cache.hit_or_set_at(&k, at(10)));
    }

    #[test]
    fn test_hit_does_not_refresh_ttl() {
        let cache = IntentCache::new(Duration::seconds(120));
        let k = key(Signal::Buy, dec!(2000));

        assert!(!cache.hit_or_set_at(&k, at(0)));
        // A hit at t=100 must not extend the original t=0 expiry
        assert!(cache.hit_or_set_at(&k, at(100)));
        // t=121 is past the original TTL: miss again (and re-recorded)
        assert!(!cache.hit_or_set_at(&k, at(121)));
    }

    #[test]
    fn test_expired_key_is_a_miss() {
        let cache = IntentCache::new(Duration::seconds(120));
        let k = key(Signal::Sell, dec!(2000));

        assert!(!cache.hit_or_set_at(&k, at(0)));
        assert!(!cache.hit_or_set_at(&k, at(120)));
    }

    #[test]
    fn test_independent_keys_do_not_interfere() {
        let cache = IntentCache::new(Duration::seconds(120));
        let buy = key(Signal::Buy, dec!(2000));
        let sell = key(Signal::Sell, dec!(2000));

        assert!(!cache.hit_or_set_at(&buy, at(0)));
        assert!(!cache.hit_or_set_at(&sell, at(0)));
        assert!(cache.hit_or_set_at(&buy, at(1)));
        assert!(cache.hit_or_set_at(&sell, at(1)));
    }
}
