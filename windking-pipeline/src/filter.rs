//! Direction Filter
//!
//! Throttles the raw directional signal stream: a signal is only admitted
//! after `n_same` consecutive identical Buy/Sell pushes, and no two
//! admissions can be closer than the cooldown. A Hold breaks any
//! in-progress run.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use windking_domain::Signal;

/// N-consecutive-same + cooldown signal filter.
///
/// # Contract
///
/// - A push within `throttle` of the last admission returns `None` and
///   leaves the buffer untouched.
/// - `Hold` clears the buffer and returns `None`.
/// - Buy/Sell append to a ring of capacity `n_same`; a full ring of
///   identical entries admits the signal, clears the ring and resets the
///   cooldown.
/// - `reset()` clears both ring and cooldown (used when a trailing-stop
///   trigger forces a flat state).
#[derive(Debug)]
pub struct DirectionFilter {
    n_same: usize,
    throttle: Duration,
    buf: VecDeque<Signal>,
    last_emit: Option<DateTime<Utc>>,
}

impl DirectionFilter {
    /// Create a filter requiring `n_same` consecutive identical signals
    /// (minimum 1) with the given cooldown between admissions.
    pub fn new(n_same: usize, throttle: Duration) -> Self {
        let n_same = n_same.max(1);
        Self {
            n_same,
            throttle,
            buf: VecDeque::with_capacity(n_same),
            last_emit: None,
        }
    }

    /// Push a signal using the wall clock.
    pub fn push(&mut self, signal: Signal) -> Option<Signal> {
        self.push_at(signal, Utc::now())
    }

    /// Push a signal at an explicit instant. Returns the admitted signal
    /// when the run completes outside the cooldown.
    pub fn push_at(&mut self, signal: Signal, now: DateTime<Utc>) -> Option<Signal> {
        if let Some(last) = self.last_emit {
            if now - last < self.throttle {
                return None;
            }
        }

        if signal == Signal::Hold {
            self.buf.clear();
            return None;
        }

        if self.buf.len() == self.n_same {
            self.buf.pop_front();
        }
        self.buf.push_back(signal);

        if self.buf.len() == self.n_same && self.buf.iter().all(|s| *s == signal) {
            self.buf.clear();
            self.last_emit = Some(now);
            return Some(signal);
        }
        None
    }

    /// Clear the ring and the cooldown unconditionally.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.last_emit = None;
    }
}

// =============================================================================
// Tests
// =============================================================================
