//! Windking Storage Layer
//!
//! One concern: the durable position cache. The decision loop asks it a
//! single question (what direction is open?) and tells it two things
//! (opened, closed). Everything else (expiry, corrupt-file recovery,
//! best-effort persistence) lives behind `PositionStore`.

#![warn(clippy::all)]

pub mod error;
pub mod position;

// Re-exports for convenience
pub use error::StoreError;
pub use position::{PositionRecord, PositionStore};
