//! Windking Domain Layer
//!
//! Pure domain logic with zero I/O dependencies.
//! Contains value objects, risk sizing, and the trailing-stop state machine.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod risk;
pub mod trailing;
pub mod value_objects;

// Re-export commonly used types
pub use risk::{calc_size, calc_sl_tp, InstrumentSpec, RiskConfig};
pub use trailing::TrailingStop;
pub use value_objects::{Direction, DomainError, Price, Quantity, Signal, Symbol};
