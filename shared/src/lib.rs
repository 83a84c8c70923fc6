//! Shared types and the order fulfillment ledger for the Product Tracker
//!
//! This crate contains the records exchanged between the backend, the
//! browser (via WASM) and reporting, plus the pure allocation engine that
//! turns received shipments into order fulfillment.

pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use ledger::*;
pub use models::*;
pub use types::*;
pub use validation::*;
