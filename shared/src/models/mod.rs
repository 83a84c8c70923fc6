//! Domain models for the Product Tracker

mod allocation;
mod catalog;
mod order;
mod receive;
mod sales;
mod stock;

pub use allocation::*;
pub use catalog::*;
pub use order::*;
pub use receive::*;
pub use sales::*;
pub use stock::*;
