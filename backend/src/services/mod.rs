//! Business logic services for the Product Tracker

pub mod catalog;
pub mod ledger_store;
pub mod metrics;
pub mod orders;
pub mod pending;
pub mod receiving;
pub mod stock;
pub mod weekly_sales;

pub use catalog::CatalogService;
pub use ledger_store::LedgerStore;
pub use metrics::MetricsService;
pub use orders::OrderService;
pub use pending::PendingService;
pub use receiving::ReceivingService;
pub use stock::StockService;
pub use weekly_sales::WeeklySalesService;
