// Stock module
// Per-store stock ledger, stores, day snapshots, and restock orders

pub mod error;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod repository;
pub mod restock;
pub mod service;

pub use error::StockError;
pub use ledger::StockLedger;
pub use models::{LineStockEffect, Stock, StockEffect, Store};
pub use repository::StockRepository;
pub use restock::{RestockStatus, RestockTransitions};
pub use service::StockService;
