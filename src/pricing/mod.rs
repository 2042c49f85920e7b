// Pricing module
// Base price and discount arithmetic shared by quotes, catalogs, and orders

pub mod engine;
pub mod handlers;
pub mod models;
pub mod service;

pub use engine::{LinePrice, OrderTotals, PricingEngine};
pub use models::{LineRequest, QuoteRequest, QuoteResponse};
pub use service::PricingService;
