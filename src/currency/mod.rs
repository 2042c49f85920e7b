pub mod client;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod sync;

pub use client::RatesClient;
pub use error::CurrencyError;
pub use models::{CurrencyRate, UpdatedBy};
pub use repository::CurrencyRepository;
pub use service::CurrencyService;
pub use sync::{RateSync, RateWrite};
