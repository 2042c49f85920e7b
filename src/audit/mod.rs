// Audit trail module
// Append-only log of stock and order changes, written inside the caller's transaction

pub mod handlers;
pub mod logger;
pub mod models;
pub mod repository;

pub use logger::AuditLogger;
pub use models::{AuditEntry, AuditLog, AuditOutcome, RequestMeta};
pub use repository::AuditRepository;
