pub mod check_code;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod status_machine;

pub use check_code::{CheckCode, CheckCodeKind, OrderNumber};
pub use error::OrderError;
pub use models::{Order, OrderDetail, OrderItem, OrderStatus};
pub use repository::OrderRepository;
pub use service::OrderService;
pub use status_machine::StatusMachine;
