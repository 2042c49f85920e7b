// Devices module
// Till registration per store and the unauthenticated lookup tills boot with

pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use error::DeviceError;
pub use models::{Device, DeviceInfo};
pub use repository::DeviceRepository;
pub use service::DeviceService;
