// Authentication module
// Password and PIN login issuing JWTs, user management, and the capability table

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod permissions;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use middleware::AuthenticatedUser;
pub use models::{Role, User, UserResponse};
pub use permissions::Capability;
pub use repository::UserRepository;
pub use service::AuthService;
pub use token::TokenService;
