// Authentication module
// JWT access tokens plus single-use opaque refresh tokens with rotation

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use handlers::{login_handler, me_handler, refresh_handler, register_handler};
pub use middleware::AuthenticatedUser;
pub use models::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, User, UserResponse};
pub use repository::UserRepository;
pub use service::AuthService;
pub use token::TokenService;
