//! Authentication: password hashing, access tokens and the request gate

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;

pub use error::AuthError;
pub use jwt::{Claims, TokenService};
pub use middleware::{bearer_token, require_auth, AuthRejection, AuthenticatedUser};
pub use models::{LoginRequest, NewUser, RegisterRequest, TokenResponse, User, UserId, UserResponse};
pub use password::PasswordHasher;
pub use service::AuthService;
