pub mod auth;
pub mod role;

pub use auth::AuthMiddleware;
pub use role::RequireRole;
