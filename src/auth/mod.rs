//! OAuth refresh-token exchange and bearer token caching.

pub mod error;
pub mod manager;
pub mod token;

pub use error::AuthError;
pub use manager::TokenManager;
pub use token::TokenState;
