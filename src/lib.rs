//! Memory M8 site server library
//!
//! Form endpoints for the marketing site: double opt-in subscription with
//! stateless signed confirmation links, sponsorship pledges and SMTP
//! diagnostics.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::AppSettings;
pub use error::AppError;
pub use models::runtime_config::AppState;
