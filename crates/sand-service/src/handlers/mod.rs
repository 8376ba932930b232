//! HTTP request handlers.

pub mod auth_handler;
pub mod health;
pub mod metrics;
pub mod prediction_handler;

pub use auth_handler::handle_login;
pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use prediction_handler::handle_upload;
