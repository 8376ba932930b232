//! Sand Prediction Service Library
//!
//! An authenticated HTTP service that estimates sand content in incoming
//! raw-material deliveries.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Token signing and password hashing
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `inference` - Feature derivation, model, post-processing
//! - `masterdata` - Season and region lookup tables
//! - `middleware` - Bearer authentication and HTTP metrics
//! - `models` - Request, response and domain types
//! - `observability` - Metrics and log-field hashing
//! - `routes` - Router assembly
//! - `services` - Auth Gate and prediction pipeline

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod inference;
pub mod masterdata;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
