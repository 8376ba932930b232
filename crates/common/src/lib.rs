//! Common utilities and types shared across the sand prediction workspace.

#![warn(clippy::pedantic)]

/// Module for common configuration
pub mod config;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (validation, claims, constants)
pub mod jwt;
