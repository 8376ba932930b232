//! Integration tests for the sand prediction service
//!
//! This is the top-level integration test harness that Cargo discovers.
//! Test modules are organized in the integration/ subdirectory.

#![allow(clippy::indexing_slicing)]

#[path = "integration/health_tests.rs"]
mod health_tests;

#[path = "integration/login_tests.rs"]
mod login_tests;

#[path = "integration/token_validation_tests.rs"]
mod token_validation_tests;

#[path = "integration/prediction_tests.rs"]
mod prediction_tests;
