//! # Sand Test Utilities
//!
//! Shared test utilities for the sand prediction service.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (fixed keys for reproducible tests)
//! - Credential, lookup-table and predictor fixtures
//! - Token builders (TestTokenBuilder)
//! - Server test harness (TestSandServer for E2E tests)
//! - Custom assertions (TokenAssertions trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sand_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestSandServer::spawn().await?;
//!     let token = server.login_token().await?;
//!
//!     token.assert_valid_jwt().assert_for_subject(TEST_USERNAME);
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod fixtures;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use crypto_fixtures::*;
pub use fixtures::*;
pub use server_harness::*;
pub use token_builders::*;
