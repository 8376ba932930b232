//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports types from the [`secrecy`] crate. Use these for the login
//! password, the stored password hash, and the in-memory signing key.
//!
//! `SecretBox<T>` and `SecretString` implement `Debug` with redaction, so any
//! struct deriving `Debug` over a secret is safe to log with `{:?}`. Secrets
//! are zeroized when dropped.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct LoginForm {
//!     username: String,
//!     password: SecretString,
//! }
//!
//! let form = LoginForm {
//!     username: "operator".to_string(),
//!     password: SecretString::from("hunter2"),
//! };
//!
//! assert!(!format!("{form:?}").contains("hunter2"));
//! let password: &str = form.password.expose_secret();
//! assert_eq!(password, "hunter2");
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
