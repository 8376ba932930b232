//! Common configuration types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default `EnvFilter` directive when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "sand_service=info,tower_http=info";

/// Observability configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directive (e.g. "sand_service=debug")
    pub log_filter: String,
    /// Enable JSON-formatted logs
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            json_logs: false,
        }
    }
}

impl ObservabilityConfig {
    /// Read `RUST_LOG` and `LOG_FORMAT` from a variable map.
    ///
    /// Unknown `LOG_FORMAT` values fall back to plain text.
    #[must_use]
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let log_filter = vars
            .get("RUST_LOG")
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let json_logs = vars
            .get("LOG_FORMAT")
            .is_some_and(|v| v.eq_ignore_ascii_case("json"));

        Self {
            log_filter,
            json_logs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        let config = ObservabilityConfig::from_vars(&HashMap::new());
        assert_eq!(config, ObservabilityConfig::default());
    }

    #[test]
    fn test_json_format_case_insensitive() {
        let vars = HashMap::from([("LOG_FORMAT".to_string(), "JSON".to_string())]);
        assert!(ObservabilityConfig::from_vars(&vars).json_logs);

        let vars = HashMap::from([("LOG_FORMAT".to_string(), "pretty".to_string())]);
        assert!(!ObservabilityConfig::from_vars(&vars).json_logs);
    }

    #[test]
    fn test_rust_log_overrides_filter() {
        let vars = HashMap::from([("RUST_LOG".to_string(), "sand_service=trace".to_string())]);
        assert_eq!(
            ObservabilityConfig::from_vars(&vars).log_filter,
            "sand_service=trace"
        );
    }
}
