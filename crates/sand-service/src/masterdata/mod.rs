//! Lookup tables for derived categorical features.
//!
//! Two static mappings are loaded once at startup and shared read-only:
//! receipt month to season, and vendor to region. Absent keys resolve to
//! [`UNKNOWN`] rather than failing the request.

use crate::observability::metrics::record_lookup_fallback;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::instrument;

/// Sentinel category used when a lookup key is absent.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Error)]
pub enum MasterdataError {
    #[error("Failed to read lookup tables from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse lookup tables: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid month key in season table: {0:?} (must be 1-12)")]
    InvalidMonth(String),
}

/// On-disk shape; month keys are strings in JSON.
#[derive(Debug, Deserialize)]
struct RawTables {
    #[serde(default)]
    season: HashMap<String, String>,
    #[serde(default)]
    region: HashMap<String, String>,
}

/// Month-to-season and vendor-to-region mappings.
#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    season: HashMap<u32, String>,
    region: HashMap<String, String>,
}

impl LookupTables {
    pub fn new(season: HashMap<u32, String>, region: HashMap<String, String>) -> Self {
        Self { season, region }
    }

    /// Load tables from a JSON file.
    #[instrument(skip_all)]
    pub fn from_path(path: &Path) -> Result<Self, MasterdataError> {
        let raw = std::fs::read_to_string(path).map_err(|source| MasterdataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let tables = Self::from_json_str(&raw)?;

        tracing::info!(
            target: "sand.masterdata",
            season_entries = tables.season.len(),
            region_entries = tables.region.len(),
            "Lookup tables loaded"
        );

        Ok(tables)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, MasterdataError> {
        let raw: RawTables = serde_json::from_str(raw)?;

        let season = raw
            .season
            .into_iter()
            .map(|(key, value)| {
                key.trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|month| (1..=12).contains(month))
                    .map(|month| (month, value))
                    .ok_or(MasterdataError::InvalidMonth(key))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self {
            season,
            region: raw.region,
        })
    }

    /// Season for a receipt month, or `Unknown`.
    pub fn season_for(&self, month: u32) -> String {
        match self.season.get(&month) {
            Some(season) => season.clone(),
            None => {
                record_lookup_fallback("season");
                tracing::debug!(target: "sand.masterdata", month, "No season for month");
                UNKNOWN.to_string()
            }
        }
    }

    /// Region for a vendor code (exact match), or `Unknown`.
    pub fn region_for(&self, vendor: &str) -> String {
        match self.region.get(vendor) {
            Some(region) => region.clone(),
            None => {
                record_lookup_fallback("region");
                tracing::debug!(target: "sand.masterdata", vendor = %vendor, "No region for vendor");
                UNKNOWN.to_string()
            }
        }
    }

    pub fn season_entries(&self) -> usize {
        self.season.len()
    }

    pub fn region_entries(&self) -> usize {
        self.region.len()
    }
}
