//! Inference pipeline: feature derivation, model evaluation, post-processing.
//!
//! The model is an opaque [`Predictor`] loaded once at startup. Everything
//! around it (date parsing, lookups, rounding) lives in [`features`] so the
//! pipeline can be exercised with any predictor.

pub mod features;
pub mod linear;

use crate::models::FeatureVector;
use thiserror::Error;

pub use features::{derive_features, parse_receipt_month, post_process, round2};
pub use linear::{LinearModel, ModelError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredictorError {
    #[error("unknown category {value:?} for feature {feature}")]
    UnknownCategory { feature: &'static str, value: String },

    #[error("model produced a non-finite value")]
    NonFinite,

    #[error("{0}")]
    Other(String),
}

/// A loaded regression model.
///
/// Implementations must be safe to call from several blocking threads at
/// once; `predict` takes `&self` and is never given mutable access.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictorError>;

    /// Short label for readiness reporting.
    fn kind(&self) -> &'static str;
}
