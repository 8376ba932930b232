//! One-hot linear regression model.
//!
//! Artifact format (JSON):
//!
//! ```json
//! {
//!   "intercept": 12.5,
//!   "numeric": {"month": 0.1, "fines": 0.4, "bulk": -0.2},
//!   "categorical": {
//!     "season": {"Spring": 1.5},
//!     "plant": {"A": -0.5},
//!     "vendor": {"V1": 2.0},
//!     "region": {"North": 0.75}
//!   },
//!   "handle_unknown": "ignore"
//! }
//! ```
//!
//! Each categorical feature contributes the coefficient of its value, or
//! nothing when the value was not seen during training and
//! `handle_unknown` is `ignore`.

use super::{Predictor, PredictorError};
use crate::models::FeatureVector;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleUnknown {
    #[default]
    Ignore,
    Error,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumericCoefficients {
    #[serde(default)]
    pub month: f64,
    #[serde(default)]
    pub fines: f64,
    #[serde(default)]
    pub bulk: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoricalCoefficients {
    #[serde(default)]
    pub season: HashMap<String, f64>,
    #[serde(default)]
    pub plant: HashMap<String, f64>,
    #[serde(default)]
    pub vendor: HashMap<String, f64>,
    #[serde(default)]
    pub region: HashMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinearModel {
    pub intercept: f64,
    #[serde(default)]
    pub numeric: NumericCoefficients,
    #[serde(default)]
    pub categorical: CategoricalCoefficients,
    #[serde(default)]
    pub handle_unknown: HandleUnknown,
}

impl LinearModel {
    /// Load a model artifact.
    #[instrument(skip_all)]
    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let model = Self::from_json_str(&raw)?;

        tracing::info!(
            target: "sand.inference",
            handle_unknown = ?model.handle_unknown,
            "Model loaded"
        );

        Ok(model)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(raw)?)
    }

    fn categorical_tables(&self) -> [(&'static str, &HashMap<String, f64>); 4] {
        [
            ("season", &self.categorical.season),
            ("plant", &self.categorical.plant),
            ("vendor", &self.categorical.vendor),
            ("region", &self.categorical.region),
        ]
    }

    fn categorical_term(
        &self,
        feature: &'static str,
        table: &HashMap<String, f64>,
        value: &str,
    ) -> Result<f64, PredictorError> {
        match (table.get(value), self.handle_unknown) {
            (Some(coef), _) => Ok(*coef),
            (None, HandleUnknown::Ignore) => Ok(0.0),
            (None, HandleUnknown::Error) => Err(PredictorError::UnknownCategory {
                feature,
                value: value.to_string(),
            }),
        }
    }
}

impl Predictor for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictorError> {
        let values = [
            features.season.as_str(),
            features.plant.as_str(),
            features.vendor.as_str(),
            features.region.as_str(),
        ];

        let mut total = self.intercept
            + self.numeric.month * f64::from(features.month)
            + self.numeric.fines * features.fines
            + self.numeric.bulk * features.bulk;

        for ((feature, table), value) in self.categorical_tables().into_iter().zip(values) {
            total += self.categorical_term(feature, table, value)?;
        }

        if total.is_finite() {
            Ok(total)
        } else {
            Err(PredictorError::NonFinite)
        }
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    const MODEL: &str = r#"{
        "intercept": 10.0,
        "numeric": {"month": 1.0, "fines": 0.5, "bulk": -0.25},
        "categorical": {
            "season": {"Spring": 2.0},
            "plant": {"A": 3.0},
            "vendor": {"V1": -1.0},
            "region": {"North": 4.0}
        }
    }"#;

    fn features(season: &str, region: &str) -> FeatureVector {
        FeatureVector {
            month: 3,
            season: season.to_string(),
            plant: "A".to_string(),
            vendor: "V1".to_string(),
            region: region.to_string(),
            fines: 80.0,
            bulk: 20.0,
        }
    }

    #[test]
    fn test_predict_all_categories_known() {
        let model = LinearModel::from_json_str(MODEL).unwrap();

        // 10 + 3 + 40 - 5 + 2 + 3 - 1 + 4
        assert_eq!(model.predict(&features("Spring", "North")).unwrap(), 56.0);
    }

    #[test]
    fn test_unknown_category_ignored_by_default() {
        let model = LinearModel::from_json_str(MODEL).unwrap();
        assert_eq!(model.handle_unknown, HandleUnknown::Ignore);

        // Season and region drop out
        assert_eq!(model.predict(&features("Unknown", "Unknown")).unwrap(), 50.0);
    }

    #[test]
    fn test_unknown_category_error_mode() {
        let raw = MODEL.replacen('{', r#"{"handle_unknown": "error","#, 1);
        let model = LinearModel::from_json_str(&raw).unwrap();

        let err = model.predict(&features("Spring", "Unknown")).unwrap_err();
        assert_eq!(
            err,
            PredictorError::UnknownCategory {
                feature: "region",
                value: "Unknown".to_string()
            }
        );
    }

    #[test]
    fn test_intercept_only_model() {
        let model = LinearModel::from_json_str(r#"{"intercept": 50.0}"#).unwrap();
        assert_eq!(model.predict(&features("Spring", "North")).unwrap(), 50.0);
        assert_eq!(model.kind(), "linear");
    }

    #[test]
    fn test_non_finite_output_is_error() {
        let model = LinearModel::from_json_str(r#"{"intercept": 1e308, "numeric": {"bulk": 1e308}}"#)
            .unwrap();
        assert_eq!(
            model.predict(&features("Spring", "North")).unwrap_err(),
            PredictorError::NonFinite
        );
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(matches!(
            LinearModel::from_json_str(r#"{"intercept": 1.0, "numeric": {"weight": 2.0}}"#),
            Err(ModelError::Parse(_))
        ));
        assert!(matches!(
            LinearModel::from_json_str(r#"{"intercept": 1.0, "handle_unknown": "skip"}"#),
            Err(ModelError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_intercept_rejected() {
        assert!(matches!(
            LinearModel::from_json_str(r#"{"numeric": {"fines": 2.0}}"#),
            Err(ModelError::Parse(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MODEL.as_bytes()).unwrap();

        let model = LinearModel::from_path(file.path()).unwrap();
        assert_eq!(model.intercept, 10.0);
    }

    #[test]
    fn test_from_path_missing_file() {
        assert!(matches!(
            LinearModel::from_path(Path::new("/nonexistent/model.json")),
            Err(ModelError::Io { .. })
        ));
    }

    #[test]
    fn test_bundled_model_loads() {
        let model = LinearModel::from_json_str(include_str!("../../data/model.json")).unwrap();

        assert_eq!(model.handle_unknown, HandleUnknown::Ignore);
        assert!(model.predict(&features("Spring", "North")).unwrap().is_finite());
    }
}
