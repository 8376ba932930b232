use crate::errors::SandError;
use crate::masterdata::LookupTables;
use crate::models::{FeatureVector, PredictionRequest, PredictionResult};
use chrono::{Datelike, NaiveDate};

/// Receipt dates are `day.month.year`.
pub const RECEIPT_DATE_FORMAT: &str = "%d.%m.%Y";

/// Extract the month (1-12) from a receipt date.
pub fn parse_receipt_month(date_receive: &str) -> Result<u32, SandError> {
    NaiveDate::parse_from_str(date_receive, RECEIPT_DATE_FORMAT)
        .map(|date| date.month())
        .map_err(|_| {
            SandError::InvalidInput(
                "date_receive must be a valid date in day.month.year format".to_string(),
            )
        })
}

/// Build the model input for one request.
pub fn derive_features(
    request: &PredictionRequest,
    tables: &LookupTables,
) -> Result<FeatureVector, SandError> {
    let month = parse_receipt_month(&request.date_receive)?;

    Ok(FeatureVector {
        month,
        season: tables.season_for(month),
        plant: request.plant.clone(),
        vendor: request.vendor.clone(),
        region: tables.region_for(&request.vendor),
        fines: request.fines,
        bulk: request.bulk,
    })
}

/// Round half away from zero to 2 decimals.
///
/// Magnitudes too large to scale by 100 have no fractional digits left and
/// are returned unchanged.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        value
    }
}

/// Scale the raw prediction by `fines` and round both values.
///
/// The total uses the unrounded prediction. A product that overflows is an
/// `InferenceFailure`; non-finite values never reach the response.
pub fn post_process(prediction: f64, fines: f64) -> Result<PredictionResult, SandError> {
    let result = PredictionResult {
        sand_predict_value: round2(prediction),
        total_sand_value: round2(prediction * fines / 100.0),
    };

    if result.sand_predict_value.is_finite() && result.total_sand_value.is_finite() {
        Ok(result)
    } else {
        Err(SandError::InferenceFailure(format!(
            "post-processed values are not finite: prediction={}, fines={}",
            prediction, fines
        )))
    }
}
