use crate::errors::SandError;
use crate::inference::{derive_features, post_process, Predictor};
use crate::masterdata::LookupTables;
use crate::models::{PredictionRequest, PredictionResult};
use crate::observability::metrics::record_prediction;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::instrument;

/// Runs the inference pipeline for one request at a time per permit.
#[derive(Clone)]
pub struct PredictionService {
    predictor: Arc<dyn Predictor>,
    tables: Arc<LookupTables>,
    permits: Arc<Semaphore>,
}

impl PredictionService {
    pub fn new(
        predictor: Arc<dyn Predictor>,
        tables: Arc<LookupTables>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            predictor,
            tables,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn tables(&self) -> &LookupTables {
        &self.tables
    }

    pub fn model_kind(&self) -> &'static str {
        self.predictor.kind()
    }

    /// Derive features, evaluate the model on the blocking pool, post-process.
    #[instrument(skip_all, name = "sand.inference.predict", fields(plant = %request.plant, vendor = %request.vendor))]
    pub async fn predict(&self, request: PredictionRequest) -> Result<PredictionResult, SandError> {
        let start = Instant::now();
        let result = self.run(request).await;

        let status = match &result {
            Ok(_) => "success",
            Err(e) => e.as_label(),
        };
        record_prediction(status, start.elapsed());

        result
    }

    async fn run(&self, request: PredictionRequest) -> Result<PredictionResult, SandError> {
        let features = derive_features(&request, &self.tables)?;

        tracing::info!(
            target: "sand.inference",
            month = features.month,
            season = %features.season,
            region = %features.region,
            "Features derived"
        );

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| SandError::InferenceFailure(format!("inference pool closed: {}", e)))?;

        let predictor = Arc::clone(&self.predictor);
        let raw = tokio::task::spawn_blocking(move || predictor.predict(&features))
            .await
            .map_err(|e| SandError::InferenceFailure(format!("inference task failed: {}", e)))?
            .map_err(|e| SandError::InferenceFailure(e.to_string()))?;

        let result = post_process(raw, request.fines)?;

        tracing::info!(
            target: "sand.inference",
            sand_predict_value = result.sand_predict_value,
            total_sand_value = result.total_sand_value,
            "Prediction complete"
        );

        Ok(result)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::inference::PredictorError;
    use crate::models::FeatureVector;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct Fixed(f64);

    impl Predictor for Fixed {
        fn predict(&self, _features: &FeatureVector) -> Result<f64, PredictorError> {
            Ok(self.0)
        }

        fn kind(&self) -> &'static str {
            "fixed"
        }
    }

    /// Records what it was called with.
    #[derive(Default)]
    struct Recording(Mutex<Vec<FeatureVector>>);

    impl Predictor for Recording {
        fn predict(&self, features: &FeatureVector) -> Result<f64, PredictorError> {
            self.0.lock().unwrap().push(features.clone());
            Ok(1.0)
        }

        fn kind(&self) -> &'static str {
            "recording"
        }
    }

    struct Panicking;

    impl Predictor for Panicking {
        fn predict(&self, _features: &FeatureVector) -> Result<f64, PredictorError> {
            panic!("model exploded");
        }

        fn kind(&self) -> &'static str {
            "panicking"
        }
    }

    /// Tracks peak concurrency.
    #[derive(Default)]
    struct Slow {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Predictor for Slow {
        fn predict(&self, _features: &FeatureVector) -> Result<f64, PredictorError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(1.0)
        }

        fn kind(&self) -> &'static str {
            "slow"
        }
    }

    fn tables() -> Arc<LookupTables> {
        Arc::new(LookupTables::new(
            HashMap::from([(3, "Spring".to_string())]),
            HashMap::from([("V1".to_string(), "North".to_string())]),
        ))
    }

    fn request(date: &str) -> PredictionRequest {
        PredictionRequest {
            date_receive: date.to_string(),
            plant: "A".to_string(),
            vendor: "V1".to_string(),
            fines: 80.0,
            bulk: 20.0,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_golden_case() {
        let service = PredictionService::new(Arc::new(Fixed(50.0)), tables(), 4);

        let result = service.predict(request("15.03.2024")).await.unwrap();

        assert_eq!(
            result,
            PredictionResult {
                sand_predict_value: 50.0,
                total_sand_value: 40.0,
            }
        );
    }

    #[tokio::test]
    async fn test_predictor_receives_derived_features() {
        let recording = Arc::new(Recording::default());
        let service = PredictionService::new(recording.clone(), tables(), 1);

        service.predict(request("15.03.2024")).await.unwrap();

        let calls = recording.0.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].season, "Spring");
        assert_eq!(calls[0].region, "North");
        assert_eq!(calls[0].month, 3);
    }

    #[tokio::test]
    async fn test_invalid_date_never_reaches_model() {
        let recording = Arc::new(Recording::default());
        let service = PredictionService::new(recording.clone(), tables(), 1);

        let err = service.predict(request("31.02.2024")).await.unwrap_err();

        assert!(matches!(err, SandError::InvalidInput(_)));
        assert!(recording.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_predictor_error_is_inference_failure() {
        struct Failing;
        impl Predictor for Failing {
            fn predict(&self, _: &FeatureVector) -> Result<f64, PredictorError> {
                Err(PredictorError::UnknownCategory {
                    feature: "plant",
                    value: "Z".to_string(),
                })
            }
            fn kind(&self) -> &'static str {
                "failing"
            }
        }

        let service = PredictionService::new(Arc::new(Failing), tables(), 1);
        let err = service.predict(request("15.03.2024")).await.unwrap_err();

        match err {
            SandError::InferenceFailure(detail) => assert!(detail.contains("plant")),
            other => panic!("expected InferenceFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_predictor_panic_is_contained() {
        let service = PredictionService::new(Arc::new(Panicking), tables(), 1);

        let err = service.predict(request("15.03.2024")).await.unwrap_err();
        assert!(matches!(err, SandError::InferenceFailure(_)));

        // The service keeps working; the permit was released
        let service = PredictionService {
            predictor: Arc::new(Fixed(1.0)),
            ..service
        };
        assert!(service.predict(request("15.03.2024")).await.is_ok());
    }

    #[tokio::test]
    async fn test_overflowing_total_is_inference_failure() {
        let service = PredictionService::new(Arc::new(Fixed(50.0)), tables(), 1);
        let mut huge = request("15.03.2024");
        huge.fines = 1e307;

        let err = service.predict(huge).await.unwrap_err();

        assert!(matches!(err, SandError::InferenceFailure(_)));
    }

    #[tokio::test]
    async fn test_identical_requests_give_identical_results() {
        let model = crate::inference::LinearModel::from_json_str(include_str!(
            "../../data/model.json"
        ))
        .unwrap();
        let service = PredictionService::new(Arc::new(model), tables(), 2);

        let first = service.predict(request("15.03.2024")).await.unwrap();
        for _ in 0..5 {
            assert_eq!(service.predict(request("15.03.2024")).await.unwrap(), first);
        }

        let unknown_vendor = PredictionRequest {
            vendor: "V404".to_string(),
            ..request("10.07.2024")
        };
        let first = service.predict(unknown_vendor.clone()).await.unwrap();
        for _ in 0..5 {
            assert_eq!(service.predict(unknown_vendor.clone()).await.unwrap(), first);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_limited_by_permits() {
        let slow = Arc::new(Slow::default());
        let service = PredictionService::new(slow.clone(), tables(), 2);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.predict(request("15.03.2024")).await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert!(slow.peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_zero_concurrency_clamped_to_one() {
        let service = PredictionService::new(Arc::new(Fixed(1.0)), tables(), 0);
        assert_eq!(service.permits.available_permits(), 1);
        assert_eq!(service.model_kind(), "fixed");
        assert_eq!(service.tables().season_entries(), 1);
    }
}
