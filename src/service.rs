//! Prediction service: classifier lookup plus forecast projection
//!
//! The served model lives in a [`ModelHandle`] owned by the service. The
//! first request (or an explicit warm-up) loads the persisted model or
//! trains a new one; later requests reuse it until a retrain swaps it out.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

use crate::PredictorError;
use crate::cache::PersistentCache;
use crate::classifier::{Features, WeatherClassifier, train_weather_model};
use crate::config::ModelConfig;
use crate::dataset::GsodDatasetLoader;
use crate::forecast::{CurrentConditions, project};
use crate::models::{ForecastDay, WeatherCategory};

const MODEL_CACHE_KEY: &str = "model:weather";
const MODEL_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// A classifier ready to serve, with the accuracy it scored when trained
pub struct TrainedClassifier {
    pub classifier: Arc<dyn WeatherClassifier>,
    pub accuracy: f64,
}

/// Where the served classifier comes from
#[async_trait]
pub trait ModelSource: Send + Sync {
    /// A previously persisted classifier, if one is available
    async fn load(&self) -> Result<Option<Arc<dyn WeatherClassifier>>>;

    /// Train (and persist) a fresh classifier
    async fn train(&self) -> Result<TrainedClassifier>;
}

/// GSOD-trained scaler + kNN pipeline persisted in the cache
pub struct GsodModelSource {
    loader: GsodDatasetLoader,
    cache: PersistentCache,
    config: ModelConfig,
}

impl GsodModelSource {
    pub fn new(loader: GsodDatasetLoader, cache: PersistentCache, config: ModelConfig) -> Self {
        Self {
            loader,
            cache,
            config,
        }
    }
}

#[async_trait]
impl ModelSource for GsodModelSource {
    async fn load(&self) -> Result<Option<Arc<dyn WeatherClassifier>>> {
        match self
            .cache
            .get::<crate::classifier::WeatherModel>(MODEL_CACHE_KEY)
            .await
        {
            Ok(Some(model)) => {
                info!("Loaded persisted weather model");
                Ok(Some(Arc::new(model)))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!("Persisted model unreadable, discarding it: {e:#}");
                self.cache.remove(MODEL_CACHE_KEY).await?;
                Ok(None)
            }
        }
    }

    async fn train(&self) -> Result<TrainedClassifier> {
        let rows = self.loader.load().await?;
        let config = self.config.clone();
        let outcome = tokio::task::spawn_blocking(move || train_weather_model(&rows, &config))
            .await
            .context("Training task panicked")??;

        self.cache
            .put(MODEL_CACHE_KEY, outcome.model.clone(), MODEL_TTL)
            .await?;
        info!(
            train_rows = outcome.train_rows,
            test_rows = outcome.test_rows,
            "Weather model saved"
        );

        Ok(TrainedClassifier {
            classifier: Arc::new(outcome.model),
            accuracy: outcome.accuracy,
        })
    }
}

/// Lazily initialised, swappable classifier.
///
/// All initialisation and retraining goes through `init`, so concurrent
/// first requests trigger a single load-or-train.
pub struct ModelHandle {
    source: Arc<dyn ModelSource>,
    current: RwLock<Option<Arc<dyn WeatherClassifier>>>,
    init: Mutex<()>,
}

impl ModelHandle {
    pub fn new(source: Arc<dyn ModelSource>) -> Self {
        Self {
            source,
            current: RwLock::new(None),
            init: Mutex::new(()),
        }
    }

    /// The served classifier, loading or training it on first use
    pub async fn get(&self) -> Result<Arc<dyn WeatherClassifier>> {
        if let Some(model) = self.current.read().await.clone() {
            return Ok(model);
        }

        let _guard = self.init.lock().await;
        if let Some(model) = self.current.read().await.clone() {
            return Ok(model);
        }

        let model = match self.source.load().await? {
            Some(model) => model,
            None => {
                info!("Model not found. Training new model...");
                self.source.train().await?.classifier
            }
        };
        *self.current.write().await = Some(model.clone());
        Ok(model)
    }

    /// Train a new classifier and serve it from now on; returns its accuracy
    pub async fn retrain(&self) -> Result<f64> {
        let _guard = self.init.lock().await;
        let trained = self.source.train().await?;
        *self.current.write().await = Some(trained.classifier);
        Ok(trained.accuracy)
    }
}

/// Observed conditions submitted for prediction
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeatherInput {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
}

impl WeatherInput {
    #[must_use]
    pub fn features(&self) -> Features {
        [
            self.temperature,
            self.humidity,
            self.pressure,
            self.wind_speed,
            self.precipitation,
        ]
    }

    /// Reject NaN and infinite readings
    pub fn validate(&self) -> Result<(), PredictorError> {
        let names = ["temperature", "humidity", "pressure", "wind_speed", "precipitation"];
        for (name, value) in names.iter().zip(self.features()) {
            if !value.is_finite() {
                return Err(PredictorError::validation(format!(
                    "{name} must be a finite number"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionConditions {
    pub humidity: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
}

/// Prediction response: today's category plus the projected five days
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherPrediction {
    pub weather_type: WeatherCategory,
    pub probability: f64,
    pub temperature: f64,
    pub conditions: PredictionConditions,
    pub forecast: Vec<ForecastDay>,
}

pub struct PredictionService {
    models: ModelHandle,
}

impl PredictionService {
    pub fn new(source: Arc<dyn ModelSource>) -> Self {
        Self {
            models: ModelHandle::new(source),
        }
    }

    /// Load or train the model ahead of the first request
    pub async fn warm_up(&self) -> Result<()> {
        self.models.get().await.map(|_| ())
    }

    #[instrument(skip(self), fields(temperature = input.temperature))]
    pub async fn predict(&self, input: WeatherInput) -> Result<WeatherPrediction> {
        input.validate()?;

        let model = self.models.get().await?;
        let prediction = model.predict(&input.features())?;

        let forecast = project(CurrentConditions {
            category: prediction.category,
            temperature: input.temperature,
            humidity: input.humidity,
            precipitation: input.precipitation,
        });

        Ok(WeatherPrediction {
            weather_type: prediction.category,
            probability: prediction.probability,
            temperature: input.temperature,
            conditions: PredictionConditions {
                humidity: input.humidity,
                precipitation: input.precipitation,
                wind_speed: input.wind_speed,
            },
            forecast,
        })
    }

    #[instrument(skip(self))]
    pub async fn retrain(&self) -> Result<f64> {
        let accuracy = self.models.retrain().await?;
        info!("Model successfully trained (accuracy {accuracy:.2})");
        Ok(accuracy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassPrediction;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed(WeatherCategory);

    impl WeatherClassifier for Fixed {
        fn predict(&self, _features: &Features) -> Result<ClassPrediction, PredictorError> {
            Ok(ClassPrediction {
                category: self.0,
                probability: 0.75,
            })
        }
    }

    #[derive(Default)]
    struct CountingSource {
        persisted: Option<WeatherCategory>,
        loads: AtomicUsize,
        trains: AtomicUsize,
    }

    #[async_trait]
    impl ModelSource for CountingSource {
        async fn load(&self) -> Result<Option<Arc<dyn WeatherClassifier>>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .persisted
                .map(|c| Arc::new(Fixed(c)) as Arc<dyn WeatherClassifier>))
        }

        async fn train(&self) -> Result<TrainedClassifier> {
            let n = self.trains.fetch_add(1, Ordering::SeqCst);
            let category = if n == 0 {
                WeatherCategory::Rainy
            } else {
                WeatherCategory::Foggy
            };
            Ok(TrainedClassifier {
                classifier: Arc::new(Fixed(category)),
                accuracy: 0.5,
            })
        }
    }

    fn input() -> WeatherInput {
        WeatherInput {
            temperature: 18.0,
            humidity: 70.0,
            pressure: 1012.0,
            wind_speed: 4.0,
            precipitation: 0.3,
        }
    }

    #[tokio::test]
    async fn test_first_use_trains_when_nothing_persisted() {
        let source = Arc::new(CountingSource::default());
        let service = PredictionService::new(source.clone());

        let prediction = service.predict(input()).await.unwrap();

        assert_eq!(prediction.weather_type, WeatherCategory::Rainy);
        assert_eq!(prediction.probability, 0.75);
        assert_eq!(prediction.forecast.len(), 5);
        assert_eq!(source.trains.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_persisted_model_is_memoised() {
        let source = Arc::new(CountingSource {
            persisted: Some(WeatherCategory::Sunny),
            ..Default::default()
        });
        let service = PredictionService::new(source.clone());

        for _ in 0..3 {
            let prediction = service.predict(input()).await.unwrap();
            assert_eq!(prediction.weather_type, WeatherCategory::Sunny);
        }

        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert_eq!(source.trains.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_first_requests_initialise_once() {
        let source = Arc::new(CountingSource::default());
        let service = Arc::new(PredictionService::new(source.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.predict(input()).await.map(|p| p.weather_type) })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), WeatherCategory::Rainy);
        }

        assert_eq!(source.trains.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retrain_swaps_served_model() {
        let source = Arc::new(CountingSource::default());
        let service = PredictionService::new(source.clone());
        service.warm_up().await.unwrap();

        let accuracy = service.retrain().await.unwrap();
        let prediction = service.predict(input()).await.unwrap();

        assert_eq!(accuracy, 0.5);
        assert_eq!(prediction.weather_type, WeatherCategory::Foggy);
    }

    #[tokio::test]
    async fn test_rejects_non_finite_input() {
        let service = PredictionService::new(Arc::new(CountingSource::default()));
        let mut bad = input();
        bad.pressure = f64::INFINITY;

        let err = service.predict(bad).await.unwrap_err();
        let err = err.downcast_ref::<PredictorError>().unwrap();
        assert!(matches!(err, PredictorError::Validation { .. }));
    }

    #[test]
    fn test_prediction_wire_format() {
        let prediction = WeatherPrediction {
            weather_type: WeatherCategory::PartlyCloudy,
            probability: 0.6,
            temperature: 21.0,
            conditions: PredictionConditions {
                humidity: 55.0,
                precipitation: 0.0,
                wind_speed: 3.0,
            },
            forecast: Vec::new(),
        };
        let value = serde_json::to_value(&prediction).unwrap();
        assert_eq!(value["weatherType"], "Partly Cloudy");
        assert_eq!(value["conditions"]["windSpeed"], 3.0);
        assert!(value["forecast"].as_array().unwrap().is_empty());
    }
}
