//! Weather type classification
//!
//! Maps the five atmospheric features to one of the eight trainable
//! categories. [`WeatherModel`] is the shipped pipeline (standard scaling
//! followed by k-nearest-neighbours); anything implementing
//! [`WeatherClassifier`] can stand in for it.

pub mod knn;
pub mod scaler;
pub mod training;

use serde::{Deserialize, Serialize};

use crate::PredictorError;
use crate::models::WeatherCategory;

pub use knn::KNearestClassifier;
pub use scaler::StandardScaler;
pub use training::{TrainingOutcome, train_test_split, train_weather_model};

pub const FEATURE_COUNT: usize = 5;

/// `[temperature, humidity, pressure, wind_speed, precipitation]`
pub type Features = [f64; FEATURE_COUNT];

/// Predicted category with the classifier's confidence in it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassPrediction {
    pub category: WeatherCategory,
    /// Highest class probability, in `[0, 1]`
    pub probability: f64,
}

/// A trained model mapping features to a weather category
pub trait WeatherClassifier: Send + Sync {
    fn predict(&self, features: &Features) -> Result<ClassPrediction, PredictorError>;
}

/// Scaler + kNN pipeline, persisted as one unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherModel {
    scaler: StandardScaler,
    classifier: KNearestClassifier,
}

impl WeatherModel {
    /// Fit the scaler on `samples`, then the classifier on the scaled samples
    pub fn fit(
        neighbours: usize,
        samples: &[Features],
        labels: Vec<WeatherCategory>,
    ) -> Result<Self, PredictorError> {
        let scaler = StandardScaler::fit(samples)?;
        let scaled = samples.iter().map(|s| scaler.transform(s)).collect();
        let classifier = KNearestClassifier::fit(neighbours, scaled, labels)?;
        Ok(Self { scaler, classifier })
    }
}

impl WeatherClassifier for WeatherModel {
    fn predict(&self, features: &Features) -> Result<ClassPrediction, PredictorError> {
        if let Some(bad) = features.iter().find(|x| !x.is_finite()) {
            return Err(PredictorError::validation(format!(
                "Feature value {bad} is not a finite number"
            )));
        }
        self.classifier.predict(&self.scaler.transform(features))
    }
}
