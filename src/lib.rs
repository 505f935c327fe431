//! Weather predictor - weather type classification and five-day outlooks
//!
//! This library labels historical station observations, trains a weather
//! type classifier on them, and serves predictions together with a
//! stochastic five-day forecast over HTTP.

pub mod api;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod error;
pub mod forecast;
pub mod logging;
pub mod models;
pub mod service;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use cache::PersistentCache;
pub use classifier::{ClassPrediction, WeatherClassifier, WeatherModel};
pub use config::PredictorConfig;
pub use dataset::GsodDatasetLoader;
pub use error::PredictorError;
pub use forecast::{CurrentConditions, project, project_with_rng};
pub use models::{ForecastDay, TrainingRow, WeatherCategory, WeatherIndicatorCode};
pub use service::{GsodModelSource, ModelSource, PredictionService, WeatherInput, WeatherPrediction};
pub use weather::{estimate_humidity, label};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
