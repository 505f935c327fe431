//! Data models for the weather predictor
//!
//! This module contains the core domain models organized by concern:
//! - Category: the weather type label space and its forecast ordering
//! - Observation: raw station-days and derived training rows
//! - Forecast: projected forecast days

pub mod category;
pub mod forecast;
pub mod observation;

// Re-export all public types for convenient access
pub use category::WeatherCategory;
pub use forecast::ForecastDay;
pub use observation::{IndicatorFlags, ObservationRecord, TrainingRow, WeatherIndicatorCode};
