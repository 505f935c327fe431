//! Configuration management for the weather predictor
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::PredictorError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Observation dataset acquisition
    #[serde(default)]
    pub dataset: DatasetConfig,
    /// Classifier training
    #[serde(default)]
    pub model: ModelConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_server_host")]
    pub host: String,
    /// Bind port
    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// GSOD dataset settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Base URL of the global-summary-of-the-day archive
    #[serde(default = "default_dataset_base_url")]
    pub base_url: String,
    /// Station identifiers to download
    #[serde(default = "default_dataset_stations")]
    pub stations: Vec<String>,
    /// Number of full calendar years before the current one
    #[serde(default = "default_dataset_years")]
    pub years: u32,
    /// Maximum number of processed rows kept for training
    #[serde(default = "default_dataset_sample_size")]
    pub sample_size: usize,
    /// Request timeout in seconds
    #[serde(default = "default_dataset_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_dataset_max_retries")]
    pub max_retries: u32,
}

/// Classifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of neighbours consulted per prediction
    #[serde(default = "default_model_neighbours")]
    pub neighbours: usize,
    /// Share of rows held out for the accuracy score
    #[serde(default = "default_model_test_fraction")]
    pub test_fraction: f64,
    /// Seed for sampling and train/test splitting
    #[serde(default = "default_model_seed")]
    pub seed: u64,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8000
}

fn default_dataset_base_url() -> String {
    "https://www.ncei.noaa.gov/data/global-summary-of-the-day/access".to_string()
}

fn default_dataset_stations() -> Vec<String> {
    [
        "72295099999", // New York (JFK)
        "72278099999", // Miami
        "72494099999", // Los Angeles
        "72531099999", // Denver
        "72219099999", // Chicago
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn default_dataset_years() -> u32 {
    3
}

fn default_dataset_sample_size() -> usize {
    2000
}

fn default_dataset_timeout() -> u32 {
    30
}

fn default_dataset_max_retries() -> u32 {
    3
}

fn default_model_neighbours() -> usize {
    15
}

fn default_model_test_fraction() -> f64 {
    0.2
}

fn default_model_seed() -> u64 {
    42
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("weather-predictor"))
        .unwrap_or_else(|| PathBuf::from("data"))
        .to_string_lossy()
        .into_owned()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            base_url: default_dataset_base_url(),
            stations: default_dataset_stations(),
            years: default_dataset_years(),
            sample_size: default_dataset_sample_size(),
            timeout_seconds: default_dataset_timeout(),
            max_retries: default_dataset_max_retries(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            neighbours: default_model_neighbours(),
            test_fraction: default_model_test_fraction(),
            seed: default_model_seed(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl PredictorConfig {
    /// Load configuration from `config_path` (or the default location) and environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // WEATHER_PREDICTOR_SERVER__PORT=9000 overrides server.port
        builder = builder.add_source(
            Environment::with_prefix("WEATHER_PREDICTOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: PredictorConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weather-predictor").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.dataset.base_url.is_empty() {
            self.dataset.base_url = default_dataset_base_url();
        }
        if self.dataset.stations.is_empty() {
            self.dataset.stations = default_dataset_stations();
        }
        if self.dataset.years == 0 {
            self.dataset.years = default_dataset_years();
        }
        if self.dataset.sample_size == 0 {
            self.dataset.sample_size = default_dataset_sample_size();
        }
        if self.dataset.timeout_seconds == 0 {
            self.dataset.timeout_seconds = default_dataset_timeout();
        }
        if self.model.neighbours == 0 {
            self.model.neighbours = default_model_neighbours();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(PredictorError::config("Server port cannot be 0").into());
        }

        if self.dataset.years > 30 {
            return Err(
                PredictorError::config("Dataset years cannot exceed 30").into(),
            );
        }

        if self.dataset.timeout_seconds > 300 {
            return Err(
                PredictorError::config("Dataset download timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.dataset.max_retries > 10 {
            return Err(PredictorError::config("Dataset max retries cannot exceed 10").into());
        }

        if self.model.neighbours > 200 {
            return Err(PredictorError::config("Model neighbours cannot exceed 200").into());
        }

        if !(self.model.test_fraction > 0.0 && self.model.test_fraction < 1.0) {
            return Err(PredictorError::config(format!(
                "Model test fraction must be between 0 and 1 (exclusive), got {}",
                self.model.test_fraction
            ))
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(PredictorError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(PredictorError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.dataset.base_url.starts_with("http://")
            && !self.dataset.base_url.starts_with("https://")
        {
            return Err(PredictorError::config(
                "Dataset base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        if let Some(station) = self
            .dataset
            .stations
            .iter()
            .find(|s| s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(PredictorError::config(format!(
                "Invalid station identifier '{station}'"
            ))
            .into());
        }

        Ok(())
    }
}
