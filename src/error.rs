//! Error types and handling for the weather predictor

use thiserror::Error;

/// Main error type for the weather predictor
#[derive(Error, Debug)]
pub enum PredictorError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Dataset download or parsing errors
    #[error("Dataset error: {message}")]
    Dataset { message: String },

    /// Training, loading or inference errors
    #[error("Model error: {message}")]
    Model { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl PredictorError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new dataset error
    pub fn dataset<S: Into<String>>(message: S) -> Self {
        Self::Dataset {
            message: message.into(),
        }
    }

    /// Create a new model error
    pub fn model<S: Into<String>>(message: S) -> Self {
        Self::Model {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PredictorError::Config { .. } => {
                "Configuration error. Please check your config file and environment.".to_string()
            }
            PredictorError::Dataset { .. } => {
                "Unable to obtain weather observations. Please check your internet connection."
                    .to_string()
            }
            PredictorError::Model { message } => format!("Model unavailable: {message}"),
            PredictorError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            PredictorError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            PredictorError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
