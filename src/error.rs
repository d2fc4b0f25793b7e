//! Error types and handling for the `Mudcast` application

use thiserror::Error;

/// Main error type for the `Mudcast` application
#[derive(Error, Debug)]
pub enum MudcastError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Weather or map API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors (bad coordinates, malformed series, ...)
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

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl MudcastError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
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

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            MudcastError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            MudcastError::Api { .. } => {
                "Unable to reach the weather service. Please check your internet connection."
                    .to_string()
            }
            MudcastError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            MudcastError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            MudcastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            MudcastError::General { message } => message.clone(),
        }
    }
}
