//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid assistant API base URL")]
    InvalidBaseUrl,

    #[error("Invalid upstream request timeout")]
    InvalidTimeout,

    #[error("Poll interval must be greater than zero")]
    InvalidPollInterval,

    #[error("Poll timeout must be greater than zero")]
    InvalidPollTimeout,

    #[error("Maximum poll attempts must be greater than zero")]
    InvalidPollAttempts,

    #[error("Fallback reply text must not be empty: {0}")]
    EmptyFallbackText(&'static str),
}
