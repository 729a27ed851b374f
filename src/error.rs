//! Error types for tapline
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use crate::transform::SchemaMismatch;
use thiserror::Error;

/// The main error type for tapline
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Config is missing required keys: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Protocol Errors
    // ============================================================================
    #[error("Invalid message: {message}")]
    InvalidMessage { message: String },

    #[error("Message is missing required key '{key}': {message}")]
    MissingMessageKey { key: String, message: String },

    // ============================================================================
    // Transform Errors
    // ============================================================================
    #[error(transparent)]
    SchemaMismatch(#[from] SchemaMismatch),

    #[error("Unresolvable $ref: {reference}")]
    UnresolvableReference { reference: String },

    #[error("Circular $ref: {reference}")]
    CircularReference { reference: String },

    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("Invalid patternProperties regex: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Unable to parse '{value}' as a date-time")]
    DateTimeParse { value: String },

    #[error("Pre-hook aborted transform: {message}")]
    PreHook { message: String },

    // ============================================================================
    // Connector Phase Errors
    // ============================================================================
    #[error("Discovery error: {message}")]
    Discovery { message: String },

    #[error("Sync error: {message}")]
    Sync { message: String },

    #[error("Retryable request error: {message}")]
    RetryableRequest { message: String },

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    #[error("Stream '{stream}' not found")]
    StreamNotFound { stream: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid message error
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage {
            message: message.into(),
        }
    }

    /// Create an invalid schema error
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Create an unresolvable reference error
    pub fn unresolvable(reference: impl Into<String>) -> Self {
        Self::UnresolvableReference {
            reference: reference.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a discovery error
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery {
            message: message.into(),
        }
    }

    /// Create a sync error
    pub fn sync(message: impl Into<String>) -> Self {
        Self::Sync {
            message: message.into(),
        }
    }

    /// Create a retryable request error
    pub fn retryable(message: impl Into<String>) -> Self {
        Self::RetryableRequest {
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RetryableRequest { .. })
    }

    /// The per-path transform errors, if this is a schema mismatch
    pub fn transform_errors(&self) -> Option<&[crate::transform::TransformError]> {
        match self {
            Error::SchemaMismatch(mismatch) => Some(mismatch.errors()),
            _ => None,
        }
    }
}

/// Result type alias for tapline
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("api_key, start_date");
        assert_eq!(
            err.to_string(),
            "Config is missing required keys: api_key, start_date"
        );

        let err = Error::unresolvable("#/definitions/missing");
        assert_eq!(err.to_string(), "Unresolvable $ref: #/definitions/missing");
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::retryable("503 from upstream").is_retryable());

        assert!(!Error::sync("bad page").is_retryable());
        assert!(!Error::discovery("no tables").is_retryable());
        assert!(!Error::config("test").is_retryable());
    }

    #[test]
    fn test_transform_errors_accessor() {
        let err: Error = SchemaMismatch::new(Vec::new()).into();
        assert_eq!(err.transform_errors().map(<[_]>::len), Some(0));
        assert!(Error::config("x").transform_errors().is_none());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
