//! Error types for playlake
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for playlake
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Malformed record in {path}: {message}")]
    MalformedRecord { path: String, message: String },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    // ============================================================================
    // Warehouse Errors
    // ============================================================================
    #[error("Warehouse error: {0}")]
    Warehouse(#[from] duckdb::Error),

    #[error("Warehouse statement failed: {message}")]
    Statement { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
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

    /// Create a malformed record error
    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a warehouse statement error
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement {
            message: message.into(),
        }
    }
}

/// Result type alias for playlake
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("warehouse.password");
        assert_eq!(
            err.to_string(),
            "Missing required config field: warehouse.password"
        );

        let err = Error::malformed("log_data/2018/11/events.json", "not valid JSON");
        assert_eq!(
            err.to_string(),
            "Malformed record in log_data/2018/11/events.json: not valid JSON"
        );

        let err = Error::statement("table missing");
        assert_eq!(err.to_string(), "Warehouse statement failed: table missing");
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("not json");
        let err: Error = parse.unwrap_err().into();
        assert!(err.to_string().starts_with("Failed to parse JSON"));
    }
}
