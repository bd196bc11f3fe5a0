//! Error types for sparkify-etl
//!
//! This module defines the error hierarchy for the whole job.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for sparkify-etl
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // Data Errors
    // ============================================================================
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Malformed input '{path}': {message}")]
    MalformedInput { path: String, message: String },

    // ============================================================================
    // Engine Errors
    // ============================================================================
    #[error("DuckDB error: {0}")]
    Engine(#[from] duckdb::Error),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Invalid location '{location}': {message}")]
    InvalidLocation { location: String, message: String },

    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
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

    /// Create a malformed input error
    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Create an invalid location error
    pub fn invalid_location(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLocation {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create an invalid glob error
    pub fn invalid_glob(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidGlob {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Check if this error was caused by bad configuration rather than data or I/O
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::MissingConfigField { .. }
                | Error::InvalidConfigValue { .. }
                | Error::YamlParse(_)
                | Error::InvalidLocation { .. }
                | Error::InvalidGlob { .. }
        )
    }
}

/// Result type alias for sparkify-etl
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

        let err = Error::missing_field("aws.secret_access_key");
        assert_eq!(
            err.to_string(),
            "Missing required config field: aws.secret_access_key"
        );

        let err = Error::output("songs_table: disk full");
        assert_eq!(err.to_string(), "Output error: songs_table: disk full");

        let err = Error::malformed("log_data/2018/11/a.json", "unexpected EOF");
        assert_eq!(
            err.to_string(),
            "Malformed input 'log_data/2018/11/a.json': unexpected EOF"
        );
    }

    #[test]
    fn test_is_config_error() {
        assert!(Error::config("x").is_config_error());
        assert!(Error::invalid_value("threads", "must be > 0").is_config_error());
        assert!(Error::invalid_glob("{a", "unclosed").is_config_error());
        assert!(Error::invalid_location("ftp://x", "unsupported").is_config_error());

        assert!(!Error::malformed("x", "y").is_config_error());
        assert!(!Error::output("x").is_config_error());
        assert!(!Error::FileNotFound {
            path: "x".to_string()
        }
        .is_config_error());
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
