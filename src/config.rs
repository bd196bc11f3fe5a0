//! Job configuration
//!
//! The job runs with fixed default locations; a YAML file may override
//! them and supply storage credentials.
//!
//! ```yaml
//! input: s3a://udacity-dend
//! output: s3a://sparkify-data-processed
//! aws:
//!   access_key_id: AKIA...
//!   secret_access_key: ...
//!   region: us-west-2
//! parquet:
//!   compression: snappy
//! ```

use crate::error::{Error, Result, ResultExt};
use crate::types::{MalformedRecords, ParquetCompression};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Input root used when no configuration overrides it
pub const DEFAULT_INPUT: &str = "s3a://udacity-dend";

/// Output root used when no configuration overrides it
pub const DEFAULT_OUTPUT: &str = "s3a://sparkify-data-processed";

/// Song files, relative to the input root
pub const DEFAULT_SONG_DATA: &str = "song_data/*/*/*/*.json";

/// Log files, relative to the input root
pub const DEFAULT_LOG_DATA: &str = "log_data/*/*/*.json";

/// S3 region used when neither the config nor the environment names one
pub const DEFAULT_REGION: &str = "us-west-2";

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "dl.yaml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete job configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EtlConfig {
    /// Root holding `song_data/` and `log_data/`
    pub input: String,

    /// Root receiving the five output tables
    pub output: String,

    /// Glob selecting song files under the input root
    pub song_data: String,

    /// Glob selecting log files under the input root
    pub log_data: String,

    /// Storage credentials
    pub aws: AwsCredentials,

    /// Handling of undecodable input lines
    pub malformed_records: MalformedRecords,

    /// Query engine worker threads; the engine picks when unset
    pub threads: Option<usize>,

    /// Parquet output settings
    pub parquet: ParquetSettings,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            input: DEFAULT_INPUT.to_string(),
            output: DEFAULT_OUTPUT.to_string(),
            song_data: DEFAULT_SONG_DATA.to_string(),
            log_data: DEFAULT_LOG_DATA.to_string(),
            aws: AwsCredentials::default(),
            malformed_records: MalformedRecords::default(),
            threads: None,
            parquet: ParquetSettings::default(),
        }
    }
}

impl EtlConfig {
    /// Parse a configuration from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Load the given file, else `dl.yaml` in the working directory, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            tracing::debug!("Using config file {}", fallback.display());
            return Self::from_file(fallback);
        }

        Ok(Self::default())
    }

    /// Override the input root
    #[must_use]
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    /// Override the output root
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Copy with the secret key replaced, for display
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.aws.secret_access_key.is_some() {
            config.aws.secret_access_key = Some("***".to_string());
        }
        config
    }

    fn check_pattern(field: &str, pattern: &str) -> Result<()> {
        let trimmed = pattern.trim_matches('/');
        if trimmed.is_empty() {
            return Err(Error::missing_field(field));
        }
        glob::Pattern::new(trimmed).map_err(|e| Error::invalid_glob(pattern, e.msg))?;
        Ok(())
    }

    /// Check the configuration for values the job cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.input.trim().is_empty() {
            return Err(Error::missing_field("input"));
        }
        if self.output.trim().is_empty() {
            return Err(Error::missing_field("output"));
        }
        if self.threads == Some(0) {
            return Err(Error::invalid_value("threads", "must be greater than 0"));
        }
        if self.parquet.row_group_size == 0 {
            return Err(Error::invalid_value(
                "parquet.row_group_size",
                "must be greater than 0",
            ));
        }

        Self::check_pattern("song_data", &self.song_data)?;
        Self::check_pattern("log_data", &self.log_data)?;
        self.aws.validate()?;

        Ok(())
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// S3 credentials; fields left empty fall back to the process environment
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AwsCredentials {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub region: Option<String>,
    /// Custom endpoint (MinIO, R2, ...)
    pub endpoint: Option<String>,
}

impl AwsCredentials {
    /// Whether an explicit key pair is configured
    pub fn has_keys(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }

    fn validate(&self) -> Result<()> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(_), None) => Err(Error::missing_field("aws.secret_access_key")),
            (None, Some(_)) => Err(Error::missing_field("aws.access_key_id")),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "***"),
            )
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

// ============================================================================
// Parquet Settings
// ============================================================================

/// Parquet writer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParquetSettings {
    pub compression: ParquetCompression,
    /// Rows per row group
    pub row_group_size: usize,
}

impl Default for ParquetSettings {
    fn default() -> Self {
        Self {
            compression: ParquetCompression::default(),
            row_group_size: 122_880,
        }
    }
}
