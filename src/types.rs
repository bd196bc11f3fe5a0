//! Common types used throughout sparkify-etl
//!
//! This module contains shared enums and the run statistics reported by
//! the pipeline stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Read Policy
// ============================================================================

/// What to do with an input line that cannot be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedRecords {
    /// Skip the line and keep the rest of the file
    #[default]
    Permissive,
    /// Abort the run
    FailFast,
}

// ============================================================================
// Parquet Compression
// ============================================================================

/// Compression codec for Parquet output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParquetCompression {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    None,
}

impl ParquetCompression {
    /// Codec name as accepted by `COPY ... (COMPRESSION ...)`
    pub fn as_sql(self) -> &'static str {
        match self {
            ParquetCompression::Snappy => "snappy",
            ParquetCompression::Zstd => "zstd",
            ParquetCompression::Gzip => "gzip",
            ParquetCompression::None => "uncompressed",
        }
    }
}

// ============================================================================
// Run Statistics
// ============================================================================

/// Outcome of writing one output table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableWriteStats {
    /// Table name (directory under the output root)
    pub table: String,
    /// Full location of the table directory
    pub location: String,
    /// Rows written
    pub rows: usize,
    /// Parquet files written
    pub files: usize,
    /// Distinct partition directories written (0 for unpartitioned tables)
    pub partitions: usize,
    /// Objects removed from a previous run
    pub replaced_objects: usize,
}

/// Outcome of one pipeline stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    /// Stage name
    pub stage: String,
    /// Input files matched by the stage glob
    pub input_files: usize,
    /// Raw rows decoded from the input
    pub input_rows: usize,
    /// Tables written by the stage, in write order
    pub tables: Vec<TableWriteStats>,
}

impl StageSummary {
    /// Create an empty summary for a stage
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            ..Self::default()
        }
    }

    /// Look up the stats of a table written by this stage
    pub fn table(&self, name: &str) -> Option<&TableWriteStats> {
        self.tables.iter().find(|t| t.table == name)
    }
}

/// Outcome of a full run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Input root
    pub input: String,
    /// Output root
    pub output: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Stages in execution order
    pub stages: Vec<StageSummary>,
    /// Wall-clock duration in milliseconds
    pub elapsed_ms: u64,
}

impl RunSummary {
    /// Look up the stats of a table across all stages
    pub fn table(&self, name: &str) -> Option<&TableWriteStats> {
        self.stages.iter().find_map(|s| s.table(name))
    }

    /// Total rows written across all tables
    pub fn total_rows(&self) -> usize {
        self.stages
            .iter()
            .flat_map(|s| s.tables.iter())
            .map(|t| t.rows)
            .sum()
    }
}
