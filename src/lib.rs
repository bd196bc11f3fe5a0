// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Sparkify ETL
//!
//! Batch job that turns raw song metadata and user activity logs into a
//! star schema of Parquet tables.
//!
//! ## Features
//!
//! - **JSON Inputs**: Song files and event logs read by glob from local disk or object storage
//! - **Star Schema**: songs, artists, users and time dimensions plus a songplays fact table
//! - **Hive Layout**: Partitioned Parquet output, overwritten on every run
//! - **Cloud Storage**: S3 (`s3://`, `s3a://`), GCS and Azure through `object_store`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sparkify_etl::{pipeline, EtlConfig, Result, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = EtlConfig::default()
//!         .with_input("./data")
//!         .with_output("./out");
//!
//!     let session = Session::new(config)?;
//!     let summary = pipeline::run(&session).await?;
//!     println!("{} rows written", summary.total_rows());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Orchestrator                         │
//! │          Session → SongDataStage → LogDataStage              │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────────┬──────────────┴──────┬────────────────────────┐
//! │   Storage    │      Dataset        │        Engine          │
//! ├──────────────┼─────────────────────┼────────────────────────┤
//! │ Local / S3   │ JSON source         │ DuckDB in memory       │
//! │ GCS / Azure  │ Table writer        │ read_json / SQL        │
//! │ Cleanup      │ Table read-back     │ COPY ... PARTITION_BY  │
//! └──────────────┴─────────────────────┴────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and run statistics
pub mod types;

/// Job configuration
pub mod config;

/// Object storage roots
pub mod storage;

/// DuckDB query engine
pub mod engine;

/// JSON sources and Parquet tables
pub mod dataset;

/// Input schemas and output table layout
pub mod tables;

/// Shared execution context
pub mod session;

/// Song and log stages and the orchestrator
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::EtlConfig;
pub use engine::Engine;
pub use session::Session;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
