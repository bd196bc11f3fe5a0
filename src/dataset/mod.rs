//! Dataset module
//!
//! Loading raw inputs into the engine and reading/writing output tables.
//!
//! # Overview
//!
//! This module provides:
//! - `JsonSource` - loads the JSON files matching a glob into an engine table
//! - `TableWriter` - overwrites an output table as Hive-partitioned Parquet
//! - `read_table` - loads a written table back, partition columns included

mod reader;
mod writer;

pub use reader::{read_table, JsonLoad, JsonSource};
pub use writer::{TableWriter, PART_FILE, SUCCESS_MARKER};

#[cfg(test)]
mod tests;
