//! CLI module
//!
//! Command-line interface for running the ETL job.
//!
//! # Commands
//!
//! - `run` - Build every output table
//! - `validate` - Check configuration and print it with secrets masked
//! - `tables` - List output tables and their partition columns

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
