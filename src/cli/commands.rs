//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sparkify song-play ETL
#[derive(Parser, Debug)]
#[command(name = "sparkify-etl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML); defaults to ./dl.yaml when present
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build every output table from the input data
    Run {
        /// Input root holding song_data/ and log_data/
        /// Supports: /path, file:///path, s3://bucket/path, s3a://bucket/path, gs://bucket/path, az://container/path
        #[arg(short, long)]
        input: Option<String>,

        /// Output root for the tables (same formats as --input)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate configuration and show the resolved settings
    Validate,

    /// List output tables and their partition columns
    Tables,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Indented JSON
    Pretty,
}
