//! Shared execution context for a run

use crate::config::EtlConfig;
use crate::dataset::{read_table, JsonLoad, JsonSource, TableWriter};
use crate::engine::Engine;
use crate::error::Result;
use crate::storage::Storage;
use crate::tables::{ColumnDef, TableSpec};
use crate::types::TableWriteStats;

/// Input and output roots plus the query engine
///
/// Built once by the orchestrator and passed to every stage by reference.
#[derive(Debug)]
pub struct Session {
    config: EtlConfig,
    input: Storage,
    output: Storage,
    engine: Engine,
}

impl Session {
    /// Validate `config`, open its input and output roots and start the engine
    pub fn new(config: EtlConfig) -> Result<Self> {
        config.validate()?;
        let input = Storage::open(&config.input, &config.aws)?;
        let output = Storage::create(&config.output, &config.aws)?;
        Self::with_storage(config, input, output)
    }

    /// Build a session over already opened roots
    pub fn with_storage(config: EtlConfig, input: Storage, output: Storage) -> Result<Self> {
        let engine = Engine::open()?;
        if let Some(threads) = config.threads {
            engine.set_threads(threads)?;
        }
        if input.is_cloud() || output.is_cloud() {
            engine.configure_cloud_storage(&config.aws, input.is_azure() || output.is_azure())?;
        }

        tracing::debug!(
            "Session: input={} output={} mode={:?}",
            input.url(),
            output.url(),
            config.malformed_records
        );
        Ok(Self {
            config,
            input,
            output,
            engine,
        })
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    pub fn input(&self) -> &Storage {
        &self.input
    }

    pub fn output(&self) -> &Storage {
        &self.output
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Load input JSON matching `pattern` into the engine table `table`
    pub fn read_json(&self, table: &str, pattern: &str, columns: &[ColumnDef]) -> Result<JsonLoad> {
        JsonSource::new(&self.engine, &self.input, columns)
            .with_mode(self.config.malformed_records)
            .load(table, pattern)
    }

    /// Overwrite an output table with the rows of `query`
    pub async fn write_table(&self, table: &TableSpec, query: &str) -> Result<TableWriteStats> {
        TableWriter::new(&self.engine, &self.output, &self.config.parquet)
            .overwrite(table, query)
            .await
    }

    /// Load an output table back into the engine table `into`
    pub async fn read_table(
        &self,
        table: &TableSpec,
        into: &str,
        fallback: &[ColumnDef],
    ) -> Result<usize> {
        read_table(&self.engine, &self.output, table, into, fallback).await
    }
}
