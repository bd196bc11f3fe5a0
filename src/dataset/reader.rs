//! Input and table readers

use crate::engine::Engine;
use crate::error::Result;
use crate::storage::Storage;
use crate::tables::{ColumnDef, TableSpec};
use crate::types::MalformedRecords;

/// Outcome of loading one JSON input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonLoad {
    /// Files matched by the glob
    pub files: usize,
    /// Rows loaded
    pub rows: usize,
}

/// JSON files under a storage root, decoded against fixed columns
pub struct JsonSource<'a> {
    engine: &'a Engine,
    storage: &'a Storage,
    columns: &'a [ColumnDef],
    mode: MalformedRecords,
}

impl<'a> JsonSource<'a> {
    pub fn new(engine: &'a Engine, storage: &'a Storage, columns: &'a [ColumnDef]) -> Self {
        Self {
            engine,
            storage,
            columns,
            mode: MalformedRecords::default(),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: MalformedRecords) -> Self {
        self.mode = mode;
        self
    }

    /// Load every file matching `pattern` (relative to the root) into `table`
    ///
    /// No matching file yields an empty table with the declared columns.
    pub fn load(&self, table: &str, pattern: &str) -> Result<JsonLoad> {
        let source = self.storage.engine_path(pattern);
        let files = self.engine.glob(&source)?;
        if files.is_empty() {
            tracing::warn!("No input files match {}", self.storage.display(pattern));
            self.engine.create_empty_table(table, self.columns)?;
            return Ok(JsonLoad::default());
        }

        tracing::debug!("Loading {} files from {source}", files.len());
        let rows = self
            .engine
            .load_json(table, &source, self.columns, self.mode)?;
        Ok(JsonLoad {
            files: files.len(),
            rows,
        })
    }
}

/// Load a written output table into the engine as `into`
///
/// Partition columns come back after the data columns, typed as the table
/// declares them. A table with no data files loads as an empty table with
/// `fallback` columns.
pub async fn read_table(
    engine: &Engine,
    storage: &Storage,
    table: &TableSpec,
    into: &str,
    fallback: &[ColumnDef],
) -> Result<usize> {
    let objects = storage.list(table.name).await?;
    if !objects.iter().any(|path| path.ends_with(".parquet")) {
        tracing::debug!("{} has no data files", storage.display(table.name));
        engine.create_empty_table(into, fallback)?;
        return Ok(0);
    }

    let pattern = format!(
        "{}/{}*.parquet",
        table.name,
        "*/".repeat(table.partition_by.len())
    );
    engine.load_parquet(into, &storage.engine_path(&pattern), table.partition_by)
}
