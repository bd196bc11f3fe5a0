//! Parquet table writer
//!
//! Writes query results as Hive-partitioned Parquet directories with
//! overwrite semantics.

use crate::config::ParquetSettings;
use crate::engine::{quote_ident, CopyOptions, Engine};
use crate::error::Result;
use crate::storage::Storage;
use crate::tables::TableSpec;
use crate::types::TableWriteStats;
use bytes::Bytes;
use std::collections::BTreeSet;

/// Name of the data file of an unpartitioned table
pub const PART_FILE: &str = "part-0.parquet";

/// Marker written once a table is complete
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Writes output tables under a storage root
pub struct TableWriter<'a> {
    engine: &'a Engine,
    storage: &'a Storage,
    settings: &'a ParquetSettings,
}

impl<'a> TableWriter<'a> {
    pub fn new(engine: &'a Engine, storage: &'a Storage, settings: &'a ParquetSettings) -> Self {
        Self {
            engine,
            storage,
            settings,
        }
    }

    /// Replace `table` with the rows of `query`
    ///
    /// The query is materialized before anything is deleted, so a failing
    /// query leaves the previous output in place. Partition columns are
    /// encoded in the directory names and left out of the data files.
    pub async fn overwrite(&self, table: &TableSpec, query: &str) -> Result<TableWriteStats> {
        let staged = format!("{}_staged", table.name);
        let rows = self.engine.create_table_as(&staged, query)?;

        let replaced_objects = self.storage.delete_prefix(table.name).await?;
        if replaced_objects > 0 {
            tracing::debug!(
                "Removed {replaced_objects} objects from previous {} output",
                table.name
            );
        }

        let partition_by = table.partition_columns();
        let target = if table.is_partitioned() {
            self.storage.engine_path(table.name)
        } else {
            self.storage.ensure_dir(table.name)?;
            self.storage
                .engine_path(&format!("{}/{PART_FILE}", table.name))
        };
        let options = CopyOptions {
            compression: self.settings.compression,
            row_group_size: self.settings.row_group_size,
            partition_by: &partition_by,
        };
        self.engine.copy_to_parquet(
            &format!("SELECT * FROM {}", quote_ident(&staged)),
            &target,
            &options,
        )?;
        self.engine
            .execute(&format!("DROP TABLE {};", quote_ident(&staged)))?;

        let files: Vec<String> = self
            .storage
            .list(table.name)
            .await?
            .into_iter()
            .filter(|path| path.ends_with(".parquet"))
            .collect();
        let partitions = if table.is_partitioned() {
            files
                .iter()
                .filter_map(|path| path.rsplit_once('/').map(|(dir, _)| dir))
                .collect::<BTreeSet<_>>()
                .len()
        } else {
            0
        };

        self.storage
            .put(&format!("{}/{SUCCESS_MARKER}", table.name), Bytes::new())
            .await?;

        let stats = TableWriteStats {
            table: table.name.to_string(),
            location: self.storage.display(table.name),
            rows,
            files: files.len(),
            partitions,
            replaced_objects,
        };
        tracing::info!(
            "Wrote {} rows to {} ({} files)",
            stats.rows,
            stats.location,
            stats.files
        );
        Ok(stats)
    }
}
