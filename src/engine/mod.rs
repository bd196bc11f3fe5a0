//! DuckDB query engine
//!
//! Scans the JSON inputs, runs the table transforms as SQL and writes
//! Parquet straight to local disk or object storage with `COPY ... TO`.

mod sql;

pub use sql::{columns_struct, quote_ident, quote_literal, types_struct};

use crate::config::{AwsCredentials, DEFAULT_REGION};
use crate::error::{Error, Result};
use crate::tables::ColumnDef;
use crate::types::{MalformedRecords, ParquetCompression};
use duckdb::types::FromSql;
use duckdb::Connection;
use std::fmt;
use std::sync::Mutex;

/// Options for a Parquet `COPY`
#[derive(Debug, Clone, Copy)]
pub struct CopyOptions<'a> {
    pub compression: ParquetCompression,
    pub row_group_size: usize,
    /// Hive partition columns; empty writes a single file
    pub partition_by: &'a [&'a str],
}

/// File name pattern for partitioned writes, `{i}` is the file index
pub const PART_FILE_PATTERN: &str = "part-{i}";

/// In-memory DuckDB database shared by the stages of a run
pub struct Engine {
    /// DuckDB connection; the lock makes the engine shareable across stage futures
    conn: Mutex<Connection>,
}

impl Engine {
    /// Open an in-memory database
    pub fn open() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::config(format!("Failed to create DuckDB connection: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> duckdb::Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| Error::Other("DuckDB connection lock poisoned".to_string()))?;
        Ok(f(&conn)?)
    }

    /// Run one or more statements
    pub fn execute(&self, sql: &str) -> Result<()> {
        tracing::debug!("Executing: {}", sql);
        self.with_conn(|conn| conn.execute_batch(sql))
    }

    /// Limit the worker threads
    pub fn set_threads(&self, threads: usize) -> Result<()> {
        self.execute(&format!("SET threads = {threads};"))
    }

    /// Configure object storage access (S3 and compatible, Azure)
    ///
    /// Keys left out of `credentials` fall back to the `AWS_*` environment
    /// variables; with no keys at all requests go out unsigned.
    pub fn configure_cloud_storage(&self, credentials: &AwsCredentials, azure: bool) -> Result<()> {
        self.execute("INSTALL httpfs; LOAD httpfs;")
            .map_err(|e| Error::config(format!("Failed to load httpfs extension: {e}")))?;

        let key_id = credentials
            .access_key_id
            .clone()
            .or_else(|| std::env::var("AWS_ACCESS_KEY_ID").ok());
        let secret = credentials
            .secret_access_key
            .clone()
            .or_else(|| std::env::var("AWS_SECRET_ACCESS_KEY").ok());
        let region = credentials
            .region
            .clone()
            .or_else(|| std::env::var("AWS_REGION").ok())
            .or_else(|| std::env::var("AWS_DEFAULT_REGION").ok())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let mut settings = format!("SET s3_region = {};", quote_literal(&region));
        if let (Some(key_id), Some(secret)) = (key_id, secret) {
            settings.push_str(&format!(
                " SET s3_access_key_id = {}; SET s3_secret_access_key = {};",
                quote_literal(&key_id),
                quote_literal(&secret)
            ));
        }
        if let Some(endpoint) = credentials
            .endpoint
            .clone()
            .or_else(|| std::env::var("AWS_ENDPOINT").ok())
        {
            let host = endpoint
                .trim_start_matches("https://")
                .trim_start_matches("http://");
            settings.push_str(&format!(
                " SET s3_endpoint = {}; SET s3_url_style = 'path';",
                quote_literal(host)
            ));
            if endpoint.starts_with("http://") {
                settings.push_str(" SET s3_use_ssl = false;");
            }
        }
        // Not routed through `execute`: the statement carries the secret key
        self.with_conn(|conn| conn.execute_batch(&settings))
            .map_err(|e| Error::config(format!("Failed to configure S3: {e}")))?;

        if azure {
            self.execute("INSTALL azure; LOAD azure;")
                .map_err(|e| Error::config(format!("Failed to load azure extension: {e}")))?;
        }
        Ok(())
    }

    /// First column of every row of `query`
    pub fn query_column<T: FromSql>(&self, query: &str) -> Result<Vec<T>> {
        tracing::debug!("Querying: {}", query);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(query)?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            let values = rows.collect::<duckdb::Result<Vec<T>>>();
            values
        })
    }

    /// Row count of a table or view
    pub fn count(&self, table: &str) -> Result<usize> {
        let count: i64 = self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT count(*) FROM {}", quote_ident(table)),
                [],
                |row| row.get(0),
            )
        })?;
        Ok(count as usize)
    }

    /// Files matching a glob, sorted
    pub fn glob(&self, pattern: &str) -> Result<Vec<String>> {
        self.query_column(&format!(
            "SELECT file FROM glob({}) ORDER BY file",
            quote_literal(pattern)
        ))
    }

    /// Materialize `query` as `table`, replacing any previous table of that name
    pub fn create_table_as(&self, table: &str, query: &str) -> Result<usize> {
        self.execute(&format!(
            "CREATE OR REPLACE TABLE {} AS {query};",
            quote_ident(table)
        ))?;
        self.count(table)
    }

    /// Create an empty table with the given columns
    pub fn create_empty_table(&self, table: &str, columns: &[ColumnDef]) -> Result<()> {
        let columns: Vec<String> = columns
            .iter()
            .map(|(name, sql_type)| format!("{} {sql_type}", quote_ident(name)))
            .collect();
        self.execute(&format!(
            "CREATE OR REPLACE TABLE {} ({});",
            quote_ident(table),
            columns.join(", ")
        ))
    }

    /// Load newline-delimited JSON matching `source` into `table`
    ///
    /// Keys outside `columns` are ignored and missing keys read as NULL.
    /// In permissive mode a line that does not parse contributes no values
    /// and the rest of its file is kept; in fail-fast mode it aborts the load.
    pub fn load_json(
        &self,
        table: &str,
        source: &str,
        columns: &[ColumnDef],
        mode: MalformedRecords,
    ) -> Result<usize> {
        let ignore_errors = matches!(mode, MalformedRecords::Permissive);
        let query = format!(
            "SELECT * FROM read_json({}, columns = {}, format = 'newline_delimited', ignore_errors = {ignore_errors})",
            quote_literal(source),
            columns_struct(columns)
        );
        self.create_table_as(table, &query)
            .map_err(|e| Error::malformed(source, e.to_string()))
    }

    /// Load a Hive-partitioned Parquet dataset matching `source` into `table`
    ///
    /// Partition values are typed by `partition_types` rather than guessed
    /// from the directory names.
    pub fn load_parquet(
        &self,
        table: &str,
        source: &str,
        partition_types: &[ColumnDef],
    ) -> Result<usize> {
        let query = if partition_types.is_empty() {
            format!("SELECT * FROM read_parquet({})", quote_literal(source))
        } else {
            format!(
                "SELECT * FROM read_parquet({}, hive_partitioning = true, hive_types = {})",
                quote_literal(source),
                types_struct(partition_types)
            )
        };
        self.create_table_as(table, &query)
    }

    /// Write the result of `query` as Parquet at `target`
    ///
    /// Unpartitioned writes produce the single file `target`; partitioned
    /// writes produce `target/col=value/.../part-N.parquet`, with the
    /// partition columns kept out of the data files.
    pub fn copy_to_parquet(&self, query: &str, target: &str, options: &CopyOptions<'_>) -> Result<()> {
        let mut copy_options = format!(
            "FORMAT PARQUET, COMPRESSION '{}', ROW_GROUP_SIZE {}",
            options.compression.as_sql(),
            options.row_group_size
        );
        if !options.partition_by.is_empty() {
            let columns: Vec<String> = options.partition_by.iter().map(|c| quote_ident(c)).collect();
            copy_options.push_str(&format!(
                ", PARTITION_BY ({}), OVERWRITE_OR_IGNORE true, FILENAME_PATTERN {}",
                columns.join(", "),
                quote_literal(PART_FILE_PATTERN)
            ));
        }

        let copy_sql = format!("COPY ({query}) TO {} ({copy_options});", quote_literal(target));
        self.execute(&copy_sql)
            .map_err(|e| Error::output(format!("Failed to write Parquet to {target}: {e}")))
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}
