//! Input columns and output table layout

/// Songs dimension
pub const SONGS_TABLE: &str = "songs_table";
/// Artists dimension
pub const ARTISTS_TABLE: &str = "artists_table";
/// Users dimension
pub const USERS_TABLE: &str = "users_table";
/// Time dimension
pub const TIME_TABLE: &str = "time_table";
/// Songplays fact table
pub const SONGPLAYS_TABLE: &str = "songplays_table";

/// Engine table holding the raw song records
pub const SONG_DATA: &str = "song_data";
/// Engine table holding the raw log events
pub const LOG_DATA: &str = "log_data";
/// Engine table holding song-play events with `start_time`
pub const PLAY_EVENTS: &str = "play_events";
/// Engine table holding the songs table read back from the output
pub const SONGS_DATASET: &str = "songs_dataset";

/// A column name and its DuckDB type
pub type ColumnDef = (&'static str, &'static str);

/// Output table name and the columns it is partitioned by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    /// Partition columns with the types they are read back as
    pub partition_by: &'static [ColumnDef],
}

impl TableSpec {
    /// Names of the partition columns, in directory order
    pub fn partition_columns(&self) -> Vec<&'static str> {
        self.partition_by.iter().map(|(name, _)| *name).collect()
    }

    pub fn is_partitioned(&self) -> bool {
        !self.partition_by.is_empty()
    }
}

pub const SONGS: TableSpec = TableSpec {
    name: SONGS_TABLE,
    partition_by: &[("year", "BIGINT"), ("artist_id", "VARCHAR")],
};

pub const ARTISTS: TableSpec = TableSpec {
    name: ARTISTS_TABLE,
    partition_by: &[("artist_id", "VARCHAR")],
};

pub const USERS: TableSpec = TableSpec {
    name: USERS_TABLE,
    partition_by: &[],
};

pub const TIME: TableSpec = TableSpec {
    name: TIME_TABLE,
    partition_by: &[("year", "INTEGER"), ("month", "INTEGER")],
};

pub const SONGPLAYS: TableSpec = TableSpec {
    name: SONGPLAYS_TABLE,
    partition_by: &[],
};

/// All output tables in the order they are written
pub const ALL_TABLES: [TableSpec; 5] = [SONGS, ARTISTS, USERS, TIME, SONGPLAYS];

/// One song record per file under `song_data/`
pub const SONG_DATA_COLUMNS: &[ColumnDef] = &[
    ("num_songs", "BIGINT"),
    ("artist_id", "VARCHAR"),
    ("artist_latitude", "DOUBLE"),
    ("artist_longitude", "DOUBLE"),
    ("artist_location", "VARCHAR"),
    ("artist_name", "VARCHAR"),
    ("song_id", "VARCHAR"),
    ("title", "VARCHAR"),
    ("duration", "DOUBLE"),
    ("year", "BIGINT"),
];

/// Newline-delimited activity events under `log_data/`
pub const LOG_DATA_COLUMNS: &[ColumnDef] = &[
    ("artist", "VARCHAR"),
    ("auth", "VARCHAR"),
    ("firstName", "VARCHAR"),
    ("gender", "VARCHAR"),
    ("itemInSession", "BIGINT"),
    ("lastName", "VARCHAR"),
    ("length", "DOUBLE"),
    ("level", "VARCHAR"),
    ("location", "VARCHAR"),
    ("method", "VARCHAR"),
    ("page", "VARCHAR"),
    ("registration", "DOUBLE"),
    ("sessionId", "BIGINT"),
    ("song", "VARCHAR"),
    ("status", "BIGINT"),
    ("ts", "BIGINT"),
    ("userAgent", "VARCHAR"),
    ("userId", "VARCHAR"),
];

/// Songs table as read back from its partitioned layout
///
/// Partition columns follow the data columns.
pub const SONGS_DATASET_COLUMNS: &[ColumnDef] = &[
    ("song_id", "VARCHAR"),
    ("title", "VARCHAR"),
    ("duration", "DOUBLE"),
    ("year", "BIGINT"),
    ("artist_id", "VARCHAR"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_columns_match_dataset_types() {
        for (column, sql_type) in SONGS.partition_by {
            assert!(
                SONGS_DATASET_COLUMNS.contains(&(*column, *sql_type)),
                "songs dataset lacks {column} {sql_type}"
            );
        }
        assert_eq!(SONGS.partition_columns(), vec!["year", "artist_id"]);
        assert!(!USERS.is_partitioned());
    }

    #[test]
    fn test_table_names_unique() {
        let mut names: Vec<_> = ALL_TABLES.iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL_TABLES.len());
    }

    #[test]
    fn test_raw_columns_carry_pipeline_columns() {
        let has = |columns: &[ColumnDef], name: &str| columns.iter().any(|(n, _)| *n == name);
        for column in ["song_id", "title", "artist_id", "year", "duration"] {
            assert!(has(SONG_DATA_COLUMNS, column));
        }
        for column in ["userId", "page", "ts", "song", "sessionId", "userAgent"] {
            assert!(has(LOG_DATA_COLUMNS, column));
        }
    }
}
