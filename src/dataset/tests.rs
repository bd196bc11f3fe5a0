//! Tests for dataset module

use super::*;
use crate::config::{AwsCredentials, ParquetSettings};
use crate::engine::Engine;
use crate::error::Error;
use crate::storage::Storage;
use crate::tables::{ColumnDef, TableSpec, SONGS, SONGS_DATASET_COLUMNS, USERS};
use crate::types::MalformedRecords;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const TRACK_COLUMNS: &[ColumnDef] = &[
    ("song_id", "VARCHAR"),
    ("title", "VARCHAR"),
    ("year", "BIGINT"),
    ("artist_id", "VARCHAR"),
];

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn local_root() -> (TempDir, Storage) {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::create(dir.path().to_str().unwrap(), &AwsCredentials::default()).unwrap();
    (dir, storage)
}

fn tracks(engine: &Engine) -> &'static str {
    engine
        .create_table_as(
            "tracks",
            "SELECT * FROM (VALUES \
                ('S1', 'One', 2001::BIGINT, 'A1'), \
                ('S2', 'Two', 2001, 'A2'), \
                ('S3', 'Three', 1999, 'A1'), \
                ('S4', 'Four', 2001, 'A1')) t(song_id, title, year, artist_id)",
        )
        .unwrap();
    "SELECT song_id, title, year, artist_id FROM tracks"
}

// ============================================================================
// JSON Source Tests
// ============================================================================

#[test]
fn test_json_source_loads_matching_files() {
    let (dir, storage) = local_root();
    write(dir.path(), "song_data/A/a.json", r#"{"song_id": "S1", "title": "One", "year": 2001}"#);
    write(dir.path(), "song_data/B/b.json", r#"{"song_id": "S2", "title": "Two", "extra": 1}"#);
    write(dir.path(), "song_data/B/readme.txt", "not json");

    let engine = Engine::open().unwrap();
    let load = JsonSource::new(&engine, &storage, TRACK_COLUMNS)
        .load("raw", "song_data/*/*.json")
        .unwrap();
    assert_eq!(load, JsonLoad { files: 2, rows: 2 });

    let years: Vec<Option<i64>> = engine
        .query_column("SELECT year FROM raw ORDER BY song_id")
        .unwrap();
    assert_eq!(years, vec![Some(2001), None]);
}

#[test]
fn test_json_source_permissive_keeps_rest_of_file() {
    let (dir, storage) = local_root();
    write(
        dir.path(),
        "song_data/A/a.json",
        "{\"song_id\": \"S1\"}\n{\"song_id\": \n{\"song_id\": \"S2\"}\n",
    );
    write(dir.path(), "song_data/B/b.json", "{\"song_id\": ");

    let engine = Engine::open().unwrap();
    let load = JsonSource::new(&engine, &storage, TRACK_COLUMNS)
        .load("raw", "song_data/*/*.json")
        .unwrap();
    assert_eq!(load.files, 2);

    let ids: Vec<String> = engine
        .query_column("SELECT song_id FROM raw WHERE song_id IS NOT NULL ORDER BY song_id")
        .unwrap();
    assert_eq!(ids, vec!["S1", "S2"]);
}

#[test]
fn test_json_source_fail_fast() {
    let (dir, storage) = local_root();
    write(dir.path(), "song_data/A/a.json", "{\"song_id\": \"S1\"}\n");
    write(dir.path(), "song_data/B/b.json", "{\"song_id\": ");

    let engine = Engine::open().unwrap();
    let err = JsonSource::new(&engine, &storage, TRACK_COLUMNS)
        .with_mode(MalformedRecords::FailFast)
        .load("raw", "song_data/*/*.json")
        .unwrap_err();
    assert!(matches!(err, Error::MalformedInput { .. }));
}

#[test]
fn test_json_source_no_matches() {
    let (_dir, storage) = local_root();
    let engine = Engine::open().unwrap();
    let load = JsonSource::new(&engine, &storage, TRACK_COLUMNS)
        .load("raw", "log_data/*/*/*.json")
        .unwrap();
    assert_eq!(load, JsonLoad::default());
    assert_eq!(engine.count("raw").unwrap(), 0);
}

// ============================================================================
// Table Writer Tests
// ============================================================================

#[tokio::test]
async fn test_partitioned_write_layout() {
    let (dir, storage) = local_root();
    let engine = Engine::open().unwrap();
    let settings = ParquetSettings::default();
    let query = tracks(&engine);

    let stats = TableWriter::new(&engine, &storage, &settings)
        .overwrite(&SONGS, query)
        .await
        .unwrap();

    assert_eq!(stats.table, "songs_table");
    assert_eq!(stats.rows, 4);
    assert_eq!(stats.partitions, 3);
    assert_eq!(stats.files, 3);
    assert_eq!(stats.replaced_objects, 0);

    let table = dir.path().join("songs_table");
    assert!(table.join("year=2001/artist_id=A1/part-0.parquet").is_file());
    assert!(table.join("year=1999/artist_id=A1/part-0.parquet").is_file());
    assert!(table.join(SUCCESS_MARKER).is_file());
}

#[tokio::test]
async fn test_partitioned_read_back_restores_columns() {
    let (_dir, storage) = local_root();
    let engine = Engine::open().unwrap();
    let settings = ParquetSettings::default();
    let query = tracks(&engine);
    TableWriter::new(&engine, &storage, &settings)
        .overwrite(&SONGS, query)
        .await
        .unwrap();

    let rows = read_table(&engine, &storage, &SONGS, "back", SONGS_DATASET_COLUMNS)
        .await
        .unwrap();
    assert_eq!(rows, 4);

    let columns: Vec<String> = engine
        .query_column(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_name = 'back' ORDER BY ordinal_position",
        )
        .unwrap();
    assert_eq!(columns, vec!["song_id", "title", "year", "artist_id"]);

    let a1: Vec<String> = engine
        .query_column("SELECT song_id FROM back WHERE artist_id = 'A1' AND year = 2001 ORDER BY 1")
        .unwrap();
    assert_eq!(a1, vec!["S1", "S4"]);
}

#[tokio::test]
async fn test_overwrite_replaces_previous_output() {
    let (dir, storage) = local_root();
    let engine = Engine::open().unwrap();
    let settings = ParquetSettings::default();
    let writer = TableWriter::new(&engine, &storage, &settings);

    let query = tracks(&engine);
    writer.overwrite(&SONGS, query).await.unwrap();
    let stale = dir.path().join("songs_table/year=1900/artist_id=GONE/part-0.parquet");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, b"stale").unwrap();

    let stats = writer
        .overwrite(&SONGS, "SELECT * FROM tracks WHERE year = 1999")
        .await
        .unwrap();
    assert_eq!(stats.rows, 1);
    assert_eq!(stats.replaced_objects, 5);
    assert!(!stale.exists());
    assert!(!dir
        .path()
        .join("songs_table/year=2001/artist_id=A1/part-0.parquet")
        .exists());
}

#[tokio::test]
async fn test_failed_query_keeps_previous_output() {
    let (dir, storage) = local_root();
    let engine = Engine::open().unwrap();
    let settings = ParquetSettings::default();
    let writer = TableWriter::new(&engine, &storage, &settings);
    writer.overwrite(&USERS, "SELECT 8 AS user_id").await.unwrap();

    assert!(writer
        .overwrite(&USERS, "SELECT missing_column FROM tracks")
        .await
        .is_err());
    assert!(dir.path().join("users_table").join(PART_FILE).is_file());
}

#[tokio::test]
async fn test_unpartitioned_empty_table() {
    let (dir, storage) = local_root();
    let engine = Engine::open().unwrap();
    let settings = ParquetSettings::default();

    let stats = TableWriter::new(&engine, &storage, &settings)
        .overwrite(&USERS, "SELECT 'x' AS user_id WHERE false")
        .await
        .unwrap();
    assert_eq!((stats.rows, stats.files, stats.partitions), (0, 1, 0));
    assert!(dir.path().join("users_table").join(PART_FILE).is_file());

    let rows = read_table(&engine, &storage, &USERS, "users_back", &[("user_id", "VARCHAR")])
        .await
        .unwrap();
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn test_partitioned_empty_table_reads_back_with_fallback() {
    let (dir, storage) = local_root();
    let engine = Engine::open().unwrap();
    let settings = ParquetSettings::default();
    tracks(&engine);

    let stats = TableWriter::new(&engine, &storage, &settings)
        .overwrite(&SONGS, "SELECT * FROM tracks WHERE false")
        .await
        .unwrap();
    assert_eq!((stats.rows, stats.files, stats.partitions), (0, 0, 0));
    assert!(dir.path().join("songs_table").join(SUCCESS_MARKER).is_file());

    let rows = read_table(&engine, &storage, &SONGS, "back", SONGS_DATASET_COLUMNS)
        .await
        .unwrap();
    assert_eq!(rows, 0);
    assert_eq!(
        engine
            .query_column::<String>(
                "SELECT column_name FROM information_schema.columns \
                 WHERE table_name = 'back' ORDER BY ordinal_position"
            )
            .unwrap(),
        vec!["song_id", "title", "duration", "year", "artist_id"]
    );
}

#[tokio::test]
async fn test_single_partition_column_glob_depth() {
    let (_dir, storage) = local_root();
    let engine = Engine::open().unwrap();
    let settings = ParquetSettings::default();
    let by_artist = TableSpec {
        name: "by_artist",
        partition_by: &[("artist_id", "VARCHAR")],
    };
    tracks(&engine);

    TableWriter::new(&engine, &storage, &settings)
        .overwrite(&by_artist, "SELECT song_id, artist_id FROM tracks")
        .await
        .unwrap();
    let rows = read_table(&engine, &storage, &by_artist, "back", &[])
        .await
        .unwrap();
    assert_eq!(rows, 4);
}
