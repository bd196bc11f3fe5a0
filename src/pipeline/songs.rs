//! Song metadata: the songs and artists dimensions

use crate::error::Result;
use crate::pipeline::Stage;
use crate::session::Session;
use crate::tables::{ARTISTS, SONGS, SONG_DATA, SONG_DATA_COLUMNS};
use crate::types::StageSummary;
use async_trait::async_trait;

/// Songs dimension: one row per distinct song with a `song_id`
pub fn songs_query(song_data: &str) -> String {
    format!(
        "SELECT DISTINCT song_id, title, artist_id, year, duration \
         FROM {song_data} \
         WHERE song_id IS NOT NULL"
    )
}

/// Artists dimension: one row per distinct artist with an `artist_id`
pub fn artists_query(song_data: &str) -> String {
    format!(
        "SELECT DISTINCT \
             artist_id, \
             artist_name AS name, \
             artist_location AS location, \
             artist_latitude AS latitude, \
             artist_longitude AS longitude \
         FROM {song_data} \
         WHERE artist_id IS NOT NULL"
    )
}

/// Reads `song_data` and writes the songs and artists tables
#[derive(Debug, Default, Clone, Copy)]
pub struct SongDataStage;

#[async_trait]
impl Stage for SongDataStage {
    fn name(&self) -> &'static str {
        "song_data"
    }

    async fn run(&self, session: &Session) -> Result<StageSummary> {
        let load = session.read_json(SONG_DATA, &session.config().song_data, SONG_DATA_COLUMNS)?;

        let mut summary = StageSummary::new(self.name());
        summary.input_files = load.files;
        summary.input_rows = load.rows;

        summary
            .tables
            .push(session.write_table(&SONGS, &songs_query(SONG_DATA)).await?);
        summary
            .tables
            .push(session.write_table(&ARTISTS, &artists_query(SONG_DATA)).await?);

        Ok(summary)
    }
}
