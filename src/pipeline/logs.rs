//! Activity logs: the users and time dimensions and the songplays fact

use crate::error::Result;
use crate::pipeline::Stage;
use crate::session::Session;
use crate::tables::{
    LOG_DATA, LOG_DATA_COLUMNS, PLAY_EVENTS, SONGPLAYS, SONGS, SONGS_DATASET,
    SONGS_DATASET_COLUMNS, TIME, USERS,
};
use crate::types::StageSummary;
use async_trait::async_trait;

/// Page value of a song being played
pub const NEXT_SONG: &str = "NextSong";

/// Song-play events, with `start_time` derived from the `ts` milliseconds (UTC)
pub fn play_events_query(log_data: &str) -> String {
    format!(
        "SELECT *, epoch_ms(ts) AS start_time \
         FROM {log_data} \
         WHERE page = '{NEXT_SONG}'"
    )
}

/// Users dimension
pub fn users_query(events: &str) -> String {
    format!(
        "SELECT DISTINCT \
             userId AS user_id, \
             firstName AS first_name, \
             lastName AS last_name, \
             gender, \
             level \
         FROM {events} \
         WHERE userId IS NOT NULL"
    )
}

/// Time dimension: one row per distinct `start_time`
///
/// `week` is the ISO week and `weekday` runs from 1 (Sunday) to 7 (Saturday).
pub fn time_query(events: &str) -> String {
    format!(
        "SELECT DISTINCT \
             start_time, \
             CAST(hour(start_time) AS INTEGER) AS hour, \
             CAST(day(start_time) AS INTEGER) AS day, \
             CAST(weekofyear(start_time) AS INTEGER) AS week, \
             CAST(month(start_time) AS INTEGER) AS month, \
             CAST(year(start_time) AS INTEGER) AS year, \
             CAST(dayofweek(start_time) + 1 AS INTEGER) AS weekday \
         FROM {events}"
    )
}

/// Columns of the songplays fact that identify a play, in id order
const SONGPLAY_ORDER: &str =
    "start_time, user_id, level, song_id, artist_id, session_id, location, user_agent";

/// Songplays fact: song-play events matched to known songs by title
///
/// Rows are deduplicated and then ordered by every column before
/// `songplay_id` is assigned, so the same input always yields the same ids.
pub fn songplays_query(events: &str, songs: &str) -> String {
    format!(
        "SELECT \
             CAST(row_number() OVER (ORDER BY {SONGPLAY_ORDER}) - 1 AS BIGINT) AS songplay_id, \
             {SONGPLAY_ORDER} \
         FROM ( \
             SELECT DISTINCT \
                 e.start_time, \
                 e.userId AS user_id, \
                 e.level, \
                 s.song_id, \
                 s.artist_id, \
                 e.sessionId AS session_id, \
                 e.location, \
                 e.userAgent AS user_agent \
             FROM {events} AS e \
             JOIN {songs} AS s ON e.song = s.title \
         ) AS plays \
         ORDER BY songplay_id"
    )
}

/// Reads `log_data` and writes the users, time and songplays tables
///
/// Must run after [`SongDataStage`](crate::pipeline::SongDataStage): the
/// songplays join reads the written songs table back.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDataStage;

#[async_trait]
impl Stage for LogDataStage {
    fn name(&self) -> &'static str {
        "log_data"
    }

    async fn run(&self, session: &Session) -> Result<StageSummary> {
        let load = session.read_json(LOG_DATA, &session.config().log_data, LOG_DATA_COLUMNS)?;

        let mut summary = StageSummary::new(self.name());
        summary.input_files = load.files;
        summary.input_rows = load.rows;

        let plays = session
            .engine()
            .create_table_as(PLAY_EVENTS, &play_events_query(LOG_DATA))?;
        tracing::info!("{} of {} log events are song plays", plays, load.rows);

        summary
            .tables
            .push(session.write_table(&USERS, &users_query(PLAY_EVENTS)).await?);
        summary
            .tables
            .push(session.write_table(&TIME, &time_query(PLAY_EVENTS)).await?);

        let songs = session
            .read_table(&SONGS, SONGS_DATASET, SONGS_DATASET_COLUMNS)
            .await?;
        tracing::debug!("Read back {songs} songs for the songplays join");

        summary.tables.push(
            session
                .write_table(&SONGPLAYS, &songplays_query(PLAY_EVENTS, SONGS_DATASET))
                .await?,
        );

        Ok(summary)
    }
}
