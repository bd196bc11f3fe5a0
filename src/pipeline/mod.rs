//! Pipeline module
//!
//! The song and log stages and the orchestrator that runs them.
//!
//! # Overview
//!
//! This module provides:
//! - `Stage` - one step of the job, reading inputs and writing tables
//! - `SongDataStage` - songs and artists from `song_data`
//! - `LogDataStage` - users, time and songplays from `log_data`
//! - `run` - runs the stages in order over a shared `Session`

mod logs;
mod songs;

pub use logs::{
    play_events_query, songplays_query, time_query, users_query, LogDataStage, NEXT_SONG,
};
pub use songs::{artists_query, songs_query, SongDataStage};

use crate::error::Result;
use crate::session::Session;
use crate::types::{RunSummary, StageSummary};
use async_trait::async_trait;
use chrono::Utc;
use std::time::Instant;

/// One step of the job
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name used in logs and summaries
    fn name(&self) -> &'static str;

    /// Read the stage inputs and overwrite its tables
    async fn run(&self, session: &Session) -> Result<StageSummary>;
}

/// The stages of a full run, in execution order
pub fn stages() -> Vec<Box<dyn Stage>> {
    vec![Box::new(SongDataStage), Box::new(LogDataStage)]
}

/// Run every stage in order over `session`
///
/// Stops at the first failing stage; tables written by earlier stages are
/// left in place.
pub async fn run(session: &Session) -> Result<RunSummary> {
    let start = Instant::now();
    tracing::info!(
        "Starting run: {} -> {}",
        session.input().url(),
        session.output().url()
    );

    let mut summary = RunSummary {
        input: session.input().url().to_string(),
        output: session.output().url().to_string(),
        started_at: Utc::now(),
        ..RunSummary::default()
    };

    for stage in stages() {
        let stage_start = Instant::now();
        tracing::info!("Processing {}", stage.name());

        let stage_summary = stage.run(session).await?;
        tracing::info!(
            "Finished {} in {:?}: {} files, {} rows in",
            stage.name(),
            stage_start.elapsed(),
            stage_summary.input_files,
            stage_summary.input_rows
        );
        summary.stages.push(stage_summary);
    }

    summary.elapsed_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        "Run complete in {}ms: {} rows written",
        summary.elapsed_ms,
        summary.total_rows()
    );
    Ok(summary)
}
