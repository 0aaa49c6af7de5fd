//! Lake ETL pipeline
//!
//! Reads song-metadata and event-log JSON, projects five entity views, and
//! writes them as Parquet trees:
//!
//! | table | partitioning |
//! |---|---|
//! | `songs_table` | year, artist_id |
//! | `artists_table` | none |
//! | `users_table` | none |
//! | `time_table` | year, month |
//! | `songplays_table` | year, month |
//!
//! Stages run strictly in sequence; the first failure aborts the run and
//! nothing already written is rolled back.

pub mod batch;
mod logs;
mod session;
mod songs;

pub use logs::{LogStageProcessor, SONGPLAYS_TABLE, TIME_TABLE, USERS_TABLE};
pub use session::LakeSession;
pub use songs::{SongStageProcessor, ARTISTS_TABLE, SONGS_TABLE};

use crate::config::LakeConfig;
use crate::error::Result;

/// Run the lake pipeline: songs first, then logs
pub async fn run(config: &LakeConfig) -> Result<()> {
    let session = LakeSession::connect(config)?;

    SongStageProcessor::new(&session)
        .run(&config.song_glob)
        .await?;
    LogStageProcessor::new(&session)
        .run(&config.log_glob, &config.song_glob)
        .await?;

    tracing::info!("lake pipeline complete");
    Ok(())
}
