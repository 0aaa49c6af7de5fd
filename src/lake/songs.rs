//! Song stage: song-metadata JSON into the songs and artists tables

use crate::error::Result;
use crate::model::{Artist, Song, SongRecord};
use crate::storage::dedup_records;

use super::batch::{artists_batch, songs_partitions};
use super::session::LakeSession;

/// Table name for the songs view
pub const SONGS_TABLE: &str = "songs_table";

/// Table name for the artists view
pub const ARTISTS_TABLE: &str = "artists_table";

/// Reads song metadata, deduplicates, projects songs and artists
pub struct SongStageProcessor<'a> {
    session: &'a LakeSession,
}

impl<'a> SongStageProcessor<'a> {
    /// Create a processor bound to a session
    pub fn new(session: &'a LakeSession) -> Self {
        Self { session }
    }

    /// Run the stage: read, dedup, project, overwrite both destinations
    pub async fn run(&self, song_glob: &str) -> Result<()> {
        let raw = dedup_records(self.session.source.read_json(song_glob).await?);
        tracing::info!(records = raw.len(), "song metadata read");

        let records = raw
            .into_iter()
            .map(serde_json::from_value::<SongRecord>)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let songs: Vec<Song> = records.iter().map(Song::from).collect();
        let partitions = songs_partitions(&songs)?;
        self.session
            .destination
            .write_table(SONGS_TABLE, partitions)
            .await?;

        let artists: Vec<Artist> = records.iter().map(Artist::from).collect();
        let batch = artists_batch(&artists)?;
        self.session
            .destination
            .write_table(ARTISTS_TABLE, vec![(String::new(), batch)])
            .await?;

        Ok(())
    }
}
