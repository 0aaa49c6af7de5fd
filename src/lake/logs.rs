//! Log stage: event-log JSON into the users, time, and songplays tables

use crate::error::Result;
use crate::model::{calendar_from_millis, LogEvent, SongPlay, SongRecord, TimeSlot, User};
use crate::storage::dedup_records;
use std::collections::{HashMap, HashSet};

use super::batch::{songplay_partitions, time_partitions, users_batch};
use super::session::LakeSession;

/// Table name for the users view
pub const USERS_TABLE: &str = "users_table";

/// Table name for the time view
pub const TIME_TABLE: &str = "time_table";

/// Table name for the songplays view
pub const SONGPLAYS_TABLE: &str = "songplays_table";

/// Key for the exact-match song lookup: (title, artist name, duration bits)
type SongKey = (String, String, u64);

/// Reads event logs, filters song plays, projects users, time, songplays
pub struct LogStageProcessor<'a> {
    session: &'a LakeSession,
}

impl<'a> LogStageProcessor<'a> {
    /// Create a processor bound to a session
    pub fn new(session: &'a LakeSession) -> Self {
        Self { session }
    }

    /// Run the stage: read, dedup, filter to song plays, write three views
    pub async fn run(&self, log_glob: &str, song_glob: &str) -> Result<()> {
        let raw = dedup_records(self.session.source.read_json(log_glob).await?);
        let events = raw
            .into_iter()
            .map(serde_json::from_value::<LogEvent>)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let total = events.len();
        let plays: Vec<LogEvent> = events.into_iter().filter(LogEvent::is_next_song).collect();
        tracing::info!(total, plays = plays.len(), "event logs read");

        self.write_users(&plays).await?;
        self.write_time(&plays).await?;
        self.write_songplays(&plays, song_glob).await?;

        Ok(())
    }

    /// Distinct (user_id, first_name, last_name, gender, level), non-null id
    async fn write_users(&self, plays: &[LogEvent]) -> Result<()> {
        let mut seen = HashSet::new();
        let mut users = Vec::new();
        for event in plays {
            if let Some(user) = User::from_event(event) {
                if seen.insert(user.clone()) {
                    users.push(user);
                }
            }
        }

        let batch = users_batch(&users)?;
        self.session
            .destination
            .write_table(USERS_TABLE, vec![(String::new(), batch)])
            .await?;
        Ok(())
    }

    /// Calendar rows derived from each play's timestamp
    async fn write_time(&self, plays: &[LogEvent]) -> Result<()> {
        let slots: Vec<TimeSlot> = plays
            .iter()
            .filter_map(|event| event.ts)
            .filter_map(TimeSlot::from_millis)
            .collect();

        let partitions = time_partitions(&slots)?;
        self.session
            .destination
            .write_table(TIME_TABLE, partitions)
            .await?;
        Ok(())
    }

    /// Resolve each play against song metadata and write the fact view
    ///
    /// Song metadata is re-read independently of the song stage. The match
    /// is exact equality on (title, artist name, duration); events with no
    /// match are dropped, with the count surfaced in the log.
    async fn write_songplays(&self, plays: &[LogEvent], song_glob: &str) -> Result<()> {
        let raw = dedup_records(self.session.source.read_json(song_glob).await?);
        let songs = raw
            .into_iter()
            .map(serde_json::from_value::<SongRecord>)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let lookup = song_lookup(&songs);

        let mut rows = Vec::new();
        let mut unmatched = 0usize;
        for (songplay_id, event) in plays.iter().enumerate() {
            let Some((song_id, artist_id)) = resolve(&lookup, event) else {
                unmatched += 1;
                continue;
            };

            let calendar = event.ts.and_then(calendar_from_millis);
            rows.push(SongPlay {
                songplay_id: songplay_id as i64,
                start_time: event.ts,
                month: calendar.map(|c| c.month),
                year: calendar.map(|c| c.year),
                user_id: event.user_id,
                level: event.level.clone(),
                song_id,
                artist_id,
                session_id: event.session_id,
                location: event.location.clone(),
                user_agent: event.user_agent.clone(),
            });
        }

        tracing::info!(
            matched = rows.len(),
            unmatched,
            "song plays resolved against metadata"
        );

        let partitions = songplay_partitions(&rows)?;
        self.session
            .destination
            .write_table(SONGPLAYS_TABLE, partitions)
            .await?;
        Ok(())
    }
}

/// Build the exact-match lookup from song metadata
fn song_lookup(songs: &[SongRecord]) -> HashMap<SongKey, (Option<String>, Option<String>)> {
    let mut lookup = HashMap::new();
    for song in songs {
        let (Some(title), Some(artist), Some(duration)) =
            (&song.title, &song.artist_name, song.duration)
        else {
            continue;
        };
        lookup.insert(
            (title.clone(), artist.clone(), duration.to_bits()),
            (song.song_id.clone(), song.artist_id.clone()),
        );
    }
    lookup
}

/// Look up the (song_id, artist_id) pair for one event, if any
fn resolve(
    lookup: &HashMap<SongKey, (Option<String>, Option<String>)>,
    event: &LogEvent,
) -> Option<(Option<String>, Option<String>)> {
    let (Some(song), Some(artist), Some(length)) = (&event.song, &event.artist, event.length)
    else {
        return None;
    };
    lookup
        .get(&(song.clone(), artist.clone(), length.to_bits()))
        .cloned()
}
