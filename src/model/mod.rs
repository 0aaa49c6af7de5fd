//! Source records and projected entity rows
//!
//! The pipelines consume two kinds of source JSON: song-metadata objects
//! (one per file) and newline-delimited event-log objects. This module
//! holds their typed forms plus the five entity rows the lake projects
//! out of them, and the calendar derivation used for time rows.

mod entities;
mod records;

pub use entities::{
    calendar_from_millis, Artist, Calendar, Song, SongPlay, TimeSlot, User,
    HIVE_DEFAULT_PARTITION,
};
pub use records::{LogEvent, SongRecord, NEXT_SONG_PAGE};
