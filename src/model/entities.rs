//! Projected entity rows
//!
//! The five views the lake pipeline writes. Rows are plain data; Arrow
//! batch building lives with the lake stage code.

use chrono::{DateTime, Datelike, Timelike};

use super::records::{LogEvent, SongRecord};

/// Directory name for a null partition value (Hive convention)
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

// ============================================================================
// Calendar derivation
// ============================================================================

/// Calendar fields derived from an epoch-millisecond timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    pub hour: i32,
    pub day: i32,
    /// ISO week of year
    pub week: i32,
    pub month: i32,
    pub year: i32,
    /// 1 through 7, Sunday = 1
    pub weekday: i32,
}

/// Derive calendar fields from epoch milliseconds (UTC)
///
/// Returns `None` for timestamps outside the representable range.
pub fn calendar_from_millis(millis: i64) -> Option<Calendar> {
    let dt = DateTime::from_timestamp_millis(millis)?;
    Some(Calendar {
        hour: dt.hour() as i32,
        day: dt.day() as i32,
        week: dt.iso_week().week() as i32,
        month: dt.month() as i32,
        year: dt.year(),
        weekday: dt.weekday().num_days_from_sunday() as i32 + 1,
    })
}

// ============================================================================
// Entity rows
// ============================================================================

/// Song dimension row
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub song_id: Option<String>,
    pub title: Option<String>,
    pub artist_id: Option<String>,
    pub year: Option<i64>,
    pub duration: Option<f64>,
}

impl From<&SongRecord> for Song {
    fn from(record: &SongRecord) -> Self {
        Self {
            song_id: record.song_id.clone(),
            title: record.title.clone(),
            artist_id: record.artist_id.clone(),
            year: record.year,
            duration: record.duration,
        }
    }
}

/// Artist dimension row
#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub artist_id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<&SongRecord> for Artist {
    fn from(record: &SongRecord) -> Self {
        Self {
            artist_id: record.artist_id.clone(),
            name: record.artist_name.clone(),
            location: record.artist_location.clone(),
            latitude: record.artist_latitude,
            longitude: record.artist_longitude,
        }
    }
}

/// User dimension row
///
/// All fields are hashable so the distinct projection can run over a set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

impl User {
    /// Project a user row out of an event, if the event carries a user id
    pub fn from_event(event: &LogEvent) -> Option<Self> {
        let user_id = event.user_id?;
        Some(Self {
            user_id,
            first_name: event.first_name.clone(),
            last_name: event.last_name.clone(),
            gender: event.gender.clone(),
            level: event.level.clone(),
        })
    }
}

/// Time dimension row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    /// Epoch milliseconds
    pub start_time: i64,
    pub hour: i32,
    pub day: i32,
    pub week: i32,
    pub month: i32,
    pub year: i32,
    pub weekday: i32,
}

impl TimeSlot {
    /// Derive a time row from epoch milliseconds
    pub fn from_millis(millis: i64) -> Option<Self> {
        let cal = calendar_from_millis(millis)?;
        Some(Self {
            start_time: millis,
            hour: cal.hour,
            day: cal.day,
            week: cal.week,
            month: cal.month,
            year: cal.year,
            weekday: cal.weekday,
        })
    }
}

/// Fact row: one resolved song play
#[derive(Debug, Clone, PartialEq)]
pub struct SongPlay {
    pub songplay_id: i64,
    /// Epoch milliseconds
    pub start_time: Option<i64>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub user_id: Option<i64>,
    pub level: Option<String>,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}
