//! Typed source records
//!
//! Fields mirror the raw JSON exactly; everything is nullable on read so a
//! sparse record deserializes instead of failing the batch. `userId` needs
//! lenient handling: the logs carry it as a number, a numeric string, or a
//! blank string standing in for null.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Page value identifying a song-play event
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// One song-metadata record
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SongRecord {
    #[serde(default)]
    pub num_songs: Option<i64>,

    #[serde(default)]
    pub artist_id: Option<String>,

    #[serde(default)]
    pub artist_latitude: Option<f64>,

    #[serde(default)]
    pub artist_longitude: Option<f64>,

    #[serde(default)]
    pub artist_location: Option<String>,

    #[serde(default)]
    pub artist_name: Option<String>,

    #[serde(default)]
    pub song_id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub duration: Option<f64>,

    #[serde(default)]
    pub year: Option<i64>,
}

/// One event-log record
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LogEvent {
    #[serde(default)]
    pub artist: Option<String>,

    #[serde(default)]
    pub auth: Option<String>,

    #[serde(default, rename = "firstName")]
    pub first_name: Option<String>,

    #[serde(default)]
    pub gender: Option<String>,

    #[serde(default, rename = "itemInSession")]
    pub item_in_session: Option<i64>,

    #[serde(default, rename = "lastName")]
    pub last_name: Option<String>,

    #[serde(default)]
    pub length: Option<f64>,

    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub method: Option<String>,

    #[serde(default)]
    pub page: Option<String>,

    #[serde(default)]
    pub registration: Option<f64>,

    #[serde(default, rename = "sessionId")]
    pub session_id: Option<i64>,

    #[serde(default)]
    pub song: Option<String>,

    #[serde(default)]
    pub status: Option<i64>,

    /// Epoch milliseconds
    #[serde(default)]
    pub ts: Option<i64>,

    #[serde(default, rename = "userAgent")]
    pub user_agent: Option<String>,

    #[serde(default, rename = "userId", deserialize_with = "lenient_i64")]
    pub user_id: Option<i64>,
}

impl LogEvent {
    /// Whether this event is a song play
    pub fn is_next_song(&self) -> bool {
        self.page.as_deref() == Some(NEXT_SONG_PAGE)
    }
}

/// Accept an integer, a numeric string, or a blank string (meaning null)
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<i64>().ok()
            }
        }
        Some(_) => None,
    })
}
