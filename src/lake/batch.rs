//! Arrow schemas and batch builders for the five lake tables
//!
//! Partition columns are carried in the directory path, not in the file,
//! so the file schemas here omit them.

use crate::error::Result;
use crate::model::{Artist, Song, SongPlay, TimeSlot, User, HIVE_DEFAULT_PARTITION};
use arrow::array::{
    ArrayRef, Float64Array, Int32Array, Int64Array, StringArray, TimestampMillisecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use std::collections::BTreeMap;
use std::sync::Arc;

// ============================================================================
// Partition paths
// ============================================================================

/// One Hive-style path segment, `column=value`
fn partition_segment<T: std::fmt::Display>(column: &str, value: Option<T>) -> String {
    match value {
        Some(v) => format!("{column}={v}"),
        None => format!("{column}={HIVE_DEFAULT_PARTITION}"),
    }
}

/// Group rows into partition paths, preserving row order within each group
fn group_by_partition<'a, T, F>(rows: &'a [T], path_of: F) -> BTreeMap<String, Vec<&'a T>>
where
    F: Fn(&T) -> String,
{
    let mut groups: BTreeMap<String, Vec<&T>> = BTreeMap::new();
    for row in rows {
        groups.entry(path_of(row)).or_default().push(row);
    }
    groups
}

// ============================================================================
// Column helpers
// ============================================================================

fn utf8_col<'a>(values: impl Iterator<Item = Option<&'a str>>) -> ArrayRef {
    Arc::new(values.collect::<StringArray>())
}

fn int64_col(values: impl Iterator<Item = Option<i64>>) -> ArrayRef {
    Arc::new(values.collect::<Int64Array>())
}

fn int32_col(values: impl Iterator<Item = Option<i32>>) -> ArrayRef {
    Arc::new(values.collect::<Int32Array>())
}

fn float64_col(values: impl Iterator<Item = Option<f64>>) -> ArrayRef {
    Arc::new(values.collect::<Float64Array>())
}

fn timestamp_col(values: impl Iterator<Item = Option<i64>>) -> ArrayRef {
    Arc::new(values.collect::<TimestampMillisecondArray>())
}

fn timestamp_field(name: &str) -> Field {
    Field::new(name, DataType::Timestamp(TimeUnit::Millisecond, None), true)
}

// ============================================================================
// Songs (partitioned by year, artist_id)
// ============================================================================

/// File schema of the songs table
pub fn songs_schema() -> Schema {
    Schema::new(vec![
        Field::new("song_id", DataType::Utf8, true),
        Field::new("title", DataType::Utf8, true),
        Field::new("duration", DataType::Float64, true),
    ])
}

/// Partition songs by (year, artist_id) and build one batch per partition
pub fn songs_partitions(rows: &[Song]) -> Result<Vec<(String, RecordBatch)>> {
    let groups = group_by_partition(rows, |song| {
        format!(
            "{}/{}",
            partition_segment("year", song.year),
            partition_segment("artist_id", song.artist_id.as_deref()),
        )
    });

    let schema = Arc::new(songs_schema());
    groups
        .into_iter()
        .map(|(path, rows)| {
            let batch = RecordBatch::try_new(
                Arc::clone(&schema),
                vec![
                    utf8_col(rows.iter().map(|s| s.song_id.as_deref())),
                    utf8_col(rows.iter().map(|s| s.title.as_deref())),
                    float64_col(rows.iter().map(|s| s.duration)),
                ],
            )?;
            Ok((path, batch))
        })
        .collect()
}

// ============================================================================
// Artists (unpartitioned)
// ============================================================================

/// File schema of the artists table
pub fn artists_schema() -> Schema {
    Schema::new(vec![
        Field::new("artist_id", DataType::Utf8, true),
        Field::new("name", DataType::Utf8, true),
        Field::new("location", DataType::Utf8, true),
        Field::new("latitude", DataType::Float64, true),
        Field::new("longitude", DataType::Float64, true),
    ])
}

/// Build the single artists batch
pub fn artists_batch(rows: &[Artist]) -> Result<RecordBatch> {
    let batch = RecordBatch::try_new(
        Arc::new(artists_schema()),
        vec![
            utf8_col(rows.iter().map(|a| a.artist_id.as_deref())),
            utf8_col(rows.iter().map(|a| a.name.as_deref())),
            utf8_col(rows.iter().map(|a| a.location.as_deref())),
            float64_col(rows.iter().map(|a| a.latitude)),
            float64_col(rows.iter().map(|a| a.longitude)),
        ],
    )?;
    Ok(batch)
}

// ============================================================================
// Users (unpartitioned)
// ============================================================================

/// File schema of the users table
pub fn users_schema() -> Schema {
    Schema::new(vec![
        Field::new("user_id", DataType::Int64, false),
        Field::new("first_name", DataType::Utf8, true),
        Field::new("last_name", DataType::Utf8, true),
        Field::new("gender", DataType::Utf8, true),
        Field::new("level", DataType::Utf8, true),
    ])
}

/// Build the single users batch
pub fn users_batch(rows: &[User]) -> Result<RecordBatch> {
    let batch = RecordBatch::try_new(
        Arc::new(users_schema()),
        vec![
            int64_col(rows.iter().map(|u| Some(u.user_id))),
            utf8_col(rows.iter().map(|u| u.first_name.as_deref())),
            utf8_col(rows.iter().map(|u| u.last_name.as_deref())),
            utf8_col(rows.iter().map(|u| u.gender.as_deref())),
            utf8_col(rows.iter().map(|u| u.level.as_deref())),
        ],
    )?;
    Ok(batch)
}

// ============================================================================
// Time (partitioned by year, month)
// ============================================================================

/// File schema of the time table
pub fn time_schema() -> Schema {
    Schema::new(vec![
        timestamp_field("start_time"),
        Field::new("hour", DataType::Int32, true),
        Field::new("day", DataType::Int32, true),
        Field::new("week", DataType::Int32, true),
        Field::new("weekday", DataType::Int32, true),
    ])
}

/// Partition time rows by (year, month) and build one batch per partition
pub fn time_partitions(rows: &[TimeSlot]) -> Result<Vec<(String, RecordBatch)>> {
    let groups = group_by_partition(rows, |slot| {
        format!(
            "{}/{}",
            partition_segment("year", Some(slot.year)),
            partition_segment("month", Some(slot.month)),
        )
    });

    let schema = Arc::new(time_schema());
    groups
        .into_iter()
        .map(|(path, rows)| {
            let batch = RecordBatch::try_new(
                Arc::clone(&schema),
                vec![
                    timestamp_col(rows.iter().map(|t| Some(t.start_time))),
                    int32_col(rows.iter().map(|t| Some(t.hour))),
                    int32_col(rows.iter().map(|t| Some(t.day))),
                    int32_col(rows.iter().map(|t| Some(t.week))),
                    int32_col(rows.iter().map(|t| Some(t.weekday))),
                ],
            )?;
            Ok((path, batch))
        })
        .collect()
}

// ============================================================================
// Songplays (partitioned by year, month)
// ============================================================================

/// File schema of the songplays table
pub fn songplays_schema() -> Schema {
    Schema::new(vec![
        Field::new("songplay_id", DataType::Int64, false),
        timestamp_field("start_time"),
        Field::new("user_id", DataType::Int64, true),
        Field::new("level", DataType::Utf8, true),
        Field::new("song_id", DataType::Utf8, true),
        Field::new("artist_id", DataType::Utf8, true),
        Field::new("session_id", DataType::Int64, true),
        Field::new("location", DataType::Utf8, true),
        Field::new("user_agent", DataType::Utf8, true),
    ])
}

/// Partition songplays by (year, month) and build one batch per partition
pub fn songplay_partitions(rows: &[SongPlay]) -> Result<Vec<(String, RecordBatch)>> {
    let groups = group_by_partition(rows, |play| {
        format!(
            "{}/{}",
            partition_segment("year", play.year),
            partition_segment("month", play.month),
        )
    });

    let schema = Arc::new(songplays_schema());
    groups
        .into_iter()
        .map(|(path, rows)| {
            let batch = RecordBatch::try_new(
                Arc::clone(&schema),
                vec![
                    int64_col(rows.iter().map(|p| Some(p.songplay_id))),
                    timestamp_col(rows.iter().map(|p| p.start_time)),
                    int64_col(rows.iter().map(|p| p.user_id)),
                    utf8_col(rows.iter().map(|p| p.level.as_deref())),
                    utf8_col(rows.iter().map(|p| p.song_id.as_deref())),
                    utf8_col(rows.iter().map(|p| p.artist_id.as_deref())),
                    int64_col(rows.iter().map(|p| p.session_id)),
                    utf8_col(rows.iter().map(|p| p.location.as_deref())),
                    utf8_col(rows.iter().map(|p| p.user_agent.as_deref())),
                ],
            )?;
            Ok((path, batch))
        })
        .collect()
}
