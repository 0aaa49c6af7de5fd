//! End-to-end lake pipeline tests against local storage
//!
//! Runs the full pipeline over a small fixture dataset in a tempdir and
//! reads the Parquet trees back.

use arrow::array::{Array, Int64Array, StringArray, TimestampMillisecondArray};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use playlake::config::LakeConfig;
use playlake::lake;
use playlake::model::calendar_from_millis;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SONG_S1: &str = r#"{"num_songs": 1, "artist_id": "AR1", "artist_latitude": 48.86, "artist_longitude": 2.35, "artist_location": "Paris", "artist_name": "Artist X", "song_id": "S1", "title": "Song A", "duration": 210.5, "year": 2000}"#;
const SONG_S2: &str = r#"{"num_songs": 1, "artist_id": "AR2", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "Artist Y", "song_id": "S2", "title": "Song B", "duration": 180.0, "year": 2005}"#;

// Line 2 is an exact duplicate of line 1; line 3 is an unmatched play;
// line 4 is not a play; line 5 matches S1 but has a blank user id.
const LOG_EVENTS: &str = concat!(
    r#"{"artist": "Artist X", "song": "Song A", "length": 210.5, "page": "NextSong", "ts": 1500000000000, "userId": 7, "sessionId": 818, "level": "paid", "firstName": "Lily", "lastName": "Koch", "gender": "F", "location": "San Jose, CA", "userAgent": "Mozilla/5.0"}"#,
    "\n",
    r#"{"artist": "Artist X", "song": "Song A", "length": 210.5, "page": "NextSong", "ts": 1500000000000, "userId": 7, "sessionId": 818, "level": "paid", "firstName": "Lily", "lastName": "Koch", "gender": "F", "location": "San Jose, CA", "userAgent": "Mozilla/5.0"}"#,
    "\n",
    r#"{"artist": "Nobody", "song": "Unknown Song", "length": 95.0, "page": "NextSong", "ts": 1541105830796, "userId": "15", "sessionId": 5, "level": "free", "firstName": "Ann", "lastName": "Baker", "gender": "F", "location": "NYC", "userAgent": "UA2"}"#,
    "\n",
    r#"{"artist": null, "song": null, "length": null, "page": "Home", "ts": 1541106106796, "userId": 7, "sessionId": 818, "level": "paid", "firstName": "Lily", "lastName": "Koch", "gender": "F", "location": "San Jose, CA", "userAgent": "Mozilla/5.0"}"#,
    "\n",
    r#"{"artist": "Artist X", "song": "Song A", "length": 210.5, "page": "NextSong", "ts": 1500000000500, "userId": "", "sessionId": 900, "level": "free", "firstName": null, "lastName": null, "gender": null, "location": null, "userAgent": null}"#,
    "\n",
);

struct Fixture {
    _input: TempDir,
    output: TempDir,
    config: LakeConfig,
}

fn fixture() -> Fixture {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let root = input.path();

    std::fs::create_dir_all(root.join("song_data/A/A/A")).unwrap();
    std::fs::create_dir_all(root.join("song_data/A/A/B")).unwrap();
    std::fs::create_dir_all(root.join("song_data/A/B/A")).unwrap();
    std::fs::write(root.join("song_data/A/A/A/TRAAAAA.json"), SONG_S1).unwrap();
    std::fs::write(root.join("song_data/A/A/B/TRAAAAB.json"), SONG_S2).unwrap();
    // Same record again in another file; full-row dedup must collapse it
    std::fs::write(root.join("song_data/A/B/A/TRAAABA.json"), SONG_S1).unwrap();

    std::fs::create_dir_all(root.join("log_data/2018/11")).unwrap();
    std::fs::write(root.join("log_data/2018/11/2018-11-01-events.json"), LOG_EVENTS).unwrap();

    let config = LakeConfig {
        input_url: root.to_str().unwrap().to_string(),
        output_url: output.path().to_str().unwrap().to_string(),
        song_glob: "song_data/*/*/*/*.json".to_string(),
        log_glob: "log_data/*/*/*.json".to_string(),
        s3: None,
    };

    Fixture {
        _input: input,
        output,
        config,
    }
}

// ============================================================================
// Parquet read-back helpers
// ============================================================================

fn parquet_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if !dir.exists() {
        return files;
    }
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|ext| ext == "parquet") {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

fn read_batches(path: &Path) -> Vec<RecordBatch> {
    let file = File::open(path).unwrap();
    ParquetRecordBatchReaderBuilder::try_new(file)
        .unwrap()
        .build()
        .unwrap()
        .map(Result::unwrap)
        .collect()
}

fn table_rows(output: &Path, table: &str) -> usize {
    parquet_files(&output.join(table))
        .iter()
        .flat_map(|path| read_batches(path))
        .map(|batch| batch.num_rows())
        .sum()
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> &'a StringArray {
    batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap()
}

fn int64_col<'a>(batch: &'a RecordBatch, name: &str) -> &'a Int64Array {
    batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap()
}

fn timestamp_col<'a>(batch: &'a RecordBatch, name: &str) -> &'a TimestampMillisecondArray {
    batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<TimestampMillisecondArray>()
        .unwrap()
}

/// Extract `name=value` from a partition path
fn partition_value(path: &Path, name: &str) -> Option<String> {
    path.ancestors().find_map(|dir| {
        dir.file_name()
            .and_then(|segment| segment.to_str())
            .and_then(|segment| segment.strip_prefix(&format!("{name}=")))
            .map(String::from)
    })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_song_stage_outputs() {
    let fx = fixture();
    lake::run(&fx.config).await.unwrap();
    let out = fx.output.path();

    // Duplicate source record collapsed: two songs, two artists
    assert_eq!(table_rows(out, "songs_table"), 2);
    assert_eq!(table_rows(out, "artists_table"), 2);

    // Hive-style partition layout by (year, artist_id)
    assert!(out
        .join("songs_table/year=2000/artist_id=AR1/data.parquet")
        .exists());
    assert!(out
        .join("songs_table/year=2005/artist_id=AR2/data.parquet")
        .exists());

    // Artists unpartitioned, one file
    assert!(out.join("artists_table/data.parquet").exists());
}

#[tokio::test]
async fn test_users_distinct_and_non_null() {
    let fx = fixture();
    lake::run(&fx.config).await.unwrap();

    let files = parquet_files(&fx.output.path().join("users_table"));
    assert_eq!(files.len(), 1);
    let batches = read_batches(&files[0]);

    let mut user_ids = Vec::new();
    for batch in &batches {
        let ids = int64_col(batch, "user_id");
        for i in 0..batch.num_rows() {
            assert!(!ids.is_null(i), "null user_id in users table");
            user_ids.push(ids.value(i));
        }
    }
    user_ids.sort_unstable();

    // User 7 (duplicate play collapsed), user 15 (string-typed id),
    // blank-id play excluded
    assert_eq!(user_ids, vec![7, 15]);
}

#[tokio::test]
async fn test_time_rows_match_their_partition() {
    let fx = fixture();
    lake::run(&fx.config).await.unwrap();

    let files = parquet_files(&fx.output.path().join("time_table"));
    assert!(!files.is_empty());

    let mut rows = 0;
    for path in &files {
        let year: i32 = partition_value(path, "year").unwrap().parse().unwrap();
        let month: i32 = partition_value(path, "month").unwrap().parse().unwrap();

        for batch in read_batches(path) {
            let start = timestamp_col(&batch, "start_time");
            for i in 0..batch.num_rows() {
                let cal = calendar_from_millis(start.value(i)).unwrap();
                assert_eq!(cal.year, year);
                assert_eq!(cal.month, month);
            }
            rows += batch.num_rows();
        }
    }

    // Three distinct play timestamps
    assert_eq!(rows, 3);
    assert!(fx
        .output
        .path()
        .join("time_table/year=2017/month=7/data.parquet")
        .exists());
    assert!(fx
        .output
        .path()
        .join("time_table/year=2018/month=11/data.parquet")
        .exists());
}

#[tokio::test]
async fn test_songplays_joined_and_filtered() {
    let fx = fixture();
    lake::run(&fx.config).await.unwrap();

    let files = parquet_files(&fx.output.path().join("songplays_table"));
    let mut ids = Vec::new();
    let mut matched_example = false;
    let mut rows = 0;

    for path in &files {
        let year: i32 = partition_value(path, "year").unwrap().parse().unwrap();
        let month: i32 = partition_value(path, "month").unwrap().parse().unwrap();

        for batch in read_batches(path) {
            let songplay_ids = int64_col(&batch, "songplay_id");
            let start = timestamp_col(&batch, "start_time");
            let users = int64_col(&batch, "user_id");
            let songs = string_col(&batch, "song_id");
            let artists = string_col(&batch, "artist_id");

            for i in 0..batch.num_rows() {
                rows += 1;
                ids.push(songplay_ids.value(i));

                // Join correctness: the only matchable song is S1/AR1
                assert_eq!(songs.value(i), "S1");
                assert_eq!(artists.value(i), "AR1");

                // Partition equals the row's own calendar
                let cal = calendar_from_millis(start.value(i)).unwrap();
                assert_eq!((cal.year, cal.month), (year, month));

                if !users.is_null(i)
                    && users.value(i) == 7
                    && start.value(i) == 1_500_000_000_000
                {
                    matched_example = true;
                }
            }
        }
    }

    // Matching plays only: the unmatched play and the Home event are gone,
    // the duplicated play is collapsed
    assert_eq!(rows, 2);
    assert!(matched_example, "end-to-end example row missing");

    // Synthetic ids unique
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 2);
}

#[tokio::test]
async fn test_rerun_overwrites_outputs() {
    let fx = fixture();
    lake::run(&fx.config).await.unwrap();
    let first = table_rows(fx.output.path(), "songplays_table");

    lake::run(&fx.config).await.unwrap();
    let second = table_rows(fx.output.path(), "songplays_table");

    assert_eq!(first, second);
    assert_eq!(table_rows(fx.output.path(), "songs_table"), 2);
}
