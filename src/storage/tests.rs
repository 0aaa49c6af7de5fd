//! Tests for storage module

use super::*;
use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;
use test_case::test_case;

fn sample_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, true),
        Field::new("name", DataType::Utf8, true),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![Some(1), Some(2)])),
            Arc::new(StringArray::from(vec![Some("a"), Some("b")])),
        ],
    )
    .unwrap()
}

// ============================================================================
// Decode Tests
// ============================================================================

#[test]
fn test_decode_single_object() {
    let records = decode_records(br#"{"song_id": "S1"}"#, "x.json").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["song_id"], "S1");
}

#[test]
fn test_decode_ndjson() {
    let data = b"{\"userId\": 1}\n{\"userId\": 2}\n\n{\"userId\": 3}\n";
    let records = decode_records(data, "events.json").unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2]["userId"], 3);
}

#[test]
fn test_decode_array() {
    let records = decode_records(br#"[{"a": 1}, {"a": 2}]"#, "x.json").unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn test_decode_empty_file() {
    assert!(decode_records(b"", "x.json").unwrap().is_empty());
    assert!(decode_records(b"  \n ", "x.json").unwrap().is_empty());
}

#[test]
fn test_decode_malformed_line() {
    let data = b"{\"a\": 1}\nnot json at all {\n";
    let err = decode_records(data, "bad.json").unwrap_err();
    assert!(err.to_string().contains("bad.json"));
}

// ============================================================================
// Dedup Tests
// ============================================================================

#[test]
fn test_dedup_full_row_equality() {
    let records = vec![
        json!({"a": 1, "b": "x"}),
        json!({"a": 1, "b": "x"}),
        json!({"a": 1, "b": "y"}),
    ];
    let deduped = dedup_records(records);
    assert_eq!(deduped.len(), 2);
    assert_eq!(deduped[0]["b"], "x");
    assert_eq!(deduped[1]["b"], "y");
}

#[test]
fn test_dedup_keeps_first_seen_order() {
    let records = vec![json!({"n": 3}), json!({"n": 1}), json!({"n": 3})];
    let deduped = dedup_records(records);
    assert_eq!(deduped.len(), 2);
    assert_eq!(deduped[0]["n"], 3);
    assert_eq!(deduped[1]["n"], 1);
}

// ============================================================================
// Glob Tests
// ============================================================================

#[test_case("song_data/*/*/*/*.json", "song_data/A/B/C/TRAABJL12903CDCF1A.json", true)]
#[test_case("song_data/*/*/*/*.json", "song_data/A/B/TRAABJL12903CDCF1A.json", false)]
#[test_case("log_data/*/*/*.json", "log_data/2018/11/2018-11-12-events.json", true)]
#[test_case("log_data/*/*/*.json", "log_data/2018/11/notes.txt", false)]
#[test_case("data/*.json", "data/a.json", true)]
#[test_case("data/a.json", "data/a.json", true)]
#[test_case("data/a.json", "data/b.json", false)]
fn test_glob_match(pattern: &str, path: &str, expected: bool) {
    assert_eq!(glob_match(pattern, path), expected);
}

// ============================================================================
// Location Tests
// ============================================================================

#[tokio::test]
async fn test_local_read_json_glob() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("song_data/A/B/C")).unwrap();
    std::fs::write(
        root.join("song_data/A/B/C/song1.json"),
        r#"{"song_id": "S1"}"#,
    )
    .unwrap();
    std::fs::write(
        root.join("song_data/A/B/C/ignore.txt"),
        "not matched by the glob",
    )
    .unwrap();

    let location = StorageLocation::parse(root.to_str().unwrap(), None).unwrap();
    let records = location.read_json("song_data/*/*/*/*.json").await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["song_id"], "S1");
}

#[tokio::test]
async fn test_write_table_unpartitioned() {
    let dir = tempdir().unwrap();
    let location = StorageLocation::parse(dir.path().to_str().unwrap(), None).unwrap();

    let rows = location
        .write_table("artists_table", vec![(String::new(), sample_batch())])
        .await
        .unwrap();

    assert_eq!(rows, 2);
    assert!(dir.path().join("artists_table/data.parquet").exists());
}

#[tokio::test]
async fn test_write_table_partitioned_paths() {
    let dir = tempdir().unwrap();
    let location = StorageLocation::parse(dir.path().to_str().unwrap(), None).unwrap();

    location
        .write_table(
            "songs_table",
            vec![
                ("year=2000/artist_id=AR1".to_string(), sample_batch()),
                ("year=2005/artist_id=AR2".to_string(), sample_batch()),
            ],
        )
        .await
        .unwrap();

    assert!(dir
        .path()
        .join("songs_table/year=2000/artist_id=AR1/data.parquet")
        .exists());
    assert!(dir
        .path()
        .join("songs_table/year=2005/artist_id=AR2/data.parquet")
        .exists());
}

#[tokio::test]
async fn test_write_table_overwrites() {
    let dir = tempdir().unwrap();
    let location = StorageLocation::parse(dir.path().to_str().unwrap(), None).unwrap();

    location
        .write_table("t", vec![("year=1999".to_string(), sample_batch())])
        .await
        .unwrap();
    // Second run has a different partition set; the first must be gone
    location
        .write_table("t", vec![("year=2001".to_string(), sample_batch())])
        .await
        .unwrap();

    assert!(!dir.path().join("t/year=1999/data.parquet").exists());
    assert!(dir.path().join("t/year=2001/data.parquet").exists());
}

#[test]
fn test_parse_s3_requires_credentials() {
    let result = StorageLocation::parse("s3://bucket/prefix/", None);
    assert!(result.is_err());
}

#[test]
fn test_parquet_bytes_roundtrip_header() {
    let bytes = batch_to_parquet_bytes(&sample_batch()).unwrap();
    // Parquet magic at both ends
    assert_eq!(&bytes[..4], b"PAR1");
    assert_eq!(&bytes[bytes.len() - 4..], b"PAR1");
}
