//! JSON record decoding, glob matching, and full-row dedup

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashSet;

/// Decode the records held in one object
///
/// Accepts a single JSON object, a JSON array of objects, or
/// newline-delimited JSON, chosen by content.
pub fn decode_records(data: &[u8], path: &str) -> Result<Vec<Value>> {
    let text = std::str::from_utf8(data)
        .map_err(|e| Error::malformed(path, format!("not valid UTF-8: {e}")))?;
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    // Whole-document parse first: covers one-object-per-file and arrays
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(match value {
            Value::Array(items) => items,
            other => vec![other],
        });
    }

    // Newline-delimited JSON
    trimmed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str::<Value>(line).map_err(|e| Error::malformed(path, e.to_string()))
        })
        .collect()
}

/// Drop exact duplicate records, keeping first-seen order
///
/// Equality is over the canonical JSON rendering, i.e. full-row equality.
pub fn dedup_records(records: Vec<Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.to_string()))
        .collect()
}

/// Match a path against a glob with `*` wildcards
///
/// Wildcards never cross `/` boundaries: the pattern and the path must
/// have the same number of segments, matched pairwise.
pub fn glob_match(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();

    if pattern_segments.len() != path_segments.len() {
        return false;
    }

    pattern_segments
        .iter()
        .zip(&path_segments)
        .all(|(p, s)| segment_match(p, s))
}

/// The literal prefix of a glob, up to the last `/` before the first `*`
///
/// Used to narrow the store listing before pattern matching.
pub fn glob_prefix(pattern: &str) -> &str {
    match pattern.find('*') {
        Some(star) => match pattern[..star].rfind('/') {
            Some(slash) => &pattern[..slash],
            None => "",
        },
        None => pattern,
    }
}

/// Match one path segment against one pattern segment
fn segment_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == text;
    }

    let chunks: Vec<&str> = pattern.split('*').collect();
    let mut remaining = text;

    // First chunk anchors at the start, last at the end
    if let Some(first) = chunks.first() {
        if !remaining.starts_with(first) {
            return false;
        }
        remaining = &remaining[first.len()..];
    }

    for chunk in &chunks[1..chunks.len() - 1] {
        if chunk.is_empty() {
            continue;
        }
        match remaining.find(chunk) {
            Some(idx) => remaining = &remaining[idx + chunk.len()..],
            None => return false,
        }
    }

    match chunks.last() {
        Some(last) if chunks.len() > 1 => remaining.ends_with(last),
        _ => true,
    }
}
