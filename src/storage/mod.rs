//! Object-storage reads and partitioned Parquet writes
//!
//! The lake pipeline's whole engine boundary:
//!
//! - `read(glob) -> rows`: list a store, match paths against a `*` glob,
//!   decode JSON records (object-per-file or newline-delimited)
//! - `write(rows, destination, partitions, overwrite)`: delete the
//!   destination tree, then write one Parquet file per partition under
//!   Hive-style `col=value/` directories
//!
//! Destinations are S3 URLs (explicit credentials) or local paths.

mod json;
mod location;
mod parquet;

pub use json::{decode_records, dedup_records, glob_match};
pub use location::StorageLocation;
pub use parquet::batch_to_parquet_bytes;

#[cfg(test)]
mod tests;
