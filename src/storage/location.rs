//! Storage locations: S3 or local filesystem behind one handle

use crate::config::S3Credentials;
use crate::error::{Error, Result};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde_json::Value;
use std::sync::Arc;

use super::json::{decode_records, glob_match, glob_prefix};
use super::parquet::batch_to_parquet_bytes;

/// A root in object storage (or on disk) that the pipeline reads from or
/// writes under
#[derive(Debug, Clone)]
pub struct StorageLocation {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path prefix within the bucket (empty for local roots)
    prefix: String,
    /// Original URL scheme for logging
    scheme: String,
}

impl StorageLocation {
    /// Parse a root URL and create the matching object store
    ///
    /// Supported formats:
    /// - `s3://bucket/prefix/` - AWS S3, credentials required
    /// - `/local/path/` or `file:///local/path/` - local filesystem
    pub fn parse(url: &str, s3: Option<&S3Credentials>) -> Result<Self> {
        if url.starts_with("s3://") || url.starts_with("s3a://") {
            Self::parse_s3(url, s3)
        } else {
            Self::parse_local(url)
        }
    }

    /// Parse an S3 URL with explicit credentials
    fn parse_s3(url: &str, s3: Option<&S3Credentials>) -> Result<Self> {
        let without_scheme = url
            .strip_prefix("s3://")
            .or_else(|| url.strip_prefix("s3a://"))
            .ok_or_else(|| Error::config(format!("Invalid s3 URL: {url}")))?;

        let (bucket, prefix) = match without_scheme.find('/') {
            Some(idx) => (
                &without_scheme[..idx],
                without_scheme[idx + 1..].trim_matches('/').to_string(),
            ),
            None => (without_scheme, String::new()),
        };

        let creds = s3.ok_or_else(|| Error::missing_field("lake.s3"))?;

        let store = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_access_key_id(creds.access_key_id.as_str())
            .with_secret_access_key(creds.secret_access_key.as_str())
            .with_region(creds.region.as_str())
            .build()
            .map_err(|e| Error::config(format!("Failed to create s3 client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "s3".to_string(),
        })
    }

    /// Parse a local filesystem path
    fn parse_local(path: &str) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);

        std::fs::create_dir_all(path)
            .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: String::new(),
            scheme: "file".to_string(),
        })
    }

    /// Get the scheme (s3, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Resolve a path relative to this root
    fn full_path(&self, rel: &str) -> ObjectPath {
        let rel = rel.trim_matches('/');
        if self.prefix.is_empty() {
            ObjectPath::from(rel)
        } else if rel.is_empty() {
            ObjectPath::from(self.prefix.as_str())
        } else {
            ObjectPath::from(format!("{}/{rel}", self.prefix))
        }
    }

    /// Strip this root's prefix off a listed object path
    fn relative<'a>(&self, location: &'a ObjectPath) -> &'a str {
        let full = location.as_ref();
        if self.prefix.is_empty() {
            full
        } else {
            full.strip_prefix(self.prefix.as_str())
                .map_or(full, |rest| rest.trim_start_matches('/'))
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read every JSON record under a glob, in listed order
    pub async fn read_json(&self, glob: &str) -> Result<Vec<Value>> {
        let list_under = self.full_path(glob_prefix(glob));
        let mut objects = self.store.list(Some(&list_under));

        let mut records = Vec::new();
        let mut files = 0usize;
        while let Some(meta) = objects.try_next().await? {
            let rel = self.relative(&meta.location).to_string();
            if !glob_match(glob, &rel) {
                continue;
            }
            let data = self.store.get(&meta.location).await?.bytes().await?;
            records.extend(decode_records(&data, &rel)?);
            files += 1;
        }

        tracing::debug!(glob, files, records = records.len(), "read source records");
        Ok(records)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Delete everything under a table directory (overwrite semantics)
    pub async fn delete_tree(&self, table: &str) -> Result<usize> {
        let root = self.full_path(table);
        let mut objects = self.store.list(Some(&root));

        let mut deleted = 0usize;
        while let Some(meta) = objects.try_next().await? {
            self.store.delete(&meta.location).await?;
            deleted += 1;
        }

        if deleted > 0 {
            tracing::debug!(table, deleted, "cleared destination tree");
        }
        Ok(deleted)
    }

    /// Overwrite a table with one Parquet file per partition
    ///
    /// Each entry pairs a Hive-style partition path (empty for an
    /// unpartitioned table) with the batch for that partition. Returns the
    /// total row count written.
    pub async fn write_table(
        &self,
        table: &str,
        partitions: Vec<(String, RecordBatch)>,
    ) -> Result<usize> {
        self.delete_tree(table).await?;

        let mut rows = 0usize;
        for (partition, batch) in partitions {
            let rel = if partition.is_empty() {
                format!("{table}/data.parquet")
            } else {
                format!("{table}/{partition}/data.parquet")
            };

            rows += batch.num_rows();
            let bytes = batch_to_parquet_bytes(&batch)?;
            self.put(&rel, Bytes::from(bytes)).await?;
        }

        tracing::info!(table, rows, scheme = %self.scheme, "wrote table");
        Ok(rows)
    }

    /// Write raw bytes to a path under this root
    pub async fn put(&self, rel: &str, data: Bytes) -> Result<String> {
        let path = self.full_path(rel);
        self.store.put(&path, data.into()).await?;
        Ok(format!("{}://{path}", self.scheme))
    }
}
