//! Configuration types for the ETL pipelines
//!
//! Both pipelines are configured from one YAML file with a `lake` section
//! and a `warehouse` section. Credentials are plain config fields handed to
//! the storage and warehouse factories; nothing is injected through the
//! process environment.

use crate::error::{Error, Result};
use crate::warehouse::Dialect;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete ETL configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlConfig {
    /// Lake pipeline configuration
    #[serde(default)]
    pub lake: Option<LakeConfig>,

    /// Warehouse pipeline configuration
    #[serde(default)]
    pub warehouse: Option<WarehouseConfig>,
}

impl EtlConfig {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::config(format!(
                "Failed to read config file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Get the lake section, or fail if it is absent
    pub fn lake(&self) -> Result<&LakeConfig> {
        self.lake.as_ref().ok_or_else(|| Error::missing_field("lake"))
    }

    /// Get the warehouse section, or fail if it is absent
    pub fn warehouse(&self) -> Result<&WarehouseConfig> {
        self.warehouse
            .as_ref()
            .ok_or_else(|| Error::missing_field("warehouse"))
    }
}

// ============================================================================
// Lake Config
// ============================================================================

/// Lake pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LakeConfig {
    /// Source root: `s3://bucket/prefix` or a local path
    pub input_url: String,

    /// Destination root: `s3://bucket/prefix` or a local path
    pub output_url: String,

    /// Glob for song-metadata files, relative to the input root
    #[serde(default = "default_song_glob")]
    pub song_glob: String,

    /// Glob for event-log files, relative to the input root
    #[serde(default = "default_log_glob")]
    pub log_glob: String,

    /// S3 credentials, required when either root is an `s3://` URL
    #[serde(default)]
    pub s3: Option<S3Credentials>,
}

fn default_song_glob() -> String {
    "song_data/*/*/*/*.json".to_string()
}

fn default_log_glob() -> String {
    "log_data/*/*/*.json".to_string()
}

/// Explicit S3 credentials for the lake stores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Credentials {
    /// Access key id
    pub access_key_id: String,

    /// Secret access key
    pub secret_access_key: String,

    /// Bucket region
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    "us-west-2".to_string()
}

// ============================================================================
// Warehouse Config
// ============================================================================

/// Warehouse pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// SQL dialect emitted by the schema catalog
    #[serde(default)]
    pub dialect: Dialect,

    /// Warehouse host (attached Postgres-protocol warehouses)
    #[serde(default)]
    pub host: Option<String>,

    /// Warehouse port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Warehouse database name
    #[serde(default)]
    pub dbname: Option<String>,

    /// Warehouse user
    #[serde(default)]
    pub user: Option<String>,

    /// Warehouse password
    #[serde(default)]
    pub password: Option<String>,

    /// Local database file for the DuckDB dialect
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Bulk-copy source locations and credentials
    pub sources: CopySources,
}

fn default_port() -> u16 {
    5439
}

fn default_database_path() -> String {
    ":memory:".to_string()
}

/// Source locations substituted into the bulk-copy statements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopySources {
    /// Event-log JSON location
    pub log_data: String,

    /// JSONPaths document mapping event-log fields to columns
    #[serde(default)]
    pub log_jsonpath: Option<String>,

    /// Song-metadata JSON location
    pub song_data: String,

    /// IAM role granted to the warehouse for the copy
    #[serde(default)]
    pub iam_role_arn: Option<String>,

    /// Region of the copy sources
    #[serde(default = "default_region")]
    pub region: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
lake:
  input_url: "s3://udacity-dend/"
  output_url: "s3://playlake-out/"
  s3:
    access_key_id: AKIATEST
    secret_access_key: secret
warehouse:
  dialect: redshift
  host: cluster.example.us-west-2.redshift.amazonaws.com
  dbname: dev
  user: etl
  password: hunter2
  sources:
    log_data: "s3://udacity-dend/log_data"
    log_jsonpath: "s3://udacity-dend/log_json_path.json"
    song_data: "s3://udacity-dend/song_data"
    iam_role_arn: "arn:aws:iam::123456789012:role/dwhRole"
"#;

        let config = EtlConfig::from_yaml(yaml).unwrap();
        let lake = config.lake().unwrap();
        assert_eq!(lake.input_url, "s3://udacity-dend/");
        assert_eq!(lake.song_glob, "song_data/*/*/*/*.json");
        assert_eq!(lake.log_glob, "log_data/*/*/*.json");

        let wh = config.warehouse().unwrap();
        assert_eq!(wh.dialect, Dialect::Redshift);
        assert_eq!(wh.port, 5439);
        assert_eq!(wh.sources.region, "us-west-2");
    }

    #[test]
    fn test_parse_duckdb_warehouse() {
        let yaml = r#"
warehouse:
  dialect: duckdb
  database_path: warehouse.duckdb
  sources:
    log_data: ./data/log_data.json
    song_data: ./data/song_data.json
"#;

        let config = EtlConfig::from_yaml(yaml).unwrap();
        let wh = config.warehouse().unwrap();
        assert_eq!(wh.dialect, Dialect::DuckDb);
        assert_eq!(wh.database_path, "warehouse.duckdb");
        assert!(wh.sources.iam_role_arn.is_none());
    }

    #[test]
    fn test_missing_section_is_an_error_on_access() {
        let config = EtlConfig::from_yaml("lake:\n  input_url: a\n  output_url: b\n").unwrap();
        assert!(config.lake().is_ok());
        assert!(matches!(
            config.warehouse(),
            Err(Error::MissingConfigField { .. })
        ));
    }
}
