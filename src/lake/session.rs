//! Lake session: the handle the stage processors run against

use crate::config::LakeConfig;
use crate::error::Result;
use crate::storage::StorageLocation;

/// Source and destination stores for one lake run
#[derive(Debug, Clone)]
pub struct LakeSession {
    /// Where the raw JSON lives
    pub source: StorageLocation,
    /// Where the Parquet trees go
    pub destination: StorageLocation,
}

impl LakeSession {
    /// Build the session from explicit configuration
    ///
    /// Credentials come from the config and go straight into the store
    /// builders; nothing is read from or written to the process
    /// environment.
    pub fn connect(config: &LakeConfig) -> Result<Self> {
        let source = StorageLocation::parse(&config.input_url, config.s3.as_ref())?;
        let destination = StorageLocation::parse(&config.output_url, config.s3.as_ref())?;

        tracing::info!(
            input = %config.input_url,
            output = %config.output_url,
            "lake session ready"
        );

        Ok(Self {
            source,
            destination,
        })
    }
}
