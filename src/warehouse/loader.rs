//! Staging and transform loaders
//!
//! Both run their statements strictly in order, one execute and one commit
//! per statement. No statement is retried and no batch transaction spans
//! the sequence.

use crate::config::CopySources;
use crate::error::Result;

use super::catalog::SchemaCatalog;
use super::client::WarehouseClient;

/// Bulk-copies staged JSON into the two staging tables
pub struct StagingLoader {
    catalog: SchemaCatalog,
}

impl StagingLoader {
    /// Create a loader over a catalog
    pub fn new(catalog: SchemaCatalog) -> Self {
        Self { catalog }
    }

    /// Run both copy statements, committing after each
    pub fn load(&self, client: &mut WarehouseClient, sources: &CopySources) -> Result<()> {
        for (table, sql) in self.catalog.copy_statements(sources)? {
            tracing::info!(table, "copying into staging");
            client.execute(&sql)?;
            client.commit()?;
        }
        Ok(())
    }
}

/// Transforms staging rows into the star schema
pub struct TransformLoader {
    catalog: SchemaCatalog,
}

impl TransformLoader {
    /// Create a loader over a catalog
    pub fn new(catalog: SchemaCatalog) -> Self {
        Self { catalog }
    }

    /// Run the five insert transforms (fact first), committing after each
    pub fn load(&self, client: &mut WarehouseClient) -> Result<()> {
        for (table, sql) in self.catalog.insert_statements() {
            client.execute(&sql)?;
            client.commit()?;
            tracing::info!(table, "transform loaded");
        }
        Ok(())
    }
}
