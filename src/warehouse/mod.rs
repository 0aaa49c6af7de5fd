//! Warehouse ETL pipeline
//!
//! Loads staged JSON into two staging tables with bulk COPY, then
//! transforms them into a star schema: `fact_songplays` plus `dim_users`,
//! `dim_songs`, `dim_artists`, and `dim_time`.
//!
//! The transforms assume freshly created tables; rerunning the ETL without
//! `create_tables` duplicates rows.

pub mod catalog;
pub mod client;
pub mod loader;

pub use catalog::{sql_literal, Dialect, SchemaCatalog, TABLES};
pub use client::WarehouseClient;
pub use loader::{StagingLoader, TransformLoader};

use crate::config::WarehouseConfig;
use crate::error::Result;

/// Drop and recreate all seven tables
pub fn create_tables(config: &WarehouseConfig) -> Result<()> {
    let catalog = SchemaCatalog::new(config.dialect);
    let mut client = WarehouseClient::connect(config)?;
    tracing::info!(warehouse = client.connection_info(), "recreating tables");

    for sql in catalog.drop_statements() {
        client.execute(&sql)?;
        client.commit()?;
    }
    for sql in catalog.create_statements() {
        client.execute(&sql)?;
        client.commit()?;
    }

    client.close()
}

/// Run the warehouse ETL: load staging, then transform
pub fn run(config: &WarehouseConfig) -> Result<()> {
    let catalog = SchemaCatalog::new(config.dialect);
    let mut client = WarehouseClient::connect(config)?;
    tracing::info!(warehouse = client.connection_info(), "warehouse connected");

    StagingLoader::new(catalog).load(&mut client, &config.sources)?;
    TransformLoader::new(catalog).load(&mut client)?;

    tracing::info!("warehouse pipeline complete");
    client.close()
}
