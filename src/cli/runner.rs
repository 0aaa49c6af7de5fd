//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, WarehouseAction};
use crate::config::EtlConfig;
use crate::error::Result;
use crate::{lake, warehouse};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = EtlConfig::load(&self.cli.config)?;

        match &self.cli.command {
            Commands::Lake => lake::run(config.lake()?).await,
            Commands::Warehouse { action } => match action {
                WarehouseAction::CreateTables => warehouse::create_tables(config.warehouse()?),
                WarehouseAction::Etl => warehouse::run(config.warehouse()?),
            },
        }
    }
}
