//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// playlake batch ETL CLI
#[derive(Parser, Debug)]
#[command(name = "playlake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true, default_value = "playlake.yaml")]
    pub config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the lake pipeline: songs and artists, then users, time, songplays
    Lake,

    /// Warehouse pipeline commands
    Warehouse {
        #[command(subcommand)]
        action: WarehouseAction,
    },
}

/// Warehouse subcommands
#[derive(Subcommand, Debug)]
pub enum WarehouseAction {
    /// Drop and recreate the staging, fact, and dimension tables
    CreateTables,

    /// Bulk-copy into staging, then transform into the star schema
    Etl,
}
