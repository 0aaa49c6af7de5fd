// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # playlake
//!
//! Batch ETL pipelines for music-streaming analytics.
//!
//! Two independent pipelines ship in this crate:
//!
//! - **Lake ETL**: reads song-metadata and event-log JSON from object
//!   storage, deduplicates, projects five entity views (songs, artists,
//!   users, time, songplays) and writes them as partitioned Parquet trees.
//! - **Warehouse ETL**: bulk-copies staged JSON into two staging tables,
//!   then transforms them with `INSERT...SELECT` into a star schema
//!   (1 fact + 4 dimension tables).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use playlake::{config::EtlConfig, lake, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = EtlConfig::load("playlake.yaml")?;
//!     lake::run(&config.lake).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │           Lake ETL           │   │         Warehouse ETL        │
//! │  songs → artists             │   │  create → copy → transform   │
//! │  users → time → songplays    │   │  (star schema)               │
//! └──────────────┬───────────────┘   └──────────────┬───────────────┘
//!                │                                  │
//! ┌──────────────┴───────────────┐   ┌──────────────┴───────────────┐
//! │   storage (S3 / local)       │   │   warehouse client (DuckDB)  │
//! │   JSON in, Parquet out       │   │   execute / commit / close   │
//! └──────────────────────────────┘   └──────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Configuration loading
pub mod config;

/// Source records and projected entity rows
pub mod model;

/// Object-storage reads and partitioned Parquet writes
pub mod storage;

/// Lake ETL pipeline
pub mod lake;

/// Warehouse ETL pipeline
pub mod warehouse;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::EtlConfig;
pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
