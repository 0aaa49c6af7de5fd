//! Warehouse client: execute / commit / close over a DuckDB connection
//!
//! Two backends sit behind the same narrow contract:
//!
//! - **native**: an in-memory or file DuckDB database; statements run
//!   locally, with an implicit BEGIN on the first `execute` after a commit
//!   and an explicit COMMIT on `commit`
//! - **attached**: a Postgres-protocol warehouse reached through DuckDB's
//!   `postgres` extension; raw statement text is forwarded with
//!   `postgres_execute`, which commits remotely per call, so `commit` is a
//!   sequencing no-op

use crate::config::WarehouseConfig;
use crate::error::{Error, Result};
use crate::warehouse::catalog::{sql_literal, Dialect};
use duckdb::Connection;

/// Alias the attached warehouse database is registered under
const ATTACHED_ALIAS: &str = "warehouse";

#[derive(Debug)]
enum Backend {
    Native,
    Attached,
}

/// Scoped warehouse connection, acquired once per run
pub struct WarehouseClient {
    conn: Connection,
    backend: Backend,
    in_transaction: bool,
    /// Connection description for logging (password masked)
    info: String,
}

impl WarehouseClient {
    /// Connect according to the configured dialect
    pub fn connect(config: &WarehouseConfig) -> Result<Self> {
        match config.dialect {
            Dialect::DuckDb => Self::open(&config.database_path),
            Dialect::Redshift => Self::attach(config),
        }
    }

    /// Open a native DuckDB database (":memory:" or a file path)
    pub fn open(database_path: &str) -> Result<Self> {
        let conn = if database_path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(database_path)?
        };

        Ok(Self {
            conn,
            backend: Backend::Native,
            in_transaction: false,
            info: format!("duckdb:{database_path}"),
        })
    }

    /// Open an in-memory native database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Attach a Postgres-protocol warehouse through the postgres extension
    fn attach(config: &WarehouseConfig) -> Result<Self> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| Error::missing_field("warehouse.host"))?;
        let dbname = config
            .dbname
            .as_deref()
            .ok_or_else(|| Error::missing_field("warehouse.dbname"))?;
        let user = config
            .user
            .as_deref()
            .ok_or_else(|| Error::missing_field("warehouse.user"))?;
        let password = config
            .password
            .as_deref()
            .ok_or_else(|| Error::missing_field("warehouse.password"))?;
        let port = config.port;

        let connection_string = format!("postgresql://{user}:{password}@{host}:{port}/{dbname}");

        let conn = Connection::open_in_memory()?;
        conn.execute_batch("INSTALL postgres; LOAD postgres;")
            .map_err(|e| Error::config(format!("Failed to load postgres extension: {e}")))?;

        let attach_sql = format!(
            "ATTACH {} AS {ATTACHED_ALIAS} (TYPE POSTGRES);",
            sql_literal(&connection_string)
        );
        conn.execute_batch(&attach_sql)
            .map_err(|e| Error::config(format!("Failed to attach warehouse: {e}")))?;

        Ok(Self {
            conn,
            backend: Backend::Attached,
            in_transaction: false,
            info: format!("postgresql://{user}:****@{host}:{port}/{dbname}"),
        })
    }

    /// Execute one statement (or statement batch)
    pub fn execute(&mut self, sql: &str) -> Result<()> {
        match self.backend {
            Backend::Native => {
                if !self.in_transaction {
                    self.conn.execute_batch("BEGIN TRANSACTION;")?;
                    self.in_transaction = true;
                }
                self.conn
                    .execute_batch(sql)
                    .map_err(|e| Error::statement(format!("{e}")))?;
            }
            Backend::Attached => {
                self.conn
                    .execute(
                        "CALL postgres_execute(?, ?)",
                        duckdb::params![ATTACHED_ALIAS, sql],
                    )
                    .map_err(|e| Error::statement(format!("{e}")))?;
            }
        }
        Ok(())
    }

    /// Commit the open transaction, if any
    pub fn commit(&mut self) -> Result<()> {
        if matches!(self.backend, Backend::Native) && self.in_transaction {
            self.conn.execute_batch("COMMIT;")?;
            self.in_transaction = false;
        }
        Ok(())
    }

    /// Run a scalar query, e.g. a row count
    pub fn query_i64(&self, sql: &str) -> Result<i64> {
        let value = match self.backend {
            Backend::Native => self.conn.query_row(sql, [], |row| row.get::<_, i64>(0))?,
            Backend::Attached => self.conn.query_row(
                "SELECT * FROM postgres_query(?, ?)",
                duckdb::params![ATTACHED_ALIAS, sql],
                |row| row.get::<_, i64>(0),
            )?,
        };
        Ok(value)
    }

    /// Count rows in a table
    pub fn count(&self, table: &str) -> Result<i64> {
        self.query_i64(&format!("SELECT COUNT(*) FROM {table}"))
    }

    /// Connection description for logging (password masked)
    pub fn connection_info(&self) -> &str {
        &self.info
    }

    /// Commit outstanding work and release the connection
    pub fn close(mut self) -> Result<()> {
        self.commit()?;
        let Self { conn, .. } = self;
        conn.close().map_err(|(_, e)| Error::from(e))
    }
}
