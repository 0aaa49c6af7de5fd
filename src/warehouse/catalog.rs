//! Schema catalog: the seven warehouse tables and their statements
//!
//! Two staging tables (raw passthrough, nulls allowed), one fact table and
//! four dimension tables (star schema). All SQL is static text; the only
//! runtime inputs are the copy source locations and credentials, which are
//! embedded as escaped SQL literals.

use crate::config::CopySources;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// All warehouse tables, in create order
pub const TABLES: [&str; 7] = [
    "staging_events",
    "staging_songs",
    "fact_songplays",
    "dim_users",
    "dim_songs",
    "dim_artists",
    "dim_time",
];

/// Sequence backing the fact key on DuckDB
const SONGPLAY_SEQUENCE: &str = "songplay_id_seq";

/// SQL dialect the catalog emits
///
/// Redshift carries the distribution/sort layout hints, informational
/// dimension keys, and the IAM-role bulk copy. DuckDB is the same logical
/// schema with those dropped; only the sequence-backed fact key stays
/// declared there, since DuckDB enforces key constraints and the loads
/// rely on Redshift not doing so.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Redshift,
    DuckDb,
}

/// Quote a value as a SQL string literal
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Static table definitions and statement builders
#[derive(Debug, Clone, Copy)]
pub struct SchemaCatalog {
    dialect: Dialect,
}

impl SchemaCatalog {
    /// Create a catalog for a dialect
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// The dialect this catalog emits
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    // ========================================================================
    // Drop / create
    // ========================================================================

    /// One DROP per table (plus the fact-key sequence on DuckDB)
    pub fn drop_statements(&self) -> Vec<String> {
        let mut statements = Vec::new();
        for table in TABLES {
            statements.push(format!("DROP TABLE IF EXISTS {table};"));
            if table == "fact_songplays" && self.dialect == Dialect::DuckDb {
                statements.push(format!("DROP SEQUENCE IF EXISTS {SONGPLAY_SEQUENCE};"));
            }
        }
        statements
    }

    /// One CREATE per table, in [`TABLES`] order
    pub fn create_statements(&self) -> Vec<String> {
        TABLES
            .iter()
            .map(|table| self.create_table(table))
            .collect()
    }

    fn create_table(&self, table: &str) -> String {
        match table {
            "staging_events" => self.staging_events_create(),
            "staging_songs" => STAGING_SONGS_CREATE.to_string(),
            "fact_songplays" => self.fact_songplays_create(),
            "dim_users" => self.dim_users_create(),
            "dim_songs" => self.dim_songs_create(),
            "dim_artists" => self.dim_artists_create(),
            "dim_time" => self.dim_time_create(),
            other => unreachable!("unknown table {other}"),
        }
    }

    fn staging_events_create(&self) -> String {
        // Redshift converts ts at COPY time (TIMEFORMAT 'epochmillisecs');
        // DuckDB keeps the raw epoch milliseconds and converts at insert.
        let ts_type = match self.dialect {
            Dialect::Redshift => "TIMESTAMP",
            Dialect::DuckDb => "BIGINT",
        };
        format!(
            "CREATE TABLE IF NOT EXISTS staging_events
(
    artist          VARCHAR,
    auth            VARCHAR,
    firstName       VARCHAR,
    gender          VARCHAR,
    itemInSession   INTEGER,
    lastName        VARCHAR,
    length          FLOAT,
    level           VARCHAR,
    location        VARCHAR,
    method          VARCHAR,
    page            VARCHAR,
    registration    FLOAT,
    sessionId       INTEGER,
    song            VARCHAR,
    status          INTEGER,
    ts              {ts_type},
    userAgent       VARCHAR,
    userId          INTEGER
);"
        )
    }

    fn fact_songplays_create(&self) -> String {
        match self.dialect {
            Dialect::Redshift => "CREATE TABLE IF NOT EXISTS fact_songplays
(
    songplay_id          INTEGER IDENTITY(0,1) PRIMARY KEY,
    start_time           TIMESTAMP NOT NULL sortkey,
    user_id              INTEGER NOT NULL,
    level                VARCHAR,
    song_id              VARCHAR NOT NULL distkey,
    artist_id            VARCHAR NOT NULL,
    session_id           INTEGER,
    location             VARCHAR,
    user_agent           VARCHAR
);"
            .to_string(),
            Dialect::DuckDb => format!(
                "CREATE SEQUENCE IF NOT EXISTS {SONGPLAY_SEQUENCE};
CREATE TABLE IF NOT EXISTS fact_songplays
(
    songplay_id          INTEGER PRIMARY KEY DEFAULT nextval('{SONGPLAY_SEQUENCE}'),
    start_time           TIMESTAMP NOT NULL,
    user_id              INTEGER NOT NULL,
    level                VARCHAR,
    song_id              VARCHAR NOT NULL,
    artist_id            VARCHAR NOT NULL,
    session_id           INTEGER,
    location             VARCHAR,
    user_agent           VARCHAR
);"
            ),
        }
    }

    fn dim_users_create(&self) -> String {
        let key = self.hint(" PRIMARY KEY distkey");
        format!(
            "CREATE TABLE IF NOT EXISTS dim_users
(
    user_id         INTEGER{key},
    first_name      VARCHAR,
    last_name       VARCHAR,
    gender          VARCHAR,
    level           VARCHAR
);"
        )
    }

    fn dim_songs_create(&self) -> String {
        let key = self.hint(" PRIMARY KEY");
        let hints = self.hint(" sortkey distkey");
        format!(
            "CREATE TABLE IF NOT EXISTS dim_songs
(
    song_id     VARCHAR{key},
    title       VARCHAR NOT NULL,
    artist_id   VARCHAR NOT NULL{hints},
    year        INTEGER,
    duration    FLOAT
);"
        )
    }

    fn dim_artists_create(&self) -> String {
        let key = self.hint(" PRIMARY KEY distkey");
        format!(
            "CREATE TABLE IF NOT EXISTS dim_artists
(
    artist_id          VARCHAR{key},
    name               VARCHAR,
    location           VARCHAR,
    latitude           FLOAT,
    longitude          FLOAT
);"
        )
    }

    fn dim_time_create(&self) -> String {
        let key = self.hint(" PRIMARY KEY sortkey distkey");
        format!(
            "CREATE TABLE IF NOT EXISTS dim_time
(
    start_time    TIMESTAMP{key},
    hour          INTEGER,
    day           INTEGER,
    week          INTEGER,
    month         INTEGER,
    year          INTEGER,
    weekday       INTEGER
);"
        )
    }

    /// Physical layout hint, emitted only on Redshift
    fn hint(&self, hint: &'static str) -> &'static str {
        match self.dialect {
            Dialect::Redshift => hint,
            Dialect::DuckDb => "",
        }
    }

    // ========================================================================
    // Bulk copy
    // ========================================================================

    /// The two staging copies, as (table, statement) pairs
    pub fn copy_statements(&self, sources: &CopySources) -> Result<Vec<(&'static str, String)>> {
        match self.dialect {
            Dialect::Redshift => self.redshift_copies(sources),
            Dialect::DuckDb => Ok(vec![
                (
                    "staging_events",
                    format!(
                        "COPY staging_events FROM {} (FORMAT JSON);",
                        sql_literal(&sources.log_data)
                    ),
                ),
                (
                    "staging_songs",
                    format!(
                        "COPY staging_songs FROM {} (FORMAT JSON);",
                        sql_literal(&sources.song_data)
                    ),
                ),
            ]),
        }
    }

    fn redshift_copies(&self, sources: &CopySources) -> Result<Vec<(&'static str, String)>> {
        let role = sources
            .iam_role_arn
            .as_deref()
            .ok_or_else(|| Error::missing_field("warehouse.sources.iam_role_arn"))?;
        let jsonpath = sources
            .log_jsonpath
            .as_deref()
            .ok_or_else(|| Error::missing_field("warehouse.sources.log_jsonpath"))?;
        let credentials = sql_literal(&format!("aws_iam_role={role}"));
        let region = sql_literal(&sources.region);

        let events = format!(
            "COPY staging_events FROM {data}
    CREDENTIALS {credentials}
    COMPUPDATE OFF REGION {region}
    TIMEFORMAT AS 'epochmillisecs'
    TRUNCATECOLUMNS BLANKSASNULL EMPTYASNULL
    FORMAT AS JSON {jsonpath};",
            data = sql_literal(&sources.log_data),
            jsonpath = sql_literal(jsonpath),
        );

        let songs = format!(
            "COPY staging_songs FROM {data}
    CREDENTIALS {credentials}
    COMPUPDATE OFF REGION {region}
    FORMAT AS JSON 'auto'
    TRUNCATECOLUMNS BLANKSASNULL EMPTYASNULL;",
            data = sql_literal(&sources.song_data),
        );

        Ok(vec![("staging_events", events), ("staging_songs", songs)])
    }

    // ========================================================================
    // Star-schema transforms
    // ========================================================================

    /// The five INSERT...SELECT transforms, fact first, as (table, statement)
    pub fn insert_statements(&self) -> Vec<(&'static str, String)> {
        vec![
            ("fact_songplays", self.fact_insert()),
            ("dim_users", DIM_USERS_INSERT.to_string()),
            ("dim_songs", DIM_SONGS_INSERT.to_string()),
            ("dim_artists", DIM_ARTISTS_INSERT.to_string()),
            ("dim_time", self.dim_time_insert()),
        ]
    }

    fn fact_insert(&self) -> String {
        let start_time = match self.dialect {
            Dialect::Redshift => "se.ts",
            Dialect::DuckDb => "make_timestamp(se.ts * 1000)",
        };
        format!(
            "INSERT INTO fact_songplays (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
SELECT DISTINCT {start_time}  AS start_time,
       se.userId              AS user_id,
       se.level               AS level,
       ss.song_id             AS song_id,
       ss.artist_id           AS artist_id,
       se.sessionId           AS session_id,
       se.location            AS location,
       se.userAgent           AS user_agent
FROM staging_events se
JOIN staging_songs ss
  ON se.song = ss.title AND se.artist = ss.artist_name
WHERE se.page = 'NextSong';"
        )
    }

    fn dim_time_insert(&self) -> String {
        let source = match self.dialect {
            Dialect::Redshift => "SELECT ts AS start_time FROM staging_events WHERE page = 'NextSong'",
            Dialect::DuckDb => {
                "SELECT make_timestamp(ts * 1000) AS start_time FROM staging_events WHERE page = 'NextSong'"
            }
        };
        format!(
            "INSERT INTO dim_time (start_time, hour, day, week, month, year, weekday)
SELECT DISTINCT start_time,
       EXTRACT(hour FROM start_time),
       EXTRACT(day FROM start_time),
       EXTRACT(week FROM start_time),
       EXTRACT(month FROM start_time),
       EXTRACT(year FROM start_time),
       EXTRACT(dow FROM start_time)
FROM ({source}) AS plays;"
        )
    }
}

const STAGING_SONGS_CREATE: &str = "CREATE TABLE IF NOT EXISTS staging_songs
(
    song_id            VARCHAR,
    num_songs          INTEGER,
    title              VARCHAR,
    artist_name        VARCHAR,
    artist_latitude    FLOAT,
    year               INTEGER,
    duration           FLOAT,
    artist_id          VARCHAR,
    artist_longitude   FLOAT,
    artist_location    VARCHAR
);";

const DIM_USERS_INSERT: &str = "INSERT INTO dim_users (user_id, first_name, last_name, gender, level)
SELECT DISTINCT userId     AS user_id,
       firstName           AS first_name,
       lastName            AS last_name,
       gender              AS gender,
       level               AS level
FROM staging_events
WHERE userId IS NOT NULL
  AND page = 'NextSong';";

const DIM_SONGS_INSERT: &str = "INSERT INTO dim_songs (song_id, title, artist_id, year, duration)
SELECT DISTINCT song_id    AS song_id,
       title               AS title,
       artist_id           AS artist_id,
       year                AS year,
       duration            AS duration
FROM staging_songs
WHERE song_id IS NOT NULL;";

const DIM_ARTISTS_INSERT: &str = "INSERT INTO dim_artists (artist_id, name, location, latitude, longitude)
SELECT DISTINCT artist_id  AS artist_id,
       artist_name         AS name,
       artist_location     AS location,
       artist_latitude     AS latitude,
       artist_longitude    AS longitude
FROM staging_songs
WHERE artist_id IS NOT NULL;";
