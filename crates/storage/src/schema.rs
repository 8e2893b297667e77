//! Store schema
//!
//! The table layout the repository is written against. Used to create fresh
//! stores (fixtures, tooling) and to check an existing store at startup.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::StorageError;

/// Version of the table layout below. Bump on any column change.
pub const SCHEMA_VERSION: u32 = 1;

/// Station metadata table
pub const STATION_TABLE: &str = "station";

/// Daily measurement table
pub const MEASUREMENT_TABLE: &str = "measurement";

/// DDL for a fresh store
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS station (
    id INTEGER PRIMARY KEY,
    station TEXT NOT NULL,
    name TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    elevation REAL
);

CREATE TABLE IF NOT EXISTS measurement (
    id INTEGER PRIMARY KEY,
    station TEXT NOT NULL,
    date TEXT NOT NULL,
    prcp REAL,
    tobs REAL
);

CREATE INDEX IF NOT EXISTS idx_measurement_date ON measurement (date)
"#;

/// Columns each table must expose, in check order
const EXPECTED_COLUMNS: [(&str, &str); 2] = [
    (STATION_TABLE, "station, name, latitude, longitude, elevation"),
    (MEASUREMENT_TABLE, "station, date, prcp, tobs"),
];

/// Create the tables on a writable pool.
pub async fn apply(pool: &SqlitePool) -> Result<(), StorageError> {
    for statement in SCHEMA_SQL.split(';') {
        let trimmed = statement.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
        .execute(pool)
        .await?;

    info!("Applied store schema v{}", SCHEMA_VERSION);
    Ok(())
}

/// Version recorded in the store's `user_version` pragma. Stores not created
/// by [`apply`] report 0.
pub async fn stored_version(pool: &SqlitePool) -> Result<u32, StorageError> {
    let version = sqlx::query_scalar::<_, i64>("PRAGMA user_version")
        .fetch_one(pool)
        .await?;
    Ok(version as u32)
}

/// Check that every expected column exists.
///
/// Runs a zero-row `SELECT` per table, so it works on read-only stores and
/// never scans data. Columns decide compatibility; a `user_version` other
/// than [`SCHEMA_VERSION`] is only logged, since externally built stores
/// never set it.
pub async fn verify(pool: &SqlitePool) -> Result<(), StorageError> {
    let version = stored_version(pool).await?;
    if version != SCHEMA_VERSION {
        warn!(
            "Store reports schema version {}, expected {}; checking columns only",
            version, SCHEMA_VERSION
        );
    }

    for (table, columns) in EXPECTED_COLUMNS {
        let select = format!("SELECT {} FROM {} LIMIT 0", columns, table);
        sqlx::query(&select)
            .fetch_all(pool)
            .await
            .map_err(|e| StorageError::SchemaMismatch {
                table,
                reason: e.to_string(),
            })?;
        debug!("Table {} has columns {}", table, columns);
    }
    Ok(())
}
