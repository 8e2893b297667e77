//! Weather Store
//!
//! Read-only SQLite access to station metadata and daily measurements.

pub mod dates;
pub mod schema;
mod models;
mod repository;

pub use models::{DailyTemperatureStats, DateRange, PrecipitationRecord, StationRecord, TobsRecord};
pub use repository::{Repository, StoreOptions};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("No measurements in the store")]
    EmptyDataset,
    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Schema mismatch on table {table}: {reason}")]
    SchemaMismatch { table: &'static str, reason: String },
}
