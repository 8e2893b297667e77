//! Repository Implementation

use std::str::FromStr;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;
use tracing::{debug, info};

use crate::dates::cutoff_date;
use crate::models::{
    DailyTemperatureStats, DateRange, PrecipitationRecord, StationRecord, TobsRecord,
};
use crate::{schema, StorageError};

/// Connection settings for the store
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// SQLite URL, e.g. `sqlite://Resources/hawaii.sqlite`
    pub url: String,
    /// Pool size
    pub max_connections: u32,
    /// How long a request waits for a free connection
    pub acquire_timeout: Duration,
    /// Open connections with `SQLITE_OPEN_READONLY`
    pub read_only: bool,
    /// Create the database file if it does not exist
    pub create_if_missing: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            url: "sqlite://Resources/hawaii.sqlite".to_string(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            read_only: true,
            create_if_missing: false,
        }
    }
}

impl StoreOptions {
    /// Read-only options for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Writable, created on demand. For building fixtures and fresh stores.
    pub fn writable(mut self) -> Self {
        self.read_only = false;
        self.create_if_missing = true;
        self
    }
}

/// Read queries over the station and measurement tables.
///
/// Holds a connection pool; every query method checks out one connection and
/// hands it back when the method returns, whether or not the query succeeded.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Open a pool against the store
    pub async fn connect(options: &StoreOptions) -> Result<Self, StorageError> {
        let connect_options = SqliteConnectOptions::from_str(&options.url)?
            .read_only(options.read_only)
            .create_if_missing(options.create_if_missing);

        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect_with(connect_options)
            .await?;

        info!(
            "Opened store {} (read_only={}, max_connections={})",
            options.url, options.read_only, options.max_connections
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn acquire(&self) -> Result<PoolConnection<Sqlite>, StorageError> {
        Ok(self.pool.acquire().await?)
    }

    /// Check the store exposes the expected tables and columns
    pub async fn verify_schema(&self) -> Result<(), StorageError> {
        schema::verify(&self.pool).await
    }

    /// Round-trip a trivial query
    pub async fn ping(&self) -> Result<(), StorageError> {
        let mut conn = self.acquire().await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }

    /// All (date, prcp) rows, oldest first
    pub async fn precipitation(&self) -> Result<Vec<PrecipitationRecord>, StorageError> {
        let mut conn = self.acquire().await?;
        let rows = sqlx::query_as::<_, PrecipitationRecord>(
            "SELECT date, prcp FROM measurement ORDER BY date",
        )
        .fetch_all(&mut *conn)
        .await?;

        debug!("Fetched {} precipitation rows", rows.len());
        Ok(rows)
    }

    /// All (station, name) rows in store order
    pub async fn stations(&self) -> Result<Vec<StationRecord>, StorageError> {
        let mut conn = self.acquire().await?;
        let rows = sqlx::query_as::<_, StationRecord>("SELECT station, name FROM station")
            .fetch_all(&mut *conn)
            .await?;

        debug!("Fetched {} station rows", rows.len());
        Ok(rows)
    }

    /// Most recent measurement date, `None` for an empty store
    pub async fn latest_date(&self) -> Result<Option<String>, StorageError> {
        let mut conn = self.acquire().await?;
        fetch_latest_date(&mut conn).await
    }

    /// (date, tobs) rows on or after `cutoff`, oldest first
    pub async fn observations_since(&self, cutoff: &str) -> Result<Vec<TobsRecord>, StorageError> {
        let mut conn = self.acquire().await?;
        fetch_observations_since(&mut conn, cutoff).await
    }

    /// Observations from the last [`LOOKBACK_DAYS`](crate::dates::LOOKBACK_DAYS)
    /// of data, measured back from the most recent date in the store.
    pub async fn last_year_observations(&self) -> Result<Vec<TobsRecord>, StorageError> {
        let mut conn = self.acquire().await?;

        let latest = fetch_latest_date(&mut conn)
            .await?
            .ok_or(StorageError::EmptyDataset)?;
        let cutoff = cutoff_date(&latest)?;
        debug!("Latest date {}, cutoff {}", latest, cutoff);

        fetch_observations_since(&mut conn, &cutoff).await
    }

    /// Per-date min/avg/max of tobs over `range`, oldest first
    pub async fn daily_temperature_stats(
        &self,
        range: &DateRange,
    ) -> Result<Vec<DailyTemperatureStats>, StorageError> {
        let mut conn = self.acquire().await?;

        let rows = match &range.end {
            Some(end) => {
                sqlx::query_as::<_, DailyTemperatureStats>(
                    "SELECT date, MIN(tobs) AS tmin, AVG(tobs) AS tavg, MAX(tobs) AS tmax \
                     FROM measurement WHERE date >= ?1 AND date <= ?2 \
                     GROUP BY date ORDER BY date",
                )
                .bind(&range.start)
                .bind(end)
                .fetch_all(&mut *conn)
                .await?
            }
            None => {
                sqlx::query_as::<_, DailyTemperatureStats>(
                    "SELECT date, MIN(tobs) AS tmin, AVG(tobs) AS tavg, MAX(tobs) AS tmax \
                     FROM measurement WHERE date >= ?1 \
                     GROUP BY date ORDER BY date",
                )
                .bind(&range.start)
                .fetch_all(&mut *conn)
                .await?
            }
        };

        debug_assert!(rows.iter().all(|row| range.contains(&row.date)));
        debug!("Aggregated {} dates for {:?}", rows.len(), range);
        Ok(rows)
    }
}

async fn fetch_latest_date(conn: &mut SqliteConnection) -> Result<Option<String>, StorageError> {
    let latest = sqlx::query_scalar::<_, Option<String>>("SELECT MAX(date) FROM measurement")
        .fetch_one(&mut *conn)
        .await?;
    Ok(latest)
}

async fn fetch_observations_since(
    conn: &mut SqliteConnection,
    cutoff: &str,
) -> Result<Vec<TobsRecord>, StorageError> {
    let rows = sqlx::query_as::<_, TobsRecord>(
        "SELECT date, tobs FROM measurement WHERE date >= ?1 ORDER BY date",
    )
    .bind(cutoff)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn fixture_store(
        stations: &[(&str, &str)],
        measurements: &[(&str, &str, Option<f64>, f64)],
    ) -> (TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("weather.sqlite").display());
        let repo = Repository::connect(&StoreOptions::new(url).writable())
            .await
            .unwrap();
        schema::apply(repo.pool()).await.unwrap();

        for (station, name) in stations {
            sqlx::query("INSERT INTO station (station, name) VALUES (?1, ?2)")
                .bind(station)
                .bind(name)
                .execute(repo.pool())
                .await
                .unwrap();
        }
        for (station, date, prcp, tobs) in measurements {
            sqlx::query("INSERT INTO measurement (station, date, prcp, tobs) VALUES (?1, ?2, ?3, ?4)")
                .bind(station)
                .bind(date)
                .bind(prcp)
                .bind(tobs)
                .execute(repo.pool())
                .await
                .unwrap();
        }

        (dir, repo)
    }

    #[tokio::test]
    async fn test_precipitation_keeps_every_row_in_date_order() {
        let (_dir, repo) = fixture_store(
            &[],
            &[
                ("USC002", "2017-01-02", Some(0.5), 70.0),
                ("USC001", "2017-01-01", None, 68.0),
                ("USC001", "2017-01-02", Some(0.1), 71.0),
            ],
        )
        .await;

        let rows = repo.precipitation().await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date, "2017-01-01");
        assert_eq!(rows[0].prcp, None);
        assert!(rows.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[tokio::test]
    async fn test_stations_returns_duplicates() {
        let (_dir, repo) = fixture_store(
            &[("USC001", "Station A"), ("USC002", "Station B"), ("USC001", "Renamed A")],
            &[],
        )
        .await;

        let rows = repo.stations().await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].name, "Renamed A");
    }

    #[tokio::test]
    async fn test_last_year_window() {
        let (_dir, repo) = fixture_store(
            &[],
            &[
                ("USC001", "2016-08-22", None, 60.0),
                ("USC001", "2016-08-23", None, 61.0),
                ("USC001", "2017-01-01", None, 65.0),
                ("USC001", "2017-08-23", None, 76.0),
            ],
        )
        .await;

        let rows = repo.last_year_observations().await.unwrap();
        let dates: Vec<_> = rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2016-08-23", "2017-01-01", "2017-08-23"]);
        assert_eq!(rows[2].tobs, Some(76.0));
    }

    #[tokio::test]
    async fn test_last_year_on_empty_store() {
        let (_dir, repo) = fixture_store(&[], &[]).await;

        assert_eq!(repo.latest_date().await.unwrap(), None);
        assert!(matches!(
            repo.last_year_observations().await,
            Err(StorageError::EmptyDataset)
        ));
    }

    #[tokio::test]
    async fn test_daily_stats_single_date() {
        let (_dir, repo) = fixture_store(
            &[],
            &[
                ("USC001", "2017-08-22", None, 77.0),
                ("USC001", "2017-08-23", None, 76.0),
            ],
        )
        .await;

        let stats = repo
            .daily_temperature_stats(&DateRange::starting("2017-08-23"))
            .await
            .unwrap();
        assert_eq!(
            stats,
            vec![DailyTemperatureStats {
                date: "2017-08-23".to_string(),
                tmin: Some(76.0),
                tavg: Some(76.0),
                tmax: Some(76.0),
            }]
        );
    }

    #[tokio::test]
    async fn test_daily_stats_range() {
        let (_dir, repo) = fixture_store(
            &[],
            &[
                ("USC001", "2017-01-01", None, 60.0),
                ("USC002", "2017-01-01", None, 70.0),
                ("USC003", "2017-01-01", None, 65.0),
                ("USC001", "2017-01-02", None, 62.0),
                ("USC001", "2017-01-03", None, 64.0),
            ],
        )
        .await;

        let range = DateRange::between("2017-01-01", "2017-01-02");
        let stats = repo.daily_temperature_stats(&range).await.unwrap();
        assert_eq!(stats.len(), 2);
        assert!(stats.iter().all(|s| range.contains(&s.date)));

        let first = &stats[0];
        assert_eq!(first.tmin, Some(60.0));
        assert_eq!(first.tavg, Some(65.0));
        assert_eq!(first.tmax, Some(70.0));

        let inverted = DateRange::between("2017-01-03", "2017-01-01");
        assert!(repo.daily_temperature_stats(&inverted).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_only_store_rejects_writes() {
        let (dir, _writer) = fixture_store(&[("USC001", "Station A")], &[]).await;
        let url = format!("sqlite://{}", dir.path().join("weather.sqlite").display());
        let reader = Repository::connect(&StoreOptions::new(url)).await.unwrap();

        reader.verify_schema().await.unwrap();
        assert_eq!(reader.stations().await.unwrap().len(), 1);

        let write = sqlx::query("INSERT INTO station (station, name) VALUES ('X', 'Y')")
            .execute(reader.pool())
            .await;
        assert!(write.is_err());
    }

    #[tokio::test]
    async fn test_missing_store_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("absent.sqlite").display());
        assert!(matches!(
            Repository::connect(&StoreOptions::new(url)).await,
            Err(StorageError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_schema_version_recorded() {
        let (_dir, repo) = fixture_store(&[], &[]).await;
        assert_eq!(
            schema::stored_version(repo.pool()).await.unwrap(),
            schema::SCHEMA_VERSION
        );
    }

    #[tokio::test]
    async fn test_verify_accepts_unversioned_store() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("external.sqlite").display());
        let repo = Repository::connect(&StoreOptions::new(url).writable())
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE station (id INTEGER, station TEXT, name TEXT, \
             latitude FLOAT, longitude FLOAT, elevation FLOAT)",
        )
        .execute(repo.pool())
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE measurement (id INTEGER, station TEXT, date TEXT, \
             prcp FLOAT, tobs FLOAT)",
        )
        .execute(repo.pool())
        .await
        .unwrap();

        assert_eq!(schema::stored_version(repo.pool()).await.unwrap(), 0);
        repo.verify_schema().await.unwrap();
    }

    #[tokio::test]
    async fn test_verify_schema_detects_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("other.sqlite").display());
        let repo = Repository::connect(&StoreOptions::new(url).writable())
            .await
            .unwrap();
        sqlx::query("CREATE TABLE station (station TEXT, name TEXT)")
            .execute(repo.pool())
            .await
            .unwrap();

        match repo.verify_schema().await {
            Err(StorageError::SchemaMismatch { table, .. }) => assert_eq!(table, "station"),
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }
}
