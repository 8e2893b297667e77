//! Weather Station API Server
//!
//! Read-only JSON API over station metadata and daily measurements.

use anyhow::Context;
use axum::{routing::get, Router};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod error;
pub mod routes;

pub use config::ApiConfig;
pub use error::ApiError;

use weather_store::{dates, Repository};

/// Application state shared across handlers
pub struct AppState {
    /// Store access; hands out one pooled connection per query
    pub repository: Repository,
    /// Reject malformed path dates with 400
    pub strict_dates: bool,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(repository: Repository, strict_dates: bool) -> Self {
        Self {
            repository,
            strict_dates,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    /// Reject a malformed path date when strict checking is on
    pub fn check_date(&self, value: &str) -> Result<(), ApiError> {
        if self.strict_dates && !dates::is_iso_date(value) {
            return Err(ApiError::InvalidDate(value.to_string()));
        }
        Ok(())
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index::list_routes))
        .route(
            "/api/v1.0/precipitation",
            get(routes::precipitation::get_precipitation),
        )
        .route("/api/v1.0/stations", get(routes::stations::get_stations))
        .route("/api/v1.0/tobs", get(routes::temperature::get_last_year_tobs))
        .route("/api/v1.0/:start", get(routes::temperature::get_stats_from))
        .route(
            "/api/v1.0/:start/:end",
            get(routes::temperature::get_stats_between),
        )
        .route("/health", get(routes::health::health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Initialize logging. `RUST_LOG` overrides the configured level.
pub fn init_logging(
    config: &ApiConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}

/// Open the store, check its schema, and serve until Ctrl-C or SIGTERM
pub async fn run_server(config: &ApiConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;

    let repository = Repository::connect(&config.store_options())
        .await
        .with_context(|| format!("Failed to open store {}", config.database_url))?;
    repository
        .verify_schema()
        .await
        .context("Store does not match the expected schema")?;

    let state = Arc::new(AppState::new(repository, config.strict_dates));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Starting API server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM on unix.
///
/// The SIGTERM handler is installed when this is called, not when the
/// returned future is first polled, so a signal sent in between is not lost.
/// A handler that fails to install is logged and never fires.
pub fn shutdown_signal() -> impl Future<Output = ()> {
    #[cfg(unix)]
    let terminate = signal(SignalKind::terminate());

    async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to install Ctrl-C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async move {
            match terminate {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
            _ = terminate => info!("Received SIGTERM, shutting down"),
        }
    }
}
