//! Temperature Routes
//!
//! The last year of observations, and per-date min/avg/max over a date range.
//! Range bounds are compared with stored dates as text; unless strict date
//! checking is on, a malformed bound simply matches fewer (or no) rows.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::debug;

use super::DatedValue;
use crate::{error::ApiError, AppState};
use weather_store::{DailyTemperatureStats, DateRange};

/// `GET /api/v1.0/tobs`
pub async fn get_last_year_tobs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DatedValue>>, ApiError> {
    let rows = state.repository.last_year_observations().await?;
    debug!("Serving {} temperature observations", rows.len());

    Ok(Json(
        rows.into_iter()
            .map(|row| DatedValue::new(row.date, row.tobs))
            .collect(),
    ))
}

/// `GET /api/v1.0/:start`
pub async fn get_stats_from(
    State(state): State<Arc<AppState>>,
    Path(start): Path<String>,
) -> Result<Json<Vec<DailyTemperatureStats>>, ApiError> {
    state.check_date(&start)?;
    daily_stats(&state, DateRange::starting(start)).await
}

/// `GET /api/v1.0/:start/:end`
pub async fn get_stats_between(
    State(state): State<Arc<AppState>>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Json<Vec<DailyTemperatureStats>>, ApiError> {
    state.check_date(&start)?;
    state.check_date(&end)?;
    daily_stats(&state, DateRange::between(start, end)).await
}

async fn daily_stats(
    state: &AppState,
    range: DateRange,
) -> Result<Json<Vec<DailyTemperatureStats>>, ApiError> {
    let stats = state.repository.daily_temperature_stats(&range).await?;
    Ok(Json(stats))
}
