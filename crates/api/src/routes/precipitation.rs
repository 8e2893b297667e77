//! Precipitation Routes

use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::debug;

use super::DatedValue;
use crate::{error::ApiError, AppState};

/// `GET /api/v1.0/precipitation`
///
/// Every measurement row as `{"<date>": prcp}`, oldest first.
pub async fn get_precipitation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DatedValue>>, ApiError> {
    let rows = state.repository.precipitation().await?;
    debug!("Serving {} precipitation readings", rows.len());

    Ok(Json(
        rows.into_iter()
            .map(|row| DatedValue::new(row.date, row.prcp))
            .collect(),
    ))
}
