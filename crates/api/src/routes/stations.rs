//! Station Routes

use axum::{extract::State, Json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

use crate::{error::ApiError, AppState};
use weather_store::StationRecord;

/// `GET /api/v1.0/stations`
pub async fn get_stations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    let rows = state.repository.stations().await?;
    Ok(Json(index_stations(rows)))
}

/// Map station id to name. A repeated id keeps the name from its last row.
pub fn index_stations(rows: Vec<StationRecord>) -> BTreeMap<String, String> {
    let mut stations = BTreeMap::new();
    for row in rows {
        if let Some(previous) = stations.insert(row.station.clone(), row.name) {
            warn!(
                "Duplicate station id {}; replacing name {:?}",
                row.station, previous
            );
        }
    }
    stations
}
