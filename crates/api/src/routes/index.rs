//! Route listing

use axum::response::Html;

/// Human-readable list of the available routes
pub const ROUTE_INDEX: &str = "Available Routes:<br/>\
    /api/v1.0/precipitation<br/>\
    /api/v1.0/stations<br/>\
    /api/v1.0/tobs<br/>\
    /api/v1.0/&lt;start&gt;<br/>\
    /api/v1.0/&lt;start&gt;/&lt;end&gt;";

/// `GET /`
pub async fn list_routes() -> Html<&'static str> {
    Html(ROUTE_INDEX)
}
