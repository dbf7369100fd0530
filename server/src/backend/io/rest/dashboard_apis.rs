use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::info;

use crate::backend::io::rest::{error_response, AuthUser};
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard/stats", get(get_stats))
}

/// Farm-wide statistics, the same for every role
pub async fn get_stats(State(state): State<AppState>, AuthUser(_actor): AuthUser) -> impl IntoResponse {
    info!("GET /api/dashboard/stats");

    match state.dashboard_service.get_stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => error_response("compute dashboard statistics", e),
    }
}
