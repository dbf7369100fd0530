//! # REST API for the Activity Log

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::info;
use serde::Deserialize;

use crate::backend::io::rest::{error_response, AuthUser};
use crate::backend::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/activities", get(list_activities))
}

pub async fn list_activities(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<ActivityQuery>,
) -> impl IntoResponse {
    info!("GET /api/activities - limit: {:?}", query.limit);

    match state.activity_service.recent_activities(&actor, query.limit).await {
        Ok(activities) => (StatusCode::OK, Json(activities)).into_response(),
        Err(e) => error_response("list activities", e),
    }
}
