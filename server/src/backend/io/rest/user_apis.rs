//! # REST API for User Management
//!
//! Admin-only endpoints. Responses never carry passwords.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, put},
    Router,
};
use log::info;

use crate::backend::io::rest::{error_response, AuthUser};
use crate::backend::AppState;
use shared::{CreateUserRequest, UpdateUserRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", put(update_user))
}

pub async fn list_users(State(state): State<AppState>, AuthUser(actor): AuthUser) -> impl IntoResponse {
    info!("GET /api/users");

    match state.user_service.list_users(&actor).await {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(e) => error_response("list users", e),
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<CreateUserRequest>,
) -> impl IntoResponse {
    info!("POST /api/users - username: {}", request.username);

    match state.user_service.create_user(&actor, request).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => error_response("create user", e),
    }
}

pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> impl IntoResponse {
    info!("PUT /api/users/{}", id);

    match state.user_service.update_user(&actor, id, request).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => error_response("update user", e),
    }
}
