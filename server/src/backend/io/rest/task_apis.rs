//! # REST API for Tasks

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, put},
    Router,
};
use log::info;
use serde::Deserialize;

use crate::backend::io::rest::{error_response, AuthUser};
use crate::backend::AppState;
use shared::{CreateTaskRequest, UpdateTaskRequest};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub assigned_to: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:id", put(update_task))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<TaskListQuery>,
) -> impl IntoResponse {
    info!("GET /api/tasks - query: {:?}", query);

    match state.task_service.list_tasks(&actor, query.assigned_to).await {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(e) => error_response("list tasks", e),
    }
}

pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<CreateTaskRequest>,
) -> impl IntoResponse {
    info!("POST /api/tasks - request: {:?}", request);

    match state.task_service.create_task(&actor, request).await {
        Ok(task) => (StatusCode::CREATED, Json(task)).into_response(),
        Err(e) => error_response("create task", e),
    }
}

/// Workers may only send a status change for their own tasks
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateTaskRequest>,
) -> impl IntoResponse {
    info!("PUT /api/tasks/{} - request: {:?}", id, request);

    match state.task_service.update_task(&actor, id, request).await {
        Ok(task) => (StatusCode::OK, Json(task)).into_response(),
        Err(e) => error_response("update task", e),
    }
}
