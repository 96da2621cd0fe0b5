// Task completion and approval HTTP routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use caseflow_contracts::{ApprovalRequest, CompleteTaskRequest, Task, TransitionResponse};

use crate::common::handle_error;
use crate::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/tasks/{task_id}", get(get_task))
        .route("/v1/tasks/{task_id}/complete", post(complete_task))
        .route("/v1/tasks/{task_id}/approval", post(decide_approval))
        .with_state(state)
}

/// GET /v1/tasks/{task_id} - Get a task by ID
#[utoipa::path(
    get,
    path = "/v1/tasks/{task_id}",
    params(
        ("task_id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task found", body = Task),
        (status = 404, description = "Task not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "tasks"
)]
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Task>, StatusCode> {
    let task = state
        .engine
        .get_task(task_id)
        .await
        .map_err(|e| handle_error("Failed to get task", e))?;

    Ok(Json(task))
}

/// POST /v1/tasks/{task_id}/complete - Complete a form or document task
#[utoipa::path(
    post,
    path = "/v1/tasks/{task_id}/complete",
    params(
        ("task_id" = Uuid, Path, description = "Task ID")
    ),
    request_body = CompleteTaskRequest,
    responses(
        (status = 200, description = "Task completed, workflow advanced", body = TransitionResponse),
        (status = 404, description = "Task not found"),
        (status = 409, description = "Workflow moved concurrently"),
        (status = 422, description = "Task is not completable"),
        (status = 500, description = "Internal server error")
    ),
    tag = "tasks"
)]
pub async fn complete_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<CompleteTaskRequest>,
) -> Result<Json<TransitionResponse>, StatusCode> {
    let transition = state
        .engine
        .complete_task(task_id, req)
        .await
        .map_err(|e| handle_error("Failed to complete task", e))?;

    Ok(Json(transition))
}

/// POST /v1/tasks/{task_id}/approval - Decide the approval task
#[utoipa::path(
    post,
    path = "/v1/tasks/{task_id}/approval",
    params(
        ("task_id" = Uuid, Path, description = "Task ID")
    ),
    request_body = ApprovalRequest,
    responses(
        (status = 200, description = "Decision recorded", body = TransitionResponse),
        (status = 404, description = "Task not found"),
        (status = 409, description = "Workflow moved concurrently"),
        (status = 422, description = "Not an approval task, or comments missing"),
        (status = 500, description = "Internal server error")
    ),
    tag = "tasks"
)]
pub async fn decide_approval(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<ApprovalRequest>,
) -> Result<Json<TransitionResponse>, StatusCode> {
    let transition = state
        .engine
        .handle_approval(task_id, req)
        .await
        .map_err(|e| handle_error("Failed to record approval decision", e))?;

    Ok(Json(transition))
}
