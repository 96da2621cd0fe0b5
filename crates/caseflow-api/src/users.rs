// Per-user query routes: inbox, task list, roles

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use caseflow_contracts::{ListResponse, Notification, Role, Task};

use crate::common::handle_error;
use crate::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/users/{user_id}/tasks", get(list_user_tasks))
        .route(
            "/v1/users/{user_id}/notifications",
            get(list_user_notifications),
        )
        .route("/v1/users/{user_id}/roles", get(list_user_roles))
        .with_state(state)
}

/// GET /v1/users/{user_id}/tasks - Tasks for a user (direct plus role-based)
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/tasks",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Tasks for the user, newest first", body = ListResponse<Task>),
        (status = 500, description = "Internal server error")
    ),
    tag = "users"
)]
pub async fn list_user_tasks(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ListResponse<Task>>, StatusCode> {
    let tasks = state
        .engine
        .get_user_tasks(user_id)
        .await
        .map_err(|e| handle_error("Failed to list user tasks", e))?;

    Ok(Json(ListResponse::new(tasks)))
}

/// GET /v1/users/{user_id}/notifications - A user's notification inbox
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/notifications",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Notifications, newest first", body = ListResponse<Notification>),
        (status = 500, description = "Internal server error")
    ),
    tag = "users"
)]
pub async fn list_user_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ListResponse<Notification>>, StatusCode> {
    let notifications = state
        .engine
        .get_user_notifications(user_id)
        .await
        .map_err(|e| handle_error("Failed to list notifications", e))?;

    Ok(Json(ListResponse::new(notifications)))
}

/// GET /v1/users/{user_id}/roles - Roles held by a user
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/roles",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Roles for the user", body = ListResponse<Role>),
        (status = 500, description = "Internal server error")
    ),
    tag = "users"
)]
pub async fn list_user_roles(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ListResponse<Role>>, StatusCode> {
    let roles = state
        .engine
        .get_user_roles(user_id)
        .await
        .map_err(|e| handle_error("Failed to list user roles", e))?;

    Ok(Json(ListResponse::new(roles)))
}
