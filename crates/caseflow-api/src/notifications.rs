// Notification state routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use uuid::Uuid;

use caseflow_contracts::Notification;

use crate::common::handle_error;
use crate::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/notifications/{notification_id}/read",
            post(mark_notification_read),
        )
        .with_state(state)
}

/// POST /v1/notifications/{notification_id}/read - Mark a notification read
#[utoipa::path(
    post,
    path = "/v1/notifications/{notification_id}/read",
    params(
        ("notification_id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked read", body = Notification),
        (status = 404, description = "Notification not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notifications"
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Notification>, StatusCode> {
    let notification = state
        .engine
        .mark_notification_read(notification_id)
        .await
        .map_err(|e| handle_error("Failed to mark notification read", e))?;

    Ok(Json(notification))
}
