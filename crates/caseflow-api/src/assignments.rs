// Role assignment routes

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use caseflow_contracts::{CreateAssignmentRequest, UserAssignment};

use crate::common::handle_error;
use crate::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/assignments", post(create_assignment))
        .with_state(state)
}

/// POST /v1/assignments - Grant a role to a user
#[utoipa::path(
    post,
    path = "/v1/assignments",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Role assigned", body = UserAssignment),
        (status = 500, description = "Internal server error")
    ),
    tag = "assignments"
)]
pub async fn create_assignment(
    State(state): State<AppState>,
    Json(req): Json<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<UserAssignment>), StatusCode> {
    let assignment = state
        .engine
        .create_assignment(req)
        .await
        .map_err(|e| handle_error("Failed to create assignment", e))?;

    Ok((StatusCode::CREATED, Json(assignment)))
}
