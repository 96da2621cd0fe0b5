// Case lifecycle HTTP routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use caseflow_contracts::{
    AccessCheckResponse, CaseDetail, CaseInitResponse, CreateCaseRequest, DecisionElement,
    DecisionPayload, Document, ListResponse, Task, TransitionResponse,
};

use crate::common::handle_error;
use crate::AppState;

/// Request to advance a case to a specific step. Normal progress happens
/// through task completion; this exists for operator repair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdvanceStepRequest {
    pub target_step: i32,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AccessQuery {
    pub user_id: Uuid,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/cases", post(create_case).get(list_cases))
        .route("/v1/cases/{case_id}", get(get_case))
        .route("/v1/cases/{case_id}/tasks", get(list_case_tasks))
        .route("/v1/cases/{case_id}/documents", get(list_case_documents))
        .route("/v1/cases/{case_id}/decisions", get(list_case_decisions))
        .route("/v1/cases/{case_id}/advance", post(advance_case))
        .route(
            "/v1/cases/{case_id}/steps/{step}/access",
            get(check_step_access),
        )
        .route("/v1/decision-elements", get(list_decision_elements))
        .with_state(state)
}

/// POST /v1/cases - Open a new case
#[utoipa::path(
    post,
    path = "/v1/cases",
    request_body = CreateCaseRequest,
    responses(
        (status = 201, description = "Case initialized", body = CaseInitResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "cases"
)]
pub async fn create_case(
    State(state): State<AppState>,
    Json(req): Json<CreateCaseRequest>,
) -> Result<(StatusCode, Json<CaseInitResponse>), StatusCode> {
    let case = state
        .engine
        .initialize_case(req.applicant_id, req.title)
        .await
        .map_err(|e| handle_error("Failed to initialize case", e))?;

    Ok((StatusCode::CREATED, Json(case)))
}

/// GET /v1/cases - List all cases
#[utoipa::path(
    get,
    path = "/v1/cases",
    responses(
        (status = 200, description = "List of cases", body = ListResponse<CaseDetail>),
        (status = 500, description = "Internal server error")
    ),
    tag = "cases"
)]
pub async fn list_cases(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<CaseDetail>>, StatusCode> {
    let cases = state
        .engine
        .list_cases()
        .await
        .map_err(|e| handle_error("Failed to list cases", e))?;

    Ok(Json(ListResponse::new(cases)))
}

/// GET /v1/cases/{case_id} - Get a case by process instance id
#[utoipa::path(
    get,
    path = "/v1/cases/{case_id}",
    params(
        ("case_id" = Uuid, Path, description = "Process instance ID")
    ),
    responses(
        (status = 200, description = "Case found", body = CaseDetail),
        (status = 404, description = "Case not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "cases"
)]
pub async fn get_case(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> Result<Json<CaseDetail>, StatusCode> {
    let case = state
        .engine
        .get_case(case_id)
        .await
        .map_err(|e| handle_error("Failed to get case", e))?;

    Ok(Json(case))
}

/// GET /v1/cases/{case_id}/tasks - Tasks for a case, newest first
#[utoipa::path(
    get,
    path = "/v1/cases/{case_id}/tasks",
    params(
        ("case_id" = Uuid, Path, description = "Process instance ID")
    ),
    responses(
        (status = 200, description = "Tasks for the case", body = ListResponse<Task>),
        (status = 500, description = "Internal server error")
    ),
    tag = "cases"
)]
pub async fn list_case_tasks(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> Result<Json<ListResponse<Task>>, StatusCode> {
    let tasks = state
        .engine
        .list_case_tasks(case_id)
        .await
        .map_err(|e| handle_error("Failed to list case tasks", e))?;

    Ok(Json(ListResponse::new(tasks)))
}

/// GET /v1/cases/{case_id}/documents - Documents for a case
#[utoipa::path(
    get,
    path = "/v1/cases/{case_id}/documents",
    params(
        ("case_id" = Uuid, Path, description = "Process instance ID")
    ),
    responses(
        (status = 200, description = "Documents for the case", body = ListResponse<Document>),
        (status = 500, description = "Internal server error")
    ),
    tag = "cases"
)]
pub async fn list_case_documents(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> Result<Json<ListResponse<Document>>, StatusCode> {
    let documents = state
        .engine
        .list_case_documents(case_id)
        .await
        .map_err(|e| handle_error("Failed to list case documents", e))?;

    Ok(Json(ListResponse::new(documents)))
}

/// GET /v1/cases/{case_id}/decisions - Decision payload audit trail
#[utoipa::path(
    get,
    path = "/v1/cases/{case_id}/decisions",
    params(
        ("case_id" = Uuid, Path, description = "Process instance ID")
    ),
    responses(
        (status = 200, description = "Decision payloads, oldest first", body = ListResponse<DecisionPayload>),
        (status = 500, description = "Internal server error")
    ),
    tag = "cases"
)]
pub async fn list_case_decisions(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
) -> Result<Json<ListResponse<DecisionPayload>>, StatusCode> {
    let payloads = state
        .engine
        .list_case_payloads(case_id)
        .await
        .map_err(|e| handle_error("Failed to list case decisions", e))?;

    Ok(Json(ListResponse::new(payloads)))
}

/// POST /v1/cases/{case_id}/advance - Advance the workflow to a step
#[utoipa::path(
    post,
    path = "/v1/cases/{case_id}/advance",
    params(
        ("case_id" = Uuid, Path, description = "Process instance ID")
    ),
    request_body = AdvanceStepRequest,
    responses(
        (status = 200, description = "Workflow advanced", body = TransitionResponse),
        (status = 404, description = "Case not found"),
        (status = 409, description = "Workflow moved concurrently"),
        (status = 500, description = "Internal server error")
    ),
    tag = "cases"
)]
pub async fn advance_case(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
    Json(req): Json<AdvanceStepRequest>,
) -> Result<Json<TransitionResponse>, StatusCode> {
    let transition = state
        .engine
        .advance_to_step(case_id, req.target_step, req.user_id)
        .await
        .map_err(|e| handle_error("Failed to advance case", e))?;

    Ok(Json(transition))
}

/// GET /v1/cases/{case_id}/steps/{step}/access - Check step access for a user
#[utoipa::path(
    get,
    path = "/v1/cases/{case_id}/steps/{step}/access",
    params(
        ("case_id" = Uuid, Path, description = "Process instance ID"),
        ("step" = i32, Path, description = "Step number"),
        AccessQuery
    ),
    responses(
        (status = 200, description = "Access decision", body = AccessCheckResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "cases"
)]
pub async fn check_step_access(
    State(state): State<AppState>,
    Path((case_id, step)): Path<(Uuid, i32)>,
    Query(query): Query<AccessQuery>,
) -> Result<Json<AccessCheckResponse>, StatusCode> {
    let access = state
        .engine
        .can_user_access_step(query.user_id, step, case_id)
        .await
        .map_err(|e| handle_error("Failed to check step access", e))?;

    Ok(Json(access))
}

/// GET /v1/decision-elements - Static step configuration
#[utoipa::path(
    get,
    path = "/v1/decision-elements",
    responses(
        (status = 200, description = "Configured workflow steps", body = ListResponse<DecisionElement>),
        (status = 500, description = "Internal server error")
    ),
    tag = "cases"
)]
pub async fn list_decision_elements(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<DecisionElement>>, StatusCode> {
    let elements = state
        .engine
        .list_decision_elements()
        .await
        .map_err(|e| handle_error("Failed to list decision elements", e))?;

    Ok(Json(ListResponse::new(elements)))
}
