// Document routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use caseflow_contracts::Document;

use crate::common::handle_error;
use crate::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/documents/{document_id}", get(get_document))
        .with_state(state)
}

/// GET /v1/documents/{document_id} - Get a document by ID
#[utoipa::path(
    get,
    path = "/v1/documents/{document_id}",
    params(
        ("document_id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document found", body = Document),
        (status = 404, description = "Document not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "documents"
)]
pub async fn get_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<Document>, StatusCode> {
    let document = state
        .engine
        .get_document(document_id)
        .await
        .map_err(|e| handle_error("Failed to get document", e))?;

    Ok(Json(document))
}
