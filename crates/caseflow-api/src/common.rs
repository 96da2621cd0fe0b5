// Shared route plumbing: workflow error -> HTTP status mapping.

use axum::http::StatusCode;
use caseflow_engine::WorkflowError;

fn status_for(err: &WorkflowError) -> StatusCode {
    match err {
        WorkflowError::NotFound { .. } => StatusCode::NOT_FOUND,
        WorkflowError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        WorkflowError::Conflict { .. } => StatusCode::CONFLICT,
        WorkflowError::Meta(_) | WorkflowError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log a failed operation and translate it into a status code. Client
/// errors log at warn, everything else at error.
pub fn handle_error(context: &str, err: WorkflowError) -> StatusCode {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("{context}: {err}");
    } else {
        tracing::warn!("{context}: {err}");
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn error_status_mapping() {
        assert_eq!(
            status_for(&WorkflowError::NotFound {
                what: "task",
                id: Uuid::now_v7()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&WorkflowError::Validation("missing comments".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&WorkflowError::Conflict {
                process_instance_id: Uuid::now_v7(),
                expected_step: 4
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&WorkflowError::Store(anyhow::anyhow!("connection reset"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
