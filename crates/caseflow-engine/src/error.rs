use uuid::Uuid;

/// Errors surfaced by workflow operations.
///
/// Role-resolution exhaustion is deliberately not an error: a step with no
/// eligible user proceeds with an unassigned task.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: Uuid },

    #[error("validation failed: {0}")]
    Validation(String),

    /// The conditional step update found the process at a different step
    /// than the caller observed. A concurrent completion already advanced
    /// (or regressed) the workflow.
    #[error("process {process_instance_id} is no longer at step {expected_step}")]
    Conflict {
        process_instance_id: Uuid,
        expected_step: i32,
    },

    #[error("invalid record metadata: {0}")]
    Meta(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
