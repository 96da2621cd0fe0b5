// Request and response types for workflow operations

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::process::ProcessInstance;
use crate::project::Project;
use crate::roles::Role;
use crate::task::Task;

/// Request to open a new case. The applicant becomes the case owner; the
/// workflow starts at step 2 with a form task assigned to them.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCaseRequest {
    pub applicant_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Response to case initialization.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CaseInitResponse {
    pub project: Project,
    pub process_instance: ProcessInstance,
    pub initial_task: Task,
}

/// A case as listed/fetched: the process instance with its project.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CaseDetail {
    pub process_instance: ProcessInstance,
    pub project: Project,
}

/// Request to complete a task. The payload, when present, is recorded as an
/// append-only decision payload for the step.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompleteTaskRequest {
    pub user_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// Request to decide an approval task. Comments are required when requesting
/// changes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApprovalRequest {
    pub approver_id: Uuid,
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

/// Result of a workflow transition: the refreshed process instance and the
/// newly created task, if the workflow did not terminate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransitionResponse {
    pub process_instance: ProcessInstance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_task: Option<Task>,
}

/// Request to assign a role to a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateAssignmentRequest {
    pub user_id: Uuid,
    pub role: Role,
}

/// Result of a step access check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessCheckResponse {
    pub can_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_role: Option<Role>,
    pub user_roles: Vec<Role>,
}
