// Process instance DTOs (one workflow run per project)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Record-level status of a process instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Underway,
    Completed,
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessStatus::Underway => write!(f, "underway"),
            ProcessStatus::Completed => write!(f, "completed"),
        }
    }
}

impl From<&str> for ProcessStatus {
    fn from(s: &str) -> Self {
        match s {
            "completed" => ProcessStatus::Completed,
            _ => ProcessStatus::Underway,
        }
    }
}

/// Workflow-level status tracked alongside the current step.
///
/// Note: `rejected` is part of the declared contract but no transition sets
/// it today; the "request changes" path keeps the process in progress.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Draft,
    InProgress,
    PendingApproval,
    Approved,
    Rejected,
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowStatus::Draft => write!(f, "draft"),
            WorkflowStatus::InProgress => write!(f, "in_progress"),
            WorkflowStatus::PendingApproval => write!(f, "pending_approval"),
            WorkflowStatus::Approved => write!(f, "approved"),
            WorkflowStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// One workflow run for a project. `current_step` ranges over 2..=6, where 6
/// is the terminal "approved" marker; step 1 (authentication) is considered
/// complete the moment the instance exists.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProcessInstance {
    pub id: Uuid,
    pub project_id: Uuid,
    pub status: ProcessStatus,
    pub stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    pub current_step: i32,
    pub workflow_status: WorkflowStatus,
    pub created_at: DateTime<Utc>,
}
