// Task and notification DTOs
//
// Both are stored as case_event rows; the `kind` column discriminates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::roles::Role;

/// Task status within a step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(s: &str) -> Self {
        match s {
            "completed" => TaskStatus::Completed,
            "in_progress" => TaskStatus::InProgress,
            _ => TaskStatus::Pending,
        }
    }
}

/// What kind of work a step asks for: a form submission, a markdown
/// document, or an approval decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Form,
    Document,
    Approval,
}

impl Default for TaskType {
    fn default() -> Self {
        TaskType::Form
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskType::Form => write!(f, "form"),
            TaskType::Document => write!(f, "document"),
            TaskType::Approval => write!(f, "approval"),
        }
    }
}

/// Recorded outcome of a completed task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    Completed,
    Approved,
    ChangesRequested,
}

impl std::fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskOutcome::Completed => write!(f, "completed"),
            TaskOutcome::Approved => write!(f, "approved"),
            TaskOutcome::ChangesRequested => write!(f, "changes_requested"),
        }
    }
}

/// A workflow task. Created when a step starts, completed exactly once by
/// the user who finishes that step. `tier` is the step number the task
/// fulfills.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub process_instance_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tier: i32,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TaskOutcome>,
    /// Empty when role resolution found no eligible user; the task then
    /// waits for manual assignment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<Uuid>,
    pub task_type: TaskType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revision_requested: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_requested_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An inbox row for a user. Best-effort: there is no delivery guarantee
/// beyond the insert itself.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub process_instance_id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub notification_type: String,
    pub read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
