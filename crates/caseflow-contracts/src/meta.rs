// Typed record metadata
//
// Each core record carries a jsonb `meta` column holding workflow-specific
// fields alongside the core columns. These structs give that column a fixed
// shape; the storage layer serializes them on write and callers deserialize
// on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::process::WorkflowStatus;
use crate::task::TaskType;

/// Project metadata: who holds which role for this case. The applicant is
/// set at creation; analyst and approver are resolved lazily and, once set,
/// never change automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub applicant_user_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyst_user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver_user_id: Option<Uuid>,
}

/// Process instance metadata: the workflow cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessMeta {
    pub current_step: i32,
    pub workflow_status: WorkflowStatus,
}

impl Default for ProcessMeta {
    fn default() -> Self {
        Self {
            current_step: 2,
            workflow_status: WorkflowStatus::Draft,
        }
    }
}

fn default_step() -> i32 {
    2
}

/// Task metadata. `step_number` defaults to 2 when stored data is malformed
/// so a damaged row still completes into the earliest real step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskMeta {
    #[serde(default = "default_step")]
    pub step_number: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_element_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_role_id: Option<i32>,
    #[serde(default)]
    pub task_type: TaskType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub revision_requested: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_requested_by: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_comments: Option<String>,
}

impl Default for TaskMeta {
    fn default() -> Self {
        Self {
            step_number: default_step(),
            decision_element_id: None,
            assigned_role_id: None,
            task_type: TaskType::Form,
            completed_by: None,
            completed_at: None,
            revision_requested: false,
            revision_comments: None,
            revision_requested_by: None,
            approval_comments: None,
        }
    }
}

/// Notification metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationMeta {
    pub notification_type: String,
    pub project_id: Uuid,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

/// Document metadata: markdown content plus optional external-editor link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub document_role: crate::document::DocumentType,
    pub created_by_user_id: Uuid,
    pub markdown_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_note_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_note_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_by_user_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_meta_falls_back_to_step_two() {
        let meta: TaskMeta = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(meta.step_number, 2);
        assert!(!meta.revision_requested);
    }

    #[test]
    fn task_meta_omits_unset_fields() {
        let value = serde_json::to_value(TaskMeta {
            step_number: 3,
            ..TaskMeta::default()
        })
        .unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("completed_by"));
        assert!(!obj.contains_key("revision_requested"));
        assert_eq!(obj["step_number"], 3);
    }
}
