// Decision element and decision payload DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::roles::Role;

/// Static per-step configuration. Steps 1..=5 map 1:1 to decision elements;
/// step 1 is authentication and is never rendered as a UI step. Read-only
/// from the engine's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DecisionElement {
    pub id: Uuid,
    pub step: i32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible_role: Option<Role>,
    /// JSON Schema for the dynamic form (step 2 only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_schema: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Result tag on a decision payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DecisionResult {
    Completed,
    Approved,
    ChangesRequested,
}

impl std::fmt::Display for DecisionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionResult::Completed => write!(f, "completed"),
            DecisionResult::Approved => write!(f, "approved"),
            DecisionResult::ChangesRequested => write!(f, "changes_requested"),
        }
    }
}

impl From<&str> for DecisionResult {
    fn from(s: &str) -> Self {
        match s {
            "approved" => DecisionResult::Approved,
            "changes_requested" => DecisionResult::ChangesRequested,
            _ => DecisionResult::Completed,
        }
    }
}

/// Append-only audit record of what happened at a step: the decision, the
/// acting user's submitted data, and references back to the process and
/// project. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DecisionPayload {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_element_id: Option<Uuid>,
    pub step: i32,
    pub process_instance_id: Uuid,
    pub project_id: Uuid,
    pub result: DecisionResult,
    pub result_bool: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_notes: Option<String>,
    pub evaluation_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
