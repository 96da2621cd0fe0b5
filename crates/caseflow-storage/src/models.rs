// Database models (internal, may differ from public DTOs)
//
// Workflow metadata lives in jsonb `meta` columns. Create/Update inputs take
// the typed meta structs from caseflow-contracts; the backends serialize them
// on write. Case events carry either task or notification metadata depending
// on `kind`, so their meta crosses this boundary as a pre-serialized value.

use caseflow_contracts::{DocumentMeta, ProcessMeta, ProjectMeta};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Discriminator values for `case_event.kind`.
pub const EVENT_KIND_TASK: &str = "task";
pub const EVENT_KIND_NOTIFICATION: &str = "notification";

// ============================================
// Projects
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub sector: Option<String>,
    pub lead_agency: Option<String>,
    pub location_text: Option<String>,
    pub status: String,
    pub meta: sqlx::types::JsonValue,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateProject {
    pub title: String,
    pub description: Option<String>,
    pub sector: Option<String>,
    pub lead_agency: Option<String>,
    pub location_text: Option<String>,
    pub status: String,
    pub meta: ProjectMeta,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    pub sector: Option<String>,
    pub lead_agency: Option<String>,
    pub location_text: Option<String>,
    pub status: Option<String>,
    pub meta: Option<ProjectMeta>,
}

// ============================================
// Process instances
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct ProcessInstanceRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub status: String,
    pub stage: String,
    pub start_date: Option<NaiveDate>,
    pub complete_date: Option<NaiveDate>,
    pub outcome: Option<String>,
    pub meta: sqlx::types::JsonValue,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateProcessInstance {
    pub project_id: Uuid,
    pub status: String,
    pub stage: String,
    pub start_date: Option<NaiveDate>,
    pub meta: ProcessMeta,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProcessInstance {
    pub status: Option<String>,
    pub stage: Option<String>,
    pub complete_date: Option<NaiveDate>,
    pub outcome: Option<String>,
    pub meta: Option<ProcessMeta>,
}

// ============================================
// Decision elements (static step configuration)
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct DecisionElementRow {
    pub id: Uuid,
    pub step: i32,
    pub title: String,
    pub description: Option<String>,
    pub responsible_role: Option<i32>,
    pub form_schema: Option<sqlx::types::JsonValue>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateDecisionElement {
    pub step: i32,
    pub title: String,
    pub description: Option<String>,
    pub responsible_role: Option<i32>,
    pub form_schema: Option<serde_json::Value>,
}

// ============================================
// Case events (tasks and notifications)
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct CaseEventRow {
    pub id: Uuid,
    pub process_instance_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    pub tier: Option<i32>,
    pub status: String,
    pub outcome: Option<String>,
    pub assigned_entity: Option<Uuid>,
    pub related_document_id: Option<Uuid>,
    pub meta: sqlx::types::JsonValue,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateCaseEvent {
    pub process_instance_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    pub tier: Option<i32>,
    pub status: String,
    pub assigned_entity: Option<Uuid>,
    pub related_document_id: Option<Uuid>,
    pub meta: serde_json::Value,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCaseEvent {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub outcome: Option<String>,
    pub assigned_entity: Option<Uuid>,
    pub related_document_id: Option<Uuid>,
    pub meta: Option<serde_json::Value>,
}

// ============================================
// Documents
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub process_instance_id: Uuid,
    pub title: String,
    pub document_type: String,
    pub status: String,
    pub prepared_by: Uuid,
    pub related_document_id: Option<Uuid>,
    pub meta: sqlx::types::JsonValue,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub process_instance_id: Uuid,
    pub title: String,
    pub document_type: String,
    pub status: String,
    pub prepared_by: Uuid,
    pub related_document_id: Option<Uuid>,
    pub meta: DocumentMeta,
}

// ============================================
// Decision payloads (append-only audit trail)
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct DecisionPayloadRow {
    pub id: Uuid,
    pub decision_element_id: Option<Uuid>,
    pub step: i32,
    pub process_instance_id: Uuid,
    pub project_id: Uuid,
    pub result: String,
    pub result_bool: bool,
    pub result_notes: Option<String>,
    pub evaluation_data: sqlx::types::JsonValue,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateDecisionPayload {
    pub decision_element_id: Option<Uuid>,
    pub step: i32,
    pub process_instance_id: Uuid,
    pub project_id: Uuid,
    pub result: String,
    pub result_bool: bool,
    pub result_notes: Option<String>,
    pub evaluation_data: serde_json::Value,
}

// ============================================
// User role assignments
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct UserAssignmentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUserAssignment {
    pub user_id: Uuid,
    pub role_id: i32,
}
