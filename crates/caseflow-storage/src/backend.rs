// Storage backend dispatch: Postgres in production, in-memory in dev mode.

use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::memory::InMemoryDatabase;
use crate::models::*;
use crate::repositories::Database;

#[derive(Clone)]
pub enum StorageBackend {
    Postgres(Database),
    InMemory(Arc<InMemoryDatabase>),
}

impl StorageBackend {
    pub fn postgres(db: Database) -> Self {
        Self::Postgres(db)
    }

    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemoryDatabase::new()))
    }

    pub fn is_dev_mode(&self) -> bool {
        matches!(self, Self::InMemory(_))
    }

    pub fn pool(&self) -> Option<&PgPool> {
        match self {
            Self::Postgres(db) => Some(db.pool()),
            Self::InMemory(_) => None,
        }
    }

    // ============================================
    // Projects
    // ============================================

    pub async fn create_project(&self, input: CreateProject) -> Result<ProjectRow> {
        match self {
            Self::Postgres(db) => db.create_project(input).await,
            Self::InMemory(db) => db.create_project(input).await,
        }
    }

    pub async fn get_project(&self, id: Uuid) -> Result<Option<ProjectRow>> {
        match self {
            Self::Postgres(db) => db.get_project(id).await,
            Self::InMemory(db) => db.get_project(id).await,
        }
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectRow>> {
        match self {
            Self::Postgres(db) => db.list_projects().await,
            Self::InMemory(db) => db.list_projects().await,
        }
    }

    pub async fn update_project(&self, id: Uuid, input: UpdateProject) -> Result<Option<ProjectRow>> {
        match self {
            Self::Postgres(db) => db.update_project(id, input).await,
            Self::InMemory(db) => db.update_project(id, input).await,
        }
    }

    // ============================================
    // Process instances
    // ============================================

    pub async fn create_process_instance(
        &self,
        input: CreateProcessInstance,
    ) -> Result<ProcessInstanceRow> {
        match self {
            Self::Postgres(db) => db.create_process_instance(input).await,
            Self::InMemory(db) => db.create_process_instance(input).await,
        }
    }

    pub async fn get_process_instance(&self, id: Uuid) -> Result<Option<ProcessInstanceRow>> {
        match self {
            Self::Postgres(db) => db.get_process_instance(id).await,
            Self::InMemory(db) => db.get_process_instance(id).await,
        }
    }

    pub async fn get_process_instance_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Option<ProcessInstanceRow>> {
        match self {
            Self::Postgres(db) => db.get_process_instance_by_project(project_id).await,
            Self::InMemory(db) => db.get_process_instance_by_project(project_id).await,
        }
    }

    pub async fn list_process_instances(&self) -> Result<Vec<ProcessInstanceRow>> {
        match self {
            Self::Postgres(db) => db.list_process_instances().await,
            Self::InMemory(db) => db.list_process_instances().await,
        }
    }

    pub async fn update_process_instance(
        &self,
        id: Uuid,
        input: UpdateProcessInstance,
    ) -> Result<Option<ProcessInstanceRow>> {
        match self {
            Self::Postgres(db) => db.update_process_instance(id, input).await,
            Self::InMemory(db) => db.update_process_instance(id, input).await,
        }
    }

    /// Conditional update that only applies when the stored current_step
    /// matches `expected_step`. Returns `None` when the guard misses.
    pub async fn update_process_instance_guarded(
        &self,
        id: Uuid,
        expected_step: i32,
        input: UpdateProcessInstance,
    ) -> Result<Option<ProcessInstanceRow>> {
        match self {
            Self::Postgres(db) => db.update_process_instance_guarded(id, expected_step, input).await,
            Self::InMemory(db) => db.update_process_instance_guarded(id, expected_step, input).await,
        }
    }

    // ============================================
    // Decision elements
    // ============================================

    pub async fn create_decision_element(
        &self,
        input: CreateDecisionElement,
    ) -> Result<DecisionElementRow> {
        match self {
            Self::Postgres(db) => db.create_decision_element(input).await,
            Self::InMemory(db) => db.create_decision_element(input).await,
        }
    }

    pub async fn get_decision_element_by_step(
        &self,
        step: i32,
    ) -> Result<Option<DecisionElementRow>> {
        match self {
            Self::Postgres(db) => db.get_decision_element_by_step(step).await,
            Self::InMemory(db) => db.get_decision_element_by_step(step).await,
        }
    }

    pub async fn list_decision_elements(&self) -> Result<Vec<DecisionElementRow>> {
        match self {
            Self::Postgres(db) => db.list_decision_elements().await,
            Self::InMemory(db) => db.list_decision_elements().await,
        }
    }

    // ============================================
    // Case events
    // ============================================

    pub async fn create_case_event(&self, input: CreateCaseEvent) -> Result<CaseEventRow> {
        match self {
            Self::Postgres(db) => db.create_case_event(input).await,
            Self::InMemory(db) => db.create_case_event(input).await,
        }
    }

    pub async fn get_case_event(&self, id: Uuid) -> Result<Option<CaseEventRow>> {
        match self {
            Self::Postgres(db) => db.get_case_event(id).await,
            Self::InMemory(db) => db.get_case_event(id).await,
        }
    }

    pub async fn update_case_event(
        &self,
        id: Uuid,
        input: UpdateCaseEvent,
    ) -> Result<Option<CaseEventRow>> {
        match self {
            Self::Postgres(db) => db.update_case_event(id, input).await,
            Self::InMemory(db) => db.update_case_event(id, input).await,
        }
    }

    pub async fn latest_task_for_step(
        &self,
        process_instance_id: Uuid,
        step: i32,
    ) -> Result<Option<CaseEventRow>> {
        match self {
            Self::Postgres(db) => db.latest_task_for_step(process_instance_id, step).await,
            Self::InMemory(db) => db.latest_task_for_step(process_instance_id, step).await,
        }
    }

    pub async fn list_events_for_process(
        &self,
        process_instance_id: Uuid,
        kind: &str,
    ) -> Result<Vec<CaseEventRow>> {
        match self {
            Self::Postgres(db) => db.list_events_for_process(process_instance_id, kind).await,
            Self::InMemory(db) => db.list_events_for_process(process_instance_id, kind).await,
        }
    }

    pub async fn list_events_for_user(&self, user_id: Uuid, kind: &str) -> Result<Vec<CaseEventRow>> {
        match self {
            Self::Postgres(db) => db.list_events_for_user(user_id, kind).await,
            Self::InMemory(db) => db.list_events_for_user(user_id, kind).await,
        }
    }

    pub async fn list_tasks_for_roles(&self, role_ids: &[i32]) -> Result<Vec<CaseEventRow>> {
        match self {
            Self::Postgres(db) => db.list_tasks_for_roles(role_ids).await,
            Self::InMemory(db) => db.list_tasks_for_roles(role_ids).await,
        }
    }

    // ============================================
    // Documents
    // ============================================

    pub async fn create_document(&self, input: CreateDocument) -> Result<DocumentRow> {
        match self {
            Self::Postgres(db) => db.create_document(input).await,
            Self::InMemory(db) => db.create_document(input).await,
        }
    }

    pub async fn get_document(&self, id: Uuid) -> Result<Option<DocumentRow>> {
        match self {
            Self::Postgres(db) => db.get_document(id).await,
            Self::InMemory(db) => db.get_document(id).await,
        }
    }

    pub async fn list_documents_for_process(
        &self,
        process_instance_id: Uuid,
    ) -> Result<Vec<DocumentRow>> {
        match self {
            Self::Postgres(db) => db.list_documents_for_process(process_instance_id).await,
            Self::InMemory(db) => db.list_documents_for_process(process_instance_id).await,
        }
    }

    pub async fn latest_document_of_type(
        &self,
        process_instance_id: Uuid,
        document_type: &str,
    ) -> Result<Option<DocumentRow>> {
        match self {
            Self::Postgres(db) => {
                db.latest_document_of_type(process_instance_id, document_type)
                    .await
            }
            Self::InMemory(db) => {
                db.latest_document_of_type(process_instance_id, document_type)
                    .await
            }
        }
    }

    // ============================================
    // Decision payloads
    // ============================================

    pub async fn create_decision_payload(
        &self,
        input: CreateDecisionPayload,
    ) -> Result<DecisionPayloadRow> {
        match self {
            Self::Postgres(db) => db.create_decision_payload(input).await,
            Self::InMemory(db) => db.create_decision_payload(input).await,
        }
    }

    pub async fn list_decision_payloads(
        &self,
        process_instance_id: Uuid,
    ) -> Result<Vec<DecisionPayloadRow>> {
        match self {
            Self::Postgres(db) => db.list_decision_payloads(process_instance_id).await,
            Self::InMemory(db) => db.list_decision_payloads(process_instance_id).await,
        }
    }

    // ============================================
    // User role assignments
    // ============================================

    pub async fn create_user_assignment(
        &self,
        input: CreateUserAssignment,
    ) -> Result<UserAssignmentRow> {
        match self {
            Self::Postgres(db) => db.create_user_assignment(input).await,
            Self::InMemory(db) => db.create_user_assignment(input).await,
        }
    }

    pub async fn list_user_ids_with_role(&self, role_id: i32) -> Result<Vec<Uuid>> {
        match self {
            Self::Postgres(db) => db.list_user_ids_with_role(role_id).await,
            Self::InMemory(db) => db.list_user_ids_with_role(role_id).await,
        }
    }

    pub async fn list_role_ids_for_user(&self, user_id: Uuid) -> Result<Vec<i32>> {
        match self {
            Self::Postgres(db) => db.list_role_ids_for_user(user_id).await,
            Self::InMemory(db) => db.list_role_ids_for_user(user_id).await,
        }
    }
}
