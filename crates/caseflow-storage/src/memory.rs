// In-memory storage implementation for dev mode and tests
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
//
// Mirrors the Postgres repository API over HashMaps so the engine can run
// without a database. All data is lost on restart.

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::*;

#[derive(Default)]
pub struct InMemoryDatabase {
    projects: RwLock<HashMap<Uuid, ProjectRow>>,
    process_instances: RwLock<HashMap<Uuid, ProcessInstanceRow>>,
    decision_elements: RwLock<HashMap<Uuid, DecisionElementRow>>,
    case_events: RwLock<HashMap<Uuid, CaseEventRow>>,
    documents: RwLock<HashMap<Uuid, DocumentRow>>,
    decision_payloads: RwLock<HashMap<Uuid, DecisionPayloadRow>>,
    user_assignments: RwLock<HashMap<Uuid, UserAssignmentRow>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    // ============================================
    // Projects
    // ============================================

    pub async fn create_project(&self, input: CreateProject) -> Result<ProjectRow> {
        let id = Uuid::now_v7();
        let row = ProjectRow {
            id,
            title: input.title,
            description: input.description,
            sector: input.sector,
            lead_agency: input.lead_agency,
            location_text: input.location_text,
            status: input.status,
            meta: serde_json::to_value(&input.meta)?,
            created_at: Self::now(),
        };
        self.projects.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_project(&self, id: Uuid) -> Result<Option<ProjectRow>> {
        Ok(self.projects.read().get(&id).cloned())
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectRow>> {
        let mut rows: Vec<_> = self.projects.read().values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    pub async fn update_project(&self, id: Uuid, input: UpdateProject) -> Result<Option<ProjectRow>> {
        let mut projects = self.projects.write();
        if let Some(row) = projects.get_mut(&id) {
            if let Some(title) = input.title {
                row.title = title;
            }
            if let Some(description) = input.description {
                row.description = Some(description);
            }
            if let Some(sector) = input.sector {
                row.sector = Some(sector);
            }
            if let Some(lead_agency) = input.lead_agency {
                row.lead_agency = Some(lead_agency);
            }
            if let Some(location_text) = input.location_text {
                row.location_text = Some(location_text);
            }
            if let Some(status) = input.status {
                row.status = status;
            }
            if let Some(meta) = input.meta {
                row.meta = serde_json::to_value(&meta)?;
            }
            return Ok(Some(row.clone()));
        }
        Ok(None)
    }

    // ============================================
    // Process instances
    // ============================================

    pub async fn create_process_instance(
        &self,
        input: CreateProcessInstance,
    ) -> Result<ProcessInstanceRow> {
        let id = Uuid::now_v7();
        let row = ProcessInstanceRow {
            id,
            project_id: input.project_id,
            status: input.status,
            stage: input.stage,
            start_date: input.start_date,
            complete_date: None,
            outcome: None,
            meta: serde_json::to_value(&input.meta)?,
            created_at: Self::now(),
        };
        self.process_instances.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_process_instance(&self, id: Uuid) -> Result<Option<ProcessInstanceRow>> {
        Ok(self.process_instances.read().get(&id).cloned())
    }

    pub async fn get_process_instance_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Option<ProcessInstanceRow>> {
        let instances = self.process_instances.read();
        let mut rows: Vec<_> = instances
            .values()
            .filter(|p| p.project_id == project_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows.into_iter().next())
    }

    pub async fn list_process_instances(&self) -> Result<Vec<ProcessInstanceRow>> {
        let mut rows: Vec<_> = self.process_instances.read().values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    fn apply_process_patch(row: &mut ProcessInstanceRow, input: UpdateProcessInstance) -> Result<()> {
        if let Some(status) = input.status {
            row.status = status;
        }
        if let Some(stage) = input.stage {
            row.stage = stage;
        }
        if let Some(complete_date) = input.complete_date {
            row.complete_date = Some(complete_date);
        }
        if let Some(outcome) = input.outcome {
            row.outcome = Some(outcome);
        }
        if let Some(meta) = input.meta {
            row.meta = serde_json::to_value(&meta)?;
        }
        Ok(())
    }

    pub async fn update_process_instance(
        &self,
        id: Uuid,
        input: UpdateProcessInstance,
    ) -> Result<Option<ProcessInstanceRow>> {
        let mut instances = self.process_instances.write();
        if let Some(row) = instances.get_mut(&id) {
            Self::apply_process_patch(row, input)?;
            return Ok(Some(row.clone()));
        }
        Ok(None)
    }

    /// Compare-and-swap on the stored current_step, matching the Postgres
    /// conditional update. The write lock makes check-then-patch atomic.
    pub async fn update_process_instance_guarded(
        &self,
        id: Uuid,
        expected_step: i32,
        input: UpdateProcessInstance,
    ) -> Result<Option<ProcessInstanceRow>> {
        let mut instances = self.process_instances.write();
        if let Some(row) = instances.get_mut(&id) {
            let stored_step = row
                .meta
                .get("current_step")
                .and_then(|v| v.as_i64())
                .map(|v| v as i32);
            if stored_step != Some(expected_step) {
                return Ok(None);
            }
            Self::apply_process_patch(row, input)?;
            return Ok(Some(row.clone()));
        }
        Ok(None)
    }

    // ============================================
    // Decision elements
    // ============================================

    pub async fn create_decision_element(
        &self,
        input: CreateDecisionElement,
    ) -> Result<DecisionElementRow> {
        let id = Uuid::now_v7();
        let row = DecisionElementRow {
            id,
            step: input.step,
            title: input.title,
            description: input.description,
            responsible_role: input.responsible_role,
            form_schema: input.form_schema,
            created_at: Self::now(),
        };
        self.decision_elements.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_decision_element_by_step(
        &self,
        step: i32,
    ) -> Result<Option<DecisionElementRow>> {
        Ok(self
            .decision_elements
            .read()
            .values()
            .find(|e| e.step == step)
            .cloned())
    }

    pub async fn list_decision_elements(&self) -> Result<Vec<DecisionElementRow>> {
        let mut rows: Vec<_> = self.decision_elements.read().values().cloned().collect();
        rows.sort_by_key(|e| e.step);
        Ok(rows)
    }

    // ============================================
    // Case events
    // ============================================

    pub async fn create_case_event(&self, input: CreateCaseEvent) -> Result<CaseEventRow> {
        let id = Uuid::now_v7();
        let row = CaseEventRow {
            id,
            process_instance_id: input.process_instance_id,
            name: input.name,
            description: input.description,
            kind: input.kind,
            tier: input.tier,
            status: input.status,
            outcome: None,
            assigned_entity: input.assigned_entity,
            related_document_id: input.related_document_id,
            meta: input.meta,
            created_at: Self::now(),
        };
        self.case_events.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_case_event(&self, id: Uuid) -> Result<Option<CaseEventRow>> {
        Ok(self.case_events.read().get(&id).cloned())
    }

    pub async fn update_case_event(
        &self,
        id: Uuid,
        input: UpdateCaseEvent,
    ) -> Result<Option<CaseEventRow>> {
        let mut events = self.case_events.write();
        if let Some(row) = events.get_mut(&id) {
            if let Some(name) = input.name {
                row.name = name;
            }
            if let Some(description) = input.description {
                row.description = Some(description);
            }
            if let Some(status) = input.status {
                row.status = status;
            }
            if let Some(outcome) = input.outcome {
                row.outcome = Some(outcome);
            }
            if let Some(assigned_entity) = input.assigned_entity {
                row.assigned_entity = Some(assigned_entity);
            }
            if let Some(related_document_id) = input.related_document_id {
                row.related_document_id = Some(related_document_id);
            }
            if let Some(meta) = input.meta {
                row.meta = meta;
            }
            return Ok(Some(row.clone()));
        }
        Ok(None)
    }

    pub async fn latest_task_for_step(
        &self,
        process_instance_id: Uuid,
        step: i32,
    ) -> Result<Option<CaseEventRow>> {
        let events = self.case_events.read();
        let mut rows: Vec<_> = events
            .values()
            .filter(|e| {
                e.process_instance_id == process_instance_id
                    && e.kind == EVENT_KIND_TASK
                    && e.tier == Some(step)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows.into_iter().next())
    }

    pub async fn list_events_for_process(
        &self,
        process_instance_id: Uuid,
        kind: &str,
    ) -> Result<Vec<CaseEventRow>> {
        let events = self.case_events.read();
        let mut rows: Vec<_> = events
            .values()
            .filter(|e| e.process_instance_id == process_instance_id && e.kind == kind)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    pub async fn list_events_for_user(&self, user_id: Uuid, kind: &str) -> Result<Vec<CaseEventRow>> {
        let events = self.case_events.read();
        let mut rows: Vec<_> = events
            .values()
            .filter(|e| e.assigned_entity == Some(user_id) && e.kind == kind)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    pub async fn list_tasks_for_roles(&self, role_ids: &[i32]) -> Result<Vec<CaseEventRow>> {
        let events = self.case_events.read();
        let mut rows: Vec<_> = events
            .values()
            .filter(|e| {
                e.kind == EVENT_KIND_TASK
                    && e.meta
                        .get("assigned_role_id")
                        .and_then(|v| v.as_i64())
                        .map(|v| role_ids.contains(&(v as i32)))
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    // ============================================
    // Documents
    // ============================================

    pub async fn create_document(&self, input: CreateDocument) -> Result<DocumentRow> {
        let id = Uuid::now_v7();
        let row = DocumentRow {
            id,
            process_instance_id: input.process_instance_id,
            title: input.title,
            document_type: input.document_type,
            status: input.status,
            prepared_by: input.prepared_by,
            related_document_id: input.related_document_id,
            meta: serde_json::to_value(&input.meta)?,
            created_at: Self::now(),
        };
        self.documents.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_document(&self, id: Uuid) -> Result<Option<DocumentRow>> {
        Ok(self.documents.read().get(&id).cloned())
    }

    pub async fn list_documents_for_process(
        &self,
        process_instance_id: Uuid,
    ) -> Result<Vec<DocumentRow>> {
        let docs = self.documents.read();
        let mut rows: Vec<_> = docs
            .values()
            .filter(|d| d.process_instance_id == process_instance_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    pub async fn latest_document_of_type(
        &self,
        process_instance_id: Uuid,
        document_type: &str,
    ) -> Result<Option<DocumentRow>> {
        let docs = self.documents.read();
        let mut rows: Vec<_> = docs
            .values()
            .filter(|d| {
                d.process_instance_id == process_instance_id && d.document_type == document_type
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows.into_iter().next())
    }

    // ============================================
    // Decision payloads (append-only)
    // ============================================

    pub async fn create_decision_payload(
        &self,
        input: CreateDecisionPayload,
    ) -> Result<DecisionPayloadRow> {
        let id = Uuid::now_v7();
        let row = DecisionPayloadRow {
            id,
            decision_element_id: input.decision_element_id,
            step: input.step,
            process_instance_id: input.process_instance_id,
            project_id: input.project_id,
            result: input.result,
            result_bool: input.result_bool,
            result_notes: input.result_notes,
            evaluation_data: input.evaluation_data,
            created_at: Self::now(),
        };
        self.decision_payloads.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn list_decision_payloads(
        &self,
        process_instance_id: Uuid,
    ) -> Result<Vec<DecisionPayloadRow>> {
        let payloads = self.decision_payloads.read();
        let mut rows: Vec<_> = payloads
            .values()
            .filter(|p| p.process_instance_id == process_instance_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    // ============================================
    // User role assignments
    // ============================================

    pub async fn create_user_assignment(
        &self,
        input: CreateUserAssignment,
    ) -> Result<UserAssignmentRow> {
        let id = Uuid::now_v7();
        let row = UserAssignmentRow {
            id,
            user_id: input.user_id,
            role_id: input.role_id,
            created_at: Self::now(),
        };
        self.user_assignments.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn list_user_ids_with_role(&self, role_id: i32) -> Result<Vec<Uuid>> {
        let assignments = self.user_assignments.read();
        let mut rows: Vec<_> = assignments
            .values()
            .filter(|a| a.role_id == role_id)
            .cloned()
            .collect();
        // uuid v7 ids sort by creation time, matching the SQL ORDER BY id
        rows.sort_by_key(|a| a.id);
        Ok(rows.into_iter().map(|a| a.user_id).collect())
    }

    pub async fn list_role_ids_for_user(&self, user_id: Uuid) -> Result<Vec<i32>> {
        let assignments = self.user_assignments.read();
        let mut rows: Vec<_> = assignments
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.id);
        Ok(rows.into_iter().map(|a| a.role_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caseflow_contracts::{ProcessMeta, ProjectMeta, WorkflowStatus};

    fn project_meta(applicant: Uuid) -> ProjectMeta {
        ProjectMeta {
            applicant_user_id: applicant,
            analyst_user_id: None,
            approver_user_id: None,
        }
    }

    #[tokio::test]
    async fn guarded_update_rejects_stale_step() {
        let db = InMemoryDatabase::new();
        let project = db
            .create_project(CreateProject {
                title: "Test".into(),
                description: None,
                sector: None,
                lead_agency: None,
                location_text: None,
                status: "draft".into(),
                meta: project_meta(Uuid::now_v7()),
            })
            .await
            .unwrap();

        let instance = db
            .create_process_instance(CreateProcessInstance {
                project_id: project.id,
                status: "underway".into(),
                stage: "Step 2: Project Information".into(),
                start_date: None,
                meta: ProcessMeta {
                    current_step: 2,
                    workflow_status: WorkflowStatus::Draft,
                },
            })
            .await
            .unwrap();

        // Guard matches: update applies
        let updated = db
            .update_process_instance_guarded(
                instance.id,
                2,
                UpdateProcessInstance {
                    meta: Some(ProcessMeta {
                        current_step: 3,
                        workflow_status: WorkflowStatus::InProgress,
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.is_some());

        // Guard stale: second caller still expecting step 2 is refused
        let refused = db
            .update_process_instance_guarded(
                instance.id,
                2,
                UpdateProcessInstance {
                    meta: Some(ProcessMeta {
                        current_step: 3,
                        workflow_status: WorkflowStatus::InProgress,
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(refused.is_none());
    }

    #[tokio::test]
    async fn role_lookup_is_ordered_by_assignment() {
        let db = InMemoryDatabase::new();
        let first = Uuid::now_v7();
        let second = Uuid::now_v7();
        db.create_user_assignment(CreateUserAssignment {
            user_id: first,
            role_id: 2,
        })
        .await
        .unwrap();
        db.create_user_assignment(CreateUserAssignment {
            user_id: second,
            role_id: 2,
        })
        .await
        .unwrap();

        let ids = db.list_user_ids_with_role(2).await.unwrap();
        assert_eq!(ids, vec![first, second]);
        assert!(db.list_user_ids_with_role(3).await.unwrap().is_empty());
    }
}
