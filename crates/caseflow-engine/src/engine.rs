// The workflow engine proper
//
// Every operation takes the record store by shared reference; there is no
// process-wide singleton. Step advancement uses a conditional update on the
// stored current_step so two concurrent completions of the same task cannot
// double-advance the workflow.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use caseflow_contracts::{
    ApprovalRequest, CaseDetail, CaseInitResponse, CompleteTaskRequest, CreateAssignmentRequest,
    DecisionElement, DecisionPayload, DecisionResult, Document, DocumentMeta, DocumentType,
    Notification, NotificationMeta, ProcessInstance, ProcessMeta, ProcessStatus, Project,
    ProjectMeta, ProjectStatus, Role, Task, TaskMeta, TaskOutcome, TaskStatus, TaskType,
    TransitionResponse, UserAssignment, WorkflowStatus,
};
use caseflow_storage::{
    CaseEventRow, CreateCaseEvent, CreateDecisionPayload, CreateDocument, CreateProcessInstance,
    CreateProject, CreateUserAssignment, DecisionElementRow, DecisionPayloadRow, DocumentRow,
    ProcessInstanceRow, ProjectRow, StorageBackend, UpdateCaseEvent, UpdateProcessInstance,
    UpdateProject, EVENT_KIND_NOTIFICATION, EVENT_KIND_TASK,
};

use crate::error::{Result, WorkflowError};
use crate::steps::{
    document_title, document_type_for_step, initial_document_content, stage_name,
    task_type_for_step, APPROVAL_STEP, FIRST_STEP, TERMINAL_STEP,
};

#[derive(Clone)]
pub struct WorkflowEngine {
    store: Arc<StorageBackend>,
}

impl WorkflowEngine {
    pub fn new(store: Arc<StorageBackend>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &StorageBackend {
        &self.store
    }

    // ============================================
    // Case initialization
    // ============================================

    /// Create the project, its process instance, the first task, and the
    /// synthetic step-1 decision payload recording that authentication
    /// already happened.
    pub async fn initialize_case(
        &self,
        applicant_id: Uuid,
        title: Option<String>,
    ) -> Result<CaseInitResponse> {
        let project = self
            .store
            .create_project(CreateProject {
                title: title.unwrap_or_else(|| "New Project".to_string()),
                description: None,
                sector: None,
                lead_agency: None,
                location_text: None,
                status: ProjectStatus::Draft.to_string(),
                meta: ProjectMeta {
                    applicant_user_id: applicant_id,
                    analyst_user_id: None,
                    approver_user_id: None,
                },
            })
            .await?;

        let instance = self
            .store
            .create_process_instance(CreateProcessInstance {
                project_id: project.id,
                status: ProcessStatus::Underway.to_string(),
                stage: stage_name(FIRST_STEP),
                start_date: Some(Utc::now().date_naive()),
                meta: ProcessMeta {
                    current_step: FIRST_STEP,
                    workflow_status: WorkflowStatus::Draft,
                },
            })
            .await?;

        let element = self.store.get_decision_element_by_step(FIRST_STEP).await?;
        let task_meta = TaskMeta {
            step_number: FIRST_STEP,
            decision_element_id: element.as_ref().map(|e| e.id),
            assigned_role_id: Some(Role::Applicant.id()),
            task_type: TaskType::Form,
            ..Default::default()
        };
        let task = self
            .store
            .create_case_event(CreateCaseEvent {
                process_instance_id: instance.id,
                name: "Complete Project Information".to_string(),
                description: Some("Fill out the project information form to proceed".to_string()),
                kind: EVENT_KIND_TASK.to_string(),
                tier: Some(FIRST_STEP),
                status: TaskStatus::Pending.to_string(),
                assigned_entity: Some(applicant_id),
                related_document_id: None,
                meta: serde_json::to_value(&task_meta)?,
            })
            .await?;

        // Step 1 (authentication) is complete by construction.
        self.store
            .create_decision_payload(CreateDecisionPayload {
                decision_element_id: None,
                step: 1,
                process_instance_id: instance.id,
                project_id: project.id,
                result: DecisionResult::Completed.to_string(),
                result_bool: true,
                result_notes: None,
                evaluation_data: json!({
                    "user_id": applicant_id,
                    "authenticated_at": Utc::now(),
                }),
            })
            .await?;

        tracing::info!(
            project_id = %project.id,
            process_instance_id = %instance.id,
            "initialized case"
        );

        Ok(CaseInitResponse {
            project: project_dto(project)?,
            process_instance: process_dto(instance)?,
            initial_task: task_dto(task)?,
        })
    }

    // ============================================
    // Step transitions
    // ============================================

    /// Advance a process instance to `target_step`, guarding against
    /// concurrent movement with the step it was observed at.
    pub async fn advance_to_step(
        &self,
        process_instance_id: Uuid,
        target_step: i32,
        initiating_user_id: Uuid,
    ) -> Result<TransitionResponse> {
        let instance = self.require_instance(process_instance_id).await?;
        let meta: ProcessMeta = serde_json::from_value(instance.meta.clone())?;
        self.advance_guarded(&instance, meta.current_step, target_step, initiating_user_id)
            .await
    }

    async fn advance_guarded(
        &self,
        instance: &ProcessInstanceRow,
        expected_step: i32,
        target_step: i32,
        initiating_user_id: Uuid,
    ) -> Result<TransitionResponse> {
        let project = self.require_project(instance.project_id).await?;
        let element = self.store.get_decision_element_by_step(target_step).await?;

        // Absence of a decision element is the completion signal.
        let Some(element) = element else {
            let updated = self
                .store
                .update_process_instance_guarded(
                    instance.id,
                    expected_step,
                    UpdateProcessInstance {
                        status: Some(ProcessStatus::Completed.to_string()),
                        stage: Some("Completed".to_string()),
                        complete_date: Some(Utc::now().date_naive()),
                        outcome: Some("approved".to_string()),
                        meta: Some(ProcessMeta {
                            current_step: target_step,
                            workflow_status: WorkflowStatus::Approved,
                        }),
                    },
                )
                .await?
                .ok_or(WorkflowError::Conflict {
                    process_instance_id: instance.id,
                    expected_step,
                })?;
            self.store
                .update_project(
                    project.id,
                    UpdateProject {
                        status: Some(ProjectStatus::Approved.to_string()),
                        ..Default::default()
                    },
                )
                .await?;
            tracing::info!(process_instance_id = %instance.id, "workflow completed");
            return Ok(TransitionResponse {
                process_instance: process_dto(updated)?,
                next_task: None,
            });
        };

        let project_meta: ProjectMeta = serde_json::from_value(project.meta.clone())?;
        let assigned_user = match element.responsible_role.and_then(Role::from_id) {
            Some(Role::Analyst) => {
                self.resolve_role(&project, Role::Analyst, &[project_meta.applicant_user_id])
                    .await?
            }
            Some(Role::Approver) => {
                let mut exclude = vec![project_meta.applicant_user_id];
                exclude.extend(project_meta.analyst_user_id);
                self.resolve_role(&project, Role::Approver, &exclude).await?
            }
            _ => Some(initiating_user_id),
        };

        let workflow_status = if target_step == APPROVAL_STEP {
            WorkflowStatus::PendingApproval
        } else {
            WorkflowStatus::InProgress
        };
        let updated = self
            .store
            .update_process_instance_guarded(
                instance.id,
                expected_step,
                UpdateProcessInstance {
                    stage: Some(stage_name(target_step)),
                    meta: Some(ProcessMeta {
                        current_step: target_step,
                        workflow_status,
                    }),
                    ..Default::default()
                },
            )
            .await?
            .ok_or(WorkflowError::Conflict {
                process_instance_id: instance.id,
                expected_step,
            })?;

        let task_type = task_type_for_step(target_step);
        let task_meta = TaskMeta {
            step_number: target_step,
            decision_element_id: Some(element.id),
            assigned_role_id: Some(element.responsible_role.unwrap_or(Role::Applicant.id())),
            task_type,
            ..Default::default()
        };
        let task = self
            .store
            .create_case_event(CreateCaseEvent {
                process_instance_id: instance.id,
                name: element.title.clone(),
                description: element.description.clone(),
                kind: EVENT_KIND_TASK.to_string(),
                tier: Some(target_step),
                status: TaskStatus::Pending.to_string(),
                assigned_entity: assigned_user,
                related_document_id: None,
                meta: serde_json::to_value(&task_meta)?,
            })
            .await?;

        if task_type == TaskType::Document {
            self.create_document_for_step(
                instance.id,
                target_step,
                assigned_user.unwrap_or(initiating_user_id),
            )
            .await?;
        }

        tracing::info!(
            process_instance_id = %instance.id,
            step = target_step,
            assigned = ?assigned_user,
            "advanced workflow step"
        );

        Ok(TransitionResponse {
            process_instance: process_dto(updated)?,
            next_task: Some(task_dto(task)?),
        })
    }

    /// Find or assign a user for a role on this project.
    ///
    /// Idempotent: once a user is recorded in the project metadata for the
    /// role, that user is returned without consulting the assignment lookup.
    /// Exhaustion is not an error; the caller proceeds with an unassigned
    /// task.
    async fn resolve_role(
        &self,
        project: &ProjectRow,
        role: Role,
        exclude: &[Uuid],
    ) -> Result<Option<Uuid>> {
        let mut meta: ProjectMeta = serde_json::from_value(project.meta.clone())?;
        let existing = match role {
            Role::Applicant => Some(meta.applicant_user_id),
            Role::Analyst => meta.analyst_user_id,
            Role::Approver => meta.approver_user_id,
        };
        if let Some(user) = existing {
            return Ok(Some(user));
        }

        let candidates = self.store.list_user_ids_with_role(role.id()).await?;
        let Some(chosen) = candidates.into_iter().find(|u| !exclude.contains(u)) else {
            tracing::warn!(
                project_id = %project.id,
                role = %role,
                "no eligible user for role, leaving task unassigned"
            );
            return Ok(None);
        };

        match role {
            Role::Applicant => {}
            Role::Analyst => meta.analyst_user_id = Some(chosen),
            Role::Approver => meta.approver_user_id = Some(chosen),
        }
        self.store
            .update_project(
                project.id,
                UpdateProject {
                    meta: Some(meta),
                    ..Default::default()
                },
            )
            .await?;

        Ok(Some(chosen))
    }

    async fn create_document_for_step(
        &self,
        process_instance_id: Uuid,
        step: i32,
        user_id: Uuid,
    ) -> Result<DocumentRow> {
        // The analysis reviews the applicant draft.
        let related_document_id = if document_type_for_step(step) == DocumentType::Analysis {
            self.store
                .latest_document_of_type(process_instance_id, &DocumentType::Draft.to_string())
                .await?
                .map(|d| d.id)
        } else {
            None
        };

        let document_role = document_type_for_step(step);
        let row = self
            .store
            .create_document(CreateDocument {
                process_instance_id,
                title: document_title(step).to_string(),
                document_type: document_role.to_string(),
                status: "draft".to_string(),
                prepared_by: user_id,
                related_document_id,
                meta: DocumentMeta {
                    document_role,
                    created_by_user_id: user_id,
                    markdown_content: initial_document_content(step).to_string(),
                    external_note_id: None,
                    external_note_url: None,
                    last_edited_by_user_id: None,
                },
            })
            .await?;
        Ok(row)
    }

    // ============================================
    // Task completion
    // ============================================

    /// Complete a form or document task and advance to the next step.
    pub async fn complete_task(
        &self,
        task_id: Uuid,
        req: CompleteTaskRequest,
    ) -> Result<TransitionResponse> {
        let task = self.require_task(task_id).await?;
        let mut meta: TaskMeta = serde_json::from_value(task.meta.clone())?;

        if TaskStatus::from(task.status.as_str()) == TaskStatus::Completed {
            return Err(WorkflowError::Validation(format!(
                "task {} is already completed",
                task.id
            )));
        }
        if meta.task_type == TaskType::Approval {
            return Err(WorkflowError::Validation(
                "approval tasks are decided through the approval operation".to_string(),
            ));
        }

        let step = meta.step_number;
        let instance = self.require_instance(task.process_instance_id).await?;

        meta.completed_by = Some(req.user_id);
        meta.completed_at = Some(Utc::now());
        self.store
            .update_case_event(
                task.id,
                UpdateCaseEvent {
                    status: Some(TaskStatus::Completed.to_string()),
                    outcome: Some(TaskOutcome::Completed.to_string()),
                    meta: Some(serde_json::to_value(&meta)?),
                    ..Default::default()
                },
            )
            .await?;

        if let Some(payload) = req.payload {
            if step == FIRST_STEP {
                self.apply_project_form(&instance, &payload).await?;
            }
            self.store
                .create_decision_payload(CreateDecisionPayload {
                    decision_element_id: meta.decision_element_id,
                    step,
                    process_instance_id: instance.id,
                    project_id: instance.project_id,
                    result: DecisionResult::Completed.to_string(),
                    result_bool: true,
                    result_notes: None,
                    evaluation_data: payload,
                })
                .await?;
        }

        self.advance_guarded(&instance, step, step + 1, req.user_id)
            .await
    }

    /// Step 2 carries the project information form; its submission patches
    /// the project record and moves it out of draft.
    async fn apply_project_form(
        &self,
        instance: &ProcessInstanceRow,
        payload: &serde_json::Value,
    ) -> Result<()> {
        let text = |key: &str| {
            payload
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        };
        self.store
            .update_project(
                instance.project_id,
                UpdateProject {
                    title: text("title"),
                    description: text("description"),
                    sector: text("sector"),
                    lead_agency: text("lead_agency"),
                    location_text: text("location_text"),
                    status: Some(ProjectStatus::Underway.to_string()),
                    meta: None,
                },
            )
            .await?;
        Ok(())
    }

    // ============================================
    // Approval gate
    // ============================================

    /// Decide the step-5 approval task: either terminate the workflow as
    /// approved, or regress to step 4 with revision context on the new task.
    pub async fn handle_approval(
        &self,
        task_id: Uuid,
        req: ApprovalRequest,
    ) -> Result<TransitionResponse> {
        let task = self.require_task(task_id).await?;
        let mut meta: TaskMeta = serde_json::from_value(task.meta.clone())?;

        if meta.task_type != TaskType::Approval {
            return Err(WorkflowError::Validation(format!(
                "task {} is not an approval task",
                task.id
            )));
        }
        if TaskStatus::from(task.status.as_str()) == TaskStatus::Completed {
            return Err(WorkflowError::Validation(format!(
                "task {} is already decided",
                task.id
            )));
        }
        let comments = req.comments.as_deref().map(str::trim).filter(|c| !c.is_empty());
        if !req.approved && comments.is_none() {
            return Err(WorkflowError::Validation(
                "comments are required when requesting changes".to_string(),
            ));
        }

        let instance = self.require_instance(task.process_instance_id).await?;
        let project = self.require_project(instance.project_id).await?;
        let project_meta: ProjectMeta = serde_json::from_value(project.meta.clone())?;

        let outcome = if req.approved {
            TaskOutcome::Approved
        } else {
            TaskOutcome::ChangesRequested
        };
        meta.completed_by = Some(req.approver_id);
        meta.completed_at = Some(Utc::now());
        meta.approval_comments = comments.map(str::to_owned);
        self.store
            .update_case_event(
                task.id,
                UpdateCaseEvent {
                    status: Some(TaskStatus::Completed.to_string()),
                    outcome: Some(outcome.to_string()),
                    meta: Some(serde_json::to_value(&meta)?),
                    ..Default::default()
                },
            )
            .await?;

        let result = if req.approved {
            DecisionResult::Approved
        } else {
            DecisionResult::ChangesRequested
        };
        self.store
            .create_decision_payload(CreateDecisionPayload {
                decision_element_id: meta.decision_element_id,
                step: APPROVAL_STEP,
                process_instance_id: instance.id,
                project_id: instance.project_id,
                result: result.to_string(),
                result_bool: req.approved,
                result_notes: comments.map(str::to_owned),
                evaluation_data: json!({
                    "approver_id": req.approver_id,
                    "decision_at": Utc::now(),
                }),
            })
            .await?;

        if req.approved {
            let updated = self
                .store
                .update_process_instance_guarded(
                    instance.id,
                    APPROVAL_STEP,
                    UpdateProcessInstance {
                        status: Some(ProcessStatus::Completed.to_string()),
                        stage: Some("Approved".to_string()),
                        complete_date: Some(Utc::now().date_naive()),
                        outcome: Some("approved".to_string()),
                        meta: Some(ProcessMeta {
                            current_step: TERMINAL_STEP,
                            workflow_status: WorkflowStatus::Approved,
                        }),
                    },
                )
                .await?
                .ok_or(WorkflowError::Conflict {
                    process_instance_id: instance.id,
                    expected_step: APPROVAL_STEP,
                })?;
            self.store
                .update_project(
                    project.id,
                    UpdateProject {
                        status: Some(ProjectStatus::Approved.to_string()),
                        ..Default::default()
                    },
                )
                .await?;

            if let Some(analyst_id) = project_meta.analyst_user_id {
                let message = match comments {
                    Some(c) => format!(
                        "Your analysis for \"{}\" has been approved. Comment: {}",
                        project.title, c
                    ),
                    None => format!("Your analysis for \"{}\" has been approved.", project.title),
                };
                self.create_notification(
                    analyst_id,
                    instance.id,
                    project.id,
                    "approval",
                    "Case Approved",
                    &message,
                )
                .await?;
            }

            tracing::info!(process_instance_id = %instance.id, "case approved");
            return Ok(TransitionResponse {
                process_instance: process_dto(updated)?,
                next_task: None,
            });
        }

        // Request changes: the single permitted backward transition, 5 -> 4.
        let revision_comments = comments.map(str::to_owned).unwrap_or_default();
        let transition = self
            .advance_guarded(&instance, APPROVAL_STEP, APPROVAL_STEP - 1, req.approver_id)
            .await?;

        let Some(next_task) = transition.next_task else {
            return Ok(transition);
        };
        let row = self.require_task(next_task.id).await?;
        let mut next_meta: TaskMeta = serde_json::from_value(row.meta.clone())?;
        next_meta.revision_requested = true;
        next_meta.revision_comments = Some(revision_comments.clone());
        next_meta.revision_requested_by = Some(req.approver_id);
        let patched = self
            .store
            .update_case_event(
                row.id,
                UpdateCaseEvent {
                    description: Some(format!("Revisions requested: {revision_comments}")),
                    meta: Some(serde_json::to_value(&next_meta)?),
                    ..Default::default()
                },
            )
            .await?
            .ok_or(WorkflowError::NotFound {
                what: "task",
                id: row.id,
            })?;

        if let Some(analyst_id) = project_meta.analyst_user_id {
            self.create_notification(
                analyst_id,
                instance.id,
                project.id,
                "revision_requested",
                "Revisions Requested",
                &format!(
                    "Revisions requested for \"{}\": {}",
                    project.title, revision_comments
                ),
            )
            .await?;
        }

        tracing::info!(process_instance_id = %instance.id, "revisions requested");
        Ok(TransitionResponse {
            process_instance: transition.process_instance,
            next_task: Some(task_dto(patched)?),
        })
    }

    // ============================================
    // Notifications
    // ============================================

    pub async fn create_notification(
        &self,
        user_id: Uuid,
        process_instance_id: Uuid,
        project_id: Uuid,
        notification_type: &str,
        title: &str,
        message: &str,
    ) -> Result<Notification> {
        let meta = NotificationMeta {
            notification_type: notification_type.to_string(),
            project_id,
            read: false,
            read_at: None,
        };
        let row = self
            .store
            .create_case_event(CreateCaseEvent {
                process_instance_id,
                name: title.to_string(),
                description: Some(message.to_string()),
                kind: EVENT_KIND_NOTIFICATION.to_string(),
                tier: None,
                status: TaskStatus::Pending.to_string(),
                assigned_entity: Some(user_id),
                related_document_id: None,
                meta: serde_json::to_value(&meta)?,
            })
            .await?;
        notification_dto(row)
    }

    pub async fn get_user_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let rows = self
            .store
            .list_events_for_user(user_id, EVENT_KIND_NOTIFICATION)
            .await?;
        rows.into_iter().map(notification_dto).collect()
    }

    pub async fn mark_notification_read(&self, notification_id: Uuid) -> Result<Notification> {
        let row = self
            .store
            .get_case_event(notification_id)
            .await?
            .filter(|e| e.kind == EVENT_KIND_NOTIFICATION)
            .ok_or(WorkflowError::NotFound {
                what: "notification",
                id: notification_id,
            })?;
        let mut meta: NotificationMeta = serde_json::from_value(row.meta.clone())?;
        meta.read = true;
        meta.read_at = Some(Utc::now());
        let updated = self
            .store
            .update_case_event(
                row.id,
                UpdateCaseEvent {
                    status: Some(TaskStatus::Completed.to_string()),
                    meta: Some(serde_json::to_value(&meta)?),
                    ..Default::default()
                },
            )
            .await?
            .ok_or(WorkflowError::NotFound {
                what: "notification",
                id: notification_id,
            })?;
        notification_dto(updated)
    }

    // ============================================
    // Roles and task queries
    // ============================================

    pub async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>> {
        let ids = self.store.list_role_ids_for_user(user_id).await?;
        Ok(ids.into_iter().filter_map(Role::from_id).collect())
    }

    pub async fn user_has_role(&self, user_id: Uuid, role: Role) -> Result<bool> {
        Ok(self.get_user_roles(user_id).await?.contains(&role))
    }

    pub async fn create_assignment(&self, req: CreateAssignmentRequest) -> Result<UserAssignment> {
        let row = self
            .store
            .create_user_assignment(CreateUserAssignment {
                user_id: req.user_id,
                role_id: req.role.id(),
            })
            .await?;
        Ok(UserAssignment {
            id: row.id,
            user_id: row.user_id,
            role: Role::from_id(row.role_id).unwrap_or(req.role),
            created_at: row.created_at,
        })
    }

    /// Tasks assigned to the user directly, plus tasks assigned to any of
    /// the user's roles, newest first.
    pub async fn get_user_tasks(&self, user_id: Uuid) -> Result<Vec<Task>> {
        let mut rows = self.store.list_events_for_user(user_id, EVENT_KIND_TASK).await?;
        let role_ids = self.store.list_role_ids_for_user(user_id).await?;
        if !role_ids.is_empty() {
            rows.extend(self.store.list_tasks_for_roles(&role_ids).await?);
        }

        let mut seen = HashSet::new();
        rows.retain(|r| seen.insert(r.id));
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.into_iter().map(task_dto).collect()
    }

    pub async fn get_task(&self, task_id: Uuid) -> Result<Task> {
        task_dto(self.require_task(task_id).await?)
    }

    pub async fn list_case_tasks(&self, process_instance_id: Uuid) -> Result<Vec<Task>> {
        let rows = self
            .store
            .list_events_for_process(process_instance_id, EVENT_KIND_TASK)
            .await?;
        rows.into_iter().map(task_dto).collect()
    }

    // ============================================
    // Case and record queries
    // ============================================

    pub async fn get_case(&self, process_instance_id: Uuid) -> Result<CaseDetail> {
        let instance = self.require_instance(process_instance_id).await?;
        let project = self.require_project(instance.project_id).await?;
        Ok(CaseDetail {
            process_instance: process_dto(instance)?,
            project: project_dto(project)?,
        })
    }

    pub async fn list_cases(&self) -> Result<Vec<CaseDetail>> {
        let instances = self.store.list_process_instances().await?;
        let mut cases = Vec::with_capacity(instances.len());
        for instance in instances {
            let project = self.require_project(instance.project_id).await?;
            cases.push(CaseDetail {
                process_instance: process_dto(instance)?,
                project: project_dto(project)?,
            });
        }
        Ok(cases)
    }

    pub async fn get_document(&self, document_id: Uuid) -> Result<Document> {
        let row = self
            .store
            .get_document(document_id)
            .await?
            .ok_or(WorkflowError::NotFound {
                what: "document",
                id: document_id,
            })?;
        document_dto(row)
    }

    pub async fn list_case_documents(&self, process_instance_id: Uuid) -> Result<Vec<Document>> {
        let rows = self
            .store
            .list_documents_for_process(process_instance_id)
            .await?;
        rows.into_iter().map(document_dto).collect()
    }

    pub async fn list_case_payloads(
        &self,
        process_instance_id: Uuid,
    ) -> Result<Vec<DecisionPayload>> {
        let rows = self.store.list_decision_payloads(process_instance_id).await?;
        Ok(rows.into_iter().map(payload_dto).collect())
    }

    pub async fn list_decision_elements(&self) -> Result<Vec<DecisionElement>> {
        let rows = self.store.list_decision_elements().await?;
        Ok(rows.into_iter().map(element_dto).collect())
    }

    // ============================================
    // Lookups
    // ============================================

    pub(crate) async fn require_instance(&self, id: Uuid) -> Result<ProcessInstanceRow> {
        self.store
            .get_process_instance(id)
            .await?
            .ok_or(WorkflowError::NotFound {
                what: "process instance",
                id,
            })
    }

    pub(crate) async fn require_project(&self, id: Uuid) -> Result<ProjectRow> {
        self.store
            .get_project(id)
            .await?
            .ok_or(WorkflowError::NotFound { what: "project", id })
    }

    pub(crate) async fn require_task(&self, id: Uuid) -> Result<CaseEventRow> {
        self.store
            .get_case_event(id)
            .await?
            .filter(|e| e.kind == EVENT_KIND_TASK)
            .ok_or(WorkflowError::NotFound { what: "task", id })
    }
}

// ============================================
// Row -> DTO mapping
// ============================================

pub(crate) fn project_dto(row: ProjectRow) -> Result<Project> {
    let meta: ProjectMeta = serde_json::from_value(row.meta)?;
    Ok(Project {
        id: row.id,
        title: row.title,
        description: row.description,
        sector: row.sector,
        lead_agency: row.lead_agency,
        location_text: row.location_text,
        status: ProjectStatus::from(row.status.as_str()),
        applicant_user_id: meta.applicant_user_id,
        analyst_user_id: meta.analyst_user_id,
        approver_user_id: meta.approver_user_id,
        created_at: row.created_at,
    })
}

pub(crate) fn process_dto(row: ProcessInstanceRow) -> Result<ProcessInstance> {
    let meta: ProcessMeta = serde_json::from_value(row.meta)?;
    Ok(ProcessInstance {
        id: row.id,
        project_id: row.project_id,
        status: ProcessStatus::from(row.status.as_str()),
        stage: row.stage,
        start_date: row.start_date,
        complete_date: row.complete_date,
        outcome: row.outcome,
        current_step: meta.current_step,
        workflow_status: meta.workflow_status,
        created_at: row.created_at,
    })
}

fn parse_outcome(s: &str) -> TaskOutcome {
    match s {
        "approved" => TaskOutcome::Approved,
        "changes_requested" => TaskOutcome::ChangesRequested,
        _ => TaskOutcome::Completed,
    }
}

pub(crate) fn task_dto(row: CaseEventRow) -> Result<Task> {
    let meta: TaskMeta = serde_json::from_value(row.meta)?;
    Ok(Task {
        id: row.id,
        process_instance_id: row.process_instance_id,
        name: row.name,
        description: row.description,
        tier: row.tier.unwrap_or(meta.step_number),
        status: TaskStatus::from(row.status.as_str()),
        outcome: row.outcome.as_deref().map(parse_outcome),
        assigned_user_id: row.assigned_entity,
        task_type: meta.task_type,
        assigned_role: meta.assigned_role_id.and_then(Role::from_id),
        completed_by: meta.completed_by,
        completed_at: meta.completed_at,
        revision_requested: meta.revision_requested,
        revision_comments: meta.revision_comments,
        revision_requested_by: meta.revision_requested_by,
        approval_comments: meta.approval_comments,
        created_at: row.created_at,
    })
}

pub(crate) fn notification_dto(row: CaseEventRow) -> Result<Notification> {
    let meta: NotificationMeta = serde_json::from_value(row.meta)?;
    let user_id = row.assigned_entity.ok_or_else(|| {
        WorkflowError::Validation(format!("notification {} has no recipient", row.id))
    })?;
    Ok(Notification {
        id: row.id,
        process_instance_id: row.process_instance_id,
        project_id: meta.project_id,
        user_id,
        title: row.name,
        message: row.description,
        notification_type: meta.notification_type,
        read: meta.read,
        read_at: meta.read_at,
        created_at: row.created_at,
    })
}

pub(crate) fn document_dto(row: DocumentRow) -> Result<Document> {
    let meta: DocumentMeta = serde_json::from_value(row.meta)?;
    Ok(Document {
        id: row.id,
        process_instance_id: row.process_instance_id,
        title: row.title,
        document_type: DocumentType::from(row.document_type.as_str()),
        status: row.status,
        prepared_by: row.prepared_by,
        related_document_id: row.related_document_id,
        markdown_content: meta.markdown_content,
        external_note_url: meta.external_note_url,
        created_at: row.created_at,
    })
}

pub(crate) fn element_dto(row: DecisionElementRow) -> DecisionElement {
    DecisionElement {
        id: row.id,
        step: row.step,
        title: row.title,
        description: row.description,
        responsible_role: row.responsible_role.and_then(Role::from_id),
        form_schema: row.form_schema,
        created_at: row.created_at,
    }
}

pub(crate) fn payload_dto(row: DecisionPayloadRow) -> DecisionPayload {
    DecisionPayload {
        id: row.id,
        decision_element_id: row.decision_element_id,
        step: row.step,
        process_instance_id: row.process_instance_id,
        project_id: row.project_id,
        result: DecisionResult::from(row.result.as_str()),
        result_bool: row.result_bool,
        result_notes: row.result_notes,
        evaluation_data: row.evaluation_data,
        created_at: row.created_at,
    }
}
