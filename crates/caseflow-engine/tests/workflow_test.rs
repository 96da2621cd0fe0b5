// End-to-end workflow tests over the in-memory store.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use caseflow_contracts::{
    ApprovalRequest, CompleteTaskRequest, CreateAssignmentRequest, DocumentType, ProcessStatus,
    ProjectStatus, Role, Task, TaskStatus, TaskType, WorkflowStatus,
};
use caseflow_engine::{WorkflowEngine, WorkflowError};
use caseflow_storage::{CreateDecisionElement, StorageBackend};

async fn seed_elements(store: &StorageBackend) {
    let elements = [
        (2, "Complete Project Information", Some(1)),
        (3, "Prepare Draft Document", Some(1)),
        (4, "Conduct Environmental Analysis", Some(2)),
        (5, "Approve Environmental Review", Some(3)),
    ];
    for (step, title, role) in elements {
        store
            .create_decision_element(CreateDecisionElement {
                step,
                title: title.to_string(),
                description: None,
                responsible_role: role,
                form_schema: None,
            })
            .await
            .unwrap();
    }
}

struct Fixture {
    engine: WorkflowEngine,
    applicant: Uuid,
    analyst: Uuid,
    approver: Uuid,
}

/// Seed a store where the applicant also holds the analyst and approver
/// roles, and the analyst also holds the approver role, in assignment order
/// that would make them the first candidates. Exclusion rules must skip them.
async fn fixture() -> Fixture {
    let store = Arc::new(StorageBackend::in_memory());
    seed_elements(&store).await;
    let engine = WorkflowEngine::new(store);

    let applicant = Uuid::now_v7();
    let analyst = Uuid::now_v7();
    let approver = Uuid::now_v7();
    for (user, role) in [
        (applicant, Role::Applicant),
        (applicant, Role::Analyst),
        (analyst, Role::Analyst),
        (applicant, Role::Approver),
        (analyst, Role::Approver),
        (approver, Role::Approver),
    ] {
        engine
            .create_assignment(CreateAssignmentRequest { user_id: user, role })
            .await
            .unwrap();
    }

    Fixture {
        engine,
        applicant,
        analyst,
        approver,
    }
}

/// Drive a fresh case up to the pending approval task.
async fn drive_to_approval(fx: &Fixture) -> (Uuid, Task) {
    let init = fx.engine.initialize_case(fx.applicant, None).await.unwrap();
    let pid = init.process_instance.id;
    let t2 = fx
        .engine
        .complete_task(
            init.initial_task.id,
            CompleteTaskRequest {
                user_id: fx.applicant,
                payload: Some(json!({"title": "Highway 101"})),
            },
        )
        .await
        .unwrap();
    let t3 = fx
        .engine
        .complete_task(
            t2.next_task.unwrap().id,
            CompleteTaskRequest {
                user_id: fx.applicant,
                payload: None,
            },
        )
        .await
        .unwrap();
    let t4 = fx
        .engine
        .complete_task(
            t3.next_task.unwrap().id,
            CompleteTaskRequest {
                user_id: fx.analyst,
                payload: None,
            },
        )
        .await
        .unwrap();
    (pid, t4.next_task.unwrap())
}

#[tokio::test]
async fn initialize_case_creates_all_records() {
    let fx = fixture().await;
    let init = fx.engine.initialize_case(fx.applicant, None).await.unwrap();

    assert_eq!(init.project.status, ProjectStatus::Draft);
    assert_eq!(init.project.applicant_user_id, fx.applicant);
    assert_eq!(init.process_instance.current_step, 2);
    assert_eq!(init.process_instance.workflow_status, WorkflowStatus::Draft);
    assert_eq!(init.process_instance.stage, "Step 2: Project Information");
    assert_eq!(init.initial_task.tier, 2);
    assert_eq!(init.initial_task.task_type, TaskType::Form);
    assert_eq!(init.initial_task.status, TaskStatus::Pending);
    assert_eq!(init.initial_task.assigned_user_id, Some(fx.applicant));

    // Step 1 (authentication) is recorded as a completed decision.
    let payloads = fx
        .engine
        .list_case_payloads(init.process_instance.id)
        .await
        .unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].step, 1);
    assert_eq!(payloads[0].project_id, init.project.id);
    assert_eq!(payloads[0].process_instance_id, init.process_instance.id);
}

#[tokio::test]
async fn completing_the_form_step_updates_project_and_creates_draft() {
    let fx = fixture().await;
    let init = fx.engine.initialize_case(fx.applicant, None).await.unwrap();
    let pid = init.process_instance.id;

    let transition = fx
        .engine
        .complete_task(
            init.initial_task.id,
            CompleteTaskRequest {
                user_id: fx.applicant,
                payload: Some(json!({
                    "title": "Highway 101",
                    "sector": "transportation",
                    "description": "Interchange expansion",
                })),
            },
        )
        .await
        .unwrap();

    let task3 = transition.next_task.unwrap();
    assert_eq!(task3.tier, 3);
    assert_eq!(task3.task_type, TaskType::Document);
    assert_eq!(task3.status, TaskStatus::Pending);

    let prior = fx.engine.get_task(init.initial_task.id).await.unwrap();
    assert_eq!(prior.status, TaskStatus::Completed);
    assert_eq!(prior.completed_by, Some(fx.applicant));
    assert!(prior.completed_at.is_some());

    let case = fx.engine.get_case(pid).await.unwrap();
    assert_eq!(case.project.title, "Highway 101");
    assert_eq!(case.project.sector.as_deref(), Some("transportation"));
    assert_eq!(case.project.status, ProjectStatus::Underway);

    let docs = fx.engine.list_case_documents(pid).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].document_type, DocumentType::Draft);
    assert!(docs[0].markdown_content.starts_with("# Project Analysis Document"));

    // The form submission is kept as an audit record for step 2.
    let payloads = fx.engine.list_case_payloads(pid).await.unwrap();
    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[1].step, 2);
    assert_eq!(payloads[1].evaluation_data["title"], "Highway 101");
}

#[tokio::test]
async fn role_resolution_applies_exclusions_and_persists() {
    let fx = fixture().await;
    let (pid, approval_task) = drive_to_approval(&fx).await;

    // The applicant holds the analyst role and was assigned first, but must
    // not review their own submission.
    let case = fx.engine.get_case(pid).await.unwrap();
    assert_eq!(case.project.analyst_user_id, Some(fx.analyst));
    // Applicant and analyst both hold the approver role; both are excluded.
    assert_eq!(case.project.approver_user_id, Some(fx.approver));

    assert_eq!(approval_task.tier, 5);
    assert_eq!(approval_task.task_type, TaskType::Approval);
    assert_eq!(approval_task.assigned_user_id, Some(fx.approver));
    assert_eq!(
        case.process_instance.workflow_status,
        WorkflowStatus::PendingApproval
    );

    // The analysis document reviews the draft.
    let docs = fx.engine.list_case_documents(pid).await.unwrap();
    let draft = docs
        .iter()
        .find(|d| d.document_type == DocumentType::Draft)
        .unwrap();
    let analysis = docs
        .iter()
        .find(|d| d.document_type == DocumentType::Analysis)
        .unwrap();
    assert_eq!(analysis.related_document_id, Some(draft.id));
    assert_eq!(analysis.prepared_by, fx.analyst);
}

#[tokio::test]
async fn role_resolution_exhaustion_leaves_task_unassigned() {
    let store = Arc::new(StorageBackend::in_memory());
    seed_elements(&store).await;
    let engine = WorkflowEngine::new(store);
    let applicant = Uuid::now_v7();
    // The only analyst candidate is the applicant, who is excluded.
    engine
        .create_assignment(CreateAssignmentRequest {
            user_id: applicant,
            role: Role::Analyst,
        })
        .await
        .unwrap();

    let init = engine.initialize_case(applicant, None).await.unwrap();
    let t2 = engine
        .complete_task(
            init.initial_task.id,
            CompleteTaskRequest {
                user_id: applicant,
                payload: None,
            },
        )
        .await
        .unwrap();
    let t3 = engine
        .complete_task(
            t2.next_task.unwrap().id,
            CompleteTaskRequest {
                user_id: applicant,
                payload: None,
            },
        )
        .await
        .unwrap();

    let task4 = t3.next_task.unwrap();
    assert_eq!(task4.tier, 4);
    assert_eq!(task4.assigned_user_id, None);
    assert_eq!(task4.assigned_role, Some(Role::Analyst));
}

#[tokio::test]
async fn approval_terminates_the_workflow() {
    let fx = fixture().await;
    let (pid, approval_task) = drive_to_approval(&fx).await;

    let decided = fx
        .engine
        .handle_approval(
            approval_task.id,
            ApprovalRequest {
                approver_id: fx.approver,
                approved: true,
                comments: Some("Well analyzed".to_string()),
            },
        )
        .await
        .unwrap();

    assert!(decided.next_task.is_none());
    assert_eq!(decided.process_instance.status, ProcessStatus::Completed);
    assert_eq!(decided.process_instance.stage, "Approved");
    assert_eq!(decided.process_instance.current_step, 6);
    assert_eq!(
        decided.process_instance.workflow_status,
        WorkflowStatus::Approved
    );
    assert!(decided.process_instance.complete_date.is_some());

    let case = fx.engine.get_case(pid).await.unwrap();
    assert_eq!(case.project.status, ProjectStatus::Approved);

    let inbox = fx.engine.get_user_notifications(fx.analyst).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].title, "Case Approved");
    assert!(inbox[0].message.as_deref().unwrap().contains("Highway 101"));
    assert!(!inbox[0].read);

    let read = fx.engine.mark_notification_read(inbox[0].id).await.unwrap();
    assert!(read.read);
    assert!(read.read_at.is_some());
}

#[tokio::test]
async fn request_changes_regresses_to_step_four() {
    let fx = fixture().await;
    let (pid, approval_task) = drive_to_approval(&fx).await;

    // Comments are mandatory on the request-changes path.
    let err = fx
        .engine
        .handle_approval(
            approval_task.id,
            ApprovalRequest {
                approver_id: fx.approver,
                approved: false,
                comments: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));

    let decided = fx
        .engine
        .handle_approval(
            approval_task.id,
            ApprovalRequest {
                approver_id: fx.approver,
                approved: false,
                comments: Some("fix X".to_string()),
            },
        )
        .await
        .unwrap();

    let revision = decided.next_task.unwrap();
    assert_eq!(revision.tier, 4);
    assert_eq!(revision.status, TaskStatus::Pending);
    assert!(revision.revision_requested);
    assert_eq!(revision.revision_comments.as_deref(), Some("fix X"));
    assert_eq!(revision.revision_requested_by, Some(fx.approver));
    assert_eq!(
        revision.description.as_deref(),
        Some("Revisions requested: fix X")
    );
    assert_eq!(decided.process_instance.current_step, 4);
    assert_eq!(decided.process_instance.status, ProcessStatus::Underway);

    let inbox = fx.engine.get_user_notifications(fx.analyst).await.unwrap();
    assert!(inbox.iter().any(|n| n.title == "Revisions Requested"));

    // Redoing step 4 resolves to the same approver as before.
    let redo = fx
        .engine
        .complete_task(
            revision.id,
            CompleteTaskRequest {
                user_id: fx.analyst,
                payload: None,
            },
        )
        .await
        .unwrap();
    let task5 = redo.next_task.unwrap();
    assert_eq!(task5.tier, 5);
    assert_eq!(task5.assigned_user_id, Some(fx.approver));

    let case = fx.engine.get_case(pid).await.unwrap();
    assert_eq!(case.project.approver_user_id, Some(fx.approver));
}

#[tokio::test]
async fn completed_and_approval_tasks_reject_plain_completion() {
    let fx = fixture().await;
    let init = fx.engine.initialize_case(fx.applicant, None).await.unwrap();
    fx.engine
        .complete_task(
            init.initial_task.id,
            CompleteTaskRequest {
                user_id: fx.applicant,
                payload: None,
            },
        )
        .await
        .unwrap();

    let err = fx
        .engine
        .complete_task(
            init.initial_task.id,
            CompleteTaskRequest {
                user_id: fx.applicant,
                payload: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));

    let (_, approval_task) = drive_to_approval(&fx).await;
    let err = fx
        .engine
        .complete_task(
            approval_task.id,
            CompleteTaskRequest {
                user_id: fx.approver,
                payload: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));
}

#[tokio::test]
async fn advancing_past_the_last_step_is_terminal() {
    let fx = fixture().await;
    let init = fx.engine.initialize_case(fx.applicant, None).await.unwrap();

    let transition = fx
        .engine
        .advance_to_step(init.process_instance.id, 6, fx.applicant)
        .await
        .unwrap();
    assert!(transition.next_task.is_none());
    assert_eq!(transition.process_instance.status, ProcessStatus::Completed);
    assert_eq!(transition.process_instance.stage, "Completed");
    assert_eq!(transition.process_instance.current_step, 6);
}

#[tokio::test]
async fn access_check_honors_roles_and_direct_assignment() {
    let fx = fixture().await;
    let (pid, approval_task) = drive_to_approval(&fx).await;

    // Step 4 requires the analyst role.
    let outsider = Uuid::now_v7();
    let denied = fx
        .engine
        .can_user_access_step(outsider, 4, pid)
        .await
        .unwrap();
    assert!(!denied.can_access);
    assert_eq!(denied.required_role, Some(Role::Analyst));
    assert!(denied.user_roles.is_empty());

    let allowed = fx
        .engine
        .can_user_access_step(fx.analyst, 4, pid)
        .await
        .unwrap();
    assert!(allowed.can_access);

    // The user assigned to the latest step-5 task gets in without the role.
    assert_eq!(approval_task.assigned_user_id, Some(fx.approver));
    let direct = fx
        .engine
        .can_user_access_step(fx.approver, 5, pid)
        .await
        .unwrap();
    assert!(direct.can_access);

    // A step with no configured element has no role requirement.
    let open = fx
        .engine
        .can_user_access_step(outsider, 6, pid)
        .await
        .unwrap();
    assert!(open.can_access);
    assert_eq!(open.required_role, None);
}

#[tokio::test]
async fn user_task_listing_merges_direct_and_role_tasks() {
    let fx = fixture().await;
    let (_, _approval_task) = drive_to_approval(&fx).await;

    // A second analyst sees the step-4 task through their role even though
    // it was assigned to the first analyst.
    let second_analyst = Uuid::now_v7();
    fx.engine
        .create_assignment(CreateAssignmentRequest {
            user_id: second_analyst,
            role: Role::Analyst,
        })
        .await
        .unwrap();
    let tasks = fx.engine.get_user_tasks(second_analyst).await.unwrap();
    assert!(tasks.iter().any(|t| t.tier == 4));

    // The first analyst gets the same task once, not twice.
    let tasks = fx.engine.get_user_tasks(fx.analyst).await.unwrap();
    let step4: Vec<_> = tasks.iter().filter(|t| t.tier == 4).collect();
    assert_eq!(step4.len(), 1);
    assert_eq!(step4[0].assigned_user_id, Some(fx.analyst));
}
