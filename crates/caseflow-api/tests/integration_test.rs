// Integration tests for the Caseflow API
// Run against a live server (in-memory dev mode is enough):
//   cargo run -p caseflow-api
//   cargo test --test integration_test -- --ignored

use serde_json::json;
use uuid::Uuid;

use caseflow_contracts::{
    CaseInitResponse, ListResponse, Notification, Task, TaskStatus, TaskType, TransitionResponse,
    UserAssignment, WorkflowStatus,
};

const API_BASE_URL: &str = "http://localhost:9000";

#[tokio::test]
#[ignore] // Run with: cargo test --test integration_test -- --ignored
async fn test_full_case_workflow() {
    let client = reqwest::Client::new();

    let applicant = Uuid::now_v7();
    let analyst = Uuid::now_v7();
    let approver = Uuid::now_v7();

    // Step 1: assign roles
    println!("\n📝 Step 1: Assigning roles...");
    for (user, role) in [
        (applicant, "applicant"),
        (analyst, "analyst"),
        (approver, "approver"),
    ] {
        let response = client
            .post(format!("{}/v1/assignments", API_BASE_URL))
            .json(&json!({ "user_id": user, "role": role }))
            .send()
            .await
            .expect("Failed to create assignment");
        assert_eq!(response.status(), 201);
        let assignment: UserAssignment = response
            .json()
            .await
            .expect("Failed to parse assignment");
        println!("✅ Assigned {} to {}", role, assignment.user_id);
    }

    // Step 2: open a case
    println!("\n📂 Step 2: Opening case...");
    let response = client
        .post(format!("{}/v1/cases", API_BASE_URL))
        .json(&json!({ "applicant_id": applicant }))
        .send()
        .await
        .expect("Failed to create case");
    assert_eq!(response.status(), 201);
    let case: CaseInitResponse = response.json().await.expect("Failed to parse case");
    println!("✅ Opened case: {}", case.process_instance.id);
    assert_eq!(case.process_instance.current_step, 2);
    assert_eq!(case.initial_task.task_type, TaskType::Form);

    // Step 3: submit the project information form
    println!("\n📋 Step 3: Submitting project information...");
    let response = client
        .post(format!(
            "{}/v1/tasks/{}/complete",
            API_BASE_URL, case.initial_task.id
        ))
        .json(&json!({
            "user_id": applicant,
            "payload": { "title": "Highway 101", "sector": "transportation" }
        }))
        .send()
        .await
        .expect("Failed to complete form task");
    assert_eq!(response.status(), 200);
    let transition: TransitionResponse = response.json().await.expect("Failed to parse transition");
    let draft_task = transition.next_task.expect("expected a step-3 task");
    assert_eq!(draft_task.tier, 3);

    // Step 4: complete the draft document step
    println!("\n📄 Step 4: Completing draft document...");
    let response = client
        .post(format!(
            "{}/v1/tasks/{}/complete",
            API_BASE_URL, draft_task.id
        ))
        .json(&json!({ "user_id": applicant }))
        .send()
        .await
        .expect("Failed to complete draft task");
    assert_eq!(response.status(), 200);
    let transition: TransitionResponse = response.json().await.expect("Failed to parse transition");
    let review_task = transition.next_task.expect("expected a step-4 task");
    assert_eq!(review_task.tier, 4);
    assert_eq!(review_task.assigned_user_id, Some(analyst));

    // Step 5: analyst sees the task in their list
    println!("\n👤 Step 5: Checking analyst task list...");
    let response = client
        .get(format!("{}/v1/users/{}/tasks", API_BASE_URL, analyst))
        .send()
        .await
        .expect("Failed to list tasks");
    assert_eq!(response.status(), 200);
    let tasks: ListResponse<Task> = response.json().await.expect("Failed to parse tasks");
    assert!(tasks.data.iter().any(|t| t.id == review_task.id));

    // Step 6: complete the analysis, reaching the approval gate
    println!("\n🔬 Step 6: Completing analysis...");
    let response = client
        .post(format!(
            "{}/v1/tasks/{}/complete",
            API_BASE_URL, review_task.id
        ))
        .json(&json!({ "user_id": analyst }))
        .send()
        .await
        .expect("Failed to complete analysis task");
    assert_eq!(response.status(), 200);
    let transition: TransitionResponse = response.json().await.expect("Failed to parse transition");
    assert_eq!(
        transition.process_instance.workflow_status,
        WorkflowStatus::PendingApproval
    );
    let approval_task = transition.next_task.expect("expected an approval task");
    assert_eq!(approval_task.task_type, TaskType::Approval);

    // Step 7: approve
    println!("\n✅ Step 7: Approving...");
    let response = client
        .post(format!(
            "{}/v1/tasks/{}/approval",
            API_BASE_URL, approval_task.id
        ))
        .json(&json!({ "approver_id": approver, "approved": true }))
        .send()
        .await
        .expect("Failed to approve");
    assert_eq!(response.status(), 200);
    let decided: TransitionResponse = response.json().await.expect("Failed to parse decision");
    assert!(decided.next_task.is_none());
    assert_eq!(
        decided.process_instance.workflow_status,
        WorkflowStatus::Approved
    );

    // Step 8: analyst inbox has the approval notification
    println!("\n🔔 Step 8: Checking analyst notifications...");
    let response = client
        .get(format!(
            "{}/v1/users/{}/notifications",
            API_BASE_URL, analyst
        ))
        .send()
        .await
        .expect("Failed to list notifications");
    assert_eq!(response.status(), 200);
    let inbox: ListResponse<Notification> = response
        .json()
        .await
        .expect("Failed to parse notifications");
    let note = inbox
        .data
        .iter()
        .find(|n| n.title == "Case Approved")
        .expect("expected approval notification");

    let response = client
        .post(format!(
            "{}/v1/notifications/{}/read",
            API_BASE_URL, note.id
        ))
        .send()
        .await
        .expect("Failed to mark notification read");
    assert_eq!(response.status(), 200);
    let read: Notification = response.json().await.expect("Failed to parse notification");
    assert!(read.read);

    // The old form task is completed
    let response = client
        .get(format!(
            "{}/v1/tasks/{}",
            API_BASE_URL, case.initial_task.id
        ))
        .send()
        .await
        .expect("Failed to get task");
    let form_task: Task = response.json().await.expect("Failed to parse task");
    assert_eq!(form_task.status, TaskStatus::Completed);

    println!("\n🎉 Full case workflow passed");
}
