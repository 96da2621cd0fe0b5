// Caseflow API server
//
// Runs against Postgres when DATABASE_URL is set, otherwise falls back to
// the in-memory store (dev mode, data lost on restart).

mod assignments;
mod cases;
mod common;
mod documents;
mod notifications;
mod tasks;
mod users;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use caseflow_contracts::*;
use caseflow_engine::WorkflowEngine;
use caseflow_storage::{Database, StorageBackend};

/// App state shared across routes
#[derive(Clone)]
pub struct AppState {
    pub engine: WorkflowEngine,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    storage_mode: &'static str,
}

#[derive(Clone)]
struct HealthState {
    storage_mode: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage_mode: state.storage_mode,
    })
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        cases::create_case,
        cases::list_cases,
        cases::get_case,
        cases::list_case_tasks,
        cases::list_case_documents,
        cases::list_case_decisions,
        cases::advance_case,
        cases::check_step_access,
        cases::list_decision_elements,
        tasks::get_task,
        tasks::complete_task,
        tasks::decide_approval,
        documents::get_document,
        users::list_user_tasks,
        users::list_user_notifications,
        users::list_user_roles,
        notifications::mark_notification_read,
        assignments::create_assignment,
    ),
    components(
        schemas(
            Project, ProjectStatus,
            ProcessInstance, ProcessStatus, WorkflowStatus,
            Task, TaskStatus, TaskType, TaskOutcome,
            Notification,
            Document, DocumentType,
            DecisionElement, DecisionPayload, DecisionResult,
            Role, UserAssignment,
            CreateCaseRequest, CaseInitResponse, CaseDetail,
            CompleteTaskRequest, ApprovalRequest, TransitionResponse,
            CreateAssignmentRequest, AccessCheckResponse,
            cases::AdvanceStepRequest,
            ListResponse<CaseDetail>,
            ListResponse<Task>,
            ListResponse<Notification>,
            ListResponse<Document>,
            ListResponse<DecisionPayload>,
            ListResponse<DecisionElement>,
            ListResponse<Role>,
        )
    ),
    tags(
        (name = "cases", description = "Case lifecycle endpoints"),
        (name = "tasks", description = "Task completion and approval endpoints"),
        (name = "documents", description = "Document endpoints"),
        (name = "users", description = "Per-user task, notification, and role queries"),
        (name = "notifications", description = "Notification state endpoints"),
        (name = "assignments", description = "Role assignment endpoints")
    ),
    info(
        title = "Caseflow API",
        version = "0.1.0",
        description = "API for the environmental review case workflow",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caseflow_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("caseflow-api starting...");

    let (store, storage_mode) = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let db = Database::from_url(&database_url)
                .await
                .context("Failed to connect to database")?;
            db.migrate().await.context("Failed to run migrations")?;
            tracing::info!("Connected to database, migrations applied");
            (StorageBackend::postgres(db), "postgres")
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage (dev mode)");
            let store = StorageBackend::in_memory();
            seed_dev_elements(&store)
                .await
                .context("Failed to seed decision elements")?;
            (store, "in-memory")
        }
    };

    let engine = WorkflowEngine::new(Arc::new(store));
    let state = AppState { engine };
    let health_state = HealthState { storage_mode };

    // Load API prefix from environment (default: empty)
    // Example: API_PREFIX="/api" results in routes like /api/v1/cases
    let api_prefix = std::env::var("API_PREFIX").unwrap_or_default();
    if !api_prefix.is_empty() {
        tracing::info!(prefix = %api_prefix, "API prefix configured");
    }

    // CORS origins, only needed when the UI is served from another origin
    // Example: CORS_ALLOWED_ORIGINS="https://app.example.com,https://admin.example.com"
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();

    if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
    }

    let api_routes = Router::new()
        .merge(cases::routes(state.clone()))
        .merge(tasks::routes(state.clone()))
        .merge(documents::routes(state.clone()))
        .merge(users::routes(state.clone()))
        .merge(notifications::routes(state.clone()))
        .merge(assignments::routes(state));

    let mut app = Router::new().route("/health", get(health).with_state(health_state));
    app = app.merge(build_router_with_prefix(api_routes, &api_prefix));

    let app =
        app.merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                    header::CACHE_CONTROL,
                ])
                .allow_credentials(true),
        )
    } else {
        app
    };

    let app = app.layer(TraceLayer::new_for_http());

    let addr = "0.0.0.0:9000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Seed the workflow step configuration that migrations provide on
/// Postgres. Role ids: 1 = Applicant, 2 = Analyst, 3 = Approver.
async fn seed_dev_elements(store: &StorageBackend) -> Result<()> {
    let elements = [
        (
            2,
            "Complete Project Information",
            "Fill in the project information form to begin the review process",
            Some(1),
            Some(serde_json::json!({
                "fields": [
                    {"name": "title", "label": "Project Title", "type": "text", "required": true},
                    {"name": "description", "label": "Project Description", "type": "textarea", "required": true},
                    {"name": "sector", "label": "Sector", "type": "text", "required": false},
                    {"name": "lead_agency", "label": "Lead Agency", "type": "text", "required": false},
                    {"name": "location_text", "label": "Location", "type": "text", "required": false}
                ]
            })),
        ),
        (
            3,
            "Prepare Draft Document",
            "Draft the project analysis document for review",
            Some(1),
            None,
        ),
        (
            4,
            "Conduct Environmental Analysis",
            "Review the applicant draft and prepare the environmental analysis",
            Some(2),
            None,
        ),
        (
            5,
            "Approve Environmental Review",
            "Review the completed analysis and approve or request changes",
            Some(3),
            None,
        ),
    ];
    for (step, title, description, responsible_role, form_schema) in elements {
        store
            .create_decision_element(caseflow_storage::CreateDecisionElement {
                step,
                title: title.to_string(),
                description: Some(description.to_string()),
                responsible_role,
                form_schema,
            })
            .await?;
    }
    Ok(())
}

/// Build router with optional API prefix (extracted for testing)
fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_routes() -> Router {
        Router::new().route("/v1/test", get(|| async { "ok" }))
    }

    #[tokio::test]
    async fn test_api_prefix_empty() {
        let app = build_router_with_prefix(test_routes(), "");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_api_prefix_set() {
        let app = build_router_with_prefix(test_routes(), "/api");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 404);
    }
}
