// Repository layer for database operations
//
// Ids are generated app-side with uuid v7 so row ids sort by creation time;
// the role resolver and latest-task lookups depend on that ordering.

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::*;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply embedded migrations (schema + default decision elements).
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // ============================================
    // Projects
    // ============================================

    pub async fn create_project(&self, input: CreateProject) -> Result<ProjectRow> {
        let meta = serde_json::to_value(&input.meta)?;
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            INSERT INTO project (id, title, description, sector, lead_agency, location_text, status, meta)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, description, sector, lead_agency, location_text, status, meta, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.sector)
        .bind(&input.lead_agency)
        .bind(&input.location_text)
        .bind(&input.status)
        .bind(&meta)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_project(&self, id: Uuid) -> Result<Option<ProjectRow>> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, title, description, sector, lead_agency, location_text, status, meta, created_at
            FROM project
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectRow>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, title, description, sector, lead_agency, location_text, status, meta, created_at
            FROM project
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn update_project(&self, id: Uuid, input: UpdateProject) -> Result<Option<ProjectRow>> {
        let meta = input.meta.as_ref().map(serde_json::to_value).transpose()?;
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            UPDATE project
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                sector = COALESCE($4, sector),
                lead_agency = COALESCE($5, lead_agency),
                location_text = COALESCE($6, location_text),
                status = COALESCE($7, status),
                meta = COALESCE($8, meta)
            WHERE id = $1
            RETURNING id, title, description, sector, lead_agency, location_text, status, meta, created_at
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.sector)
        .bind(&input.lead_agency)
        .bind(&input.location_text)
        .bind(&input.status)
        .bind(&meta)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    // ============================================
    // Process instances
    // ============================================

    pub async fn create_process_instance(
        &self,
        input: CreateProcessInstance,
    ) -> Result<ProcessInstanceRow> {
        let meta = serde_json::to_value(&input.meta)?;
        let row = sqlx::query_as::<_, ProcessInstanceRow>(
            r#"
            INSERT INTO process_instance (id, project_id, status, stage, start_date, meta)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, project_id, status, stage, start_date, complete_date, outcome, meta, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.project_id)
        .bind(&input.status)
        .bind(&input.stage)
        .bind(input.start_date)
        .bind(&meta)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_process_instance(&self, id: Uuid) -> Result<Option<ProcessInstanceRow>> {
        let row = sqlx::query_as::<_, ProcessInstanceRow>(
            r#"
            SELECT id, project_id, status, stage, start_date, complete_date, outcome, meta, created_at
            FROM process_instance
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_process_instance_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Option<ProcessInstanceRow>> {
        let row = sqlx::query_as::<_, ProcessInstanceRow>(
            r#"
            SELECT id, project_id, status, stage, start_date, complete_date, outcome, meta, created_at
            FROM process_instance
            WHERE project_id = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_process_instances(&self) -> Result<Vec<ProcessInstanceRow>> {
        let rows = sqlx::query_as::<_, ProcessInstanceRow>(
            r#"
            SELECT id, project_id, status, stage, start_date, complete_date, outcome, meta, created_at
            FROM process_instance
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn update_process_instance(
        &self,
        id: Uuid,
        input: UpdateProcessInstance,
    ) -> Result<Option<ProcessInstanceRow>> {
        let meta = input.meta.as_ref().map(serde_json::to_value).transpose()?;
        let row = sqlx::query_as::<_, ProcessInstanceRow>(
            r#"
            UPDATE process_instance
            SET
                status = COALESCE($2, status),
                stage = COALESCE($3, stage),
                complete_date = COALESCE($4, complete_date),
                outcome = COALESCE($5, outcome),
                meta = COALESCE($6, meta)
            WHERE id = $1
            RETURNING id, project_id, status, stage, start_date, complete_date, outcome, meta, created_at
            "#,
        )
        .bind(id)
        .bind(&input.status)
        .bind(&input.stage)
        .bind(input.complete_date)
        .bind(&input.outcome)
        .bind(&meta)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Conditional update: applies only while the stored current_step still
    /// equals `expected_step`. Returns None when the row is missing or the
    /// guard misses, so concurrent completions cannot double-advance.
    pub async fn update_process_instance_guarded(
        &self,
        id: Uuid,
        expected_step: i32,
        input: UpdateProcessInstance,
    ) -> Result<Option<ProcessInstanceRow>> {
        let meta = input.meta.as_ref().map(serde_json::to_value).transpose()?;
        let row = sqlx::query_as::<_, ProcessInstanceRow>(
            r#"
            UPDATE process_instance
            SET
                status = COALESCE($3, status),
                stage = COALESCE($4, stage),
                complete_date = COALESCE($5, complete_date),
                outcome = COALESCE($6, outcome),
                meta = COALESCE($7, meta)
            WHERE id = $1 AND (meta->>'current_step')::int = $2
            RETURNING id, project_id, status, stage, start_date, complete_date, outcome, meta, created_at
            "#,
        )
        .bind(id)
        .bind(expected_step)
        .bind(&input.status)
        .bind(&input.stage)
        .bind(input.complete_date)
        .bind(&input.outcome)
        .bind(&meta)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    // ============================================
    // Decision elements
    // ============================================

    pub async fn create_decision_element(
        &self,
        input: CreateDecisionElement,
    ) -> Result<DecisionElementRow> {
        let row = sqlx::query_as::<_, DecisionElementRow>(
            r#"
            INSERT INTO decision_element (id, step, title, description, responsible_role, form_schema)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, step, title, description, responsible_role, form_schema, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.step)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.responsible_role)
        .bind(&input.form_schema)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_decision_element_by_step(
        &self,
        step: i32,
    ) -> Result<Option<DecisionElementRow>> {
        let row = sqlx::query_as::<_, DecisionElementRow>(
            r#"
            SELECT id, step, title, description, responsible_role, form_schema, created_at
            FROM decision_element
            WHERE step = $1
            "#,
        )
        .bind(step)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_decision_elements(&self) -> Result<Vec<DecisionElementRow>> {
        let rows = sqlx::query_as::<_, DecisionElementRow>(
            r#"
            SELECT id, step, title, description, responsible_role, form_schema, created_at
            FROM decision_element
            ORDER BY step ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ============================================
    // Case events
    // ============================================

    pub async fn create_case_event(&self, input: CreateCaseEvent) -> Result<CaseEventRow> {
        let row = sqlx::query_as::<_, CaseEventRow>(
            r#"
            INSERT INTO case_event (id, process_instance_id, name, description, kind, tier, status, assigned_entity, related_document_id, meta)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, process_instance_id, name, description, kind, tier, status, outcome, assigned_entity, related_document_id, meta, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.process_instance_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.kind)
        .bind(input.tier)
        .bind(&input.status)
        .bind(input.assigned_entity)
        .bind(input.related_document_id)
        .bind(&input.meta)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_case_event(&self, id: Uuid) -> Result<Option<CaseEventRow>> {
        let row = sqlx::query_as::<_, CaseEventRow>(
            r#"
            SELECT id, process_instance_id, name, description, kind, tier, status, outcome, assigned_entity, related_document_id, meta, created_at
            FROM case_event
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_case_event(
        &self,
        id: Uuid,
        input: UpdateCaseEvent,
    ) -> Result<Option<CaseEventRow>> {
        let row = sqlx::query_as::<_, CaseEventRow>(
            r#"
            UPDATE case_event
            SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                outcome = COALESCE($5, outcome),
                assigned_entity = COALESCE($6, assigned_entity),
                related_document_id = COALESCE($7, related_document_id),
                meta = COALESCE($8, meta)
            WHERE id = $1
            RETURNING id, process_instance_id, name, description, kind, tier, status, outcome, assigned_entity, related_document_id, meta, created_at
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.status)
        .bind(&input.outcome)
        .bind(input.assigned_entity)
        .bind(input.related_document_id)
        .bind(&input.meta)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Most recently created task for a step of a process instance.
    pub async fn latest_task_for_step(
        &self,
        process_instance_id: Uuid,
        step: i32,
    ) -> Result<Option<CaseEventRow>> {
        let row = sqlx::query_as::<_, CaseEventRow>(
            r#"
            SELECT id, process_instance_id, name, description, kind, tier, status, outcome, assigned_entity, related_document_id, meta, created_at
            FROM case_event
            WHERE process_instance_id = $1 AND kind = 'task' AND tier = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(process_instance_id)
        .bind(step)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_events_for_process(
        &self,
        process_instance_id: Uuid,
        kind: &str,
    ) -> Result<Vec<CaseEventRow>> {
        let rows = sqlx::query_as::<_, CaseEventRow>(
            r#"
            SELECT id, process_instance_id, name, description, kind, tier, status, outcome, assigned_entity, related_document_id, meta, created_at
            FROM case_event
            WHERE process_instance_id = $1 AND kind = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(process_instance_id)
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn list_events_for_user(
        &self,
        user_id: Uuid,
        kind: &str,
    ) -> Result<Vec<CaseEventRow>> {
        let rows = sqlx::query_as::<_, CaseEventRow>(
            r#"
            SELECT id, process_instance_id, name, description, kind, tier, status, outcome, assigned_entity, related_document_id, meta, created_at
            FROM case_event
            WHERE assigned_entity = $1 AND kind = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Tasks whose metadata assigns them to one of the given roles.
    pub async fn list_tasks_for_roles(&self, role_ids: &[i32]) -> Result<Vec<CaseEventRow>> {
        let rows = sqlx::query_as::<_, CaseEventRow>(
            r#"
            SELECT id, process_instance_id, name, description, kind, tier, status, outcome, assigned_entity, related_document_id, meta, created_at
            FROM case_event
            WHERE kind = 'task' AND (meta->>'assigned_role_id')::int = ANY($1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ============================================
    // Documents
    // ============================================

    pub async fn create_document(&self, input: CreateDocument) -> Result<DocumentRow> {
        let meta = serde_json::to_value(&input.meta)?;
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO document (id, process_instance_id, title, document_type, status, prepared_by, related_document_id, meta)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, process_instance_id, title, document_type, status, prepared_by, related_document_id, meta, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.process_instance_id)
        .bind(&input.title)
        .bind(&input.document_type)
        .bind(&input.status)
        .bind(input.prepared_by)
        .bind(input.related_document_id)
        .bind(&meta)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_document(&self, id: Uuid) -> Result<Option<DocumentRow>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, process_instance_id, title, document_type, status, prepared_by, related_document_id, meta, created_at
            FROM document
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_documents_for_process(
        &self,
        process_instance_id: Uuid,
    ) -> Result<Vec<DocumentRow>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, process_instance_id, title, document_type, status, prepared_by, related_document_id, meta, created_at
            FROM document
            WHERE process_instance_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(process_instance_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn latest_document_of_type(
        &self,
        process_instance_id: Uuid,
        document_type: &str,
    ) -> Result<Option<DocumentRow>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, process_instance_id, title, document_type, status, prepared_by, related_document_id, meta, created_at
            FROM document
            WHERE process_instance_id = $1 AND document_type = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(process_instance_id)
        .bind(document_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    // ============================================
    // Decision payloads (append-only)
    // ============================================

    pub async fn create_decision_payload(
        &self,
        input: CreateDecisionPayload,
    ) -> Result<DecisionPayloadRow> {
        let row = sqlx::query_as::<_, DecisionPayloadRow>(
            r#"
            INSERT INTO process_decision_payload (id, decision_element_id, step, process_instance_id, project_id, result, result_bool, result_notes, evaluation_data)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, decision_element_id, step, process_instance_id, project_id, result, result_bool, result_notes, evaluation_data, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.decision_element_id)
        .bind(input.step)
        .bind(input.process_instance_id)
        .bind(input.project_id)
        .bind(&input.result)
        .bind(input.result_bool)
        .bind(&input.result_notes)
        .bind(&input.evaluation_data)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_decision_payloads(
        &self,
        process_instance_id: Uuid,
    ) -> Result<Vec<DecisionPayloadRow>> {
        let rows = sqlx::query_as::<_, DecisionPayloadRow>(
            r#"
            SELECT id, decision_element_id, step, process_instance_id, project_id, result, result_bool, result_notes, evaluation_data, created_at
            FROM process_decision_payload
            WHERE process_instance_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(process_instance_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ============================================
    // User role assignments
    // ============================================

    pub async fn create_user_assignment(
        &self,
        input: CreateUserAssignment,
    ) -> Result<UserAssignmentRow> {
        let row = sqlx::query_as::<_, UserAssignmentRow>(
            r#"
            INSERT INTO user_assignments (id, user_id, role_id)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, role_id, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.user_id)
        .bind(input.role_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// User ids holding a role, in assignment order (id ascending). The
    /// role resolver picks the first eligible candidate, so this ordering
    /// must be stable.
    pub async fn list_user_ids_with_role(&self, role_id: i32) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM user_assignments
            WHERE role_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    pub async fn list_role_ids_for_user(&self, user_id: Uuid) -> Result<Vec<i32>> {
        let ids = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT role_id
            FROM user_assignments
            WHERE user_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
