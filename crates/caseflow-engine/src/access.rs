// Step access checks
//
// A step with no responsible role is open to everyone. Otherwise access
// requires holding the role, with one escape hatch: the user assigned to the
// latest task for that step may access it regardless of their roles.

use uuid::Uuid;

use caseflow_contracts::{AccessCheckResponse, Role};

use crate::engine::WorkflowEngine;
use crate::error::Result;

impl WorkflowEngine {
    pub async fn can_user_access_step(
        &self,
        user_id: Uuid,
        step: i32,
        process_instance_id: Uuid,
    ) -> Result<AccessCheckResponse> {
        let element = self.store().get_decision_element_by_step(step).await?;
        let required_role = element
            .and_then(|e| e.responsible_role)
            .and_then(Role::from_id);
        let user_roles = self.get_user_roles(user_id).await?;

        let Some(required) = required_role else {
            return Ok(AccessCheckResponse {
                can_access: true,
                required_role: None,
                user_roles,
            });
        };

        let mut can_access = user_roles.contains(&required);
        if !can_access {
            let latest = self
                .store()
                .latest_task_for_step(process_instance_id, step)
                .await?;
            can_access = latest.and_then(|t| t.assigned_entity) == Some(user_id);
        }

        Ok(AccessCheckResponse {
            can_access,
            required_role: Some(required),
            user_roles,
        })
    }
}
