// Workflow roles
//
// Role ids are fixed by the tenant schema: Applicant=1, Analyst=2, Approver=3.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A workflow role. The integer ids match the `user_assignments.role_id`
/// column and `decision_element.responsible_role`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Applicant,
    Analyst,
    Approver,
}

impl Role {
    pub fn id(self) -> i32 {
        match self {
            Role::Applicant => 1,
            Role::Analyst => 2,
            Role::Approver => 3,
        }
    }

    pub fn from_id(id: i32) -> Option<Role> {
        match id {
            1 => Some(Role::Applicant),
            2 => Some(Role::Analyst),
            3 => Some(Role::Approver),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Applicant => write!(f, "Applicant"),
            Role::Analyst => write!(f, "Analyst"),
            Role::Approver => write!(f, "Approver"),
        }
    }
}

/// A user-to-role assignment row, exposed for seeding and admin views.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserAssignment {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub role: Role,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ids_round_trip() {
        for role in [Role::Applicant, Role::Analyst, Role::Approver] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(4), None);
    }
}
