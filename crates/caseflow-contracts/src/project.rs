// Project DTOs (the case subject)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Project status: draft at creation, underway once the workflow starts
/// moving, approved at the terminal step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Draft,
    Underway,
    Approved,
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Draft => write!(f, "draft"),
            ProjectStatus::Underway => write!(f, "underway"),
            ProjectStatus::Approved => write!(f, "approved"),
        }
    }
}

impl From<&str> for ProjectStatus {
    fn from(s: &str) -> Self {
        match s {
            "underway" => ProjectStatus::Underway,
            "approved" => ProjectStatus::Approved,
            _ => ProjectStatus::Draft,
        }
    }
}

/// The case subject. The analyst and approver are assigned lazily by role
/// resolution as the workflow reaches steps 4 and 5.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_agency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_text: Option<String>,
    pub status: ProjectStatus,
    pub applicant_user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyst_user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approver_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
