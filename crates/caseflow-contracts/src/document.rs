// Document DTOs (markdown work products)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Which workflow document this is: the applicant's draft (step 3) or the
/// analyst's analysis (step 4).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Draft,
    Analysis,
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentType::Draft => write!(f, "draft"),
            DocumentType::Analysis => write!(f, "analysis"),
        }
    }
}

impl From<&str> for DocumentType {
    fn from(s: &str) -> Self {
        match s {
            "analysis" => DocumentType::Analysis,
            _ => DocumentType::Draft,
        }
    }
}

/// A markdown document attached to a process instance. The analysis document
/// links back to the draft it reviews via `related_document_id`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub id: Uuid,
    pub process_instance_id: Uuid,
    pub title: String,
    pub document_type: DocumentType,
    pub status: String,
    pub prepared_by: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_document_id: Option<Uuid>,
    pub markdown_content: String,
    /// Set when an external collaborative markdown editor is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_note_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
