use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::question::Question;

/// The link-related projection of an assignment. `id` is the string form of
/// the numeric primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AssignmentLink {
    pub id: String,
    pub shareable_link: Option<String>,
    pub shareable_link_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub assignment_type: Option<String>,
    pub status: String,
    pub due_date: Option<DateTime<Utc>>,
    pub class_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub shareable_link: Option<String>,
    pub shareable_link_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub id: Uuid,
    pub name: String,
    pub section: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
}

/// Everything the play page needs: the assignment, its class and subject,
/// and its questions in `order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentDetail {
    pub assignment: Assignment,
    pub class: Option<ClassSummary>,
    pub subject: Option<SubjectSummary>,
    pub questions: Vec<Question>,
}
