use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::assignment::{AssignmentDetail, ClassSummary, SubjectSummary};
use crate::models::question::{Question, QuestionDraft};
use crate::services::question_persister::{RecordShape, SaveOutcome};
use crate::services::share_link_service::IssuedLink;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct IssueShareLinkRequest {
    #[validate(range(min = 1, max = 3650))]
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareLinkResponse {
    pub token: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedLink> for ShareLinkResponse {
    fn from(link: IssuedLink) -> Self {
        Self {
            token: link.token,
            url: link.url,
            expires_at: link.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SaveQuestionsRequest {
    #[validate(length(min = 1, message = "At least one question is required"))]
    pub questions: Vec<QuestionDraft>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveQuestionsResponse {
    pub saved: bool,
    pub count: usize,
    pub shape: RecordShape,
}

impl From<SaveOutcome> for SaveQuestionsResponse {
    fn from(outcome: SaveOutcome) -> Self {
        Self {
            saved: true,
            count: outcome.count,
            shape: outcome.shape,
        }
    }
}

/// Public view of a shared assignment. The id is exposed as a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayAssignmentResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub assignment_type: Option<String>,
    pub status: String,
    pub due_date: Option<DateTime<Utc>>,
    pub link_expires_at: Option<DateTime<Utc>>,
    pub class: Option<ClassSummary>,
    pub subject: Option<SubjectSummary>,
    pub questions: Vec<Question>,
}

impl From<AssignmentDetail> for PlayAssignmentResponse {
    fn from(detail: AssignmentDetail) -> Self {
        let assignment = detail.assignment;
        Self {
            id: assignment.id.to_string(),
            title: assignment.title,
            description: assignment.description,
            assignment_type: assignment.assignment_type,
            status: assignment.status,
            due_date: assignment.due_date,
            link_expires_at: assignment.shareable_link_expires_at,
            class: detail.class,
            subject: detail.subject,
            questions: detail.questions,
        }
    }
}
