use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::database::pool::parse_assignment_id;
use crate::database::question_store::load_questions;
use crate::error::Result;
use crate::models::assignment::{
    Assignment, AssignmentDetail, AssignmentLink, ClassSummary, SubjectSummary,
};
use crate::services::link_resolver::LinkStore;
use crate::services::share_link_service::ShareLinkStore;

#[derive(Clone)]
pub struct PgAssignmentStore {
    pool: PgPool,
}

impl PgAssignmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct AssignmentDetailRow {
    #[sqlx(flatten)]
    assignment: Assignment,
    class_name: Option<String>,
    class_section: Option<String>,
    subject_name: Option<String>,
    subject_code: Option<String>,
}

impl LinkStore for PgAssignmentStore {
    async fn find_link(&self, assignment_id: &str) -> Result<Option<AssignmentLink>> {
        let Some(id) = parse_assignment_id(assignment_id) else {
            return Ok(None);
        };
        let link = sqlx::query_as::<_, AssignmentLink>(
            r#"SELECT id::text AS id, shareable_link, shareable_link_expires_at
               FROM interactive_assignments
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }

    async fn list_links(&self) -> Result<Vec<AssignmentLink>> {
        let links = sqlx::query_as::<_, AssignmentLink>(
            r#"SELECT id::text AS id, shareable_link, shareable_link_expires_at
               FROM interactive_assignments
               WHERE shareable_link IS NOT NULL"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(links)
    }
}

impl ShareLinkStore for PgAssignmentStore {
    async fn save_link(
        &self,
        assignment_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let Some(id) = parse_assignment_id(assignment_id) else {
            return Ok(false);
        };
        let result = sqlx::query(
            r#"UPDATE interactive_assignments
               SET shareable_link = $1, shareable_link_expires_at = $2, updated_at = NOW()
               WHERE id = $3"#,
        )
        .bind(token)
        .bind(expires_at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn load_detail(&self, assignment_id: &str) -> Result<Option<AssignmentDetail>> {
        let Some(id) = parse_assignment_id(assignment_id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, AssignmentDetailRow>(
            r#"
            SELECT
                a.id, a.title, a.description, a.assignment_type, a.status, a.due_date,
                a.class_id, a.subject_id, a.shareable_link, a.shareable_link_expires_at,
                a.created_at, a.updated_at,
                c.name AS class_name, c.section AS class_section,
                s.name AS subject_name, s.code AS subject_code
            FROM interactive_assignments a
            LEFT JOIN classes c ON c.id = a.class_id
            LEFT JOIN subjects s ON s.id = a.subject_id
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let questions = load_questions(&self.pool, id).await?;

        let class = match (row.assignment.class_id, row.class_name) {
            (Some(id), Some(name)) => Some(ClassSummary {
                id,
                name,
                section: row.class_section,
            }),
            _ => None,
        };
        let subject = match (row.assignment.subject_id, row.subject_name) {
            (Some(id), Some(name)) => Some(SubjectSummary {
                id,
                name,
                code: row.subject_code,
            }),
            _ => None,
        };

        Ok(Some(AssignmentDetail {
            assignment: row.assignment,
            class,
            subject,
            questions,
        }))
    }
}
