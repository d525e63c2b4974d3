use sqlx::{Acquire, PgPool, Postgres, QueryBuilder, Transaction};

use crate::error::{Error, Result};
use crate::models::question::{Question, StoredPosition};
use crate::services::question_persister::{
    Column, QuestionRow, QuestionStore, QuestionWriter, RecordShape, WriteError,
};

pub const UNDEFINED_COLUMN: &str = "42703";
pub const NOT_NULL_VIOLATION: &str = "23502";

#[derive(Clone)]
pub struct PgQuestionStore {
    pool: PgPool,
}

impl PgQuestionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Delete and insert share one transaction. Each insert attempt runs under
/// its own savepoint so a rejected shape can be undone without losing the
/// delete.
pub struct PgQuestionWriter {
    tx: Transaction<'static, Postgres>,
}

/// Reads an assignment's questions in order. Environments whose table has no
/// `question_data` column are read without it.
pub async fn load_questions(pool: &PgPool, assignment_id: i64) -> Result<Vec<Question>> {
    match fetch_questions(pool, assignment_id, true).await {
        Err(err) if sqlstate(&err).as_deref() == Some(UNDEFINED_COLUMN) => {
            tracing::warn!(assignment_id, error = %err, "reading questions without question_data");
            Ok(fetch_questions(pool, assignment_id, false).await?)
        }
        result => Ok(result?),
    }
}

async fn fetch_questions(
    pool: &PgPool,
    assignment_id: i64,
    with_data: bool,
) -> std::result::Result<Vec<Question>, sqlx::Error> {
    let sql = question_select(with_data);
    sqlx::query_as::<_, Question>(&sql)
        .bind(assignment_id)
        .fetch_all(pool)
        .await
}

fn question_select(with_data: bool) -> String {
    let data = if with_data {
        "question_data"
    } else {
        "NULL::jsonb AS question_data"
    };
    format!(
        "SELECT id, assignment_id, question_type, question_order, question_text, {} \
         FROM interactive_questions \
         WHERE assignment_id = $1 \
         ORDER BY question_order ASC",
        data
    )
}

impl QuestionStore for PgQuestionStore {
    type Writer = PgQuestionWriter;

    async fn stored_positions(&self, assignment_id: i64) -> Result<Vec<StoredPosition>> {
        let positions = sqlx::query_as::<_, StoredPosition>(
            r#"SELECT id, question_order
               FROM interactive_questions
               WHERE assignment_id = $1
               ORDER BY question_order ASC"#,
        )
        .bind(assignment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(positions)
    }

    async fn open_writer(&self) -> Result<PgQuestionWriter> {
        Ok(PgQuestionWriter {
            tx: self.pool.begin().await?,
        })
    }
}

impl QuestionWriter for PgQuestionWriter {
    async fn delete_questions(&mut self, assignment_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM interactive_questions WHERE assignment_id = $1")
            .bind(assignment_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_questions(
        &mut self,
        rows: &[QuestionRow],
        shape: RecordShape,
    ) -> std::result::Result<(), WriteError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut savepoint = Acquire::begin(&mut self.tx).await.map_err(Error::from)?;
        for (columns, batch) in shape.batches(rows) {
            let column_list = columns
                .iter()
                .map(|c| c.name())
                .collect::<Vec<_>>()
                .join(", ");
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new(format!("INSERT INTO interactive_questions ({}) ", column_list));
            builder.push_values(batch, |mut values, row| {
                for column in &columns {
                    match column {
                        Column::Id => values.push_bind(row.id.clone()),
                        Column::AssignmentId => values.push_bind(row.assignment_id),
                        Column::QuestionType => values.push_bind(row.question_type.as_str()),
                        Column::Order => values.push_bind(row.order),
                        Column::Text => values.push_bind(row.text.clone()),
                        Column::Data => values.push_bind(row.data.clone()),
                        Column::HintText => values.push_bind(row.hint_text.clone()),
                        Column::AudioInstructions => {
                            values.push_bind(row.audio_instructions.clone())
                        }
                        Column::FeedbackCorrect => values.push_bind(row.feedback_correct.clone()),
                        Column::FeedbackIncorrect => {
                            values.push_bind(row.feedback_incorrect.clone())
                        }
                    };
                }
            });

            if let Err(err) = builder.build().execute(&mut *savepoint).await {
                savepoint.rollback().await.map_err(Error::from)?;
                return Err(classify(err));
            }
        }
        savepoint.commit().await.map_err(Error::from)?;
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

pub fn is_schema_mismatch(sqlstate: &str) -> bool {
    sqlstate == UNDEFINED_COLUMN || sqlstate == NOT_NULL_VIOLATION
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
        _ => None,
    }
}

fn classify(err: sqlx::Error) -> WriteError {
    let mismatch = match &err {
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| is_schema_mismatch(&code))
            .then(|| db.message().to_string()),
        _ => None,
    };
    match mismatch {
        Some(message) => WriteError::SchemaMismatch(message),
        None => WriteError::Other(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_column_drift_sqlstates() {
        assert!(is_schema_mismatch("42703"));
        assert!(is_schema_mismatch("23502"));
        assert!(!is_schema_mismatch("23505"));
        assert!(!is_schema_mismatch("08006"));
    }

    #[test]
    fn non_database_errors_are_not_schema_mismatch() {
        assert!(matches!(
            classify(sqlx::Error::PoolTimedOut),
            WriteError::Other(Error::Database(_))
        ));
        assert!(matches!(
            classify(sqlx::Error::RowNotFound),
            WriteError::Other(Error::NotFound(_))
        ));
    }

    #[test]
    fn question_select_can_skip_the_data_column() {
        let full = question_select(true);
        assert!(full.contains(", question_data FROM"));

        let minimal = question_select(false);
        assert!(minimal.contains("NULL::jsonb AS question_data"));
        assert!(!minimal.contains(", question_data FROM"));
        assert!(minimal.ends_with("ORDER BY question_order ASC"));
    }

    #[test]
    fn sqlstate_is_absent_for_non_database_errors() {
        assert_eq!(sqlstate(&sqlx::Error::PoolTimedOut), None);
        assert_eq!(sqlstate(&sqlx::Error::RowNotFound), None);
    }
}
