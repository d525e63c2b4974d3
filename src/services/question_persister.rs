//! Replaces the full question set of an assignment.
//!
//! Rows are written in one of two declared shapes. The full shape carries
//! every column the application knows about; the minimal shape only the
//! columns every environment has. A write that fails because the table does
//! not match the full shape is retried once with the minimal shape.

use std::collections::HashMap;
use std::future::Future;

use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::question::{QuestionDraft, QuestionType, StoredPosition};

pub const DEFAULT_QUESTION_TYPE: QuestionType = QuestionType::Matching;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    AssignmentId,
    QuestionType,
    Order,
    Text,
    Data,
    HintText,
    AudioInstructions,
    FeedbackCorrect,
    FeedbackIncorrect,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::AssignmentId => "assignment_id",
            Column::QuestionType => "question_type",
            Column::Order => "question_order",
            Column::Text => "question_text",
            Column::Data => "question_data",
            Column::HintText => "hint_text",
            Column::AudioInstructions => "audio_instructions",
            Column::FeedbackCorrect => "feedback_correct",
            Column::FeedbackIncorrect => "feedback_incorrect",
        }
    }
}

const MINIMAL_COLUMNS: [Column; 5] = [
    Column::Id,
    Column::AssignmentId,
    Column::QuestionType,
    Column::Order,
    Column::Text,
];

const FULL_COLUMNS: [Column; 10] = [
    Column::Id,
    Column::AssignmentId,
    Column::QuestionType,
    Column::Order,
    Column::Text,
    Column::Data,
    Column::HintText,
    Column::AudioInstructions,
    Column::FeedbackCorrect,
    Column::FeedbackIncorrect,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordShape {
    Full,
    Minimal,
}

impl RecordShape {
    /// Columns written for `row` in this shape. The minimal shape only
    /// carries `question_data` when there is something in it.
    pub fn columns_for(&self, row: &QuestionRow) -> Vec<Column> {
        match self {
            RecordShape::Full => FULL_COLUMNS.to_vec(),
            RecordShape::Minimal => {
                let mut columns = MINIMAL_COLUMNS.to_vec();
                if row.has_data() {
                    columns.push(Column::Data);
                }
                columns
            }
        }
    }

    /// Splits `rows` into batches that share a column list, keeping input order
    /// within each batch.
    pub fn batches<'r>(&self, rows: &'r [QuestionRow]) -> Vec<(Vec<Column>, Vec<&'r QuestionRow>)> {
        let mut batches: Vec<(Vec<Column>, Vec<&'r QuestionRow>)> = Vec::new();
        for row in rows {
            let columns = self.columns_for(row);
            match batches.iter_mut().find(|(cols, _)| *cols == columns) {
                Some((_, batch)) => batch.push(row),
                None => batches.push((columns, vec![row])),
            }
        }
        batches
    }
}

/// A question ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRow {
    pub id: String,
    pub assignment_id: i64,
    pub question_type: QuestionType,
    pub order: i32,
    pub text: String,
    pub data: Option<JsonValue>,
    pub hint_text: Option<String>,
    pub audio_instructions: Option<String>,
    pub feedback_correct: Option<String>,
    pub feedback_incorrect: Option<String>,
}

impl QuestionRow {
    pub fn has_data(&self) -> bool {
        match &self.data {
            None | Some(JsonValue::Null) => false,
            Some(JsonValue::Object(map)) => !map.is_empty(),
            Some(JsonValue::Array(items)) => !items.is_empty(),
            Some(JsonValue::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The table rejected the record shape: an unknown column or a
    /// not-null column the shape does not fill.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error(transparent)]
    Other(#[from] Error),
}

pub trait QuestionStore {
    type Writer: QuestionWriter + Send;

    fn stored_positions(
        &self,
        assignment_id: i64,
    ) -> impl Future<Output = Result<Vec<StoredPosition>>> + Send;

    fn open_writer(&self) -> impl Future<Output = Result<Self::Writer>> + Send;
}

/// A unit of work over the question table. Nothing is visible to readers
/// until `commit`; dropping the writer discards its changes.
pub trait QuestionWriter {
    fn delete_questions(&mut self, assignment_id: i64) -> impl Future<Output = Result<u64>> + Send;

    /// Inserts all rows or none of them.
    fn insert_questions(
        &mut self,
        rows: &[QuestionRow],
        shape: RecordShape,
    ) -> impl Future<Output = std::result::Result<(), WriteError>> + Send;

    fn commit(self) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub count: usize,
    pub shape: RecordShape,
}

#[derive(Clone)]
pub struct QuestionPersister<S> {
    store: S,
}

impl<S: QuestionStore + Sync> QuestionPersister<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn replace(&self, assignment_id: i64, drafts: &[QuestionDraft]) -> Result<SaveOutcome> {
        let types = validate_drafts(assignment_id, drafts)?;
        let existing = self.store.stored_positions(assignment_id).await?;
        let rows = plan_rows(assignment_id, drafts, &types, &existing);

        let mut writer = self.store.open_writer().await?;
        let deleted = writer.delete_questions(assignment_id).await?;
        tracing::debug!(assignment_id, deleted, "cleared existing questions");

        let shape = match writer.insert_questions(&rows, RecordShape::Full).await {
            Ok(()) => RecordShape::Full,
            Err(WriteError::SchemaMismatch(reason)) => {
                tracing::warn!(
                    assignment_id,
                    %reason,
                    "question table rejected full record shape, retrying with minimal shape"
                );
                match writer.insert_questions(&rows, RecordShape::Minimal).await {
                    Ok(()) => RecordShape::Minimal,
                    Err(WriteError::SchemaMismatch(reason)) => {
                        tracing::error!(assignment_id, %reason, "minimal question insert failed");
                        return Err(Error::PersistenceFailure(reason));
                    }
                    Err(WriteError::Other(err)) => return Err(err),
                }
            }
            Err(WriteError::Other(err)) => return Err(err),
        };

        writer.commit().await?;
        tracing::info!(assignment_id, count = rows.len(), ?shape, "saved questions");

        Ok(SaveOutcome {
            count: rows.len(),
            shape,
        })
    }
}

/// Checks drafts before anything is written and resolves each one's type.
pub fn validate_drafts(assignment_id: i64, drafts: &[QuestionDraft]) -> Result<Vec<QuestionType>> {
    if drafts.is_empty() {
        return Err(Error::BadRequest(
            "At least one question is required".to_string(),
        ));
    }

    drafts
        .iter()
        .enumerate()
        .map(|(idx, draft)| {
            let position = idx + 1;
            if draft.text.as_deref().is_some_and(|t| t.trim().is_empty()) {
                return Err(Error::BadRequest(format!(
                    "Question {} has blank text",
                    position
                )));
            }
            match normalize_type(draft.question_type.as_deref()) {
                Ok(Some(question_type)) => Ok(question_type),
                Ok(None) => {
                    tracing::warn!(
                        assignment_id,
                        position,
                        default = %DEFAULT_QUESTION_TYPE,
                        "question has no type, using default"
                    );
                    Ok(DEFAULT_QUESTION_TYPE)
                }
                Err(tag) => Err(Error::BadRequest(format!(
                    "Question {} has unknown type {}",
                    position, tag
                ))),
            }
        })
        .collect()
}

/// `Ok(None)` for a missing type, including the placeholder strings some
/// clients send; `Err` carries a tag outside the known set.
pub fn normalize_type(raw: Option<&str>) -> std::result::Result<Option<QuestionType>, String> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") || raw.eq_ignore_ascii_case("undefined") {
        return Ok(None);
    }
    QuestionType::from_tag(raw)
        .map(Some)
        .ok_or_else(|| raw.to_string())
}

/// Builds rows in input order. `order` is always the 1-based position; a
/// position that already has a stored question keeps that question's id.
pub fn plan_rows(
    assignment_id: i64,
    drafts: &[QuestionDraft],
    types: &[QuestionType],
    existing: &[StoredPosition],
) -> Vec<QuestionRow> {
    let ids_by_order: HashMap<i32, &str> = existing
        .iter()
        .map(|p| (p.order, p.id.as_str()))
        .collect();

    drafts
        .iter()
        .zip(types)
        .enumerate()
        .map(|(idx, (draft, question_type))| {
            let order = (idx + 1) as i32;
            let id = ids_by_order
                .get(&order)
                .map(|id| id.to_string())
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            QuestionRow {
                id,
                assignment_id,
                question_type: *question_type,
                order,
                text: draft.text.clone().unwrap_or_default(),
                data: draft.data.clone(),
                hint_text: draft.hint_text.clone(),
                audio_instructions: draft.audio_instructions.clone(),
                feedback_correct: draft.feedback_correct.clone(),
                feedback_incorrect: draft.feedback_incorrect.clone(),
            }
        })
        .collect()
}
