#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use assignment_share_backend::error::{Error, Result};
use assignment_share_backend::models::assignment::{Assignment, AssignmentDetail, AssignmentLink};
use assignment_share_backend::models::question::{Question, StoredPosition};
use assignment_share_backend::services::link_resolver::LinkStore;
use assignment_share_backend::services::question_persister::{
    QuestionRow, QuestionStore, QuestionWriter, RecordShape, WriteError,
};
use assignment_share_backend::services::share_link_service::ShareLinkStore;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

#[derive(Clone, Default)]
pub struct MemoryAssignmentStore {
    rows: Arc<Mutex<Vec<AssignmentLink>>>,
    scans: Arc<AtomicUsize>,
}

impl MemoryAssignmentStore {
    pub fn with_ids(ids: &[&str]) -> Self {
        let store = Self::default();
        for id in ids {
            store.insert(id, None, None);
        }
        store
    }

    pub fn insert(&self, id: &str, link: Option<&str>, expires_at: Option<DateTime<Utc>>) {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|r| r.id != id);
        rows.push(AssignmentLink {
            id: id.to_string(),
            shareable_link: link.map(str::to_string),
            shareable_link_expires_at: expires_at,
        });
    }

    pub fn get(&self, id: &str) -> Option<AssignmentLink> {
        self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned()
    }

    /// How many full-table scans have been served.
    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

impl LinkStore for MemoryAssignmentStore {
    async fn find_link(&self, assignment_id: &str) -> Result<Option<AssignmentLink>> {
        Ok(self.get(assignment_id))
    }

    async fn list_links(&self) -> Result<Vec<AssignmentLink>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.lock().unwrap().clone())
    }
}

impl ShareLinkStore for MemoryAssignmentStore {
    async fn save_link(
        &self,
        assignment_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == assignment_id) {
            Some(row) => {
                row.shareable_link = Some(token.to_string());
                row.shareable_link_expires_at = Some(expires_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn load_detail(&self, assignment_id: &str) -> Result<Option<AssignmentDetail>> {
        let Some(link) = self.get(assignment_id) else {
            return Ok(None);
        };
        let now = Utc::now();
        Ok(Some(AssignmentDetail {
            assignment: Assignment {
                id: link.id.parse().unwrap_or_default(),
                title: format!("Assignment {}", link.id),
                description: None,
                assignment_type: Some("MATCHING".to_string()),
                status: "PUBLISHED".to_string(),
                due_date: None,
                class_id: None,
                subject_id: None,
                shareable_link: link.shareable_link,
                shareable_link_expires_at: link.shareable_link_expires_at,
                created_at: now,
                updated_at: now,
            },
            class: None,
            subject: None,
            questions: Vec::<Question>::new(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredQuestion {
    pub id: String,
    pub assignment_id: i64,
    pub question_type: String,
    pub order: i32,
    pub text: String,
    pub data: Option<JsonValue>,
    pub hint_text: Option<String>,
}

/// Question table whose schema can be made to drift.
#[derive(Default)]
pub struct QuestionTable {
    pub rows: Vec<StoredQuestion>,
    /// Columns that do not exist in this environment.
    pub missing_columns: HashSet<&'static str>,
    /// Extra not-null columns no record shape fills.
    pub required_columns: HashSet<&'static str>,
    /// Every insert fails with a non-schema error.
    pub unavailable: bool,
    pub insert_attempts: Vec<RecordShape>,
}

#[derive(Clone, Default)]
pub struct MemoryQuestionStore {
    pub table: Arc<Mutex<QuestionTable>>,
}

impl MemoryQuestionStore {
    pub fn with_table(table: QuestionTable) -> Self {
        Self {
            table: Arc::new(Mutex::new(table)),
        }
    }

    pub fn rows_for(&self, assignment_id: i64) -> Vec<StoredQuestion> {
        let mut rows: Vec<_> = self
            .table
            .lock()
            .unwrap()
            .rows
            .iter()
            .filter(|r| r.assignment_id == assignment_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.order);
        rows
    }

    pub fn attempts(&self) -> Vec<RecordShape> {
        self.table.lock().unwrap().insert_attempts.clone()
    }
}

pub struct MemoryQuestionWriter {
    table: Arc<Mutex<QuestionTable>>,
    staged: Vec<StoredQuestion>,
}

impl QuestionStore for MemoryQuestionStore {
    type Writer = MemoryQuestionWriter;

    async fn stored_positions(&self, assignment_id: i64) -> Result<Vec<StoredPosition>> {
        Ok(self
            .rows_for(assignment_id)
            .into_iter()
            .map(|r| StoredPosition {
                id: r.id,
                order: r.order,
            })
            .collect())
    }

    async fn open_writer(&self) -> Result<MemoryQuestionWriter> {
        let staged = self.table.lock().unwrap().rows.clone();
        Ok(MemoryQuestionWriter {
            table: self.table.clone(),
            staged,
        })
    }
}

impl QuestionWriter for MemoryQuestionWriter {
    async fn delete_questions(&mut self, assignment_id: i64) -> Result<u64> {
        let before = self.staged.len();
        self.staged.retain(|r| r.assignment_id != assignment_id);
        Ok((before - self.staged.len()) as u64)
    }

    async fn insert_questions(
        &mut self,
        rows: &[QuestionRow],
        shape: RecordShape,
    ) -> std::result::Result<(), WriteError> {
        let mut table = self.table.lock().unwrap();
        table.insert_attempts.push(shape);
        if table.unavailable {
            return Err(WriteError::Other(Error::Internal(
                "connection reset by peer".to_string(),
            )));
        }

        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let columns: Vec<&str> = shape.columns_for(row).iter().map(|c| c.name()).collect();
            if let Some(missing) = columns.iter().find(|c| table.missing_columns.contains(**c)) {
                return Err(WriteError::SchemaMismatch(format!(
                    "column \"{}\" of relation \"interactive_questions\" does not exist",
                    missing
                )));
            }
            if let Some(required) = table
                .required_columns
                .iter()
                .find(|c| !columns.contains(*c))
            {
                return Err(WriteError::SchemaMismatch(format!(
                    "null value in column \"{}\" violates not-null constraint",
                    required
                )));
            }
            let has_hint = columns.contains(&"hint_text");
            inserted.push(StoredQuestion {
                id: row.id.clone(),
                assignment_id: row.assignment_id,
                question_type: row.question_type.as_str().to_string(),
                order: row.order,
                text: row.text.clone(),
                data: if columns.contains(&"question_data") {
                    row.data.clone()
                } else {
                    None
                },
                hint_text: if has_hint { row.hint_text.clone() } else { None },
            });
        }
        self.staged.extend(inserted);
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.table.lock().unwrap().rows = self.staged;
        Ok(())
    }
}
