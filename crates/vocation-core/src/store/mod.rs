//! ResultStore: SQLite-backed persistence of questionnaire submissions.
//!
//! Provides:
//! - Monotonic, never-reused ids from the engine's `AUTOINCREMENT`
//! - Immutable records (no update or delete path)
//! - Surfaced `Corrupt` errors when a stored document no longer parses

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::prediction::PredictionResult;
use crate::questionnaire::QuestionnaireResponse;

pub mod schema;

use schema::SUBMISSION_SCHEMA;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A persisted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: i64,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "email")]
    pub contact_email: String,
    pub answers: QuestionnaireResponse,
    pub prediction: PredictionResult,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot open result store at {path}: {message}")]
    Open { path: String, message: String },

    #[error("submission {id} not found")]
    NotFound { id: i64 },

    /// A stored document does not parse back into its typed form.
    #[error("submission {id} has unreadable {column}: {message}")]
    Corrupt {
        id: i64,
        column: &'static str,
        message: String,
    },

    #[error("failed to write submission: {message}")]
    WriteFailed { message: String },

    #[error("failed to read result store: {message}")]
    Read { message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Read {
            message: e.to_string(),
        }
    }
}

/// SQLite-backed result store. Clones share one connection.
#[derive(Clone)]
pub struct ResultStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for ResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl ResultStore {
    /// Open a file-backed store, creating the file and its parent directory.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let open_err = |message: String| StoreError::Open {
            path: path.display().to_string(),
            message,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| open_err(e.to_string()))?;
        }

        let conn = Connection::open(path).map_err(|e| open_err(e.to_string()))?;
        Self::init_connection(&conn).map_err(|e| open_err(e.to_string()))?;
        debug!(path = %path.display(), "result store opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path.to_path_buf()),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open {
            path: ":memory:".to_string(),
            message: e.to_string(),
        })?;
        Self::init_connection(&conn).map_err(|e| StoreError::Open {
            path: ":memory:".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    fn init_connection(conn: &Connection) -> rusqlite::Result<()> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // WAL for file-backed DBs; in-memory reports "memory"
        let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        conn.execute_batch(SUBMISSION_SCHEMA)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Persist a submission and return its new id.
    ///
    /// `created_at` is stamped here. An empty `display_name` is refused by the
    /// table's check constraint and reported as `WriteFailed`.
    pub fn save(
        &self,
        display_name: &str,
        contact_email: &str,
        answers: &QuestionnaireResponse,
        prediction: &PredictionResult,
    ) -> Result<i64, StoreError> {
        let write_err = |message: String| StoreError::WriteFailed { message };

        let answers_json = serde_json::to_string(answers).map_err(|e| write_err(e.to_string()))?;
        let prediction_json =
            serde_json::to_string(prediction).map_err(|e| write_err(e.to_string()))?;
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO survey_results (name, email, answers, predictions, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                display_name,
                contact_email,
                answers_json,
                prediction_json,
                created_at
            ],
        )
        .map_err(|e| {
            error!(error = %e, "submission insert failed");
            write_err(e.to_string())
        })?;

        let id = conn.last_insert_rowid();
        debug!(id, "submission persisted");
        Ok(id)
    }

    /// Load a submission by id.
    pub fn get(&self, id: i64) -> Result<SubmissionRecord, StoreError> {
        let row: Option<[SqlValue; 5]> = self
            .lock()
            .query_row(
                r#"
                SELECT name, email, answers, predictions, created_at
                FROM survey_results WHERE id = ?1
                "#,
                params![id],
                |row| {
                    Ok([
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ])
                },
            )
            .optional()?;

        let [name, email, answers, prediction, created_at] =
            row.ok_or(StoreError::NotFound { id })?;

        let display_name = text_column(id, "name", name)?;
        let contact_email = match email {
            SqlValue::Null => String::new(),
            other => text_column(id, "email", other)?,
        };
        let answers = text_column(id, "answers", answers)?;
        let prediction = text_column(id, "predictions", prediction)?;
        let created_at = text_column(id, "created_at", created_at)?;

        let answers: QuestionnaireResponse = serde_json::from_str(&answers)
            .map_err(|e| corrupt(id, "answers", e.to_string()))?;

        let prediction: PredictionResult = serde_json::from_str(&prediction)
            .map_err(|e| corrupt(id, "predictions", e.to_string()))?;
        prediction
            .check()
            .map_err(|message| corrupt(id, "predictions", message))?;

        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| corrupt(id, "created_at", e.to_string()))?
            .with_timezone(&Utc);

        Ok(SubmissionRecord {
            id,
            display_name,
            contact_email,
            answers,
            prediction,
            created_at,
        })
    }

    /// Number of persisted submissions.
    pub fn count(&self) -> Result<u64, StoreError> {
        let n: i64 = self
            .lock()
            .query_row("SELECT COUNT(*) FROM survey_results", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    /// Lightweight reachability check: the database file still exists and the
    /// connection answers a trivial query. Reads no records.
    pub fn ping(&self) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            if !path.exists() {
                return Err(StoreError::Read {
                    message: format!("database file missing: {}", path.display()),
                });
            }
        }
        let _: i64 = self.lock().query_row("SELECT 1", [], |row| row.get(0))?;
        Ok(())
    }
}

/// Stored documents are TEXT; any other storage class is a schema mismatch.
fn text_column(id: i64, column: &'static str, value: SqlValue) -> Result<String, StoreError> {
    match value {
        SqlValue::Text(s) => Ok(s),
        other => Err(corrupt(
            id,
            column,
            format!("expected TEXT, found {}", other.data_type()),
        )),
    }
}

fn corrupt(id: i64, column: &'static str, message: String) -> StoreError {
    error!(id, column, error = %message, "stored submission is corrupt");
    StoreError::Corrupt {
        id,
        column,
        message,
    }
}
