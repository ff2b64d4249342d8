//! SQLite schema for persisted submissions.
//!
//! `answers` and `predictions` are self-contained JSON documents; only the
//! top-level record is relational.

/// DDL for the submissions table.
///
/// `AUTOINCREMENT` keeps ids monotonic and never reused, even after deletes
/// or rolled-back inserts.
pub const SUBMISSION_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS survey_results (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL CHECK (length(name) > 0),
    email        TEXT NOT NULL DEFAULT '',
    answers      TEXT NOT NULL,
    predictions  TEXT NOT NULL,
    created_at   TEXT NOT NULL
);
"#;
