//! Core of the Vocation questionnaire service.
//!
//! - [`validation`]: parse-then-validate of inbound JSON into typed answers
//! - [`prediction`]: client for the remote prediction service
//! - [`store`]: SQLite persistence of submissions
//!
//! # Quick Start
//!
//! ```no_run
//! use vocation_core::{validate, HttpPredictionClient, PredictionService, ResultStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ResultStore::open(std::path::Path::new("./data/results.db"))?;
//! let client = HttpPredictionClient::from_env()?;
//!
//! let payload: serde_json::Value = serde_json::from_str(r#"{"q1": 3}"#)?;
//! let answers = validate(&payload)?;
//! let prediction = client.predict(&answers).await?;
//! let id = store.save("A", "", &answers, &prediction)?;
//! println!("saved submission {}", id);
//! # Ok(())
//! # }
//! ```

pub mod prediction;
pub mod questionnaire;
pub mod store;
pub mod validation;

pub use prediction::{
    HttpPredictionClient, PredictionConfig, PredictionError, PredictionResult, PredictionService,
    SpecialtyScore, TOP_CAP,
};
pub use questionnaire::{QuestionnaireResponse, MAX_ANSWER, MIN_ANSWER, QUESTION_COUNT};
pub use store::{ResultStore, StoreError, SubmissionRecord};
pub use validation::{
    validate, validate_submission, FieldIssue, FieldProblem, Submission, ValidationError,
};
