//! Parse-then-validate for inbound payloads.
//!
//! Handlers receive untyped JSON; nothing past this module sees anything but a
//! [`QuestionnaireResponse`] or a [`Submission`]. All offending fields are
//! reported at once, never a partial success.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::questionnaire::{
    question_key, QuestionnaireResponse, MAX_ANSWER, MIN_ANSWER, QUESTION_COUNT,
};

/// What is wrong with a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum FieldProblem {
    Missing,
    NotInteger,
    OutOfRange { value: i128 },
    WrongType,
    Empty,
}

/// A field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    #[serde(flatten)]
    pub problem: FieldProblem,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, problem: FieldProblem) -> Self {
        Self {
            field: field.into(),
            problem,
        }
    }

    pub(crate) fn out_of_range(field: impl Into<String>, value: i128) -> Self {
        Self::new(field, FieldProblem::OutOfRange { value })
    }

    fn prefixed(self, prefix: &str) -> Self {
        Self {
            field: format!("{}.{}", prefix, self.field),
            problem: self.problem,
        }
    }
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.problem {
            FieldProblem::Missing => write!(f, "{} is required", self.field),
            FieldProblem::NotInteger => write!(f, "{} must be an integer", self.field),
            FieldProblem::OutOfRange { value } => write!(
                f,
                "{} must be between {} and {} (got {})",
                self.field, MIN_ANSWER, MAX_ANSWER, value
            ),
            FieldProblem::WrongType => write!(f, "{} has the wrong type", self.field),
            FieldProblem::Empty => write!(f, "{} must not be empty", self.field),
        }
    }
}

/// Client input is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("invalid fields: {}", join_issues(.issues))]
    Fields { issues: Vec<FieldIssue> },
}

impl ValidationError {
    /// Names of the offending fields, in report order.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::NotAnObject => Vec::new(),
            Self::Fields { issues } => issues.iter().map(|i| i.field.as_str()).collect(),
        }
    }

    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            Self::NotAnObject => &[],
            Self::Fields { issues } => issues,
        }
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A validated submit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub display_name: String,
    pub contact_email: String,
    pub answers: QuestionnaireResponse,
}

/// Validate a questionnaire payload (`q1`..`q20`, each an integer in 1..=5).
pub fn validate(payload: &Value) -> Result<QuestionnaireResponse, ValidationError> {
    let object = payload.as_object().ok_or(ValidationError::NotAnObject)?;
    check_answers(object).map_err(|issues| ValidationError::Fields { issues })
}

/// Validate a submit payload: `{name, email?, answers}`.
pub fn validate_submission(payload: &Value) -> Result<Submission, ValidationError> {
    let object = payload.as_object().ok_or(ValidationError::NotAnObject)?;
    let mut issues = Vec::new();

    let display_name = match object.get("name") {
        None | Some(Value::Null) => {
            issues.push(FieldIssue::new("name", FieldProblem::Missing));
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            issues.push(FieldIssue::new("name", FieldProblem::Empty));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            issues.push(FieldIssue::new("name", FieldProblem::WrongType));
            None
        }
    };

    let contact_email = match object.get("email") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            issues.push(FieldIssue::new("email", FieldProblem::WrongType));
            String::new()
        }
    };

    let answers = match object.get("answers") {
        None | Some(Value::Null) => {
            issues.push(FieldIssue::new("answers", FieldProblem::Missing));
            None
        }
        Some(Value::Object(answers)) => match check_answers(answers) {
            Ok(answers) => Some(answers),
            Err(nested) => {
                issues.extend(nested.into_iter().map(|i| i.prefixed("answers")));
                None
            }
        },
        Some(_) => {
            issues.push(FieldIssue::new("answers", FieldProblem::WrongType));
            None
        }
    };

    match (display_name, answers) {
        (Some(display_name), Some(answers)) if issues.is_empty() => Ok(Submission {
            display_name,
            contact_email,
            answers,
        }),
        _ => Err(ValidationError::Fields { issues }),
    }
}

fn check_answers(object: &Map<String, Value>) -> Result<QuestionnaireResponse, Vec<FieldIssue>> {
    let mut answers = [0u8; QUESTION_COUNT];
    let mut issues = Vec::new();

    for (i, slot) in answers.iter_mut().enumerate() {
        let key = question_key(i);
        match object.get(&key).map(as_integer) {
            None => issues.push(FieldIssue::new(key, FieldProblem::Missing)),
            Some(None) => issues.push(FieldIssue::new(key, FieldProblem::NotInteger)),
            Some(Some(v)) => match u8::try_from(v) {
                Ok(v) if (MIN_ANSWER..=MAX_ANSWER).contains(&v) => *slot = v,
                _ => issues.push(FieldIssue::out_of_range(key, v)),
            },
        }
    }

    if issues.is_empty() {
        Ok(QuestionnaireResponse::from_validated(answers))
    } else {
        Err(issues)
    }
}

/// Any JSON integer, including those above `i64::MAX`.
fn as_integer(value: &Value) -> Option<i128> {
    value
        .as_i64()
        .map(i128::from)
        .or_else(|| value.as_u64().map(i128::from))
}
