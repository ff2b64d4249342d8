//! The fixed 20-question, 1..=5 scale questionnaire.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::validation::{self, ValidationError};

/// Number of questions in the instrument.
pub const QUESTION_COUNT: usize = 20;

/// Lowest accepted answer.
pub const MIN_ANSWER: u8 = 1;

/// Highest accepted answer.
pub const MAX_ANSWER: u8 = 5;

/// Wire key for the zero-based question index (`q1`..`q20`).
pub fn question_key(index: usize) -> String {
    format!("q{}", index + 1)
}

/// A complete, range-checked set of answers.
///
/// Only constructed through validation, so every value is within
/// `MIN_ANSWER..=MAX_ANSWER`. Serializes as `{"q1": .., "q20": ..}`, which is
/// both the prediction service request body and the stored blob format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuestionnaireResponse {
    answers: [u8; QUESTION_COUNT],
}

impl QuestionnaireResponse {
    /// Build from an ordered array of answers (Q1 first).
    pub fn from_answers(answers: [u8; QUESTION_COUNT]) -> Result<Self, ValidationError> {
        let issues: Vec<_> = answers
            .iter()
            .enumerate()
            .filter(|(_, v)| !(MIN_ANSWER..=MAX_ANSWER).contains(*v))
            .map(|(i, v)| validation::FieldIssue::out_of_range(question_key(i), i128::from(*v)))
            .collect();

        if issues.is_empty() {
            Ok(Self { answers })
        } else {
            Err(ValidationError::Fields { issues })
        }
    }

    pub fn answers(&self) -> &[u8; QUESTION_COUNT] {
        &self.answers
    }

    /// Answer for a one-based question number.
    pub fn get(&self, question: usize) -> Option<u8> {
        question
            .checked_sub(1)
            .and_then(|i| self.answers.get(i))
            .copied()
    }

    pub(crate) fn from_validated(answers: [u8; QUESTION_COUNT]) -> Self {
        Self { answers }
    }
}

impl Serialize for QuestionnaireResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(QUESTION_COUNT))?;
        for (i, value) in self.answers.iter().enumerate() {
            map.serialize_entry(&question_key(i), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for QuestionnaireResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        validation::validate(&value).map_err(de::Error::custom)
    }
}
