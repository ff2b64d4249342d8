//! Prediction results and the client for the remote prediction service.
//!
//! The service is opaque: it receives a questionnaire and returns a score per
//! specialty plus a ranked top list. Ranks and ordering are trusted as sent;
//! they are checked, never recomputed.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::questionnaire::QuestionnaireResponse;

mod client;
mod wire;

pub use client::{HttpPredictionClient, PredictionConfig};

/// Maximum length of [`PredictionResult::top`].
pub const TOP_CAP: usize = 5;

/// One ranked specialty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialtyScore {
    pub name: String,
    /// Percentage in `[0, 100]`.
    pub score: f64,
    /// 1 is best.
    pub rank: u32,
}

/// Scores for every specialty plus the ranked shortlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub raw_scores: BTreeMap<String, f64>,
    pub top: Vec<SpecialtyScore>,
}

impl PredictionResult {
    /// Check the structural invariants: `top` within [`TOP_CAP`], ranks exactly
    /// `1..=len` in order, names present in `raw_scores`, scores in `[0, 100]`.
    pub fn check(&self) -> Result<(), String> {
        if self.top.len() > TOP_CAP {
            return Err(format!(
                "top list has {} entries, at most {} allowed",
                self.top.len(),
                TOP_CAP
            ));
        }

        for (name, score) in &self.raw_scores {
            check_score(name, *score)?;
        }

        for (i, entry) in self.top.iter().enumerate() {
            let expected = i as u32 + 1;
            if entry.rank != expected {
                return Err(format!(
                    "top entry {} ({}) has rank {}, expected {}",
                    i, entry.name, entry.rank, expected
                ));
            }
            if !self.raw_scores.contains_key(&entry.name) {
                return Err(format!("top entry {} is not a scored specialty", entry.name));
            }
            check_score(&entry.name, entry.score)?;
        }

        Ok(())
    }
}

fn check_score(name: &str, score: f64) -> Result<(), String> {
    if score.is_finite() && (0.0..=100.0).contains(&score) {
        Ok(())
    } else {
        Err(format!("score for {} is outside [0, 100]: {}", name, score))
    }
}

/// Prediction failures. None of these are retried here; the caller decides.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    /// Connection refused, DNS failure, timeout.
    #[error("prediction service unreachable: {message}")]
    Unreachable { message: String },

    /// Non-success status; body kept verbatim for diagnostics.
    #[error("prediction service rejected the request (HTTP {status}): {body}")]
    RemoteRejected { status: u16, body: String },

    #[error("malformed prediction response: {message}")]
    MalformedResponse { message: String },
}

impl From<reqwest::Error> for PredictionError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unreachable {
            message: err.to_string(),
        }
    }
}

/// The remote prediction service as seen by handlers.
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// Score a questionnaire. Every call reaches the remote service.
    async fn predict(
        &self,
        answers: &QuestionnaireResponse,
    ) -> Result<PredictionResult, PredictionError>;

    /// Names of every specialty the service can score.
    async fn specialties(&self) -> Result<Vec<String>, PredictionError>;

    /// Liveness check; never errors.
    async fn is_live(&self) -> bool;
}
