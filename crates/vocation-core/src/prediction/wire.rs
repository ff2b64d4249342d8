//! Prediction service wire format.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::{PredictionError, PredictionResult, SpecialtyScore};

/// Body of a successful `POST /predict`.
#[derive(Debug, Deserialize)]
pub(super) struct WirePrediction {
    predictions: BTreeMap<String, f64>,
    top_5: Vec<WireSpecialty>,
}

#[derive(Debug, Deserialize)]
struct WireSpecialty {
    speciality: String,
    percentage: f64,
    rank: u32,
}

/// Body of `GET /specialties`.
#[derive(Debug, Deserialize)]
pub(super) struct WireSpecialties {
    pub(super) specialties: Vec<String>,
}

impl WirePrediction {
    pub(super) fn parse(body: &str) -> Result<PredictionResult, PredictionError> {
        let wire: WirePrediction =
            serde_json::from_str(body).map_err(|e| PredictionError::MalformedResponse {
                message: format!("failed to parse prediction body: {}", e),
            })?;
        wire.into_result()
    }

    fn into_result(self) -> Result<PredictionResult, PredictionError> {
        let result = PredictionResult {
            raw_scores: self.predictions,
            top: self
                .top_5
                .into_iter()
                .map(|s| SpecialtyScore {
                    name: s.speciality,
                    score: s.percentage,
                    rank: s.rank,
                })
                .collect(),
        };

        result
            .check()
            .map_err(|message| PredictionError::MalformedResponse { message })?;
        Ok(result)
    }
}
