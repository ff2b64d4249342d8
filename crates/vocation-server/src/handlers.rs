//! Request handlers. Pure orchestration: validate, predict, persist.
//!
//! Store calls run on the blocking pool and are not cancelled when the client
//! disconnects; an in-flight write always completes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use vocation_core::{validate, validate_submission, PredictionResult, SubmissionRecord};

use crate::error::ApiError;
use crate::AppContext;

pub const SUBMIT_MESSAGE: &str = "results saved";

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: i64,
    pub message: &'static str,
    pub prediction: PredictionResult,
}

#[derive(Debug, Serialize)]
pub struct SpecialtiesResponse {
    pub specialties: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: bool,
    pub prediction_service: bool,
    pub timestamp: DateTime<Utc>,
}

/// `POST /api/predict`: validate, predict, return. Nothing is persisted.
pub async fn predict(
    State(ctx): State<AppContext>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(body) = payload?;
    let answers = validate(&body)?;

    let prediction = ctx.predictor.predict(&answers).await.inspect_err(|e| {
        warn!(error = %e, "prediction failed");
    })?;

    Ok(Json(prediction))
}

/// `POST /api/submit`: validate, predict, then persist.
///
/// A failed prediction aborts before the store is touched.
pub async fn submit(
    State(ctx): State<AppContext>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(body) = payload?;
    let submission = validate_submission(&body)?;

    let prediction = ctx
        .predictor
        .predict(&submission.answers)
        .await
        .inspect_err(|e| warn!(error = %e, "prediction failed, submission aborted"))?;

    let store = ctx.store.clone();
    let to_save = prediction.clone();
    let id = tokio::task::spawn_blocking(move || {
        store.save(
            &submission.display_name,
            &submission.contact_email,
            &submission.answers,
            &to_save,
        )
    })
    .await??;

    info!(id, top = ?prediction.top.first().map(|s| &s.name), "submission saved");

    Ok(Json(SubmitResponse {
        id,
        message: SUBMIT_MESSAGE,
        prediction,
    }))
}

/// `GET /api/results/{id}`.
pub async fn fetch(
    State(ctx): State<AppContext>,
    Path(raw_id): Path<String>,
) -> Result<Json<SubmissionRecord>, ApiError> {
    let id: i64 = raw_id
        .parse()
        .map_err(|_| ApiError::InvalidId(raw_id.clone()))?;

    let store = ctx.store.clone();
    let record = tokio::task::spawn_blocking(move || store.get(id)).await??;
    Ok(Json(record))
}

/// `GET /api/specialties`: the prediction service's catalogue.
pub async fn specialties(
    State(ctx): State<AppContext>,
) -> Result<Json<SpecialtiesResponse>, ApiError> {
    let specialties = ctx.predictor.specialties().await.inspect_err(|e| {
        warn!(error = %e, "specialty listing failed");
    })?;

    Ok(Json(SpecialtiesResponse {
        count: specialties.len(),
        specialties,
    }))
}

/// `GET /health`: check the store and the prediction service independently.
pub async fn health(State(ctx): State<AppContext>) -> (StatusCode, Json<HealthResponse>) {
    let store = ctx.store.clone();
    let store_ok = match tokio::task::spawn_blocking(move || store.ping()).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(error = %e, "store health check failed");
            false
        }
        Err(e) => {
            warn!(error = %e, "store health check panicked");
            false
        }
    };

    let prediction_ok = ctx.predictor.is_live().await;

    let (code, status) = match (store_ok, prediction_ok) {
        (true, true) => (StatusCode::OK, "healthy"),
        (true, false) => (StatusCode::OK, "degraded"),
        (false, _) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
    };

    (
        code,
        Json(HealthResponse {
            status,
            store: store_ok,
            prediction_service: prediction_ok,
            timestamp: Utc::now(),
        }),
    )
}
