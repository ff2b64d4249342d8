//! HTTP client for the prediction service.
//!
//! This is the only place that interprets prediction service status codes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::wire::{WirePrediction, WireSpecialties};
use super::{PredictionError, PredictionResult, PredictionService};
use crate::questionnaire::QuestionnaireResponse;

const USER_AGENT_VALUE: &str = concat!("vocation-core/", env!("CARGO_PKG_VERSION"));

/// Prediction client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Base URL of the prediction service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for `/predict` and `/specialties`, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Timeout for the `/health` check, in seconds.
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_health_timeout() -> u64 {
    2
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            health_timeout_secs: default_health_timeout(),
        }
    }
}

impl PredictionConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `ML_SERVICE_URL` | Prediction service base URL |
    /// | `ML_SERVICE_TIMEOUT` | Request timeout in seconds |
    /// | `ML_SERVICE_HEALTH_TIMEOUT` | Health check timeout in seconds |
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("ML_SERVICE_URL").unwrap_or_else(|_| default_base_url()),
            timeout_secs: std::env::var("ML_SERVICE_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            health_timeout_secs: std::env::var("ML_SERVICE_HEALTH_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_health_timeout),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_health_timeout_secs(mut self, secs: u64) -> Self {
        self.health_timeout_secs = secs;
        self
    }
}

/// Prediction service over HTTP. Holds no state besides the endpoint.
#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    client: reqwest::Client,
    base_url: String,
    health_timeout: Duration,
}

impl HttpPredictionClient {
    pub fn new(config: PredictionConfig) -> Result<Self, PredictionError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| PredictionError::Unreachable {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        })
    }

    pub fn from_env() -> Result<Self, PredictionError> {
        Self::new(PredictionConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and read the body; non-2xx becomes `RemoteRejected`.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, PredictionError> {
        let response = request.send().await?;
        let status = response.status();

        let body = response.text().await.map_err(|e| PredictionError::Unreachable {
            message: format!("failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "prediction service rejected request");
            return Err(PredictionError::RemoteRejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl PredictionService for HttpPredictionClient {
    async fn predict(
        &self,
        answers: &QuestionnaireResponse,
    ) -> Result<PredictionResult, PredictionError> {
        let url = format!("{}/predict", self.base_url);
        debug!(url = %url, "requesting prediction");

        let body = self.send(self.client.post(&url).json(answers)).await?;
        WirePrediction::parse(&body)
    }

    async fn specialties(&self) -> Result<Vec<String>, PredictionError> {
        let url = format!("{}/specialties", self.base_url);
        debug!(url = %url, "listing specialties");

        let body = self.send(self.client.get(&url)).await?;
        serde_json::from_str::<WireSpecialties>(&body)
            .map(|w| w.specialties)
            .map_err(|e| PredictionError::MalformedResponse {
                message: format!("failed to parse specialties body: {}", e),
            })
    }

    async fn is_live(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!(url = %url, error = %e, "prediction service health check failed");
                false
            }
        }
    }
}
