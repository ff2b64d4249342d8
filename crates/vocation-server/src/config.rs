//! Command-line and environment configuration.

use std::path::PathBuf;

use clap::Parser;
use vocation_core::PredictionConfig;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "vocation-server",
    version,
    about = "Questionnaire submission service backed by a remote prediction model"
)]
pub struct ServerConfig {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// SQLite database file (parent directory is created if missing)
    #[arg(long, env = "DB_PATH", default_value = "./data/results.db")]
    pub db_path: PathBuf,

    /// Base URL of the prediction service
    #[arg(long, env = "ML_SERVICE_URL", default_value = "http://localhost:8000")]
    pub prediction_url: String,

    /// Timeout for prediction requests, in seconds
    #[arg(long, env = "ML_SERVICE_TIMEOUT", default_value_t = 10)]
    pub prediction_timeout_secs: u64,

    /// Timeout for the prediction service health check, in seconds
    #[arg(long, env = "ML_SERVICE_HEALTH_TIMEOUT", default_value_t = 2)]
    pub health_timeout_secs: u64,

    /// Emit logs as JSON lines
    #[arg(long, env = "VOCATION_LOG_JSON")]
    pub log_json: bool,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn prediction_config(&self) -> PredictionConfig {
        PredictionConfig::default()
            .with_base_url(&self.prediction_url)
            .with_timeout_secs(self.prediction_timeout_secs)
            .with_health_timeout_secs(self.health_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment() {
        let config = ServerConfig::try_parse_from(["vocation-server"]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_path, PathBuf::from("./data/results.db"));
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert!(!config.log_json);

        let prediction = config.prediction_config();
        assert_eq!(prediction.timeout_secs, 10);
        assert_eq!(prediction.health_timeout_secs, 2);
    }

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "vocation-server",
            "--port",
            "9000",
            "--host",
            "127.0.0.1",
            "--db-path",
            "/tmp/v.db",
            "--prediction-url",
            "http://ml:8000/",
            "--prediction-timeout-secs",
            "3",
            "--log-json",
        ])
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.prediction_config().base_url, "http://ml:8000/");
        assert_eq!(config.prediction_config().timeout_secs, 3);
        assert!(config.log_json);
    }
}
