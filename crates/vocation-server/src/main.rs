use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vocation_core::{HttpPredictionClient, ResultStore};
use vocation_server::{AppContext, ServerConfig};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_tracing(config.log_json);

    let store = ResultStore::open(&config.db_path)
        .with_context(|| format!("failed to open result store {}", config.db_path.display()))?;
    let predictor = HttpPredictionClient::new(config.prediction_config())
        .context("failed to build prediction client")?;

    info!(
        db_path = %config.db_path.display(),
        prediction_url = %predictor.base_url(),
        "starting vocation-server"
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;

    vocation_server::serve(listener, AppContext::new(store, Arc::new(predictor))).await
}
