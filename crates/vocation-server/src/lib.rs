//! HTTP front end for Vocation.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | `/api/predict` | [`handlers::predict`] |
//! | POST | `/api/submit` | [`handlers::submit`] |
//! | GET | `/api/results/{id}` | [`handlers::fetch`] |
//! | GET | `/api/specialties` | [`handlers::specialties`] |
//! | GET | `/health` | [`handlers::health`] |

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;
use vocation_core::{PredictionService, ResultStore};

pub mod config;
pub mod error;
pub mod handlers;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorBody};

/// Everything a handler needs, built once at startup.
#[derive(Clone)]
pub struct AppContext {
    pub store: ResultStore,
    pub predictor: Arc<dyn PredictionService>,
}

impl AppContext {
    pub fn new(store: ResultStore, predictor: Arc<dyn PredictionService>) -> Self {
        Self { store, predictor }
    }
}

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/api/predict", post(handlers::predict))
        .route("/api/submit", post(handlers::submit))
        .route("/api/results/{id}", get(handlers::fetch))
        .route("/api/specialties", get(handlers::specialties))
        .route("/health", get(handlers::health))
        .with_state(ctx)
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, ctx: AppContext) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
