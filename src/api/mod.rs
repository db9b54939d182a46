//! REST API over a finished episode.
//!
//! Provides two GET endpoints:
//! - `/state`: parameters, episode report, and the last step
//! - `/steps`: step records with optional range filtering

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::runner::SimulationResult;
use crate::sim::kpi::EpisodeReport;
use crate::sim::params::ParameterSet;
use crate::sim::types::StepResult;

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the episode completes; all data is read-only.
pub struct AppState {
    /// Parameters the microgrid ran with.
    pub params: Arc<ParameterSet>,
    pub report: EpisodeReport,
    /// Per-step records.
    pub results: Vec<StepResult>,
}

impl From<SimulationResult> for AppState {
    fn from(run: SimulationResult) -> Self {
        Self {
            params: run.params,
            report: run.report,
            results: run.results,
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/steps", get(handlers::get_steps))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
