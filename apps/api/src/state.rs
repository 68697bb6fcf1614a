use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::analysis::orchestrator::Orchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Holds the fetcher and the model providers; no per-request state lives here.
    pub orchestrator: Arc<Orchestrator>,
    /// Cancelled once on shutdown; each analysis runs under a child token.
    pub shutdown: CancellationToken,
}
