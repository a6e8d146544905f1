use std::sync::Arc;

use crate::nl2sql::engine::Engine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Question engine. Stateless per request; backed by `Arc<dyn QueryExecutor>`.
    pub engine: Arc<Engine>,
}
