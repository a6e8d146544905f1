mod config;
mod db;
mod errors;
mod nl2sql;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::nl2sql::engine::Engine;
use crate::nl2sql::executor::PgExecutor;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting videostats v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (waits for the database to come up)
    let db = create_pool(
        &config.database_url,
        config.db_max_connections,
        config.db_connect_attempts,
    )
    .await?;

    let engine = Engine::new(
        Arc::new(PgExecutor::new(db)),
        config.query_timeout,
        config.current_year,
    );
    info!(
        "Question engine ready (query timeout: {:?}, year override: {:?})",
        config.query_timeout, config.current_year
    );

    let state = AppState {
        engine: Arc::new(engine),
    };

    let app = build_router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
