use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

const MAX_BACKOFF: Duration = Duration::from_secs(2);

/// Creates a PostgreSQL connection pool, retrying while the database comes up.
///
/// Waits `200ms * attempt` (capped at 2s) between attempts and gives up after `attempts`.
pub async fn create_pool(database_url: &str, max_connections: u32, attempts: u32) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                info!(attempt, "PostgreSQL connection pool established");
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                let delay = backoff(attempt);
                warn!(attempt, attempts, error = %e, "PostgreSQL not ready, retrying in {delay:?}");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Could not connect to PostgreSQL after {attempts} attempts"));
            }
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    (Duration::from_millis(200) * attempt).min(MAX_BACKOFF)
}
