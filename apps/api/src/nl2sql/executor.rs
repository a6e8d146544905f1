//! Executor: runs a statement and turns its single scalar into a non-negative integer.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use tracing::debug;

use crate::errors::ExecutionError;
use crate::nl2sql::sql::{SqlParam, Statement};

/// The query execution service. Returns the first column of every result row.
///
/// Carried in `Engine` as `Arc<dyn QueryExecutor>` so tests can run without Postgres.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn fetch_scalars(
        &self,
        statement: &Statement,
    ) -> Result<Vec<Option<i64>>, ExecutionError>;
}

/// Postgres-backed executor over the shared connection pool. Read-only: only ever
/// issues the SELECTs produced by `sql::build`.
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn fetch_scalars(
        &self,
        statement: &Statement,
    ) -> Result<Vec<Option<i64>>, ExecutionError> {
        let mut query = sqlx::query_scalar::<Postgres, Option<i64>>(&statement.sql);
        for param in &statement.params {
            query = match param {
                SqlParam::Int(v) => query.bind(*v),
                SqlParam::Text(s) => query.bind(s.clone()),
                SqlParam::Timestamp(t) => query.bind(*t),
            };
        }
        Ok(query.fetch_all(&self.pool).await?)
    }
}

/// Runs `statement` within `timeout` and coerces the result.
///
/// Exactly one row is expected. NULL (e.g. `SUM` over no rows) and negative values
/// become 0.
pub async fn run(
    executor: &dyn QueryExecutor,
    statement: &Statement,
    timeout: Duration,
) -> Result<i64, ExecutionError> {
    let rows = tokio::time::timeout(timeout, executor.fetch_scalars(statement))
        .await
        .map_err(|_| ExecutionError::Timeout(timeout))??;

    let [scalar] = rows.as_slice() else {
        return Err(ExecutionError::UnexpectedShape(format!(
            "expected exactly one row, got {}",
            rows.len()
        )));
    };

    debug!(raw = ?scalar, "Query returned");
    Ok(coerce(*scalar))
}

fn coerce(value: Option<i64>) -> i64 {
    value.unwrap_or(0).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Vec<Option<i64>>, fn() -> ExecutionError>);

    #[async_trait]
    impl QueryExecutor for Fixed {
        async fn fetch_scalars(&self, _: &Statement) -> Result<Vec<Option<i64>>, ExecutionError> {
            match &self.0 {
                Ok(rows) => Ok(rows.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    struct Stalled;

    #[async_trait]
    impl QueryExecutor for Stalled {
        async fn fetch_scalars(&self, _: &Statement) -> Result<Vec<Option<i64>>, ExecutionError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![Some(1)])
        }
    }

    fn stmt() -> Statement {
        Statement {
            sql: "SELECT COUNT(*) FROM videos".into(),
            params: vec![],
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_scalar_passes_through() {
        let out = run(&Fixed(Ok(vec![Some(42)])), &stmt(), TIMEOUT).await;
        assert_eq!(out.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_null_becomes_zero() {
        let out = run(&Fixed(Ok(vec![None])), &stmt(), TIMEOUT).await;
        assert_eq!(out.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_negative_is_clamped() {
        let out = run(&Fixed(Ok(vec![Some(-7)])), &stmt(), TIMEOUT).await;
        assert_eq!(out.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_wrong_row_count_is_unexpected_shape() {
        let none = run(&Fixed(Ok(vec![])), &stmt(), TIMEOUT).await;
        assert!(matches!(none, Err(ExecutionError::UnexpectedShape(_))));
        let two = run(&Fixed(Ok(vec![Some(1), Some(2)])), &stmt(), TIMEOUT).await;
        assert!(matches!(two, Err(ExecutionError::UnexpectedShape(_))));
    }

    #[tokio::test]
    async fn test_database_error_is_reported() {
        let failing = Fixed(Err(|| ExecutionError::Database(sqlx::Error::PoolTimedOut)));
        let out = run(&failing, &stmt(), TIMEOUT).await;
        assert!(matches!(out, Err(ExecutionError::Database(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let out = run(&Stalled, &stmt(), Duration::from_millis(50)).await;
        assert!(matches!(out, Err(ExecutionError::Timeout(_))));
    }
}
