use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure while running a built statement against the query execution service.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unexpected result shape: {0}")]
    UnexpectedShape(String),
}

/// Engine-level error. Never reaches the asker: `Engine::answer` turns every variant
/// into a 0. Implements `IntoResponse` for the diagnostic endpoint.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No template matched: {0}")]
    NoMatch(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(#[from] ExecutionError),
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            EngineError::Parse(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "PARSE_ERROR",
                msg.clone(),
            ),
            EngineError::NoMatch(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "NO_MATCH", msg.clone())
            }
            EngineError::ExecutionFailed(e) => {
                tracing::error!("Execution error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXECUTION_FAILED",
                    "The query could not be executed".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
