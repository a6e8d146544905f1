use axum::{body::Bytes, extract::State, Json};

use crate::errors::EngineError;
use crate::nl2sql::engine::Explanation;
use crate::state::AppState;

/// POST /api/v1/ask
/// Body is the raw question. Always 200 with a single non-negative integer as text.
pub async fn handle_ask(State(state): State<AppState>, body: Bytes) -> String {
    let question = String::from_utf8_lossy(&body);
    if question.trim().is_empty() {
        return "0".to_string();
    }
    state.engine.answer(&question).await.to_string()
}

/// POST /api/v1/explain
/// Same input as `/ask`; returns the matched template and the statement without running it.
pub async fn handle_explain(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Explanation>, EngineError> {
    let question = String::from_utf8_lossy(&body);
    Ok(Json(state.engine.explain(&question)?))
}
