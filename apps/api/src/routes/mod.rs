pub mod ask;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/ask", post(ask::handle_ask))
        .route("/api/v1/explain", post(ask::handle_explain))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::errors::ExecutionError;
    use crate::nl2sql::engine::Engine;
    use crate::nl2sql::executor::QueryExecutor;
    use crate::nl2sql::sql::Statement;

    struct Fixed(Result<i64, ()>);

    #[async_trait]
    impl QueryExecutor for Fixed {
        async fn fetch_scalars(&self, _: &Statement) -> Result<Vec<Option<i64>>, ExecutionError> {
            match self.0 {
                Ok(v) => Ok(vec![Some(v)]),
                Err(()) => Err(ExecutionError::Database(sqlx::Error::PoolClosed)),
            }
        }
    }

    fn app(reply: Result<i64, ()>) -> Router {
        let engine = Engine::new(Arc::new(Fixed(reply)), Duration::from_secs(5), Some(2025));
        build_router(AppState {
            engine: Arc::new(engine),
        })
    }

    async fn post(app: Router, uri: &str, body: &'static str) -> Response {
        app.oneshot(
            Request::post(uri)
                .header("content-type", "text/plain; charset=utf-8")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Ok(0))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&text(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "videostats");
    }

    #[tokio::test]
    async fn test_ask_returns_integer_text() {
        let response = post(app(Ok(358)), "/api/v1/ask", "Сколько всего видео есть в системе?").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "358");
    }

    #[tokio::test]
    async fn test_ask_empty_body_is_zero() {
        let response = post(app(Ok(358)), "/api/v1/ask", "   ").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "0");
    }

    #[tokio::test]
    async fn test_ask_failures_are_still_200_with_zero() {
        let unmatched = post(app(Ok(358)), "/api/v1/ask", "Привет!").await;
        assert_eq!(unmatched.status(), StatusCode::OK);
        assert_eq!(text(unmatched).await, "0");

        let failing = post(app(Err(())), "/api/v1/ask", "Сколько всего видео?").await;
        assert_eq!(failing.status(), StatusCode::OK);
        assert_eq!(text(failing).await, "0");
    }

    #[tokio::test]
    async fn test_explain_shows_template_and_params() {
        let response = post(
            app(Ok(0)),
            "/api/v1/explain",
            "Сколько видео у автора abc набрали больше 10к лайков?",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&text(response).await).unwrap();
        assert_eq!(body["query"]["template"], "count_videos_threshold");
        assert_eq!(body["scope"], "threshold");
        assert_eq!(
            body["statement"]["sql"],
            "SELECT COUNT(*) FROM videos WHERE likes_count > $1 AND creator_id = $2"
        );
        assert_eq!(body["statement"]["params"][0], 10_000);
        assert_eq!(body["statement"]["params"][1], "abc");
    }

    #[tokio::test]
    async fn test_explain_reports_no_match() {
        let response = post(app(Ok(0)), "/api/v1/explain", "Привет!").await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = serde_json::from_str(&text(response).await).unwrap();
        assert_eq!(body["error"]["code"], "NO_MATCH");
    }
}
