pub mod health;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::errors::AppError;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {uri}"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route("/api/v1/upload", post(handlers::handle_upload))
        .route("/api/v1/analyze", post(handlers::handle_analyze))
        .fallback(not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use crate::analysis::orchestrator::tests::{
        orchestrator, two_pages, FakeFetcher, FakeProvider, COMPETITOR_URL, USER_URL,
    };

    fn state(fetcher: FakeFetcher, provider: FakeProvider) -> AppState {
        AppState {
            orchestrator: Arc::new(orchestrator(fetcher, Arc::new(provider))),
            shutdown: CancellationToken::new(),
        }
    }

    fn app(fetcher: FakeFetcher, provider: FakeProvider) -> Router {
        build_router(state(fetcher, provider))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Body) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        send(app, "POST", uri, Body::from(body.to_string())).await
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(FakeFetcher::default(), FakeProvider::text("{}"));
        let (status, body) = send(app, "GET", "/health", Body::empty()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "seo-api");
    }

    #[tokio::test]
    async fn test_upload_returns_defaulted_comparison() {
        let app = app(
            two_pages(),
            FakeProvider::text("```json\n{\"missing_keywords\":[\"x\"]}\n```"),
        );

        let (status, body) = post_json(
            app,
            "/api/v1/upload",
            json!({
                "userUrl": USER_URL,
                "competitorUrl": COMPETITOR_URL,
                "model": "gemini-2.5-flash"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"]["missing_keywords"], json!(["x"]));
        assert_eq!(body["message"]["suggested_keywords"], json!([]));
        assert_eq!(body["message"]["performance"]["missing_keywords_perf"], json!([]));
        assert_eq!(body["message"]["word_count_comparison"]["url1_word_count"], 7);
        assert_eq!(body["message"]["improved_meta_title"], "");
    }

    #[tokio::test]
    async fn test_shutdown_cancels_analysis() {
        let state = state(two_pages(), FakeProvider::text("{}"));
        state.shutdown.cancel();

        let (status, body) = post_json(
            build_router(state),
            "/api/v1/upload",
            json!({ "userUrl": USER_URL, "competitorUrl": COMPETITOR_URL }),
        )
        .await;

        assert_eq!(status.as_u16(), 499);
        assert_eq!(body["error"]["code"], "CANCELLED");
    }

    #[tokio::test]
    async fn test_upload_missing_url_is_400() {
        let app = app(two_pages(), FakeProvider::text("{}"));

        let (status, body) = post_json(
            app,
            "/api/v1/upload",
            json!({ "userUrl": "", "competitorUrl": COMPETITOR_URL }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_upload_fetch_failure_is_502() {
        let app = app(FakeFetcher::default(), FakeProvider::text("{}"));

        let (status, body) = post_json(
            app,
            "/api/v1/upload",
            json!({ "userUrl": USER_URL, "competitorUrl": COMPETITOR_URL }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "CONTENT_FETCH_ERROR");
    }

    #[tokio::test]
    async fn test_analyze_without_json_returns_defaults() {
        let app = app(FakeFetcher::default(), FakeProvider::text("Sorry, no analysis today."));

        let (status, body) = post_json(
            app,
            "/api/v1/analyze",
            json!({ "prompt": "Analyze https://blog.example/post" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = &body["responseData"];
        assert_eq!(data["overall_seo_score"], 0);
        assert_eq!(data["keyword_usage_score"], 0);
        assert_eq!(data["content_quality_score"], 0);
        assert_eq!(data["feedback"], json!([]));
        assert_eq!(data["industry_tip"], json!([]));
        assert_eq!(data["target_audience"], "");
        assert!(body.get("reasoning").is_none());
    }

    #[tokio::test]
    async fn test_analyze_missing_prompt_is_400() {
        let app = app(FakeFetcher::default(), FakeProvider::text("{}"));

        let (status, body) =
            post_json(app, "/api/v1/analyze", json!({ "webSearchModel": "gemini-2.5-pro" })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "prompt is required");
    }

    #[tokio::test]
    async fn test_malformed_json_is_400_json() {
        let app = app(FakeFetcher::default(), FakeProvider::text("{}"));

        let (status, body) =
            send(app, "POST", "/api/v1/upload", Body::from("{\"userUrl\": ")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_json() {
        let app = app(FakeFetcher::default(), FakeProvider::text("{}"));

        let (status, body) = send(app, "GET", "/api/v1/nope", Body::empty()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
