use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use super::{AnalyzeRequest, ErrorBody, ANALYZE_PATH, CSV_REQUIRED_MESSAGE};
use crate::llm::{LlmClient, LlmError};

/// Request headers browsers may send cross-origin.
const ALLOWED_HEADERS: [&str; 8] = [
    "authorization",
    "x-client-info",
    "apikey",
    "content-type",
    "x-supabase-client-platform",
    "x-supabase-client-platform-version",
    "x-supabase-client-runtime",
    "x-supabase-client-runtime-version",
];

pub fn router(llm: Arc<LlmClient>) -> Router {
    Router::new()
        .route(ANALYZE_PATH, post(analyze))
        .route("/health", get(health_check))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::POST, Method::OPTIONS])
                .allow_headers(ALLOWED_HEADERS.map(HeaderName::from_static)),
        )
        .with_state(llm)
}

/// Serve the analysis gateway until the listener fails.
pub async fn serve(addr: SocketAddr, llm: Arc<LlmClient>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind gateway on {}", addr))?;
    info!("Analysis gateway listening on http://{}", addr);
    info!("  POST http://{}{} - analyze a CSV batch", addr, ANALYZE_PATH);
    info!("  GET  http://{}/health - Health check", addr);

    axum::serve(listener, router(llm))
        .await
        .context("Gateway server failed")?;
    Ok(())
}

async fn analyze(State(llm): State<Arc<LlmClient>>, body: Bytes) -> Response {
    let csv_content = serde_json::from_slice::<AnalyzeRequest>(&body)
        .ok()
        .map(|r| r.csv_content)
        .filter(|c| !c.trim().is_empty());
    let Some(csv_content) = csv_content else {
        warn!("analyze request without csvContent");
        return error_response(StatusCode::BAD_REQUEST, CSV_REQUIRED_MESSAGE);
    };

    info!(bytes = csv_content.len(), "analysis requested");
    match llm.suggest_fixes(&csv_content).await {
        Ok(parsed) => (StatusCode::OK, Json(parsed)).into_response(),
        Err(err) => {
            let status = match err {
                LlmError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                LlmError::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error!(status = status.as_u16(), "analyze-rdi error: {}", err);
            error_response(status, &err.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::gateway::{PAYMENT_REQUIRED_MESSAGE, RATE_LIMIT_MESSAGE};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Spawn a fake chat-completions upstream that always answers with
    /// `status` and `body`. Returns its base URL.
    async fn spawn_upstream(status: StatusCode, body: Value) -> String {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    fn gateway(base_url: String) -> Router {
        let llm = LlmClient::new(&LlmConfig {
            base_url,
            model: "test-model".to_string(),
            api_key: Some("sk-test".to_string()),
        })
        .unwrap();
        router(Arc::new(llm))
    }

    fn analyze_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(ANALYZE_PATH)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn tool_call_reply(arguments: &str) -> Value {
        json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "tool_calls": [{
                        "type": "function",
                        "function": { "name": "suggest_fixes", "arguments": arguments }
                    }]
                }
            }]
        })
    }

    #[tokio::test]
    async fn test_preflight_allows_any_origin() {
        let app = gateway("http://127.0.0.1:9/v1".to_string());
        let req = Request::builder()
            .method("OPTIONS")
            .uri(ANALYZE_PATH)
            .header("origin", "https://hunter.example")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type,apikey")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert!(resp.status().is_success());

        let headers = resp.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        let allowed = headers["access-control-allow-headers"].to_str().unwrap();
        assert!(allowed.contains("x-client-info"));
        assert!(allowed.contains("apikey"));
    }

    #[tokio::test]
    async fn test_missing_csv_content_is_bad_request() {
        let app = gateway("http://127.0.0.1:9/v1".to_string());
        for body in ["{}", r#"{"csvContent":""}"#, "not json"] {
            let resp = app.clone().oneshot(analyze_request(body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(resp).await["error"], CSV_REQUIRED_MESSAGE);
        }
    }

    #[tokio::test]
    async fn test_forwards_tool_call_results() {
        let args = r#"{"results":[{"id":"BUG-1","buggyCode":"x","correctedCode":"y","explanation":"e","bugType":"Syntax","apiContext":"c","trustScore":90}]}"#;
        let base = spawn_upstream(StatusCode::OK, tool_call_reply(args)).await;
        let app = gateway(base);

        let resp = app
            .oneshot(analyze_request(r#"{"csvContent":"ID,BuggyCode\nBUG-1,x"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["results"][0]["id"], "BUG-1");
        assert_eq!(body["results"][0]["trustScore"], 90);
    }

    #[tokio::test]
    async fn test_upstream_rate_limit_passes_through() {
        let base = spawn_upstream(StatusCode::TOO_MANY_REQUESTS, json!({})).await;
        let resp = gateway(base)
            .oneshot(analyze_request(r#"{"csvContent":"ID,BuggyCode\nA,x"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            json_body(resp).await["error"],
            RATE_LIMIT_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_upstream_payment_required_passes_through() {
        let base = spawn_upstream(StatusCode::PAYMENT_REQUIRED, json!({})).await;
        let resp = gateway(base)
            .oneshot(analyze_request(r#"{"csvContent":"ID,BuggyCode\nA,x"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(
            json_body(resp).await["error"],
            PAYMENT_REQUIRED_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_upstream_failures_are_internal_errors() {
        let base = spawn_upstream(StatusCode::BAD_GATEWAY, json!({})).await;
        let resp = gateway(base)
            .oneshot(analyze_request(r#"{"csvContent":"ID,BuggyCode\nA,x"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(resp).await["error"], "AI gateway error: 502");

        let base = spawn_upstream(
            StatusCode::OK,
            json!({ "choices": [{ "message": { "content": "no tools today" } }] }),
        )
        .await;
        let resp = gateway(base)
            .oneshot(analyze_request(r#"{"csvContent":"ID,BuggyCode\nA,x"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(resp).await["error"],
            "No tool call response from AI"
        );
    }

    #[tokio::test]
    async fn test_health() {
        let app = gateway("http://127.0.0.1:9/v1".to_string());
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
