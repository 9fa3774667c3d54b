//! HTTP route handlers for the contact service.

use axum::{
    Json, Router,
    http::{HeaderValue, Method, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use contact_common::{ContactError, ErrorBody};

use crate::state::AppState;

mod contact;
mod health;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // Any origin may post, but never with credentials
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))
        .route("/api/status", get(contact::status))

        // Protocol
        .route("/api/verify", post(contact::verify))
        .route("/api/code", post(contact::verify))
        .route("/api/response", post(contact::respond))
        .route("/api/submit", post(contact::submit))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `ContactError` as an HTTP response with a generic JSON body
#[derive(Debug)]
pub struct ApiError(pub ContactError);

impl From<ContactError> for ApiError {
    fn from(err: ContactError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorBody {
            error: self.0.public_message().to_string(),
        };
        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = self.0.retry_after_secs() {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

/// Decode a JSON request body whatever its declared content type.
///
/// A body that is not JSON at all is rejected at once. A JSON body with
/// missing or mistyped fields waits out the protocol delay first.
async fn parse_body<T: DeserializeOwned>(state: &AppState, body: &[u8]) -> Result<T, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(body).map_err(bad_request)?;
    match serde_json::from_value(value) {
        Ok(req) => Ok(req),
        Err(e) => {
            state.flow.throttle().await;
            Err(bad_request(e))
        }
    }
}

fn bad_request(err: serde_json::Error) -> ApiError {
    ContactError::BadRequest(err.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::{Question, QuestionBank};
    use crate::config::AppConfig;
    use crate::flow::{ContactFlow, Envelope};
    use crate::mail::RecordingMailer;
    use crate::ratelimit::GlobalRateLimiter;
    use crate::signing::{ExpiryCodec, ManualClock, Signer};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        clock: Arc<ManualClock>,
        mailer: Arc<RecordingMailer>,
    }

    fn test_app(challenge: bool, limit: u32) -> TestApp {
        test_app_with_delay(challenge, limit, Duration::ZERO)
    }

    fn test_app_with_delay(challenge: bool, limit: u32, delay: Duration) -> TestApp {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let mailer = Arc::new(RecordingMailer::default());
        let mut flow = ContactFlow::new(
            Signer::new("router-secret"),
            ExpiryCodec::new(clock.clone()),
            Arc::new(GlobalRateLimiter::new(limit, Duration::from_secs(60))),
        )
        .with_delay(delay)
        .with_mailer(
            mailer.clone(),
            Envelope {
                from: "form@example.com".into(),
                to: "owner@example.com".into(),
                subject: "New contact".into(),
            },
        );
        if challenge {
            let bank = QuestionBank::new(vec![Question {
                question: "Which animal says 'moo'?".into(),
                answers: vec!["Cow".into(), "Cat".into()],
                correct: 0,
            }])
            .unwrap();
            flow = flow.with_challenges(bank);
        }

        let config = AppConfig {
            request_delay_ms: delay.as_millis() as u64,
            ..Default::default()
        };
        let state = AppState::with_flow(config, flow);
        TestApp {
            router: create_router(state),
            clock,
            mailer,
        }
    }

    async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    /// POST without a content-type header, the way the web form does it
    async fn post(router: &Router, path: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let (status, bytes) = send(router, req).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn get(router: &Router, path: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        send(router, req).await
    }

    fn submission(token: &Value) -> Value {
        json!({
            "email": token["email"],
            "name": "Bob",
            "message": "Hi",
            "expiry": token["expiry"],
            "signature": token["signature"],
        })
    }

    #[tokio::test]
    async fn test_status_and_health() {
        let app = test_app(false, 10);

        let (status, body) = get(&app.router, "/api/status").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        let (status, body) = get(&app.router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["challenge"], false);
        assert_eq!(json["request_delay_ms"], 0);
    }

    #[tokio::test]
    async fn test_flow_without_challenge() {
        let app = test_app(false, 10);

        let (status, token) = post(&app.router, "/api/verify", json!({"email": "a@x.com"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(token["email"], "a@x.com");
        assert!(token["expiry"].is_string());
        assert!(token["signature"].is_string());
        assert!(token.get("question").is_none());

        let (status, body) = post(&app.router, "/api/submit", submission(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
        assert_eq!(app.mailer.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_flow_with_challenge() {
        let app = test_app(true, 10);

        let (status, challenge) =
            post(&app.router, "/api/code", json!({"email": "a@x.com"})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(challenge["question"], "Which animal says 'moo'?");
        assert_eq!(challenge["answers"].as_array().unwrap().len(), 2);

        let (status, token) = post(
            &app.router,
            "/api/response",
            json!({
                "email": "a@x.com",
                "response": "Cow",
                "expiry": challenge["expiry"],
                "signature": challenge["signature"],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(token["email"], "a@x.com");

        let (status, _) = post(&app.router, "/api/submit", submission(&token)).await;
        assert_eq!(status, StatusCode::OK);

        let sent = app.mailer.sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].html.contains("Bob"));
        assert!(sent[0].html.contains("Hi"));
    }

    #[tokio::test]
    async fn test_wrong_answer_gets_generic_401() {
        let app = test_app(true, 10);
        let (_, challenge) = post(&app.router, "/api/verify", json!({"email": "a@x.com"})).await;

        let (status, body) = post(
            &app.router,
            "/api/response",
            json!({
                "email": "a@x.com",
                "response": "Cat",
                "expiry": challenge["expiry"],
                "signature": challenge["signature"],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "unauthorized"}));
    }

    #[tokio::test]
    async fn test_expired_token_is_gone() {
        let app = test_app(false, 10);
        let (_, token) = post(&app.router, "/api/verify", json!({"email": "a@x.com"})).await;

        app.clock.advance(601);
        let (status, body) = post(&app.router, "/api/submit", submission(&token)).await;
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(body["error"], "token expired");
        assert!(app.mailer.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_bad_requests() {
        let app = test_app(false, 10);

        let req = Request::builder()
            .method("POST")
            .uri("/api/verify")
            .body(Body::from("not json"))
            .unwrap();
        let (status, body) = send(&app.router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "bad request");

        let (status, _) =
            post(&app.router, "/api/submit", json!({"email": "a@x.com", "name": "Bob"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post(&app.router, "/api/verify", json!({"email": "a@x.com:x"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rate_limited_verify() {
        let app = test_app(false, 1);
        let (status, _) = post(&app.router, "/api/verify", json!({"email": "a@x.com"})).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = post(&app.router, "/api/verify", json!({"email": "a@x.com"})).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "too many requests");
    }

    #[tokio::test]
    async fn test_rate_limited_response_sets_retry_after() {
        let app = test_app(true, 1);
        let (_, challenge) = post(&app.router, "/api/verify", json!({"email": "a@x.com"})).await;
        let answer = json!({
            "email": "a@x.com",
            "response": "Cow",
            "expiry": challenge["expiry"],
            "signature": challenge["signature"],
        });

        let (status, _) = post(&app.router, "/api/response", answer.clone()).await;
        assert_eq!(status, StatusCode::OK);

        let req = Request::builder()
            .method("POST")
            .uri("/api/response")
            .body(Body::from(serde_json::to_vec(&answer).unwrap()))
            .unwrap();
        let resp = app.router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = resp.headers()[RETRY_AFTER].to_str().unwrap().parse().unwrap();
        assert!((1..=60).contains(&retry_after));
    }

    #[tokio::test]
    async fn test_other_errors_have_no_retry_after() {
        let app = test_app(false, 10);
        let req = Request::builder()
            .method("POST")
            .uri("/api/submit")
            .body(Body::from(
                serde_json::to_vec(&json!({
                    "email": "a@x.com",
                    "name": "Bob",
                    "message": "Hi",
                    "expiry": "1700000600",
                    "signature": "ABCDEF:00",
                }))
                .unwrap(),
            ))
            .unwrap();
        let resp = app.router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().get(RETRY_AFTER).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_fields_wait_for_delay() {
        let app = test_app_with_delay(false, 10, Duration::from_secs(2));

        let start = tokio::time::Instant::now();
        let (status, _) = post(&app.router, "/api/submit", json!({"email": "a@x.com"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(start.elapsed() >= Duration::from_secs(2));

        let start = tokio::time::Instant::now();
        let req = Request::builder()
            .method("POST")
            .uri("/api/submit")
            .body(Body::from("not json"))
            .unwrap();
        let (status, _) = send(&app.router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let app = test_app(false, 10);
        let req = Request::builder()
            .uri("/api/status")
            .header("origin", "https://example.org")
            .body(Body::empty())
            .unwrap();
        let resp = app.router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert!(resp.headers().get("access-control-allow-credentials").is_none());
    }
}
