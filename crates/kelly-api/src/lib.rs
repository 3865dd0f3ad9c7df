//! Kelly API adapter: one HTTP call per inbound message to the
//! question-answering backend.
//!
//! This adapter never errors across its boundary. Every failure mode is
//! classified and mapped to a fallback [`ChatResponse`] whose answer is safe
//! to show an end user; raw upstream bodies are never forwarded.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::ACCEPT, StatusCode};

use kelly_core::{
    config::Config,
    domain::{ChatResponse, SessionKey, SourceEntry},
    ports::ChatBackend,
    reply::FALLBACK_ANSWER,
};

/// Failure taxonomy for one backend call. Internal: callers of [`ApiClient`]
/// only ever see the mapped fallback answer.
#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("backend URL or access key not configured")]
    Config,

    #[error("backend request timed out")]
    Timeout,

    #[error("could not connect to backend")]
    Connect,

    #[error("backend request failed: {0}")]
    Request(reqwest::Error),

    #[error("backend rejected credentials (401)")]
    Auth,

    #[error("backend returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("backend returned server error {0}")]
    Server(u16),

    #[error("backend returned a malformed 2xx body")]
    Malformed,
}

impl ApiError {
    /// The user-visible answer for this fault. Credential faults and server
    /// errors deliberately carry no upstream detail.
    fn user_answer(&self) -> String {
        match self {
            ApiError::Config | ApiError::Request(_) => FALLBACK_ANSWER.to_string(),
            ApiError::Timeout => {
                "Sorry, the response is taking too long. Please try again.".to_string()
            }
            ApiError::Connect => "Sorry, I could not connect to the main system.".to_string(),
            ApiError::Auth => {
                "Authentication error with the main system. Contact the administrator."
                    .to_string()
            }
            ApiError::Status { status, detail } => format!("Error {status}: {detail}"),
            ApiError::Server(_) => {
                "Sorry, there was an unexpected error on the main system.".to_string()
            }
            ApiError::Malformed => {
                "Sorry, the main system returned unexpected data.".to_string()
            }
        }
    }
}

/// HTTP client for `POST {base}/api/v1/chat`.
///
/// Stateless per call: no retries, no backoff, one user-visible attempt per
/// inbound message.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    access_key: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(cfg: &Config) -> Self {
        Self::with_timeouts(
            cfg.api_base_url.clone(),
            cfg.api_access_key.clone(),
            cfg.api_connect_timeout,
            cfg.api_read_timeout,
        )
    }

    pub fn with_timeouts(
        base_url: String,
        access_key: String,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .build()
            .expect("reqwest client build");
        Self {
            base_url,
            access_key,
            http,
        }
    }

    async fn try_chat(
        &self,
        message: &str,
        session: &SessionKey,
    ) -> Result<ChatResponse, ApiError> {
        if self.base_url.trim().is_empty() || self.access_key.trim().is_empty() {
            return Err(ApiError::Config);
        }

        let url = format!("{}/api/v1/chat", self.base_url.trim_end_matches('/'));
        let payload = serde_json::json!({
            "message": message,
            "session_id": session.as_str(),
        });

        tracing::debug!(url = %url, session = session.as_str(), "calling kelly api");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.access_key)
            .header(ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let body: serde_json::Value = resp.json().await.map_err(|_| ApiError::Malformed)?;
        parse_chat_body(body, session)
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn chat(&self, message: &str, session: &SessionKey) -> ChatResponse {
        match self.try_chat(message, session).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(session = session.as_str(), "kelly api call failed: {e}");
                ChatResponse::fallback(e.user_answer(), session)
            }
        }
    }
}

fn classify_send_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        return ApiError::Timeout;
    }
    if e.is_connect() {
        return ApiError::Connect;
    }
    ApiError::Request(e)
}

fn classify_status(status: StatusCode, body: &str) -> ApiError {
    // 401 first: credential faults must never leak upstream detail.
    if status == StatusCode::UNAUTHORIZED {
        return ApiError::Auth;
    }

    // Client errors with a parseable `detail` are actionable for the user.
    if status.is_client_error() {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string));
        if let Some(detail) = detail {
            return ApiError::Status {
                status: status.as_u16(),
                detail,
            };
        }
    }

    // Any 5xx, or a 4xx without usable detail.
    ApiError::Server(status.as_u16())
}

fn parse_chat_body(
    body: serde_json::Value,
    session: &SessionKey,
) -> Result<ChatResponse, ApiError> {
    let obj = body.as_object().ok_or(ApiError::Malformed)?;

    let answer = obj
        .get("answer")
        .and_then(|a| a.as_str())
        .ok_or(ApiError::Malformed)?
        .to_string();

    let sources = obj
        .get("sources")
        .and_then(|s| s.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|src| {
                    let obj = src.as_object()?;
                    Some(SourceEntry {
                        source_id: obj
                            .get("source_id")
                            .and_then(|v| v.as_str())
                            .unwrap_or("N/A")
                            .to_string(),
                        score: obj.get("score").and_then(|v| v.as_f64()),
                    })
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    // The backend should echo the session id; inject the caller's if absent so
    // results can always be correlated.
    let session_key = obj
        .get("session_id")
        .and_then(|s| s.as_str())
        .unwrap_or(session.as_str())
        .to_string();

    Ok(ChatResponse {
        answer,
        sources,
        session_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session() -> SessionKey {
        SessionKey("tg_user_1".to_string())
    }

    fn client_for(uri: &str) -> ApiClient {
        ApiClient::with_timeouts(
            uri.to_string(),
            "test-key".to_string(),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn success_parses_body_and_preserves_source_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat"))
            .and(header("authorization", "Bearer test-key"))
            .and(header("accept", "application/json"))
            .and(body_json(json!({
                "message": "hello",
                "session_id": "tg_user_1",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "Hi there.",
                "sources": [
                    {"source_id": "FILE1_q0", "score": 0.95},
                    {"source_id": "priority_context", "score": 1.0},
                    {"source_id": "manual.pdf"},
                ],
                "session_id": "tg_user_1",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = client_for(&server.uri()).chat("hello", &session()).await;

        assert_eq!(resp.answer, "Hi there.");
        assert_eq!(resp.session_key, "tg_user_1");
        assert_eq!(
            resp.sources,
            vec![
                SourceEntry {
                    source_id: "FILE1_q0".to_string(),
                    score: Some(0.95)
                },
                SourceEntry {
                    source_id: "priority_context".to_string(),
                    score: Some(1.0)
                },
                SourceEntry {
                    source_id: "manual.pdf".to_string(),
                    score: None
                },
            ]
        );
    }

    #[tokio::test]
    async fn injects_caller_session_key_when_body_lacks_it() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"answer": "Hi.", "sources": []})),
            )
            .mount(&server)
            .await;

        let resp = client_for(&server.uri()).chat("q", &session()).await;
        assert_eq!(resp.session_key, "tg_user_1");
    }

    #[tokio::test]
    async fn trims_trailing_slash_on_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let uri = format!("{}/", server.uri());
        let resp = client_for(&uri).chat("q", &session()).await;
        assert_eq!(resp.answer, "ok");
    }

    #[tokio::test]
    async fn missing_config_yields_generic_fallback() {
        let client = ApiClient::with_timeouts(
            String::new(),
            String::new(),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );

        let resp = client.chat("q", &session()).await;
        assert_eq!(resp.answer, FALLBACK_ANSWER);
        assert!(resp.sources.is_empty());
        assert_eq!(resp.session_key, "tg_user_1");
    }

    #[tokio::test]
    async fn read_timeout_maps_to_taking_too_long() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"answer": "late"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = ApiClient::with_timeouts(
            server.uri(),
            "test-key".to_string(),
            Duration::from_secs(5),
            Duration::from_millis(100),
        );

        let resp = client.chat("q", &session()).await;
        assert!(resp.answer.contains("taking too long"), "{}", resp.answer);
        assert!(resp.sources.is_empty());
        assert_eq!(resp.session_key, "tg_user_1");
    }

    #[tokio::test]
    async fn connection_refused_maps_to_could_not_connect() {
        // Bind an ephemeral port and drop the listener so nothing listens on
        // it. (A dropped wiremock `MockServer` returns its listener to a pool
        // that keeps accepting connections, so it cannot provide a dead port.)
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let resp = client_for(&uri).chat("q", &session()).await;
        assert!(
            resp.answer.contains("could not connect"),
            "{}",
            resp.answer
        );
    }

    #[tokio::test]
    async fn unauthorized_uses_fixed_message_and_never_leaks_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"detail": "token zzz-secret expired"})),
            )
            .mount(&server)
            .await;

        let resp = client_for(&server.uri()).chat("q", &session()).await;
        assert!(resp.answer.contains("Authentication error"), "{}", resp.answer);
        assert!(!resp.answer.contains("zzz-secret"));
    }

    #[tokio::test]
    async fn client_error_with_detail_surfaces_status_and_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"detail": "quota exceeded"})),
            )
            .mount(&server)
            .await;

        let resp = client_for(&server.uri()).chat("q", &session()).await;
        assert_eq!(resp.answer, "Error 403: quota exceeded");
    }

    #[tokio::test]
    async fn client_error_without_detail_is_generic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not json"))
            .mount(&server)
            .await;

        let resp = client_for(&server.uri()).chat("q", &session()).await;
        assert!(resp.answer.contains("unexpected error"), "{}", resp.answer);
    }

    #[tokio::test]
    async fn server_error_is_generic_regardless_of_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({"detail": "stack trace at line 42"})),
            )
            .mount(&server)
            .await;

        let resp = client_for(&server.uri()).chat("q", &session()).await;
        assert!(resp.answer.contains("unexpected error"), "{}", resp.answer);
        assert!(!resp.answer.contains("stack trace"));
    }

    #[tokio::test]
    async fn malformed_success_body_is_distinct_from_network_faults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["not", "an", "object"])))
            .mount(&server)
            .await;

        let resp = client_for(&server.uri()).chat("q", &session()).await;
        assert!(resp.answer.contains("unexpected data"), "{}", resp.answer);
    }

    #[tokio::test]
    async fn success_body_without_answer_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sources": []})))
            .mount(&server)
            .await;

        let resp = client_for(&server.uri()).chat("q", &session()).await;
        assert!(resp.answer.contains("unexpected data"), "{}", resp.answer);
    }

    #[tokio::test]
    async fn identical_calls_yield_identical_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "Same.",
                "sources": [{"source_id": "S", "score": 0.5}],
            })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let first = client.chat("q", &session()).await;
        let second = client.chat("q", &session()).await;
        assert_eq!(first, second);
    }
}
