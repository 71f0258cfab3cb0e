use std::{collections::BTreeMap, fmt, sync::Arc, time::Duration};

use arc_swap::ArcSwap;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::time::{sleep, timeout};

#[cfg(feature = "tracing")]
use crate::request::redact_url;
use crate::{
    config::AUTHORIZATION,
    request::{build_url, merge_headers},
    transport::{HttpRequest, HttpResponse, HttpTransport, TransportError},
    ApiClientError, ApiError, ClientConfig, RequestSpec, Result,
};

const BACKOFF_BASE_MS: u64 = 1_000;
const BACKOFF_CAP_MS: u64 = 5_000;

/// Classified result of one attempt.
#[derive(Debug)]
enum AttemptOutcome {
    Success(Value),
    RetryableFailure(ApiClientError),
    TerminalFailure(ApiClientError),
}

/// Runs logical calls against the backend with a per-attempt deadline and
/// bounded, backed-off retry.
///
/// Clones share the transport and the header map, so an auth header set
/// through one clone is seen by all of them.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    config: Arc<ClientConfig>,
    headers: Arc<ArcSwap<BTreeMap<String, String>>>,
}

impl fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut headers = BTreeMap::clone(&self.headers.load());
        if let Some(value) = headers.get_mut(AUTHORIZATION) {
            *value = "<redacted>".to_owned();
        }
        f.debug_struct("RequestExecutor")
            .field("base_url", &self.config.base_url)
            .field("timeout_ms", &self.config.timeout_ms)
            .field("max_attempts", &self.config.max_attempts)
            .field("headers", &headers)
            .finish()
    }
}

impl RequestExecutor {
    /// Creates an executor after validating `config`.
    pub fn new(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        config.validate()?;
        let headers = Arc::new(ArcSwap::from_pointee(config.default_headers.clone()));
        Ok(Self {
            transport,
            config: Arc::new(config),
            headers,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Snapshot of the headers the next call will start from.
    pub fn default_headers(&self) -> BTreeMap<String, String> {
        BTreeMap::clone(&self.headers.load())
    }

    /// Sends `Authorization: Bearer <token>` on every subsequent call.
    ///
    /// Calls already in flight keep the headers they started with. Concurrent
    /// writers race; the last write wins.
    pub fn set_auth_header(&self, token: &str) {
        let authorization = normalize_bearer_authorization(token);
        self.headers.rcu(|current| {
            let mut next = BTreeMap::clone(current);
            next.insert(AUTHORIZATION.to_owned(), authorization.clone());
            next
        });

        #[cfg(feature = "tracing")]
        tracing::debug!("auth header set for API client");
    }

    pub fn clear_auth_header(&self) {
        self.headers.rcu(|current| {
            let mut next = BTreeMap::clone(current);
            next.remove(AUTHORIZATION);
            next
        });

        #[cfg(feature = "tracing")]
        tracing::debug!("auth header removed from API client");
    }

    /// Executes one logical call and returns the parsed JSON body.
    pub async fn execute(&self, spec: &RequestSpec) -> Result<Value> {
        let request = self.build_request(spec)?;
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1u32;

        loop {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                "{} {} (attempt {attempt}/{max_attempts})",
                request.method,
                redact_url(&request.url)
            );

            match self.run_attempt(&request, attempt).await {
                AttemptOutcome::Success(value) => return Ok(value),
                AttemptOutcome::TerminalFailure(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        "{} {} failed on attempt {attempt}: {err}",
                        request.method,
                        redact_url(&request.url)
                    );
                    return Err(err);
                }
                AttemptOutcome::RetryableFailure(err) => {
                    if attempt >= max_attempts {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            "{} {} failed after {attempt} attempts: {err}",
                            request.method,
                            redact_url(&request.url)
                        );
                        return Err(err);
                    }

                    let delay = backoff_delay(attempt);
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        "retrying request in {} ms (attempt {}/{max_attempts}): {err}",
                        delay.as_millis(),
                        attempt + 1
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn build_request(&self, spec: &RequestSpec) -> Result<HttpRequest> {
        let url = build_url(&self.config.base_url, spec.path(), spec.query_params());
        let headers = merge_headers(&self.headers.load(), spec.extra_headers());
        let body = spec.body_value().map(serde_json::to_string).transpose()?;
        Ok(HttpRequest {
            method: spec.method(),
            url,
            headers,
            body,
        })
    }

    async fn run_attempt(&self, request: &HttpRequest, attempt: u32) -> AttemptOutcome {
        let deadline = Duration::from_millis(self.config.timeout_ms);
        match timeout(deadline, self.transport.send(request.clone())).await {
            Err(_elapsed) => AttemptOutcome::TerminalFailure(ApiClientError::Timeout {
                timeout_ms: self.config.timeout_ms,
            }),
            Ok(Err(TransportError::Invalid(message))) => {
                AttemptOutcome::TerminalFailure(ApiClientError::InvalidRequest(message))
            }
            Ok(Err(source)) => {
                let err = ApiClientError::Network {
                    host: self.config.host(),
                    source,
                };
                // A connection that fails straight away points at
                // misconfiguration rather than load.
                if attempt == 1 {
                    AttemptOutcome::TerminalFailure(err)
                } else {
                    AttemptOutcome::RetryableFailure(err)
                }
            }
            Ok(Ok(response)) => classify_response(response),
        }
    }
}

fn classify_response(response: HttpResponse) -> AttemptOutcome {
    let HttpResponse { status, body } = response;

    if (200..300).contains(&status) {
        if status == StatusCode::NO_CONTENT.as_u16() || body.trim().is_empty() {
            return AttemptOutcome::Success(Value::Null);
        }
        return match serde_json::from_str::<Value>(&body) {
            Ok(value) => AttemptOutcome::Success(value),
            Err(err) => AttemptOutcome::TerminalFailure(ApiClientError::MalformedResponse {
                status,
                message: format!("invalid JSON body: {err}"),
            }),
        };
    }

    let error = ApiError::from_body(status, &body)
        .unwrap_or_else(|| ApiError::synthesized(status, status_reason(status)));

    if (400..500).contains(&status) {
        AttemptOutcome::TerminalFailure(ApiClientError::Client(error))
    } else {
        AttemptOutcome::RetryableFailure(ApiClientError::Server(error))
    }
}

fn status_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unknown Status")
}

/// Delay before re-issuing a request whose attempt `attempt` (1-based) failed.
pub fn backoff_delay(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    let delay_ms = BACKOFF_BASE_MS.saturating_mul(1u64 << exp);
    Duration::from_millis(delay_ms.min(BACKOFF_CAP_MS))
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::time::Instant;

    use super::{
        backoff_delay, classify_response, normalize_bearer_authorization, AttemptOutcome,
        RequestExecutor,
    };
    use crate::{
        transport::{HttpRequest, HttpResponse, HttpTransport, TransportError},
        ApiClientError, ClientConfig, RequestSpec,
    };

    enum Scripted {
        Respond(u16, &'static str),
        Fail,
        Reject,
        Hang,
    }

    #[derive(Default)]
    struct ScriptedTransport {
        script: Mutex<VecDeque<Scripted>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new(script: impl IntoIterator<Item = Scripted>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into_iter().collect()),
                seen: Mutex::default(),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().expect("seen mutex").len()
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.seen.lock().expect("seen mutex").clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().expect("seen mutex").push(request);
            let next = self.script.lock().expect("script mutex").pop_front();
            match next {
                Some(Scripted::Respond(status, body)) => Ok(HttpResponse::new(status, body)),
                Some(Scripted::Fail) | None => {
                    Err(TransportError::Connect("connection refused".to_owned()))
                }
                Some(Scripted::Reject) => Err(TransportError::Invalid(
                    "header value for 'Authorization': failed to parse header value".to_owned(),
                )),
                Some(Scripted::Hang) => std::future::pending().await,
            }
        }
    }

    fn executor(transport: Arc<ScriptedTransport>) -> RequestExecutor {
        RequestExecutor::new(ClientConfig::new("http://erp.local:8080/api"), transport)
            .expect("config must be valid")
    }

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(3), Duration::from_millis(4000));
        assert_eq!(backoff_delay(4), Duration::from_millis(5000));
        assert_eq!(backoff_delay(40), Duration::from_millis(5000));
    }

    #[test]
    fn classifies_responses() {
        assert!(matches!(
            classify_response(HttpResponse::new(200, r#"{"ok":true}"#)),
            AttemptOutcome::Success(_)
        ));
        assert!(matches!(
            classify_response(HttpResponse::new(204, "")),
            AttemptOutcome::Success(serde_json::Value::Null)
        ));
        assert!(matches!(
            classify_response(HttpResponse::new(200, "<html>")),
            AttemptOutcome::TerminalFailure(ApiClientError::MalformedResponse { status: 200, .. })
        ));
        assert!(matches!(
            classify_response(HttpResponse::new(404, "")),
            AttemptOutcome::TerminalFailure(ApiClientError::Client(_))
        ));
        assert!(matches!(
            classify_response(HttpResponse::new(429, "")),
            AttemptOutcome::TerminalFailure(ApiClientError::Client(_))
        ));
        assert!(matches!(
            classify_response(HttpResponse::new(500, "")),
            AttemptOutcome::RetryableFailure(ApiClientError::Server(_))
        ));
        assert!(matches!(
            classify_response(HttpResponse::new(503, "")),
            AttemptOutcome::RetryableFailure(ApiClientError::Server(_))
        ));
    }

    #[test]
    fn unparseable_error_body_is_synthesized_from_status_line() {
        let AttemptOutcome::RetryableFailure(ApiClientError::Server(error)) =
            classify_response(HttpResponse::new(503, "upstream down"))
        else {
            panic!("expected retryable server error");
        };
        assert_eq!(error.message, "HTTP 503: Service Unavailable");
        assert_eq!(error.status, 503);
    }

    #[test]
    fn normalize_bearer_adds_prefix_when_missing() {
        assert_eq!(normalize_bearer_authorization("abc123"), "Bearer abc123");
        assert_eq!(normalize_bearer_authorization("bEaReR abc123"), "bEaReR abc123");
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_makes_one_call() {
        let transport = ScriptedTransport::new([Scripted::Respond(200, r#"[1,2,3]"#)]);
        let exec = executor(transport.clone());

        let value = exec
            .execute(&RequestSpec::get("/sales-orders"))
            .await
            .expect("call must succeed");

        assert_eq!(value, json!([1, 2, 3]));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_server_errors_with_backoff_until_success() {
        let transport = ScriptedTransport::new([
            Scripted::Respond(503, ""),
            Scripted::Respond(503, ""),
            Scripted::Respond(200, r#"{"ok":true}"#),
        ]);
        let exec = executor(transport.clone());
        let started = Instant::now();

        let value = exec
            .execute(&RequestSpec::get("/health"))
            .await
            .expect("third attempt must succeed");

        assert_eq!(value, json!({"ok": true}));
        assert_eq!(transport.calls(), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn retried_requests_are_identical() {
        let transport = ScriptedTransport::new([
            Scripted::Respond(500, ""),
            Scripted::Respond(200, "{}"),
        ]);
        let exec = executor(transport.clone());
        let spec = RequestSpec::post("/api/sap/updatePlannedOrder")
            .query("plannedOrder", "1000123")
            .header("X-Request-Source", "test")
            .body(json!({"quantity": 10}));

        exec.execute(&spec).await.expect("retry must succeed");

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
        assert_eq!(requests[0].body.as_deref(), Some(r#"{"quantity":10}"#));
        assert_eq!(requests[0].headers["X-Request-Source"], "test");
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_server_errors_surface_last_failure() {
        let transport = ScriptedTransport::new([
            Scripted::Respond(500, r#"{"message":"first"}"#),
            Scripted::Respond(502, r#"{"message":"second"}"#),
            Scripted::Respond(503, r#"{"message":"SAP gateway unavailable"}"#),
        ]);
        let exec = executor(transport.clone());
        let started = Instant::now();

        let err = exec
            .execute(&RequestSpec::get("/api/sap/getPlannedOrders"))
            .await
            .expect_err("all attempts fail");

        assert_eq!(transport.calls(), 3);
        assert_eq!(err.status(), 503);
        assert!(err.to_string().contains("SAP gateway unavailable"));
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn client_error_is_not_retried() {
        let transport = ScriptedTransport::new([Scripted::Respond(404, "")]);
        let exec = executor(transport.clone());

        let err = exec
            .execute(&RequestSpec::get("/sales-orders/42"))
            .await
            .expect_err("404 must fail");

        assert!(matches!(err, ApiClientError::Client(_)));
        assert_eq!(err.status(), 404);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn network_error_on_first_attempt_fails_fast() {
        let transport = ScriptedTransport::new([Scripted::Fail, Scripted::Respond(200, "{}")]);
        let exec = executor(transport.clone());

        let err = exec
            .execute(&RequestSpec::get("/health"))
            .await
            .expect_err("connection failure must surface");

        assert_eq!(transport.calls(), 1);
        assert_eq!(err.status(), 0);
        let message = err.to_string();
        assert!(message.contains("erp.local:8080"));
        assert!(message.contains("CORS"));
        assert!(message.contains("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn unsendable_request_is_terminal_and_not_a_network_error() {
        let transport = ScriptedTransport::new([Scripted::Reject, Scripted::Respond(200, "{}")]);
        let exec = executor(transport.clone());

        let err = exec
            .execute(&RequestSpec::get("/health"))
            .await
            .expect_err("unsendable request must fail");

        assert!(matches!(err, ApiClientError::InvalidRequest(_)));
        assert_eq!(transport.calls(), 1);
        assert_eq!(err.status(), 0);
        let message = err.to_string();
        assert!(message.contains("Authorization"));
        assert!(!message.contains("CORS"));
    }

    #[tokio::test(start_paused = true)]
    async fn unsendable_request_after_server_error_is_not_retried() {
        let transport = ScriptedTransport::new([
            Scripted::Respond(503, ""),
            Scripted::Reject,
            Scripted::Respond(200, "{}"),
        ]);
        let exec = executor(transport.clone());

        let err = exec
            .execute(&RequestSpec::get("/health"))
            .await
            .expect_err("unsendable request must fail");

        assert!(matches!(err, ApiClientError::InvalidRequest(_)));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn network_error_after_first_attempt_is_retried() {
        let transport = ScriptedTransport::new([
            Scripted::Respond(500, ""),
            Scripted::Fail,
            Scripted::Respond(200, r#"{"status":"UP"}"#),
        ]);
        let exec = executor(transport.clone());

        let value = exec
            .execute(&RequestSpec::get("/health"))
            .await
            .expect("third attempt must succeed");

        assert_eq!(value["status"], "UP");
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_terminal_and_names_the_deadline() {
        let transport = ScriptedTransport::new([Scripted::Hang, Scripted::Respond(200, "{}")]);
        let exec = executor(transport.clone());
        let started = Instant::now();

        let err = exec
            .execute(&RequestSpec::get("/api/sap/getProductionSupervisor"))
            .await
            .expect_err("hung request must time out");

        assert!(matches!(err, ApiClientError::Timeout { timeout_ms: 30_000 }));
        assert!(err.to_string().contains("30000"));
        assert_eq!(transport.calls(), 1);
        assert_eq!(started.elapsed(), Duration::from_millis(30_000));
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_budget_never_retries() {
        let transport = ScriptedTransport::new([Scripted::Respond(500, "")]);
        let exec = RequestExecutor::new(
            ClientConfig::new("http://erp.local/api").with_max_attempts(1),
            transport.clone(),
        )
        .expect("config must be valid");

        let err = exec
            .execute(&RequestSpec::get("/health"))
            .await
            .expect_err("must fail");
        assert!(matches!(err, ApiClientError::Server(_)));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn auth_header_applies_to_later_calls_only() {
        let transport = ScriptedTransport::new([
            Scripted::Respond(200, "{}"),
            Scripted::Respond(200, "{}"),
            Scripted::Respond(200, "{}"),
        ]);
        let exec = executor(transport.clone());
        let spec = RequestSpec::get("/api/auth/session");

        exec.execute(&spec).await.expect("call must succeed");
        exec.clone().set_auth_header("token-1");
        exec.execute(&spec).await.expect("call must succeed");
        exec.clear_auth_header();
        exec.execute(&spec).await.expect("call must succeed");

        let requests = transport.requests();
        assert!(!requests[0].headers.contains_key("Authorization"));
        assert_eq!(requests[1].headers["Authorization"], "Bearer token-1");
        assert!(!requests[2].headers.contains_key("Authorization"));
        assert_eq!(requests[1].headers["X-App-Name"], "Sales Order Management System");
    }

    #[test]
    fn debug_redacts_authorization_value() {
        let exec = executor(ScriptedTransport::new([]));
        exec.set_auth_header("secret-token");
        let debug = format!("{exec:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn rejects_invalid_config() {
        let err = RequestExecutor::new(
            ClientConfig::default().with_timeout_ms(0),
            ScriptedTransport::new([]),
        )
        .expect_err("zero timeout must be rejected");
        assert!(matches!(err, ApiClientError::Config(_)));
    }
}
