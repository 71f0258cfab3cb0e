use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    transport::{HttpTransport, ReqwestTransport},
    ApiClientError, ClientConfig, HealthStatus, RequestExecutor, RequestSpec, Result,
};

/// HTTP client for the order management REST API.
///
/// Cheap to clone; clones share the connection pool and the header map.
#[derive(Clone, Debug)]
pub struct ApiClient {
    executor: RequestExecutor,
}

impl ApiClient {
    /// Creates a client for `base_url` with default settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_config(ClientConfig::new(base_url))
    }

    /// Creates a client over `reqwest` with the given settings.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Creates a client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let executor = RequestExecutor::new(config, transport)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            base_url = %executor.config().base_url,
            timeout_ms = executor.config().timeout_ms,
            max_attempts = executor.config().max_attempts,
            "API client configured"
        );

        Ok(Self { executor })
    }

    /// Creates a client from `API_*` environment variables.
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::with_config(ClientConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        &self.executor.config().base_url
    }

    pub fn config(&self) -> &ClientConfig {
        self.executor.config()
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Executes `spec` and returns the raw JSON body.
    pub async fn execute(&self, spec: &RequestSpec) -> Result<Value> {
        self.executor.execute(spec).await
    }

    /// Executes `spec` and decodes the body into `T`.
    pub async fn execute_as<T: DeserializeOwned>(&self, spec: &RequestSpec) -> Result<T> {
        let value = self.executor.execute(spec).await?;
        decode(spec, value)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute_as(&RequestSpec::get(path)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let spec = with_body(RequestSpec::post(path), body)?;
        self.execute_as(&spec).await
    }

    pub async fn put<T, B>(&self, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let spec = with_body(RequestSpec::put(path), body)?;
        self.execute_as(&spec).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let spec = with_body(RequestSpec::patch(path), body)?;
        self.execute_as(&spec).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute_as(&RequestSpec::delete(path)).await
    }

    /// Sends `Authorization: Bearer <token>` on subsequent calls.
    pub fn set_auth_token(&self, token: &str) {
        self.executor.set_auth_header(token);
    }

    pub fn remove_auth_token(&self) {
        self.executor.clear_auth_header();
    }

    /// Calls `GET` on the configured health path (`/health` by default).
    pub async fn health_check(&self) -> Result<HealthStatus> {
        #[cfg(feature = "tracing")]
        tracing::debug!("performing health check");

        let result = self
            .get::<HealthStatus>(&self.executor.config().health_path)
            .await;

        #[cfg(feature = "tracing")]
        match &result {
            Ok(health) => tracing::debug!(status = %health.status, "health check passed"),
            Err(err) => tracing::warn!("health check failed: {err}"),
        }

        result
    }

    /// `true` when the health check succeeds.
    pub async fn test_connection(&self) -> bool {
        self.health_check().await.is_ok()
    }
}

fn with_body<B: Serialize + ?Sized>(spec: RequestSpec, body: Option<&B>) -> Result<RequestSpec> {
    match body {
        Some(body) => spec.json(body),
        None => Ok(spec),
    }
}

pub(crate) fn decode<T: DeserializeOwned>(spec: &RequestSpec, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|err| {
        ApiClientError::Decode(format!(
            "unexpected response shape from {} {}: {err}",
            spec.method(),
            spec.path()
        ))
    })
}

/// Decodes a JSON array into `Vec<T>`; anything else counts as no rows.
pub(crate) fn decode_list<T: DeserializeOwned>(spec: &RequestSpec, value: Value) -> Result<Vec<T>> {
    match value {
        Value::Array(_) => decode(spec, value),
        _ => Ok(Vec::new()),
    }
}
