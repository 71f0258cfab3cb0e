use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::transport::TransportError;

/// Structured error body returned by the backend for non-success responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
    /// HTTP status, or `0` for connection-level failures.
    pub status: u16,
    /// ISO-8601 timestamp.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiError {
    /// Builds the error used when the backend body carries no usable JSON.
    pub fn synthesized(status: u16, reason: &str) -> Self {
        Self {
            message: format!("HTTP {status}: {reason}"),
            status,
            timestamp: now_iso8601(),
            path: None,
        }
    }

    /// Parses an error body, filling gaps the backend left out.
    ///
    /// Returns `None` when the body is not a JSON object.
    pub(crate) fn from_body(status: u16, body: &str) -> Option<Self> {
        let raw: RawApiError = serde_json::from_str(body).ok()?;
        let message = raw
            .message
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| format!("Request failed with status {status}"));
        Some(Self {
            message,
            status: raw.status.unwrap_or(status),
            timestamp: raw.timestamp.unwrap_or_else(now_iso8601),
            path: raw.path,
        })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Deserialize)]
struct RawApiError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    path: Option<String>,
}

pub(crate) fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Step of the plan-order workflow that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanStep {
    UpdateDetails,
    Dispatch,
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpdateDetails => f.write_str("update details"),
            Self::Dispatch => f.write_str("dispatch"),
        }
    }
}

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    /// The backend could not be reached at all.
    #[error(
        "network error: unable to connect to the backend server at {host}. Please check:\n\
         1. Is the backend server running and reachable?\n\
         2. Is CORS configured on the backend?\n\
         3. Is the API base URL correct in the configuration?\n\n\
         Original error: {source}"
    )]
    Network {
        host: String,
        #[source]
        source: TransportError,
    },
    /// The request could not be put on the wire (bad URL, header name or
    /// header value). Nothing was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The attempt did not complete before the configured deadline.
    #[error(
        "request timeout: the request took longer than {timeout_ms}ms to complete. \
         The backend might be slow or unresponsive."
    )]
    Timeout { timeout_ms: u64 },
    /// 4xx response.
    #[error("{0}")]
    Client(ApiError),
    /// Non-success response outside the 4xx range.
    #[error("{0}")]
    Server(ApiError),
    /// Success status with a body that is not JSON.
    #[error("malformed response (status {status}): {message}")]
    MalformedResponse { status: u16, message: String },
    /// JSON response that does not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// Request body could not be serialized.
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),
    /// No credentials are stored for the session.
    #[error("missing login credentials")]
    MissingCredentials,
    /// Stored credentials could not be decoded.
    #[error("invalid stored credentials: {0}")]
    Credentials(String),
    /// A step of the plan-order workflow failed.
    #[error("failed to plan order {planned_order} during {step}: {source}")]
    PlanOrder {
        planned_order: String,
        step: PlanStep,
        #[source]
        source: Box<ApiClientError>,
    },
}

impl ApiClientError {
    /// HTTP status associated with the failure, `0` when none was received.
    pub fn status(&self) -> u16 {
        match self {
            Self::Client(error) | Self::Server(error) => error.status,
            Self::MalformedResponse { status, .. } => *status,
            Self::PlanOrder { source, .. } => source.status(),
            _ => 0,
        }
    }

    /// Structured backend error, when the failure came from an HTTP response.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Client(error) | Self::Server(error) => Some(error),
            Self::PlanOrder { source, .. } => source.api_error(),
            _ => None,
        }
    }
}
