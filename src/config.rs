use std::collections::BTreeMap;

use crate::{ApiClientError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_APP_NAME: &str = "Sales Order Management System";
pub const DEFAULT_APP_VERSION: &str = "1.0.0";
pub const DEFAULT_MODE: &str = "development";
pub const DEFAULT_HEALTH_PATH: &str = "/health";

pub(crate) const AUTHORIZATION: &str = "Authorization";

/// Connection, timeout and retry settings shared by every call of a client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Prefix joined with every request path.
    pub base_url: String,
    /// Deadline for a single attempt in milliseconds.
    pub timeout_ms: u64,
    /// Total attempts per logical call, including the first.
    pub max_attempts: u32,
    /// Headers sent with every request.
    pub default_headers: BTreeMap<String, String>,
    /// Path probed by the health check, relative to `base_url`.
    pub health_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    /// Default settings against `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            default_headers: app_headers(DEFAULT_APP_NAME, DEFAULT_APP_VERSION, DEFAULT_MODE),
            health_path: DEFAULT_HEALTH_PATH.to_owned(),
        }
    }

    /// Reads settings from the process environment.
    ///
    /// - `API_BASE_URL` (required)
    /// - `API_TIMEOUT` in milliseconds
    /// - `API_RETRY_ATTEMPTS`
    /// - `APP_NAME`, `APP_VERSION`, `APP_MODE`
    /// - `API_HEALTH_PATH`, defaults to `/health`
    ///
    /// Missing, unparseable or zero numbers fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup("API_BASE_URL").ok_or_else(|| {
            ApiClientError::Config("missing API_BASE_URL environment variable".to_owned())
        })?;
        if base_url.trim().is_empty() {
            return Err(ApiClientError::Config(
                "API_BASE_URL is set but empty".to_owned(),
            ));
        }

        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let timeout_ms = non_empty("API_TIMEOUT")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let max_attempts = non_empty("API_RETRY_ATTEMPTS")
            .and_then(|value| value.trim().parse::<u32>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let app_name = non_empty("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_owned());
        let app_version =
            non_empty("APP_VERSION").unwrap_or_else(|| DEFAULT_APP_VERSION.to_owned());
        let mode = non_empty("APP_MODE").unwrap_or_else(|| DEFAULT_MODE.to_owned());
        let health_path = non_empty("API_HEALTH_PATH")
            .map(|path| normalize_path(path.trim()))
            .unwrap_or_else(|| DEFAULT_HEALTH_PATH.to_owned());

        Ok(Self {
            base_url: base_url.trim().to_owned(),
            timeout_ms,
            max_attempts,
            default_headers: app_headers(&app_name, &app_version, &mode),
            health_path,
        })
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Replaces the identification headers (`X-App-*`, `X-Client-Mode`).
    pub fn with_app(mut self, name: &str, version: &str, mode: &str) -> Self {
        let auth = self.default_headers.remove(AUTHORIZATION);
        self.default_headers = app_headers(name, version, mode);
        if let Some(auth) = auth {
            self.default_headers.insert(AUTHORIZATION.to_owned(), auth);
        }
        self
    }

    pub fn with_health_path(mut self, path: &str) -> Self {
        self.health_path = normalize_path(path.trim());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Rejects settings the executor cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ApiClientError::Config("base URL is empty".to_owned()));
        }
        if self.health_path.trim_start_matches('/').is_empty() {
            return Err(ApiClientError::Config("health path is empty".to_owned()));
        }
        if self.timeout_ms == 0 {
            return Err(ApiClientError::Config(
                "timeout must be greater than zero".to_owned(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(ApiClientError::Config(
                "max attempts must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// Host part of the base URL, used in diagnostics.
    pub fn host(&self) -> String {
        url::Url::parse(&self.base_url)
            .ok()
            .and_then(|url| {
                url.host_str().map(|host| match url.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_owned(),
                })
            })
            .unwrap_or_else(|| self.base_url.clone())
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

fn app_headers(name: &str, version: &str, mode: &str) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::from([
        ("Content-Type".to_owned(), "application/json".to_owned()),
        ("Accept".to_owned(), "application/json".to_owned()),
        ("X-App-Name".to_owned(), name.to_owned()),
        ("X-App-Version".to_owned(), version.to_owned()),
        ("X-Client-Mode".to_owned(), mode.to_owned()),
    ]);
    if mode == DEFAULT_MODE {
        headers.insert("X-Debug-Mode".to_owned(), "true".to_owned());
    }
    headers
}
