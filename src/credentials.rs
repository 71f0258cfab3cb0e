//! Session-scoped SAP credentials.
//!
//! The backend expects the username and password Base64-encoded, either in a
//! JSON body (login) or as `username`/`password` query parameters. The
//! encoding is a wire contract, not protection.

use std::{fmt, sync::Arc};

use arc_swap::ArcSwapOption;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::{ApiClientError, RequestSpec, Result};

/// Plain-text credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn encode(&self) -> EncodedCredentials {
        EncodedCredentials {
            username: STANDARD.encode(self.username.as_bytes()),
            password: STANDARD.encode(self.password.as_bytes()),
        }
    }
}

/// Base64-encoded credentials, as sent to and stored for the backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for EncodedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl EncodedCredentials {
    pub fn decode(&self) -> Result<Credentials> {
        Ok(Credentials {
            username: decode_field("username", &self.username)?,
            password: decode_field("password", &self.password)?,
        })
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

fn decode_field(name: &str, value: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(value)
        .map_err(|err| ApiClientError::Credentials(format!("{name} is not valid base64: {err}")))?;
    String::from_utf8(bytes)
        .map_err(|err| ApiClientError::Credentials(format!("{name} is not valid UTF-8: {err}")))
}

/// Credentials remembered for the current session.
///
/// Clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct SessionCredentials {
    slot: Arc<ArcSwapOption<EncodedCredentials>>,
}

impl SessionCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, credentials: &Credentials) {
        self.slot.store(Some(Arc::new(credentials.encode())));

        #[cfg(feature = "tracing")]
        tracing::debug!("credentials stored for session");
    }

    /// Restores a previously persisted, already-encoded pair.
    pub fn restore(&self, encoded: EncodedCredentials) {
        self.slot.store(Some(Arc::new(encoded)));
    }

    pub fn clear(&self) {
        self.slot.store(None);

        #[cfg(feature = "tracing")]
        tracing::debug!("credentials cleared from session");
    }

    pub fn stored(&self) -> Option<EncodedCredentials> {
        self.slot.load_full().map(|encoded| EncodedCredentials::clone(&encoded))
    }

    pub fn has_stored(&self) -> bool {
        self.slot
            .load()
            .as_deref()
            .is_some_and(EncodedCredentials::is_complete)
    }

    /// Plain-text credentials, or [`ApiClientError::MissingCredentials`].
    pub fn decoded(&self) -> Result<Credentials> {
        self.require()?.decode()
    }

    /// Encoded credentials, or [`ApiClientError::MissingCredentials`].
    pub fn require(&self) -> Result<EncodedCredentials> {
        self.stored()
            .filter(EncodedCredentials::is_complete)
            .ok_or(ApiClientError::MissingCredentials)
    }

    /// Adds the `username`/`password` query parameters to `spec`.
    pub fn authorize(&self, spec: RequestSpec) -> Result<RequestSpec> {
        let encoded = self.require()?;
        Ok(spec
            .query("username", encoded.username)
            .query("password", encoded.password))
    }
}
