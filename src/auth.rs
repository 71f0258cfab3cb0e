use crate::{
    ApiClient, Credentials, LoginResponse, RequestSpec, Result, SessionCredentials, SessionInfo,
};

const AUTH_ENDPOINT: &str = "/api/auth";

/// Login, logout and session lookup against `/api/auth`.
#[derive(Clone, Debug)]
pub struct AuthService {
    client: ApiClient,
    session: SessionCredentials,
}

impl AuthService {
    pub fn new(client: ApiClient, session: SessionCredentials) -> Self {
        Self { client, session }
    }

    pub fn session(&self) -> &SessionCredentials {
        &self.session
    }

    /// Logs in with Base64-encoded credentials and remembers them for the
    /// session when the backend accepts them.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        #[cfg(feature = "tracing")]
        tracing::debug!(username, "attempting login");

        let credentials = Credentials::new(username, password);
        let spec = RequestSpec::post(format!("{AUTH_ENDPOINT}/login")).json(&credentials.encode())?;
        let response: LoginResponse = self.client.execute_as(&spec).await?;

        if response.success {
            self.session.store(&credentials);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(success = response.success, message = %response.message, "login response");

        Ok(response)
    }

    /// Logs out. Stored credentials are cleared even when the call fails.
    pub async fn logout(&self) -> Result<LoginResponse> {
        let spec = RequestSpec::post(format!("{AUTH_ENDPOINT}/logout"));
        let result = self.client.execute_as::<LoginResponse>(&spec).await;
        self.session.clear();
        result
    }

    pub async fn session_info(&self) -> Result<SessionInfo> {
        self.client
            .execute_as(&RequestSpec::get(format!("{AUTH_ENDPOINT}/session")))
            .await
    }
}
