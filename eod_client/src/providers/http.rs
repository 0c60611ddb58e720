use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_secret_env_var;
use snafu::ResultExt;
use tracing::debug;

use crate::{
    models::EodResponse,
    providers::{
        ApiSnafu, ClientBuildSnafu, EodProvider, MissingEnvVarSnafu, ProviderError,
        ProviderInitError, ReqwestSnafu, error_reason,
    },
};

/// Path of the EOD endpoint, relative to the configured base URL.
pub const EOD_PATH: &str = "/api/stocks/eod";

/// Environment variables holding the HTTP Basic credentials.
pub const USERNAME_VAR: &str = "EOD_API_USERNAME";
pub const PASSWORD_VAR: &str = "EOD_API_PASSWORD";

/// Client for the `GET /api/stocks/eod?symbols=...` endpoint.
pub struct HttpEodProvider {
    client: Client,
    endpoint: String,
    username: SecretString,
    password: SecretString,
}

impl HttpEodProvider {
    /// Creates a provider for `base_url`.
    ///
    /// Reads Basic-auth credentials from the `EOD_API_USERNAME` and
    /// `EOD_API_PASSWORD` environment variables.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ProviderInitError> {
        let username = get_secret_env_var(USERNAME_VAR).context(MissingEnvVarSnafu)?;
        let password = get_secret_env_var(PASSWORD_VAR).context(MissingEnvVarSnafu)?;
        Self::with_credentials(base_url, username, password, timeout)
    }

    /// Creates a provider with explicit credentials.
    pub fn with_credentials(
        base_url: &str,
        username: SecretString,
        password: SecretString,
        timeout: Option<Duration>,
    ) -> Result<Self, ProviderInitError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            endpoint: format!("{}{EOD_PATH}", base_url.trim_end_matches('/')),
            username,
            password,
        })
    }

    /// Full URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EodProvider for HttpEodProvider {
    async fn fetch_eod(&self, symbols: &str) -> Result<EodResponse, ProviderError> {
        debug!(endpoint = %self.endpoint, symbols, "requesting eod data");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("symbols", symbols)])
            .basic_auth(
                self.username.expose_secret(),
                Some(self.password.expose_secret()),
            )
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let message = error_reason(response).await;
            return ApiSnafu {
                status: status.as_u16(),
                message,
            }
            .fail();
        }

        response.json::<EodResponse>().await.context(ReqwestSnafu)
    }
}
