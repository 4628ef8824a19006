//! Shared HTTP context for talking to the listings backend.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use zackweg_api_types::ApiErrorBody;

use crate::application::error::ErrorReport;
use crate::application::ports::ApiError;
use crate::config::ApiSettings;
use crate::infra::error::InfraError;
use crate::util::url::with_trailing_slash;

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(
        base: Url,
        token: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(request_timeout)
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            client,
            base: with_trailing_slash(base),
            token,
        })
    }

    pub fn from_settings(settings: &ApiSettings) -> Result<Self, InfraError> {
        Self::new(
            settings.base_url.clone(),
            settings.token.clone(),
            settings.request_timeout,
        )
    }

    pub fn user_agent() -> &'static str {
        concat!("zackweg/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve `path` relative to the base URL.
    pub fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(path)
    }

    /// Start a request, attaching the bearer token when one is configured.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and decode a JSON success body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Transport(describe(&err)))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::Transport(describe(&err)))?;

        if !status.is_success() {
            let message = error_message(&body)
                .unwrap_or_else(|| fallback_reason(status).to_string());
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|err| ApiError::InvalidResponse(err.to_string()))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base.as_str())
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

/// Message carried by a JSON error body, if the body is one.
pub(super) fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ApiErrorBody>(body)
        .ok()
        .and_then(ApiErrorBody::into_message)
}

/// Render a transport error with its causes; reqwest's own message omits them.
pub(super) fn describe(err: &reqwest::Error) -> String {
    ErrorReport::from_error("infra::http", err).to_string()
}

fn fallback_reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("request failed")
}
