//! HTTP adapters for the hosted FirestoreX backend.
//!
//! One [`BackendClient`] carries the base URL, the anon API key, and optionally a
//! user access token. The adapters built on it implement the crate-level ports:
//! [`RestStore`] for tables, [`RemoteStorage`] for objects, [`TokenSession`] for
//! the current actor, and [`HostedAuth`] for account operations.

pub mod auth;
pub mod error;
pub mod rest;
pub mod session;
pub mod storage;

use std::time::Duration;

use firestorex_core::BackendConfig;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

pub use auth::{AuthBackend, HostedAuth};
pub use error::ClientError;
pub use reqwest::StatusCode;
pub use rest::RestStore;
pub use session::TokenSession;
pub use storage::RemoteStorage;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Shared HTTP client for the hosted backend.
#[derive(Clone, Debug)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl BackendClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, ClientError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| ClientError::Config("backend URL is not set".to_string()))?;
        let key = config
            .anon_key
            .as_deref()
            .ok_or_else(|| ClientError::Config("backend API key is not set".to_string()))?;
        let timeout = match config.http_timeout_secs {
            0 => DEFAULT_TIMEOUT_SECS,
            secs => secs,
        };

        Self::new(url, key, Duration::from_secs(timeout))
    }

    /// Copy of this client that authenticates as a signed-in user.
    pub fn with_access_token(&self, token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..self.clone()
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Start a request with the `apikey` header and a bearer token: the user's
    /// access token when present, otherwise the anon key.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.client
            .request(method, self.build_url(path))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    /// Send a request and fail on a non-success status.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::Status {
                status,
                message: error::error_message(&body),
            });
        }

        Ok(response)
    }

    /// Send a request and deserialize the JSON response.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Percent-encode each `/`-separated segment of an object path.
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_requires_url_and_key() {
        let config = BackendConfig {
            url: None,
            anon_key: Some("key".to_string()),
            http_timeout_secs: 5,
        };
        assert!(matches!(
            BackendClient::from_config(&config),
            Err(ClientError::Config(_))
        ));

        let config = BackendConfig {
            url: Some("http://localhost:54321/".to_string()),
            anon_key: Some("key".to_string()),
            http_timeout_secs: 5,
        };
        let client = BackendClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:54321");
        assert_eq!(
            client.build_url("/rest/v1/files"),
            "http://localhost:54321/rest/v1/files"
        );
        assert_eq!(client.access_token(), None);
        assert_eq!(
            client.with_access_token("jwt").access_token(),
            Some("jwt")
        );
    }

    #[test]
    fn encode_path_keeps_separators() {
        assert_eq!(encode_path("u1/my file.pdf"), "u1/my%20file.pdf");
        assert_eq!(encode_path("a/b/c"), "a/b/c");
    }
}
