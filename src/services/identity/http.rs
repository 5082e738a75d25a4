//! HTTP-backed identity provider.
//!
//! Thin `reqwest` wrapper over three JSON endpoints under a base URL:
//! `POST /auth/login`, `POST /auth/register`, and `POST /auth/refresh`
//! (bearer-authenticated). Pure parsing lives in `parse_*` for testability.

use std::time::Duration;

use super::{Identity, IdentityError, IdentityProvider, RegistrationData};
use crate::services::token::bearer_header;

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

const CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpIdentityProvider {
    http: reqwest::Client,
    base_url: String,
}

impl HttpIdentityProvider {
    /// Build a client for `base_url` with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::HttpClientBuild`] if the client cannot be built.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| IdentityError::HttpClientBuild(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, IdentityError> {
        let response = request
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        check_status(status, text)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn authenticate(&self, email: &str, credential: &str) -> Result<Identity, IdentityError> {
        let body = LoginRequest { email, password: credential };
        let text = self
            .send(self.http.post(self.endpoint("/auth/login")).json(&body))
            .await?;
        parse_identity(&text)
    }

    async fn create_account(&self, registration: &RegistrationData) -> Result<Identity, IdentityError> {
        let text = self
            .send(self.http.post(self.endpoint("/auth/register")).json(registration))
            .await?;
        parse_identity(&text)
    }

    async fn renew_token(&self, token: &str) -> Result<String, IdentityError> {
        let (name, value) = bearer_header(token);
        let text = self
            .send(self.http.post(self.endpoint("/auth/refresh")).header(name, value))
            .await?;
        parse_refresh(&text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(serde::Deserialize)]
struct RefreshResponse {
    token: String,
}

// =============================================================================
// PARSING
// =============================================================================

fn check_status(status: u16, body: String) -> Result<String, IdentityError> {
    match status {
        200..=299 => Ok(body),
        401 | 403 => Err(IdentityError::Rejected),
        _ => Err(IdentityError::Response { status, body }),
    }
}

fn parse_identity(json: &str) -> Result<Identity, IdentityError> {
    serde_json::from_str(json).map_err(|e| IdentityError::Parse(e.to_string()))
}

fn parse_refresh(json: &str) -> Result<String, IdentityError> {
    let resp: RefreshResponse = serde_json::from_str(json).map_err(|e| IdentityError::Parse(e.to_string()))?;
    if resp.token.is_empty() {
        return Err(IdentityError::Parse("empty token".to_owned()));
    }
    Ok(resp.token)
}
