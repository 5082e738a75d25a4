//! Identity provider seam used by the session store.
//!
//! ARCHITECTURE
//! ============
//! The session store never talks to a backend directly. It calls
//! [`IdentityProvider`] to authenticate, create accounts, and renew tokens,
//! so the mock used for demos and the HTTP client used against a real API
//! are interchangeable without touching store logic.

pub mod http;
pub mod mock;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::state::user::User;

pub use http::HttpIdentityProvider;
pub use mock::MockIdentityProvider;

// =============================================================================
// TYPES
// =============================================================================

/// A user profile paired with a freshly issued token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user: User,
    pub token: String,
}

/// Fields collected by the sign-up form.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationData {
    pub email: String,
    pub password: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl fmt::Debug for RegistrationData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationData")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("username", &self.username)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by identity provider calls.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The email address is not of the form `local@domain`.
    #[error("invalid email: {0:?}")]
    InvalidEmail(String),

    /// The provider refused the credential.
    #[error("credential rejected")]
    Rejected,

    /// The token is too old to be renewed.
    #[error("token expired")]
    Expired,

    /// The HTTP request to the identity backend failed.
    #[error("identity request failed: {0}")]
    Request(String),

    /// The identity backend returned a non-success HTTP status.
    #[error("identity response error: status {status}")]
    Response { status: u16, body: String },

    /// The identity backend response body could not be deserialized.
    #[error("identity response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for IdentityError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidEmail(_) => "E_INVALID_EMAIL",
            Self::Rejected => "E_CREDENTIAL_REJECTED",
            Self::Expired => "E_TOKEN_EXPIRED",
            Self::Request(_) => "E_IDENTITY_REQUEST",
            Self::Response { .. } => "E_IDENTITY_RESPONSE",
            Self::Parse(_) => "E_IDENTITY_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Backend that issues identities and tokens.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an email and credential for a user profile and token.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the credential is refused or the
    /// backend cannot be reached.
    async fn authenticate(&self, email: &str, credential: &str) -> Result<Identity, IdentityError>;

    /// Create a new account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the registration is refused or the
    /// backend cannot be reached.
    async fn create_account(&self, registration: &RegistrationData) -> Result<Identity, IdentityError>;

    /// Exchange a held token for a new one.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the token is expired or refused.
    async fn renew_token(&self, token: &str) -> Result<String, IdentityError>;
}

/// Trim and lowercase an email, rejecting anything not shaped `local@domain`.
#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
