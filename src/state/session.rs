//! Authentication session store.
//!
//! DESIGN
//! ======
//! The store owns the current user, the credential token, and a transient
//! loading flag. `is_authenticated` is not stored at all: it is computed from
//! `user` and `token`, so it can never disagree with them. Between operations
//! either both are present or neither is.
//!
//! Every change to `user` or `token` writes the persisted projection
//! `{ user, token, isAuthenticated }` under `<namespace>.auth`. The loading
//! flag is never persisted.
//!
//! ERROR HANDLING
//! ==============
//! Provider failures are returned to the caller after the loading flag is
//! cleared. A failed refresh additionally forces a logout. Persistence failures
//! are logged and otherwise ignored.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::user::{User, UserPatch};
use crate::error::ErrorCode;
use crate::services::identity::mock::{DEMO_EMAIL, DEMO_PASSWORD};
use crate::services::identity::{IdentityError, IdentityProvider, RegistrationData};
use crate::services::storage::{self, Storage};
use crate::services::token::{self, DEFAULT_TOKEN_TTL};

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

/// Storage key suffix for the persisted session.
pub const AUTH_KEY: &str = "auth";

// =============================================================================
// ERROR
// =============================================================================

/// Errors surfaced by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Login or registration could not complete.
    #[error("authentication failed: {0}")]
    AuthFailure(#[from] IdentityError),

    /// A refresh was attempted with no token held.
    #[error("no token to refresh")]
    NoToken,

    /// The provider refused to renew the held token.
    #[error("token refresh failed: {0}")]
    RefreshFailed(#[source] IdentityError),

    /// An operation needs a signed-in user and there is none.
    #[error("authentication required")]
    AuthenticationRequired,
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::AuthFailure(_) => "E_AUTH_FAILURE",
            Self::NoToken => "E_NO_TOKEN",
            Self::RefreshFailed(_) => "E_REFRESH_FAILED",
            Self::AuthenticationRequired => "E_AUTH_REQUIRED",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::AuthFailure(e) => e.retryable(),
            _ => false,
        }
    }
}

// =============================================================================
// PROJECTIONS
// =============================================================================

/// The subset of session state written to storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub user: Option<User>,
    pub token: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
}

/// Observable view of the store, published after every change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

// =============================================================================
// STORE
// =============================================================================

/// Owner of the signed-in identity and its token lifecycle.
pub struct SessionStore {
    user: Option<User>,
    token: Option<String>,
    loading: bool,
    provider: Arc<dyn IdentityProvider>,
    storage: Arc<dyn Storage>,
    key: String,
    token_ttl: Duration,
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    /// Build the store from the session persisted under `<namespace>.auth`.
    ///
    /// Missing or unreadable records start signed out.
    pub fn restore(provider: Arc<dyn IdentityProvider>, storage: Arc<dyn Storage>, namespace: &str) -> Self {
        let key = storage::scoped_key(namespace, AUTH_KEY);
        let persisted = match storage::load_json::<PersistedSession>(storage.as_ref(), &key) {
            Ok(found) => found.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, %key, "discarding unreadable session");
                PersistedSession::default()
            }
        };
        Self::from_persisted(persisted, provider, storage, key)
    }

    /// Build the store from an explicit projection, writing to `key`.
    ///
    /// A projection holding only one of user and token is treated as signed
    /// out; the stored `isAuthenticated` flag is ignored.
    pub fn from_persisted(
        persisted: PersistedSession,
        provider: Arc<dyn IdentityProvider>,
        storage: Arc<dyn Storage>,
        key: impl Into<String>,
    ) -> Self {
        let (user, token) = match (persisted.user, persisted.token) {
            (Some(user), Some(token)) => (Some(user), Some(token)),
            (None, None) => (None, None),
            _ => {
                warn!("discarding half-populated session");
                (None, None)
            }
        };
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        let store = Self {
            user,
            token,
            loading: false,
            provider,
            storage,
            key: key.into(),
            token_ttl: DEFAULT_TOKEN_TTL,
            tx,
        };
        store.publish();
        store
    }

    /// Override the lifetime used by [`SessionStore::token_expired`].
    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user.clone(),
            token: self.token.clone(),
            is_authenticated: self.is_authenticated(),
            is_loading: self.loading,
        }
    }

    /// The projection written to storage.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedSession {
        PersistedSession {
            user: self.user.clone(),
            token: self.token.clone(),
            is_authenticated: self.is_authenticated(),
        }
    }

    /// Receive a snapshot after every change, including loading transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Sign in with `email` and `credential`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AuthFailure`] if the provider refuses; the
    /// current session is left untouched.
    pub async fn login(&mut self, email: &str, credential: &str) -> Result<SessionSnapshot, SessionError> {
        self.set_loading(true);
        match self.provider.authenticate(email, credential).await {
            Ok(identity) => {
                self.establish(identity.user, identity.token);
                info!(email = %email, "login succeeded");
                Ok(self.snapshot())
            }
            Err(e) => {
                warn!(error = %e, email = %email, "login failed");
                self.set_loading(false);
                Err(e.into())
            }
        }
    }

    /// Sign in with the built-in demo account.
    ///
    /// # Errors
    ///
    /// Same as [`SessionStore::login`].
    pub async fn demo_login(&mut self) -> Result<SessionSnapshot, SessionError> {
        self.login(DEMO_EMAIL, DEMO_PASSWORD).await
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AuthFailure`] if the provider refuses; the
    /// current session is left untouched.
    pub async fn register(&mut self, registration: &RegistrationData) -> Result<SessionSnapshot, SessionError> {
        self.set_loading(true);
        match self.provider.create_account(registration).await {
            Ok(identity) => {
                self.establish(identity.user, identity.token);
                info!(email = %registration.email, "registration succeeded");
                Ok(self.snapshot())
            }
            Err(e) => {
                warn!(error = %e, email = %registration.email, "registration failed");
                self.set_loading(false);
                Err(e.into())
            }
        }
    }

    /// Drop the session. Idempotent.
    pub fn logout(&mut self) {
        let was_authenticated = self.is_authenticated();
        self.user = None;
        self.token = None;
        self.persist();
        self.publish();
        if was_authenticated {
            info!("logged out");
        }
    }

    /// Shallow-merge `patch` into the current user. No-op when signed out.
    pub fn update_user(&mut self, patch: UserPatch) {
        let Some(user) = self.user.as_mut() else {
            debug!("update_user ignored: no user");
            return;
        };
        if patch.is_empty() {
            return;
        }
        patch.apply(user);
        self.persist();
        self.publish();
    }

    /// Replace the held token with a renewed one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoToken`] when signed out and
    /// [`SessionError::RefreshFailed`] when the provider refuses. Both force a
    /// logout before returning.
    pub async fn refresh_token(&mut self) -> Result<(), SessionError> {
        let Some(current) = self.token.clone() else {
            warn!("token refresh attempted without a token");
            self.logout();
            return Err(SessionError::NoToken);
        };

        self.set_loading(true);
        match self.provider.renew_token(&current).await {
            Ok(renewed) => {
                self.token = Some(renewed);
                self.loading = false;
                self.persist();
                self.publish();
                info!("token refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed; logging out");
                self.loading = false;
                self.logout();
                Err(SessionError::RefreshFailed(e))
            }
        }
    }

    /// Set the loading flag directly for multi-step flows.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        self.publish();
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    /// `Authorization` header for the held token, if any.
    #[must_use]
    pub fn auth_header(&self) -> Option<(&'static str, String)> {
        self.token.as_deref().map(token::bearer_header)
    }

    /// The signed-in user, or an error when signed out.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AuthenticationRequired`] when not authenticated.
    pub fn require_user(&self) -> Result<&User, SessionError> {
        match (&self.user, self.is_authenticated()) {
            (Some(user), true) => Ok(user),
            _ => Err(SessionError::AuthenticationRequired),
        }
    }

    /// Whether the held token is past its lifetime. True when signed out.
    #[must_use]
    pub fn token_expired(&self) -> bool {
        self.token_expired_at(token::now_ms())
    }

    /// [`SessionStore::token_expired`] evaluated at `now_ms`.
    #[must_use]
    pub fn token_expired_at(&self, now_ms: i64) -> bool {
        self.token
            .as_deref()
            .map_or(true, |t| token::is_token_expired(t, now_ms, self.token_ttl))
    }

    fn establish(&mut self, user: User, token: String) {
        self.user = Some(user);
        self.token = Some(token);
        self.loading = false;
        self.persist();
        self.publish();
    }

    fn persist(&self) {
        if let Err(e) = storage::save_json(self.storage.as_ref(), &self.key, &self.to_persisted()) {
            warn!(error = %e, key = %self.key, "failed to persist session");
        }
    }

    fn publish(&self) {
        self.tx.send_replace(self.snapshot());
    }
}
