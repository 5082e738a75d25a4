//! Process-wide store wiring.
//!
//! DESIGN
//! ======
//! `AppContext` is built once at startup and handed to every consumer. It
//! replaces module-level singletons: each store lives behind an
//! `Arc<tokio::sync::Mutex<_>>` so async operations (login, refresh) and the
//! OS theme forwarder never interleave mutations on the same store.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::config::{AppConfig, IdentityBackend};
use crate::error::ErrorCode;
use crate::services::identity::{HttpIdentityProvider, IdentityError, IdentityProvider, MockIdentityProvider};
use crate::services::storage::{FileStorage, PersistenceError, Storage};
use crate::services::system_theme::{self, SystemThemeSignal, ThemeSync};
use crate::state::session::SessionStore;
use crate::state::theme::{ThemeRoot, ThemeStore};

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;

/// Errors that prevent the stores from being constructed.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl ErrorCode for StartupError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Persistence(e) => e.error_code(),
            Self::Identity(e) => e.error_code(),
        }
    }
}

/// Both stores, shared by reference with every consumer.
#[derive(Clone)]
pub struct AppContext {
    pub session: Arc<Mutex<SessionStore>>,
    pub theme: Arc<Mutex<ThemeStore>>,
}

impl AppContext {
    /// Build stores backed by the configured state directory.
    ///
    /// # Errors
    ///
    /// Returns a [`StartupError`] if the state directory cannot be created or
    /// the identity client cannot be built.
    pub fn from_config(config: &AppConfig, root: Arc<dyn ThemeRoot>) -> Result<Self, StartupError> {
        let storage = Arc::new(FileStorage::open(&config.state_dir)?);
        info!(state_dir = %storage.root().display(), namespace = %config.namespace, "opened state directory");
        Self::with_storage(config, storage, root)
    }

    /// Build stores over an explicit storage backend.
    ///
    /// # Errors
    ///
    /// Returns a [`StartupError`] if the identity client cannot be built.
    pub fn with_storage(
        config: &AppConfig,
        storage: Arc<dyn Storage>,
        root: Arc<dyn ThemeRoot>,
    ) -> Result<Self, StartupError> {
        let provider = build_provider(config)?;
        let session =
            SessionStore::restore(provider, storage.clone(), &config.namespace).with_token_ttl(config.token_ttl);
        let theme = ThemeStore::restore(storage, &config.namespace, root);
        Ok(Self { session: Arc::new(Mutex::new(session)), theme: Arc::new(Mutex::new(theme)) })
    }

    /// Run the theme startup sequence against `signal`.
    pub async fn start_theme_sync(&self, signal: &dyn SystemThemeSignal) -> ThemeSync {
        system_theme::attach(self.theme.clone(), signal).await
    }
}

/// Construct the identity provider selected by `config`.
///
/// # Errors
///
/// Returns [`IdentityError::HttpClientBuild`] if the HTTP client fails to build.
pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn IdentityProvider>, IdentityError> {
    Ok(match &config.identity {
        IdentityBackend::Mock => Arc::new(MockIdentityProvider::new(config.token_ttl)),
        IdentityBackend::Http { base_url } => {
            Arc::new(HttpIdentityProvider::new(base_url.clone(), config.request_timeout)?)
        }
    })
}
