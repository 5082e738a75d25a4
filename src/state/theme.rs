//! Theme preference store: user choice, OS theme, and the resolved result.
//!
//! DESIGN
//! ======
//! Two inputs feed one output. `theme` is the user's explicit choice (or
//! `system`), `system_theme` is the last OS report, and `effective_theme` is
//! derived from both after every mutation; it has no setter.
//!
//! Only `theme` is persisted. The OS theme is rehydrated from the live signal
//! at startup (see `services::system_theme`).
//!
//! TRADE-OFFS
//! ==========
//! An OS change re-applies the presentation marker only while following the
//! system, so a user who picked `dark` keeps it when the OS flips to light.
//! Persistence failures are logged and otherwise ignored.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::services::storage::{self, Storage};

#[cfg(test)]
#[path = "theme_test.rs"]
mod tests;

/// Storage key suffix for the persisted theme choice.
pub const THEME_KEY: &str = "theme";

// =============================================================================
// VALUES
// =============================================================================

/// The user's stored theme choice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    /// Follow whatever the OS reports.
    #[default]
    System,
}

/// A concrete light/dark appearance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    #[default]
    Light,
    Dark,
}

impl Appearance {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    #[must_use]
    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }
}

impl ThemePreference {
    /// Resolve the appearance to render given the current OS theme.
    #[must_use]
    pub fn resolve(self, system: Appearance) -> Appearance {
        match self {
            Self::Light => Appearance::Light,
            Self::Dark => Appearance::Dark,
            Self::System => system,
        }
    }
}

impl From<Appearance> for ThemePreference {
    fn from(value: Appearance) -> Self {
        match value {
            Appearance::Light => Self::Light,
            Appearance::Dark => Self::Dark,
        }
    }
}

/// Returned when a theme name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme {0:?} (expected light, dark or system)")]
pub struct ParseThemeError(String);

impl FromStr for ThemePreference {
    type Err = ParseThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            _ => Err(ParseThemeError(s.to_owned())),
        }
    }
}

impl FromStr for Appearance {
    type Err = ParseThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(ParseThemeError(s.to_owned())),
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        })
    }
}

impl fmt::Display for Appearance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Light => "light",
            Self::Dark => "dark",
        })
    }
}

// =============================================================================
// PRESENTATION
// =============================================================================

/// Render root that carries the dark-mode marker.
pub trait ThemeRoot: Send + Sync {
    /// Mark the root dark (`true`) or remove the marker (`false`).
    fn set_dark(&self, dark: bool);
}

/// Apply `effective` to `root`. Idempotent.
pub fn apply_appearance(root: &dyn ThemeRoot, effective: Appearance) {
    root.set_dark(effective.is_dark());
}

/// In-process render root that records the marker.
#[derive(Debug, Default)]
pub struct DocumentRoot {
    dark: AtomicBool,
    applied: AtomicUsize,
}

impl DocumentRoot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the dark marker is currently set.
    #[must_use]
    pub fn is_dark(&self) -> bool {
        self.dark.load(Ordering::SeqCst)
    }

    /// Number of times the marker has been (re)applied.
    #[must_use]
    pub fn apply_count(&self) -> usize {
        self.applied.load(Ordering::SeqCst)
    }
}

impl ThemeRoot for DocumentRoot {
    fn set_dark(&self, dark: bool) {
        self.dark.store(dark, Ordering::SeqCst);
        self.applied.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Persisted projection: the explicit user choice only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedTheme {
    pub theme: ThemePreference,
}

/// Observable snapshot of the theme store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeState {
    pub theme: ThemePreference,
    pub system_theme: Appearance,
    pub effective_theme: Appearance,
}

/// Owner of the theme preference and its resolution.
pub struct ThemeStore {
    state: ThemeState,
    storage: Arc<dyn Storage>,
    key: String,
    root: Arc<dyn ThemeRoot>,
    tx: watch::Sender<ThemeState>,
}

impl ThemeStore {
    /// Build the store from the persisted choice under `<namespace>.theme`.
    ///
    /// Missing or unreadable records fall back to following the system. The
    /// OS theme starts as light until the signal reports otherwise.
    pub fn restore(storage: Arc<dyn Storage>, namespace: &str, root: Arc<dyn ThemeRoot>) -> Self {
        let key = storage::scoped_key(namespace, THEME_KEY);
        let theme = match storage::load_json::<PersistedTheme>(storage.as_ref(), &key) {
            Ok(Some(persisted)) => persisted.theme,
            Ok(None) => ThemePreference::default(),
            Err(e) => {
                warn!(error = %e, %key, "discarding unreadable theme preference");
                ThemePreference::default()
            }
        };
        Self::from_persisted(PersistedTheme { theme }, storage, key, root)
    }

    /// Build the store from an explicit projection, writing to `key`.
    pub fn from_persisted(
        persisted: PersistedTheme,
        storage: Arc<dyn Storage>,
        key: impl Into<String>,
        root: Arc<dyn ThemeRoot>,
    ) -> Self {
        let system_theme = Appearance::default();
        let state = ThemeState {
            theme: persisted.theme,
            system_theme,
            effective_theme: persisted.theme.resolve(system_theme),
        };
        let (tx, _rx) = watch::channel(state);
        Self { state, storage, key: key.into(), root, tx }
    }

    #[must_use]
    pub fn state(&self) -> ThemeState {
        self.state
    }

    #[must_use]
    pub fn theme(&self) -> ThemePreference {
        self.state.theme
    }

    #[must_use]
    pub fn system_theme(&self) -> Appearance {
        self.state.system_theme
    }

    #[must_use]
    pub fn effective_theme(&self) -> Appearance {
        self.state.effective_theme
    }

    /// The projection written to storage.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedTheme {
        PersistedTheme { theme: self.state.theme }
    }

    /// Receive a snapshot after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ThemeState> {
        self.tx.subscribe()
    }

    /// Store an explicit choice (or `system`) and apply the result.
    pub fn set_theme(&mut self, choice: ThemePreference) {
        self.state.theme = choice;
        self.recompute();
        debug!(theme = %choice, effective = %self.state.effective_theme, "theme set");
        self.apply();
        self.persist();
        self.publish();
    }

    /// Switch to the opposite of what is currently rendered.
    ///
    /// Always leaves follow-system mode: the result is an explicit choice.
    pub fn toggle_theme(&mut self) {
        let next = self.state.effective_theme.opposite();
        self.set_theme(next.into());
    }

    /// Record an OS theme report.
    ///
    /// The presentation marker only changes while following the system.
    pub fn set_system_theme(&mut self, os_theme: Appearance) {
        self.state.system_theme = os_theme;
        self.recompute();
        debug!(system = %os_theme, effective = %self.state.effective_theme, "system theme observed");
        if self.state.theme == ThemePreference::System {
            self.apply();
        }
        self.publish();
    }

    /// Apply the current effective theme to the render root.
    pub fn apply(&self) {
        apply_appearance(self.root.as_ref(), self.state.effective_theme);
    }

    fn recompute(&mut self) {
        self.state.effective_theme = self.state.theme.resolve(self.state.system_theme);
    }

    fn persist(&self) {
        if let Err(e) = storage::save_json(self.storage.as_ref(), &self.key, &self.to_persisted()) {
            warn!(error = %e, key = %self.key, "failed to persist theme preference");
        }
    }

    fn publish(&self) {
        self.tx.send_replace(self.state);
    }
}
