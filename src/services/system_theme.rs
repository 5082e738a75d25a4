//! OS theme signal and the wiring that feeds it into the theme store.
//!
//! SYSTEM CONTEXT
//! ==============
//! The theme store only knows `set_system_theme`. Something platform-side has
//! to report the current OS appearance and every later change; that source is
//! [`SystemThemeSignal`]. [`attach`] performs the startup sequence: seed the
//! store from the current value, subscribe to changes, and apply the initial
//! effective theme once.
//!
//! TRADE-OFFS
//! ==========
//! Delivery is a `watch` channel, so a burst of OS flips collapses to the
//! latest value. Duplicate deliveries are harmless because recomputing the
//! effective theme is idempotent.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::state::theme::{Appearance, ThemeStore};

#[cfg(test)]
#[path = "system_theme_test.rs"]
mod tests;

/// Source of the OS light/dark appearance.
pub trait SystemThemeSignal: Send + Sync {
    /// The appearance the OS reports right now.
    fn current(&self) -> Appearance;

    /// Receiver notified on every subsequent report.
    fn subscribe(&self) -> watch::Receiver<Appearance>;
}

/// Signal whose value is pushed in by the host (platform listener, CLI flag).
#[derive(Debug)]
pub struct ManualThemeSignal {
    tx: watch::Sender<Appearance>,
}

impl ManualThemeSignal {
    #[must_use]
    pub fn new(initial: Appearance) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Report an OS appearance. Repeated values are delivered again.
    pub fn publish(&self, appearance: Appearance) {
        self.tx.send_replace(appearance);
    }
}

impl SystemThemeSignal for ManualThemeSignal {
    fn current(&self) -> Appearance {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<Appearance> {
        self.tx.subscribe()
    }
}

/// Live subscription of a theme store to a signal. Dropping it unsubscribes.
#[derive(Debug)]
pub struct ThemeSync {
    handle: Option<JoinHandle<()>>,
}

impl ThemeSync {
    /// Stop forwarding OS changes and wait for the forwarder to finish.
    pub async fn unsubscribe(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Drop for ThemeSync {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Seed `store` from `signal`, apply the initial theme, and forward changes.
///
/// Must be called from within a Tokio runtime.
pub async fn attach(store: Arc<Mutex<ThemeStore>>, signal: &dyn SystemThemeSignal) -> ThemeSync {
    let mut rx = signal.subscribe();
    {
        let mut guard = store.lock().await;
        guard.set_system_theme(signal.current());
        guard.apply();
    }

    let handle = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let next = *rx.borrow_and_update();
            store.lock().await.set_system_theme(next);
        }
        debug!("system theme signal closed");
    });
    ThemeSync { handle: Some(handle) }
}
