use super::*;
use crate::services::storage::MemoryStorage;
use crate::state::theme::{DocumentRoot, ThemePreference};
use std::time::Duration;

fn shared_store() -> (Arc<Mutex<ThemeStore>>, Arc<DocumentRoot>) {
    let root = Arc::new(DocumentRoot::new());
    let store = ThemeStore::restore(Arc::new(MemoryStorage::new()), "algomaster", root.clone());
    (Arc::new(Mutex::new(store)), root)
}

async fn wait_for_effective(store: &Arc<Mutex<ThemeStore>>, want: Appearance) {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if store.lock().await.effective_theme() == want {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("effective theme never reached the expected value");
}

// =============================================================================
// ManualThemeSignal
// =============================================================================

#[test]
fn manual_signal_reports_latest_value() {
    let signal = ManualThemeSignal::new(Appearance::Light);
    assert_eq!(signal.current(), Appearance::Light);
    signal.publish(Appearance::Dark);
    assert_eq!(signal.current(), Appearance::Dark);
}

#[test]
fn manual_signal_redelivers_duplicates() {
    let signal = ManualThemeSignal::new(Appearance::Dark);
    let rx = signal.subscribe();
    signal.publish(Appearance::Dark);
    assert!(rx.has_changed().unwrap());
}

// =============================================================================
// attach
// =============================================================================

#[tokio::test]
async fn attach_seeds_store_and_applies_once() {
    let (store, root) = shared_store();
    let signal = ManualThemeSignal::new(Appearance::Dark);

    let _sync = attach(store.clone(), &signal).await;
    let guard = store.lock().await;
    assert_eq!(guard.system_theme(), Appearance::Dark);
    assert_eq!(guard.effective_theme(), Appearance::Dark);
    assert!(root.is_dark());
}

#[tokio::test]
async fn attach_applies_initial_theme_even_with_explicit_choice() {
    let (store, root) = shared_store();
    store.lock().await.set_theme(ThemePreference::Dark);
    let applied = root.apply_count();

    let signal = ManualThemeSignal::new(Appearance::Light);
    let _sync = attach(store.clone(), &signal).await;
    assert_eq!(root.apply_count(), applied + 1);
    assert!(root.is_dark());
}

#[tokio::test]
async fn os_changes_flow_into_store() {
    let (store, root) = shared_store();
    let signal = ManualThemeSignal::new(Appearance::Light);
    let _sync = attach(store.clone(), &signal).await;
    assert_eq!(store.lock().await.effective_theme(), Appearance::Light);

    signal.publish(Appearance::Dark);
    wait_for_effective(&store, Appearance::Dark).await;
    assert!(root.is_dark());

    store.lock().await.set_theme(ThemePreference::Light);
    signal.publish(Appearance::Dark);
    signal.publish(Appearance::Light);
    signal.publish(Appearance::Dark);
    tokio::time::sleep(Duration::from_millis(20)).await;
    let guard = store.lock().await;
    assert_eq!(guard.effective_theme(), Appearance::Light);
    assert!(!root.is_dark());
}

#[tokio::test]
async fn unsubscribe_stops_forwarding() {
    let (store, _root) = shared_store();
    let signal = ManualThemeSignal::new(Appearance::Light);
    let sync = attach(store.clone(), &signal).await;

    sync.unsubscribe().await;
    signal.publish(Appearance::Dark);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(store.lock().await.system_theme(), Appearance::Light);
}

#[tokio::test]
async fn forwarder_exits_when_signal_dropped() {
    let (store, _root) = shared_store();
    let signal = ManualThemeSignal::new(Appearance::Light);
    let mut sync = attach(store.clone(), &signal).await;
    drop(signal);

    let handle = sync.handle.take().unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("forwarder did not exit")
        .unwrap();
}
