use super::*;
use crate::services::storage::test_helpers::FailingStorage;
use crate::services::storage::{MemoryStorage, Storage};

fn store_with(storage: Arc<dyn Storage>) -> (ThemeStore, Arc<DocumentRoot>) {
    let root = Arc::new(DocumentRoot::new());
    let store = ThemeStore::restore(storage, "algomaster", root.clone());
    (store, root)
}

fn fresh() -> (ThemeStore, Arc<DocumentRoot>, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let (store, root) = store_with(storage.clone());
    (store, root, storage)
}

fn assert_resolved(store: &ThemeStore) {
    let expected = match store.theme() {
        ThemePreference::System => store.system_theme(),
        ThemePreference::Light => Appearance::Light,
        ThemePreference::Dark => Appearance::Dark,
    };
    assert_eq!(store.effective_theme(), expected);
}

// =============================================================================
// values
// =============================================================================

#[test]
fn preference_resolution_table() {
    assert_eq!(ThemePreference::Light.resolve(Appearance::Dark), Appearance::Light);
    assert_eq!(ThemePreference::Dark.resolve(Appearance::Light), Appearance::Dark);
    assert_eq!(ThemePreference::System.resolve(Appearance::Dark), Appearance::Dark);
    assert_eq!(ThemePreference::System.resolve(Appearance::Light), Appearance::Light);
}

#[test]
fn parse_theme_names() {
    assert_eq!("Dark".parse::<ThemePreference>().unwrap(), ThemePreference::Dark);
    assert_eq!(" system ".parse::<ThemePreference>().unwrap(), ThemePreference::System);
    assert!("system".parse::<Appearance>().is_err());
    let err = "purple".parse::<ThemePreference>().unwrap_err();
    assert!(err.to_string().contains("purple"));
}

#[test]
fn display_matches_serde_names() {
    for pref in [ThemePreference::Light, ThemePreference::Dark, ThemePreference::System] {
        assert_eq!(serde_json::to_value(pref).unwrap(), pref.to_string());
    }
}

#[test]
fn document_root_apply_is_idempotent() {
    let root = DocumentRoot::new();
    apply_appearance(&root, Appearance::Dark);
    apply_appearance(&root, Appearance::Dark);
    assert!(root.is_dark());
    apply_appearance(&root, Appearance::Light);
    assert!(!root.is_dark());
    assert_eq!(root.apply_count(), 3);
}

// =============================================================================
// restore
// =============================================================================

#[test]
fn defaults_follow_system_light() {
    let (store, _root, _storage) = fresh();
    assert_eq!(store.theme(), ThemePreference::System);
    assert_eq!(store.system_theme(), Appearance::Light);
    assert_eq!(store.effective_theme(), Appearance::Light);
}

#[test]
fn restore_reads_persisted_choice() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set("algomaster.theme", r#"{"theme":"dark"}"#).unwrap();
    let (store, _root) = store_with(storage);
    assert_eq!(store.theme(), ThemePreference::Dark);
    assert_eq!(store.effective_theme(), Appearance::Dark);
}

#[test]
fn restore_ignores_legacy_runtime_fields() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set("algomaster.theme", r#"{"theme":"light","systemTheme":"dark","actualTheme":"light"}"#)
        .unwrap();
    let (store, _root) = store_with(storage);
    assert_eq!(store.theme(), ThemePreference::Light);
    assert_eq!(store.system_theme(), Appearance::Light);
}

#[test]
fn restore_garbage_falls_back_to_default() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set("algomaster.theme", "][").unwrap();
    let (store, _root) = store_with(storage);
    assert_eq!(store.theme(), ThemePreference::System);
}

#[test]
fn restore_does_not_touch_root() {
    let (_store, root, _storage) = fresh();
    assert_eq!(root.apply_count(), 0);
}

// =============================================================================
// set_theme
// =============================================================================

#[test]
fn set_theme_persists_only_choice() {
    let (mut store, _root, storage) = fresh();
    store.set_system_theme(Appearance::Dark);
    store.set_theme(ThemePreference::Light);

    let raw = storage.get("algomaster.theme").unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json, serde_json::json!({ "theme": "light" }));
}

#[test]
fn set_theme_applies_unconditionally() {
    let (mut store, root, _storage) = fresh();
    store.set_theme(ThemePreference::Dark);
    assert!(root.is_dark());
    store.set_theme(ThemePreference::Dark);
    assert_eq!(root.apply_count(), 2);
    store.set_theme(ThemePreference::System);
    assert!(!root.is_dark());
    assert_resolved(&store);
}

#[test]
fn set_theme_survives_storage_failure() {
    let (mut store, root) = store_with(Arc::new(FailingStorage));
    store.set_theme(ThemePreference::Dark);
    assert_eq!(store.effective_theme(), Appearance::Dark);
    assert!(root.is_dark());
}

// =============================================================================
// set_system_theme
// =============================================================================

#[test]
fn system_change_does_not_override_explicit_choice() {
    let (mut store, root, _storage) = fresh();
    store.set_theme(ThemePreference::Dark);
    let applied = root.apply_count();

    store.set_system_theme(Appearance::Light);
    assert_eq!(store.effective_theme(), Appearance::Dark);
    assert_eq!(store.system_theme(), Appearance::Light);
    assert_eq!(root.apply_count(), applied);
    assert!(root.is_dark());
}

#[test]
fn system_change_applies_while_following() {
    let (mut store, root, _storage) = fresh();
    store.set_system_theme(Appearance::Dark);
    assert_eq!(store.effective_theme(), Appearance::Dark);
    assert!(root.is_dark());
}

#[test]
fn duplicate_system_reports_are_harmless() {
    let (mut store, root, _storage) = fresh();
    store.set_system_theme(Appearance::Dark);
    store.set_system_theme(Appearance::Dark);
    assert_eq!(store.effective_theme(), Appearance::Dark);
    assert!(root.is_dark());
}

#[test]
fn system_change_does_not_write_storage() {
    let (mut store, _root, storage) = fresh();
    store.set_system_theme(Appearance::Dark);
    assert_eq!(storage.get("algomaster.theme").unwrap(), None);
}

// =============================================================================
// toggle_theme
// =============================================================================

#[test]
fn toggle_twice_returns_to_start() {
    for start in [ThemePreference::Light, ThemePreference::Dark] {
        let (mut store, _root, _storage) = fresh();
        store.set_theme(start);
        let before = store.effective_theme();
        store.toggle_theme();
        assert_ne!(store.effective_theme(), before);
        store.toggle_theme();
        assert_eq!(store.effective_theme(), before);
        assert_eq!(store.theme(), start);
    }
}

#[test]
fn toggle_from_system_uses_effective_theme() {
    let (mut store, root, _storage) = fresh();
    store.set_system_theme(Appearance::Light);
    store.toggle_theme();
    assert_eq!(store.theme(), ThemePreference::Dark);
    assert_eq!(store.effective_theme(), Appearance::Dark);
    assert!(root.is_dark());

    let (mut store, _root, _storage) = fresh();
    store.set_system_theme(Appearance::Dark);
    store.toggle_theme();
    assert_eq!(store.theme(), ThemePreference::Light);
}

// =============================================================================
// invariants & scenarios
// =============================================================================

#[test]
fn effective_theme_always_resolved() {
    let (mut store, _root, _storage) = fresh();
    assert_resolved(&store);
    let steps: [&dyn Fn(&mut ThemeStore); 6] = [
        &|s: &mut ThemeStore| s.set_system_theme(Appearance::Dark),
        &|s: &mut ThemeStore| s.set_theme(ThemePreference::Light),
        &|s: &mut ThemeStore| s.toggle_theme(),
        &|s: &mut ThemeStore| s.set_system_theme(Appearance::Light),
        &|s: &mut ThemeStore| s.set_theme(ThemePreference::System),
        &|s: &mut ThemeStore| s.toggle_theme(),
    ];
    for step in steps {
        step(&mut store);
        assert_resolved(&store);
    }
}

#[test]
fn follow_system_then_explicit_choice_holds() {
    let (mut store, root, storage) = fresh();
    assert_eq!(store.theme(), ThemePreference::System);
    store.set_system_theme(Appearance::Light);
    assert_eq!(store.effective_theme(), Appearance::Light);

    store.set_system_theme(Appearance::Dark);
    assert_eq!(store.effective_theme(), Appearance::Dark);
    assert!(root.is_dark());

    store.set_theme(ThemePreference::Light);
    assert_eq!(store.effective_theme(), Appearance::Light);
    assert!(!root.is_dark());
    let persisted: PersistedTheme =
        crate::services::storage::load_json(storage.as_ref(), "algomaster.theme").unwrap().unwrap();
    assert_eq!(persisted.theme, ThemePreference::Light);

    store.set_system_theme(Appearance::Dark);
    assert_eq!(store.effective_theme(), Appearance::Light);
    assert!(!root.is_dark());
}

#[test]
fn subscribers_see_each_change() {
    let (mut store, _root, _storage) = fresh();
    let rx = store.subscribe();
    store.set_system_theme(Appearance::Dark);
    assert_eq!(rx.borrow().effective_theme, Appearance::Dark);
    store.set_theme(ThemePreference::Light);
    assert_eq!(*rx.borrow(), store.state());
}
