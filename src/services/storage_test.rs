use super::*;

// =============================================================================
// scoped_key
// =============================================================================

#[test]
fn scoped_key_joins_namespace_and_name() {
    assert_eq!(scoped_key("algomaster", "auth"), "algomaster.auth");
    assert_eq!(scoped_key("algomaster", "theme"), "algomaster.theme");
}

// =============================================================================
// MemoryStorage
// =============================================================================

#[test]
fn memory_get_missing_is_none() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get("nope").unwrap(), None);
}

#[test]
fn memory_last_write_wins() {
    let storage = MemoryStorage::new();
    storage.set("k", "one").unwrap();
    storage.set("k", "two").unwrap();
    assert_eq!(storage.get("k").unwrap().as_deref(), Some("two"));
}

#[test]
fn load_json_missing_key_is_none() {
    let storage = MemoryStorage::new();
    let loaded: Option<serde_json::Value> = load_json(&storage, "absent").unwrap();
    assert!(loaded.is_none());
}

#[test]
fn save_then_load_json() {
    let storage = MemoryStorage::new();
    save_json(&storage, "k", &serde_json::json!({ "theme": "dark" })).unwrap();
    let loaded: Option<serde_json::Value> = load_json(&storage, "k").unwrap();
    assert_eq!(loaded, Some(serde_json::json!({ "theme": "dark" })));
}

#[test]
fn load_json_garbage_is_json_error() {
    let storage = MemoryStorage::new();
    storage.set("k", "{not json").unwrap();
    let err = load_json::<serde_json::Value>(&storage, "k").unwrap_err();
    assert!(matches!(err, PersistenceError::Json { ref key, .. } if key == "k"));
    assert_eq!(err.error_code(), "E_PERSISTENCE");
    assert!(!err.retryable());
}

// =============================================================================
// FileStorage
// =============================================================================

#[test]
fn file_get_missing_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(dir.path()).unwrap();
    assert_eq!(storage.get("algomaster.auth").unwrap(), None);
}

#[test]
fn file_set_writes_key_file() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(dir.path()).unwrap();
    storage.set("algomaster.theme", r#"{"theme":"dark"}"#).unwrap();

    let on_disk = std::fs::read_to_string(dir.path().join("algomaster.theme.json")).unwrap();
    assert_eq!(on_disk, r#"{"theme":"dark"}"#);
    assert!(!dir.path().join("algomaster.theme.json.tmp").exists());
}

#[test]
fn file_values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let storage = FileStorage::open(dir.path()).unwrap();
        storage.set("algomaster.auth", "first").unwrap();
        storage.set("algomaster.auth", "second").unwrap();
    }
    let reopened = FileStorage::open(dir.path()).unwrap();
    assert_eq!(reopened.get("algomaster.auth").unwrap().as_deref(), Some("second"));
}

#[test]
fn file_open_creates_nested_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let storage = FileStorage::open(&nested).unwrap();
    assert!(nested.is_dir());
    assert_eq!(storage.root(), nested.as_path());
}

#[test]
fn file_rejects_path_like_keys() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(dir.path()).unwrap();
    for key in ["", "../escape", "a/b", ".hidden", "a\\b"] {
        let err = storage.set(key, "x").unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidKey(_)), "key {key:?} should be rejected");
    }
}
