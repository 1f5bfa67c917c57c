use super::*;

#[test]
fn memory_set_get_remove() {
    let storage = MemoryStorage::new();
    assert!(storage.is_empty());

    storage.set_item("k", "v").unwrap();
    assert_eq!(storage.get_item("k").as_deref(), Some("v"));
    assert_eq!(storage.len(), 1);

    storage.remove_item("k").unwrap();
    assert_eq!(storage.get_item("k"), None);
    storage.remove_item("k").unwrap();
    assert!(storage.is_empty());
}

#[test]
fn file_storage_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let storage = FileStorage::open(&path).unwrap();
    assert_eq!(storage.get_item("profitwavy_token"), None);
    storage.set_item("profitwavy_token", "t1").unwrap();

    let reopened = FileStorage::open(&path).unwrap();
    assert_eq!(reopened.get_item("profitwavy_token").as_deref(), Some("t1"));
    assert_eq!(reopened.path(), path.as_path());
}

#[test]
fn file_storage_remove_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let storage = FileStorage::open(&path).unwrap();
    storage.set_item("a", "1").unwrap();
    storage.set_item("b", "2").unwrap();
    storage.remove_item("a").unwrap();

    let reopened = FileStorage::open(&path).unwrap();
    assert_eq!(reopened.get_item("a"), None);
    assert_eq!(reopened.get_item("b").as_deref(), Some("2"));
}

#[test]
fn file_storage_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("session.json");

    let storage = FileStorage::open(&path).unwrap();
    storage.set_item("k", "v").unwrap();
    assert!(path.exists());
}

#[test]
fn file_storage_malformed_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{not json").unwrap();

    let storage = FileStorage::open(&path).unwrap();
    assert_eq!(storage.get_item("profitwavy_token"), None);

    storage.set_item("profitwavy_token", "fresh").unwrap();
    let reopened = FileStorage::open(&path).unwrap();
    assert_eq!(reopened.get_item("profitwavy_token").as_deref(), Some("fresh"));
}

#[test]
fn file_storage_unreadable_path_errors() {
    let dir = tempfile::tempdir().unwrap();
    // A directory cannot be read as a file.
    let err = FileStorage::open(dir.path()).unwrap_err();
    assert!(matches!(err, StorageError::Io { .. }));
}

#[test]
fn file_writes_leave_no_staging_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let storage = FileStorage::open(&path).unwrap();
    storage.set_item("profitwavy_token", "t1").unwrap();
    storage.set_item("profitwavy_user", "{}").unwrap();
    storage.remove_item("profitwavy_user").unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("session.json")]);
    let on_disk: BTreeMap<String, String> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk.get("profitwavy_token").map(String::as_str), Some("t1"));
    assert!(!on_disk.contains_key("profitwavy_user"));
}
