//! Integration tests for SettingsStore
//!
//! Runs the preference and library contract against every backend: memory,
//! JSON file and SQLite. File-backed stores are also reopened to check that
//! values survive.

use librisync_prefs::{
    Background, JsonFileStore, KeyValueStore, LibraryBook, MemoryStore, PreferenceSet,
    SettingsStore, SqliteStore,
};
use serde_json::json;
use tempfile::TempDir;

/// Run `check` once per backend
fn for_each_backend(check: impl Fn(&str, SettingsStore<Box<dyn KeyValueStore>>)) {
    let dir = TempDir::new().expect("Failed to create temp dir");

    let backends: Vec<(&str, Box<dyn KeyValueStore>)> = vec![
        ("memory", Box::new(MemoryStore::new())),
        (
            "json",
            Box::new(JsonFileStore::open(dir.path().join("settings.json")).unwrap()),
        ),
        ("sqlite", Box::new(SqliteStore::open_in_memory().unwrap())),
    ];

    for (name, backend) in backends {
        check(name, SettingsStore::new(backend));
    }
}

#[test]
fn test_defaults_on_empty_backend() {
    for_each_backend(|name, store| {
        let prefs = store.get_settings();
        assert_eq!(prefs.volume, 80, "{}", name);
        assert_eq!(prefs.voice, "Female Voice", "{}", name);
        assert_eq!(prefs.font_size, 16.0, "{}", name);
        assert_eq!(prefs.speed, 1.0, "{}", name);
        assert_eq!(prefs.background, Background::new("White", "#FFFFFF"), "{}", name);
        assert_eq!(prefs.listening_mode, "Once", "{}", name);
        assert_eq!(store.get_reading_time().unwrap(), 0, "{}", name);
        assert!(store.get_library_books().unwrap().is_empty(), "{}", name);
    });
}

#[test]
fn test_preferences_roundtrip() {
    for_each_backend(|name, store| {
        store.save_volume(42).unwrap();
        store.save_voice("Male Voice").unwrap();
        store.save_font_size(22.0).unwrap();
        store.save_speed(0.75).unwrap();
        store.save_background(&Background::new("Sepia", "#F4ECD8")).unwrap();
        store.save_listening_mode("Loop").unwrap();

        let expected = PreferenceSet {
            volume: 42,
            voice: "Male Voice".to_string(),
            font_size: 22.0,
            speed: 0.75,
            background: Background::new("Sepia", "#F4ECD8"),
            listening_mode: "Loop".to_string(),
            reading_time_seconds: 0,
        };
        assert_eq!(store.get_settings(), expected, "{}", name);
    });
}

#[test]
fn test_reading_time_is_absolute() {
    for_each_backend(|name, store| {
        store.update_reading_time(120).unwrap();
        assert_eq!(store.get_reading_time().unwrap(), 120, "{}", name);

        store.update_reading_time(50).unwrap();
        assert_eq!(store.get_reading_time().unwrap(), 50, "{}", name);
    });
}

#[test]
fn test_library_contract() {
    for_each_backend(|name, store| {
        assert!(!store.is_book_in_library("A").unwrap(), "{}", name);

        store.add_book_to_library(LibraryBook::new("A")).unwrap();
        store.add_book_to_library(LibraryBook::new("A")).unwrap();
        assert_eq!(store.get_library_books().unwrap().len(), 1, "{}", name);
        assert!(store.is_book_in_library("A").unwrap(), "{}", name);

        store.add_book_to_library(LibraryBook::new("B")).unwrap();
        store.remove_book_from_library("A").unwrap();
        assert_eq!(
            store.get_library_books().unwrap(),
            vec![LibraryBook::new("B")],
            "{}",
            name
        );
    });
}

#[test]
fn test_library_update_semantics() {
    for_each_backend(|name, store| {
        store
            .add_book_to_library(LibraryBook::new("A").with_field("title", "X"))
            .unwrap();
        store
            .update_book_in_library(LibraryBook::new("A").with_field("title", "Y"))
            .unwrap();

        let books = store.get_library_books().unwrap();
        assert_eq!(books.len(), 1, "{}", name);
        assert_eq!(books[0].title(), Some("Y"), "{}", name);

        let appended = store
            .update_book_in_library(LibraryBook::new("Z").with_field("title", "Q"))
            .unwrap();
        assert!(!appended, "{}", name);
        assert_eq!(store.get_library_books().unwrap().len(), 1, "{}", name);
    });
}

#[test]
fn test_library_uses_shared_key_format() {
    let store = SettingsStore::new(MemoryStore::new());
    store
        .add_book_to_library(
            LibraryBook::new("B07NP9L44Y")
                .with_field("title", "A Mind of Her Own")
                .with_field("chapters", 12),
        )
        .unwrap();

    assert_eq!(
        store.storage().get("user_library_books").unwrap(),
        Some(json!([{"marketId": "B07NP9L44Y", "title": "A Mind of Her Own", "chapters": 12}]))
    );
}

#[test]
fn test_reads_values_written_by_other_clients() {
    // Stored the way the mobile app writes them: plain JSON per key.
    let backend = MemoryStore::new();
    backend.set("user_volume", json!(55)).unwrap();
    backend.set("user_font_size", json!(18)).unwrap();
    backend
        .set("user_background", json!({"name": "Night", "color": "#000000"}))
        .unwrap();
    backend
        .set("user_library_books", json!([{"marketId": "X1", "author": "Nesbo"}]))
        .unwrap();

    let store = SettingsStore::new(backend);
    let prefs = store.get_settings();

    assert_eq!(prefs.volume, 55);
    assert_eq!(prefs.font_size, 18.0);
    assert_eq!(prefs.background, Background::new("Night", "#000000"));
    assert_eq!(
        store.get_library_books().unwrap()[0].field("author"),
        Some(&json!("Nesbo"))
    );
}

#[test]
fn test_json_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");

    {
        let store = SettingsStore::new(JsonFileStore::open(&path).unwrap());
        store.save_voice("Narrator").unwrap();
        store.update_reading_time(900).unwrap();
        store.add_book_to_library(LibraryBook::new("A")).unwrap();
    }

    let store = SettingsStore::new(JsonFileStore::open(&path).unwrap());
    assert_eq!(store.get_settings().voice, "Narrator");
    assert_eq!(store.get_reading_time().unwrap(), 900);
    assert!(store.is_book_in_library("A").unwrap());
}

#[test]
fn test_sqlite_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.db");

    {
        let store = SettingsStore::new(SqliteStore::open(&path).unwrap());
        store.save_listening_mode("Loop").unwrap();
        store.add_book_to_library(LibraryBook::new("A")).unwrap();
        store.into_storage().close().unwrap();
    }

    let store = SettingsStore::new(SqliteStore::open(&path).unwrap());
    assert_eq!(store.get_settings().listening_mode, "Loop");
    assert_eq!(store.get_library_books().unwrap(), vec![LibraryBook::new("A")]);
}
