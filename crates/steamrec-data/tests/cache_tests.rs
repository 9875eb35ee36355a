//! File-backed tests for TableCache and JSON loading

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use steamrec_core::{InputError, ItemKnn, Persist, Predictor};
use steamrec_data::{load_json_table, train_test_split, DataError, TableCache};
use tempfile::TempDir;

const REVIEWS: &str = r#"[
    {"user_id": "76561198000000001", "item_id": 620, "rating": 1.0},
    {"user_id": "76561198000000001", "item_id": 570, "rating": 0.0},
    {"user_id": "76561198000000002", "item_id": 620, "rating": 1.0},
    {"user_id": "76561198000000003", "item_id": 730, "rating": 1.0}
]"#;

/// Helper to write a JSON file and push its mtime forward by `offset_secs`
fn write_table(path: &Path, json: &str, offset_secs: u64) {
    fs::write(path, json).unwrap();
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(offset_secs))
        .unwrap();
}

#[test]
fn test_load_json_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reviews.json");
    write_table(&path, REVIEWS, 0);

    let table = load_json_table(&path).unwrap();
    assert_eq!(table.len(), 4);
    assert_eq!(table.get(3).map(|r| r.item_id), Some("730"));
}

#[test]
fn test_cache_hit_returns_same_table() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reviews.json");
    write_table(&path, REVIEWS, 0);

    let cache = TableCache::new();
    let first = cache.get_or_load(&path).unwrap();
    let second = cache.get_or_load(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_cache_reloads_modified_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reviews.json");
    write_table(&path, REVIEWS, 0);

    let cache = TableCache::new();
    let before = cache.get_or_load(&path).unwrap();
    assert_eq!(before.len(), 4);

    write_table(
        &path,
        r#"[{"user_id": "x", "item_id": "y", "rating": 2.0}]"#,
        60,
    );
    let after = cache.get_or_load(&path).unwrap();
    assert_eq!(after.len(), 1);
    assert!(!Arc::ptr_eq(&before, &after));
    // callers holding the old table keep it
    assert_eq!(before.len(), 4);
}

#[test]
fn test_invalidate_and_clear() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    write_table(&a, REVIEWS, 0);
    write_table(&b, REVIEWS, 0);

    let cache = TableCache::new();
    let first = cache.get_or_load(&a).unwrap();
    cache.get_or_load(&b).unwrap();
    assert_eq!(cache.len(), 2);

    assert!(cache.invalidate(&a));
    assert!(!cache.invalidate(&a));
    assert!(!cache.contains(&a));

    let reloaded = cache.get_or_load(&a).unwrap();
    assert!(!Arc::ptr_eq(&first, &reloaded));

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_separate_caches_are_independent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reviews.json");
    write_table(&path, REVIEWS, 0);

    let one = TableCache::new();
    let two = TableCache::new();
    one.get_or_load(&path).unwrap();
    assert!(two.is_empty());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let cache = TableCache::new();
    let result = cache.get_or_load(dir.path().join("absent.json"));
    assert!(matches!(result, Err(DataError::Io(_))));
    assert!(cache.is_empty());
}

#[test]
fn test_missing_column_is_not_cached() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    write_table(&path, r#"[{"user_id": "x", "rating": 1.0}]"#, 0);

    let cache = TableCache::new();
    let result = cache.get_or_load(&path);
    assert!(matches!(
        result,
        Err(DataError::Input(InputError::MissingColumn(_)))
    ));
    assert!(cache.is_empty());
}

#[test]
fn test_load_split_fit_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reviews.json");
    write_table(&path, REVIEWS, 0);

    let cache = TableCache::new();
    let table = cache.get_or_load(&path).unwrap();
    let (train, test) = train_test_split(&table, 0.25, 42).unwrap();
    assert_eq!(train.len() + test.len(), table.len());

    let mut model = ItemKnn::new();
    model.fit(&train).unwrap();
    let model_path = dir.path().join("item_knn.json");
    model.save(&model_path).unwrap();

    let restored = ItemKnn::load(&model_path).unwrap();
    for record in test.iter() {
        assert_eq!(
            restored.predict(record.user_id, record.item_id),
            model.predict(record.user_id, record.item_id)
        );
    }
}
