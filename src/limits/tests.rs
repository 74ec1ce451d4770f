#![allow(clippy::unwrap_used)]

use super::*;

fn store_in(dir: &tempfile::TempDir) -> LimitsStore {
    LimitsStore::new(dir.path().join("default_budget_limits.json"))
}

fn limits(pairs: &[(&str, f64)]) -> CategoryLimits {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

// ── Document I/O ──────────────────────────────────────────────

#[test]
fn test_load_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    assert!(store.load().is_empty());
}

#[test]
fn test_load_corrupt_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("default_budget_limits.json");
    std::fs::write(&path, "{ not json !!").unwrap();
    let store = LimitsStore::new(path);
    assert!(store.load().is_empty());
}

#[test]
fn test_save_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let mut table = LimitsTable::new();
    table.insert("2025-07".into(), limits(&[("food", 250.0), ("transport", 100.0)]));
    table.insert("2025-08".into(), limits(&[("food", 300.0)]));
    store.save(&table).unwrap();

    assert_eq!(store.load(), table);
}

#[test]
fn test_save_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.save(&LimitsTable::new()).unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["default_budget_limits.json"]);
}

// ── Month upsert / clear ──────────────────────────────────────

#[test]
fn test_upsert_month() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    store.upsert_month("2025-07", limits(&[("food", 50.0)])).unwrap();
    store.upsert_month("2025-07", limits(&[("food", 60.0), ("rent", 900.0)])).unwrap();

    let table = store.load();
    assert_eq!(table.len(), 1);
    assert_eq!(table["2025-07"], limits(&[("food", 60.0), ("rent", 900.0)]));
}

#[test]
fn test_upsert_month_rejects_malformed_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let err = store.upsert_month("2025-7", limits(&[("food", 50.0)])).unwrap_err();
    assert!(matches!(err, StoreError::InvalidMonthKey { .. }));
    assert!(store.load().is_empty());
}

#[test]
fn test_empty_month_is_distinct_from_absent() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    store.upsert_month("2025-07", CategoryLimits::new()).unwrap();
    let table = store.load();
    assert!(table.contains_key("2025-07"));
    assert!(table["2025-07"].is_empty());
}

#[test]
fn test_clear_month_removes_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    store.upsert_month("2025-07", CategoryLimits::new()).unwrap();
    store.clear_month("2025-07").unwrap();
    assert!(!store.load().contains_key("2025-07"));
}

#[test]
fn test_clear_absent_month_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.upsert_month("2025-07", limits(&[("food", 50.0)])).unwrap();

    store.clear_month("2099-01").unwrap();
    assert_eq!(store.load().len(), 1);
}

// ── CSV interchange ───────────────────────────────────────────

#[test]
fn test_csv_roundtrip() {
    let src = limits(&[("food", 70.0), ("transport", 50.0), ("groceries", 30.5)]);
    let bytes = to_csv(&src).unwrap();
    let parsed = from_csv(&bytes);
    assert_eq!(parsed, src);
}

#[test]
fn test_csv_writer_sorts_by_category() {
    let src = limits(&[("transport", 50.0), ("food", 70.0)]);
    let bytes = to_csv(&src).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, ["category,limit", "food,70", "transport,50"]);
}

#[test]
fn test_csv_reader_skips_malformed_rows() {
    let data = b"category,limit\nfood,70\n,50\nrent,not-a-number\ntransport,25.5\n";
    let parsed = from_csv(data);
    assert_eq!(parsed, limits(&[("food", 70.0), ("transport", 25.5)]));
}

#[test]
fn test_csv_reader_empty_input() {
    assert!(from_csv(b"").is_empty());
    assert!(from_csv(b"category,limit\n").is_empty());
}

#[test]
fn test_csv_reader_requires_known_header() {
    let data = b"name,value\nfood,70\n";
    assert!(from_csv(data).is_empty());
}
