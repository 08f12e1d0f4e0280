mod helper;

use chrono::{TimeDelta, Utc};
use serde_json::{Map, json};
use tempfile::TempDir;

use helper::{cache_file_with, language_entry, naive_timestamp};
use version_matrix::version::cache::VersionCache;
use version_matrix::version::types::{Language, ReleaseInfo, VersionInfo};

fn fetched(latest: Option<&str>, stable: Option<&str>, versions: &[&str]) -> VersionInfo {
    VersionInfo {
        latest: latest.map(str::to_string),
        stable: stable.map(str::to_string),
        recent_releases: versions
            .iter()
            .map(|v| ReleaseInfo::new(v, None, false, Map::new()))
            .collect(),
        details: Map::new(),
    }
}

#[test]
fn load_without_file_yields_empty_document() {
    let temp_dir = TempDir::new().unwrap();
    let cache = VersionCache::load(&temp_dir.path().join("version_cache.json"));

    assert_eq!(cache.data()["metadata"]["version"], json!("1.1"));
    assert!(cache.data()["metadata"]["last_updated"].is_string());
    assert_eq!(cache.data()["languages"], json!({}));
    assert_eq!(cache.version_count(), 0);
}

#[test]
fn is_update_needed_follows_last_updated_age() {
    let temp_dir = TempDir::new().unwrap();
    let two_days_ago = naive_timestamp(Utc::now() - TimeDelta::days(2));
    let now = naive_timestamp(Utc::now());
    let path = cache_file_with(
        temp_dir.path(),
        json!({
            "go": language_entry("1.24.1", "1.23.6", &["1.24.1", "1.23.6"], &two_days_ago),
            "rust": language_entry("1.85.0", "1.85.0", &["1.85.0"], &now),
        }),
    );

    let cache = VersionCache::load(&path);

    assert!(cache.is_update_needed(Language::Go, 1, 0));
    assert!(!cache.is_update_needed(Language::Rust, 1, 0));
    assert!(cache.is_update_needed(Language::Rust, 1, 5));
    assert!(cache.is_update_needed(Language::Python, 1, 0));
}

#[test]
fn merge_keeps_cached_latest_when_fetch_has_none() {
    let temp_dir = TempDir::new().unwrap();
    let now = naive_timestamp(Utc::now());
    let path = cache_file_with(
        temp_dir.path(),
        json!({"python": language_entry("3.13.0", "3.12.0", &["3.13.0", "3.12.0"], &now)}),
    );
    let mut cache = VersionCache::load(&path);

    cache.merge(
        Language::Python,
        &fetched(None, Some("3.12.9"), &["3.12.9"]),
        0,
        true,
    );

    let entry = cache.language("python").unwrap();
    assert_eq!(entry["latest"], json!("3.13.0"));
    assert_eq!(entry["stable"], json!("3.12.9"));
}

#[test]
fn incremental_merge_twice_reports_no_change() {
    let temp_dir = TempDir::new().unwrap();
    let mut cache = VersionCache::load(&temp_dir.path().join("version_cache.json"));
    let info = fetched(Some("22.14.0"), Some("22.14.0"), &["22.14.0", "20.18.3"]);

    let (first, _) = cache.merge(Language::Nodejs, &info, 0, true);
    let (second, new_versions) = cache.merge(Language::Nodejs, &info, 0, true);

    assert!(first);
    assert!(!second);
    assert!(new_versions.is_empty());
}

#[test]
fn incremental_merge_with_count_keeps_highest_versions() {
    let temp_dir = TempDir::new().unwrap();
    let mut cache = VersionCache::load(&temp_dir.path().join("version_cache.json"));
    cache.merge(
        Language::Ruby,
        &fetched(Some("3.3.6"), Some("3.2.6"), &["3.3.6", "3.2.6"]),
        0,
        true,
    );

    cache.merge(
        Language::Ruby,
        &fetched(Some("3.4.2"), Some("3.3.7"), &["3.4.2", "3.4.1", "3.3.7"]),
        3,
        true,
    );

    let versions: Vec<_> = cache.language("ruby").unwrap()["recent_releases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["version"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(versions, vec!["3.4.2", "3.4.1", "3.3.7"]);
}

#[test]
fn version_count_is_a_high_water_mark() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("version_cache.json");
    let mut cache = VersionCache::load(&path);
    let info = fetched(Some("1.85.0"), Some("1.85.0"), &["1.85.0"]);

    cache.merge(Language::Rust, &info, 10, false);
    cache.merge(Language::Rust, &info, 3, false);
    cache.try_save().unwrap();

    let reloaded = VersionCache::load(&path);
    assert_eq!(reloaded.version_count(), 10);
}

#[test]
fn save_preserves_unknown_keys() {
    let temp_dir = TempDir::new().unwrap();
    let path = cache_file_with(temp_dir.path(), json!({}));
    let mut document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    document["custom"] = json!({"owner": "ci"});
    std::fs::write(&path, document.to_string()).unwrap();

    let mut cache = VersionCache::load(&path);
    cache.merge(
        Language::Go,
        &fetched(Some("1.24.1"), Some("1.23.6"), &["1.24.1"]),
        0,
        false,
    );
    cache.try_save().unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["custom"], json!({"owner": "ci"}));
    assert_eq!(saved["languages"]["go"]["latest"], json!("1.24.1"));
}
