//! Cache file test utilities

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

/// Timestamp in the cache's naive UTC layout
pub fn naive_timestamp(at: DateTime<Utc>) -> String {
    at.naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Cache entry for one language with `versions` newest first
pub fn language_entry(latest: &str, stable: &str, versions: &[&str], last_updated: &str) -> Value {
    let releases: Vec<Value> = versions
        .iter()
        .map(|v| json!({"version": v, "release_date": null, "prerelease": false, "additional_info": {}}))
        .collect();
    json!({
        "latest": latest,
        "stable": stable,
        "recent_releases": releases,
        "last_updated": last_updated,
    })
}

/// Write a cache document holding `languages` into `dir`
pub fn cache_file_with(dir: &Path, languages: Value) -> PathBuf {
    let path = dir.join("cache/version_cache.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let document = json!({
        "metadata": {
            "last_updated": naive_timestamp(Utc::now()),
            "version": "1.1",
        },
        "languages": languages,
    });
    std::fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).unwrap();
    path
}
