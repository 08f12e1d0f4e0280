//! On-disk JSON cache of fetched release data
//!
//! ```text
//! {
//!     "metadata": {"last_updated": "...", "version": "1.1", "version_count": 10},
//!     "languages": {
//!         "python": {"latest": "...", "stable": "...", "recent_releases": [...], "last_updated": "..."}
//!     }
//! }
//! ```
//!
//! `recent_releases` entries are kept as raw JSON. Entries that are not an
//! object with a string `version` are left alone by every operation.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use tracing::{debug, error, info, warn};

use crate::config::CACHE_FORMAT_VERSION;
use crate::json_format::to_string_pretty4;
use crate::version::error::CacheError;
use crate::version::semver::compare_versions;
use crate::version::types::{Language, VersionInfo};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

fn timestamp(now: DateTime<Utc>) -> String {
    now.naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

/// Accepts RFC 3339 and naive ISO timestamps; naive ones are UTC
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// The `version` of a well-formed release entry
fn release_version(release: &Value) -> Option<&str> {
    release.get("version").and_then(Value::as_str)
}

/// Object stored under `key`, replacing anything that is not an object
fn object_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let entry = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    let Value::Object(object) = entry else {
        unreachable!("entry was replaced with an object")
    };
    object
}

pub struct VersionCache {
    path: PathBuf,
    data: Map<String, Value>,
    new_versions_found: IndexMap<String, usize>,
}

impl VersionCache {
    /// Load the cache at `path`.
    ///
    /// A missing or malformed file yields an empty document.
    pub fn load(path: &Path) -> Self {
        let data = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => {
                    debug!("Loaded cache from {:?}", path);
                    Some(map)
                }
                Ok(_) => {
                    warn!("Could not load cache file {:?}: not a JSON object", path);
                    None
                }
                Err(e) => {
                    warn!("Could not load cache file {:?}: {}", path, e);
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Could not load cache file {:?}: {}", path, e);
                None
            }
        };

        Self {
            path: path.to_path_buf(),
            data: data.unwrap_or_else(Self::empty_document),
            new_versions_found: IndexMap::new(),
        }
    }

    fn empty_document() -> Map<String, Value> {
        let mut data = Map::new();
        data.insert(
            "metadata".to_string(),
            json!({
                "last_updated": timestamp(Utc::now()),
                "version": CACHE_FORMAT_VERSION,
            }),
        );
        data.insert("languages".to_string(), Value::Object(Map::new()));
        data
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole document, unknown keys included
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Highest version count ever requested, 0 when never recorded
    pub fn version_count(&self) -> u64 {
        self.data
            .get("metadata")
            .and_then(|m| m.get("version_count"))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Cached entry of `language`, if any
    pub fn language(&self, language: &str) -> Option<&Map<String, Value>> {
        self.data
            .get("languages")
            .and_then(|l| l.get(language))
            .and_then(Value::as_object)
    }

    /// Number of new versions the last merge of each language found
    pub fn new_versions_found(&self) -> &IndexMap<String, usize> {
        &self.new_versions_found
    }

    pub fn is_update_needed(
        &self,
        language: Language,
        max_age_days: i64,
        requested_count: usize,
    ) -> bool {
        self.is_update_needed_at(language, max_age_days, requested_count, Utc::now())
    }

    fn is_update_needed_at(
        &self,
        language: Language,
        max_age_days: i64,
        requested_count: usize,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(entry) = self.language(language.as_str()) else {
            debug!("{}: not cached, update needed", language);
            return true;
        };

        let cached = entry
            .get("recent_releases")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        if cached == 0 {
            debug!("{}: no cached releases, update needed", language);
            return true;
        }
        if requested_count > 0 && cached < requested_count {
            info!(
                "{}: requested version count increased: {} -> {}",
                language, cached, requested_count
            );
            return true;
        }

        let Some(last_updated) = entry
            .get("last_updated")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
        else {
            debug!("{}: missing or invalid last_updated, update needed", language);
            return true;
        };

        let Some(max_age) = Duration::try_days(max_age_days) else {
            debug!("{}: max age of {} day(s) out of range, cache kept", language, max_age_days);
            return false;
        };
        let stale = now - last_updated > max_age;
        if stale {
            debug!("{}: cache older than {} day(s)", language, max_age_days);
        }
        stale
    }

    /// Merge a successful fetch into the cache.
    ///
    /// Returns whether any version was new and the set of new versions.
    /// A `None` latest or stable never overwrites a cached value, and
    /// `metadata.version_count` only ever grows.
    pub fn merge(
        &mut self,
        language: Language,
        info: &VersionInfo,
        count: usize,
        incremental: bool,
    ) -> (bool, BTreeSet<String>) {
        let now = timestamp(Utc::now());
        let key = language.as_str();

        let languages = object_entry(&mut self.data, "languages");
        let entry = object_entry(languages, key);

        let previous = match entry.get("recent_releases") {
            Some(Value::Array(releases)) => releases.clone(),
            _ => Vec::new(),
        };
        let known: HashSet<String> = previous
            .iter()
            .filter_map(release_version)
            .map(str::to_string)
            .collect();

        let new_versions: BTreeSet<String> = info
            .recent_releases
            .iter()
            .map(|r| r.version.clone())
            .filter(|v| !known.contains(v))
            .collect();

        let fetched: Vec<Value> = info.recent_releases.iter().map(|r| r.to_value()).collect();
        let releases = if incremental {
            let mut seen = known;
            let mut merged = previous;
            for release in fetched {
                let version = release_version(&release).map(str::to_string);
                if let Some(version) = version
                    && seen.insert(version)
                {
                    merged.push(release);
                }
            }

            if count > 0 {
                let (mut well_formed, inert): (Vec<Value>, Vec<Value>) = merged
                    .into_iter()
                    .partition(|r| release_version(r).is_some());
                well_formed.sort_by(|a, b| {
                    compare_versions(
                        release_version(b).unwrap_or_default(),
                        release_version(a).unwrap_or_default(),
                    )
                });
                well_formed.truncate(count);
                well_formed.extend(inert);
                well_formed
            } else {
                merged
            }
        } else {
            fetched
        };

        match &info.latest {
            Some(latest) => {
                entry.insert("latest".to_string(), json!(latest));
            }
            None => {
                debug!("{}: keeping cached latest", key);
                entry.entry("latest").or_insert(Value::Null);
            }
        }
        match &info.stable {
            Some(stable) => {
                entry.insert("stable".to_string(), json!(stable));
            }
            None => {
                debug!("{}: keeping cached stable", key);
                entry.entry("stable").or_insert(Value::Null);
            }
        }
        entry.insert("recent_releases".to_string(), Value::Array(releases));
        entry.insert("last_updated".to_string(), json!(now));

        let metadata = object_entry(&mut self.data, "metadata");
        metadata.insert("last_updated".to_string(), json!(now));
        let recorded = metadata
            .get("version_count")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        if count as u64 > recorded {
            metadata.insert("version_count".to_string(), json!(count));
            debug!("version_count raised: {} -> {}", recorded, count);
        }

        self.new_versions_found
            .insert(key.to_string(), new_versions.len());
        (!new_versions.is_empty(), new_versions)
    }

    /// Write the cache, creating parent directories
    pub fn try_save(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let content = to_string_pretty4(&self.data)?;
        std::fs::write(&self.path, content)?;
        info!("Cache saved to {:?}", self.path);
        Ok(())
    }

    /// Like [`try_save`](Self::try_save), but failures are only logged
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            error!("Could not save cache: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::types::ReleaseInfo;
    use tempfile::TempDir;

    fn version_info(latest: Option<&str>, stable: Option<&str>, versions: &[&str]) -> VersionInfo {
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

    fn cache_with(temp_dir: &TempDir, document: Value) -> VersionCache {
        let path = temp_dir.path().join("version_cache.json");
        std::fs::write(&path, document.to_string()).unwrap();
        VersionCache::load(&path)
    }

    fn cached_versions(cache: &VersionCache, language: &str) -> Vec<Value> {
        cache.language(language).unwrap()["recent_releases"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.get("version").cloned().unwrap_or_else(|| r.clone()))
            .collect()
    }

    #[test]
    fn load_missing_file_yields_empty_document() {
        let temp_dir = TempDir::new().unwrap();
        let cache = VersionCache::load(&temp_dir.path().join("absent.json"));

        assert_eq!(cache.data()["metadata"]["version"], json!("1.1"));
        assert!(cache.data()["metadata"]["last_updated"].is_string());
        assert_eq!(cache.data()["languages"], json!({}));
        assert_eq!(cache.version_count(), 0);
    }

    #[test]
    fn load_malformed_file_yields_empty_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("version_cache.json");
        std::fs::write(&path, "{ not json").unwrap();

        let cache = VersionCache::load(&path);

        assert_eq!(cache.data()["languages"], json!({}));
    }

    #[test]
    fn load_preserves_unknown_keys_through_save() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_with(
            &temp_dir,
            json!({"metadata": {"version": "1.1", "version_count": 7}, "languages": {}, "custom": [1, 2]}),
        );
        assert_eq!(cache.version_count(), 7);

        cache.try_save().unwrap();
        let reloaded = VersionCache::load(cache.path());

        assert_eq!(reloaded.data()["custom"], json!([1, 2]));
    }

    #[test]
    fn is_update_needed_checks_presence_count_and_age() {
        let temp_dir = TempDir::new().unwrap();
        let now = Utc::now();
        let cache = cache_with(
            &temp_dir,
            json!({
                "languages": {
                    "go": {
                        "recent_releases": [{"version": "1.24.0"}, {"version": "1.23.6"}],
                        "last_updated": timestamp(now - Duration::hours(2))
                    },
                    "ruby": {"recent_releases": [], "last_updated": timestamp(now)},
                    "rust": {"recent_releases": [{"version": "1.85.0"}], "last_updated": "yesterday"},
                    "nodejs": {"recent_releases": [{"version": "23.10.0"}]}
                }
            }),
        );

        assert!(!cache.is_update_needed_at(Language::Go, 1, 0, now));
        assert!(!cache.is_update_needed_at(Language::Go, 1, 2, now));
        assert!(cache.is_update_needed_at(Language::Go, 1, 3, now));
        assert!(cache.is_update_needed_at(Language::Python, 1, 0, now));
        assert!(cache.is_update_needed_at(Language::Ruby, 1, 0, now));
        assert!(cache.is_update_needed_at(Language::Rust, 1, 0, now));
        assert!(cache.is_update_needed_at(Language::Nodejs, 1, 0, now));
    }

    #[test]
    fn is_update_needed_treats_out_of_range_max_age_as_fresh() {
        let temp_dir = TempDir::new().unwrap();
        let now = Utc::now();
        let cache = cache_with(
            &temp_dir,
            json!({
                "languages": {
                    "go": {
                        "recent_releases": [{"version": "1.24.0"}],
                        "last_updated": timestamp(now - Duration::days(400))
                    }
                }
            }),
        );

        assert!(!cache.is_update_needed_at(Language::Go, i64::MAX, 0, now));
        assert!(cache.is_update_needed_at(Language::Go, 30, 0, now));
    }

    #[test]
    fn is_update_needed_accepts_rfc3339_timestamps() {
        let temp_dir = TempDir::new().unwrap();
        let now = Utc::now();
        let cache = cache_with(
            &temp_dir,
            json!({"languages": {"go": {
                "recent_releases": [{"version": "1.24.0"}],
                "last_updated": (now - Duration::days(3)).to_rfc3339()
            }}}),
        );

        assert!(cache.is_update_needed_at(Language::Go, 1, 0, now));
        assert!(!cache.is_update_needed_at(Language::Go, 7, 0, now));
    }

    #[test]
    fn merge_into_empty_cache_records_everything_as_new() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = VersionCache::load(&temp_dir.path().join("cache.json"));

        let (changed, new_versions) = cache.merge(
            Language::Python,
            &version_info(Some("3.13.2"), Some("3.12.9"), &["3.13.2", "3.12.9"]),
            10,
            false,
        );

        assert!(changed);
        assert_eq!(
            new_versions.into_iter().collect::<Vec<_>>(),
            vec!["3.12.9", "3.13.2"]
        );
        let entry = cache.language("python").unwrap();
        assert_eq!(entry["latest"], json!("3.13.2"));
        assert_eq!(entry["stable"], json!("3.12.9"));
        let keys: Vec<_> = entry.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["latest", "stable", "recent_releases", "last_updated"]);
        assert_eq!(cache.version_count(), 10);
        assert_eq!(cache.new_versions_found()["python"], 2);
    }

    #[test]
    fn merge_non_incremental_replaces_releases() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = cache_with(
            &temp_dir,
            json!({"languages": {"go": {"recent_releases": [{"version": "1.20.0"}, "junk"]}}}),
        );

        cache.merge(
            Language::Go,
            &version_info(Some("1.24.0"), Some("1.23.6"), &["1.24.0", "1.23.6"]),
            5,
            false,
        );

        assert_eq!(
            cached_versions(&cache, "go"),
            vec![json!("1.24.0"), json!("1.23.6")]
        );
    }

    #[test]
    fn merge_incremental_twice_reports_no_change() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = VersionCache::load(&temp_dir.path().join("cache.json"));
        let info = version_info(Some("1.24.0"), Some("1.23.6"), &["1.24.0", "1.23.6"]);

        cache.merge(Language::Go, &info, 5, true);
        let (changed, new_versions) = cache.merge(Language::Go, &info, 5, true);

        assert!(!changed);
        assert!(new_versions.is_empty());
        assert_eq!(cache.new_versions_found()["go"], 0);
    }

    #[test]
    fn merge_keeps_cached_latest_and_stable_when_fetch_has_none() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = cache_with(
            &temp_dir,
            json!({"languages": {"python": {
                "latest": "3.13.0",
                "stable": "3.12.0",
                "recent_releases": [{"version": "3.13.0"}]
            }}}),
        );

        cache.merge(Language::Python, &version_info(None, None, &["3.13.1"]), 0, true);

        let entry = cache.language("python").unwrap();
        assert_eq!(entry["latest"], json!("3.13.0"));
        assert_eq!(entry["stable"], json!("3.12.0"));
    }

    #[test]
    fn merge_incremental_sorts_and_truncates_to_count() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = cache_with(
            &temp_dir,
            json!({"languages": {"python": {
                "recent_releases": [{"version": "3.9.18"}, {"version": "3.11.0"}]
            }}}),
        );

        let (changed, new_versions) = cache.merge(
            Language::Python,
            &version_info(Some("3.13.2"), Some("3.12.9"), &["3.13.2", "3.12.9", "3.10.13"]),
            3,
            true,
        );

        assert!(changed);
        assert_eq!(new_versions.len(), 3);
        assert_eq!(
            cached_versions(&cache, "python"),
            vec![json!("3.13.2"), json!("3.12.9"), json!("3.11.0")]
        );
    }

    #[test]
    fn merge_incremental_leaves_inert_entries_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = cache_with(
            &temp_dir,
            json!({"languages": {"ruby": {
                "recent_releases": ["3.2.0", {"version": "3.3.7"}, {"name": "no version"}]
            }}}),
        );

        let (_, new_versions) = cache.merge(
            Language::Ruby,
            &version_info(Some("3.4.2"), Some("3.3.7"), &["3.4.2", "3.3.7"]),
            1,
            true,
        );

        assert_eq!(new_versions.into_iter().collect::<Vec<_>>(), vec!["3.4.2"]);
        assert_eq!(
            cached_versions(&cache, "ruby"),
            vec![json!("3.4.2"), json!("3.2.0"), json!({"name": "no version"})]
        );
    }

    #[test]
    fn merge_version_count_is_a_high_water_mark() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = VersionCache::load(&temp_dir.path().join("cache.json"));
        let info = version_info(Some("1.85.0"), Some("1.85.0"), &["1.85.0"]);

        cache.merge(Language::Rust, &info, 10, false);
        cache.merge(Language::Rust, &info, 3, false);
        assert_eq!(cache.version_count(), 10);

        cache.merge(Language::Rust, &info, 12, false);
        assert_eq!(cache.version_count(), 12);
    }

    #[test]
    fn save_creates_parent_directories_with_four_space_indent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/version_cache.json");
        let mut cache = VersionCache::load(&path);
        cache.merge(
            Language::Go,
            &version_info(Some("1.24.0"), Some("1.23.6"), &["1.24.0"]),
            1,
            false,
        );

        cache.save();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("{\n    \"metadata\": {\n        \"last_updated\""));
        let reloaded = VersionCache::load(&path);
        assert_eq!(reloaded.language("go").unwrap()["latest"], json!("1.24.0"));
    }

    #[test]
    fn save_swallows_write_failures() {
        let temp_dir = TempDir::new().unwrap();
        // A directory cannot be written as a file
        let cache = VersionCache::load(temp_dir.path());

        assert!(cache.try_save().is_err());
        cache.save();
    }
}
