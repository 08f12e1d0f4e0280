//! Fetcher test utilities

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Map;

use version_matrix::version::fetcher::VersionFetcher;
use version_matrix::version::types::{Language, ReleaseInfo, VersionInfo};

/// Fetcher returning a canned result and counting its calls
pub struct StubFetcher {
    language: Language,
    result: VersionInfo,
    calls: Arc<AtomicUsize>,
}

impl StubFetcher {
    /// Fetcher reporting `versions`, newest first; latest is the first and
    /// stable the second when present
    pub fn with_versions(language: Language, versions: &[&str]) -> Self {
        let recent_releases = versions
            .iter()
            .map(|v| ReleaseInfo::new(v, Some("2025-02-04"), false, Map::new()))
            .collect();
        let result = VersionInfo {
            latest: versions.first().map(|v| v.to_string()),
            stable: versions
                .get(1)
                .or(versions.first())
                .map(|v| v.to_string()),
            recent_releases,
            details: Map::new(),
        };
        Self::with_result(language, result)
    }

    /// Fetcher that hits the GitHub rate limit
    pub fn rate_limited(language: Language) -> Self {
        Self::with_result(
            language,
            VersionInfo::from_error("GitHub API rate limit exceeded", "RateLimited"),
        )
    }

    pub fn with_result(language: Language, result: VersionInfo) -> Self {
        Self {
            language,
            result,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle to the call counter, usable after the fetcher is boxed
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn boxed(self) -> Box<dyn VersionFetcher> {
        Box::new(self)
    }
}

#[async_trait]
impl VersionFetcher for StubFetcher {
    fn language(&self) -> Language {
        self.language
    }

    async fn fetch_versions(&self, recent_count: usize) -> VersionInfo {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut result = self.result.clone();
        if recent_count > 0 {
            result.recent_releases.truncate(recent_count);
        }
        result
    }
}
