//! Cache refresh from the tag fetchers

use indexmap::IndexMap;
use tracing::{error, info, warn};

use crate::config::{DEFAULT_MAX_AGE_DAYS, DEFAULT_VERSION_COUNT, GITHUB_TOKEN_ENV};
use crate::version::cache::VersionCache;
use crate::version::fetcher::VersionFetcher;

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Refetch even when the cache is fresh
    pub force: bool,
    pub max_age_days: i64,
    /// Number of recent releases to fetch and keep
    pub count: usize,
    /// Append to the cached releases instead of replacing them
    pub incremental: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            force: false,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            count: DEFAULT_VERSION_COUNT,
            incremental: false,
        }
    }
}

/// Outcome of one refresh run, by language
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
    pub new_versions: IndexMap<String, Vec<String>>,
    pub rate_limited: bool,
}

impl UpdateSummary {
    fn log(&self) {
        info!("Update summary:");
        info!("  Updated: {}", self.updated.join(", "));
        info!("  Unchanged: {}", self.unchanged.join(", "));
        if !self.skipped.is_empty() {
            info!("  Skipped (rate limit): {}", self.skipped.join(", "));
        }
        if !self.failed.is_empty() {
            info!("  Failed: {}", self.failed.join(", "));
        }
        for (language, versions) in &self.new_versions {
            info!("  New {} versions: {}", language, versions.join(", "));
        }
        if self.rate_limited {
            warn!(
                "GitHub API rate limit was hit. Set {} to raise the limit.",
                GITHUB_TOKEN_ENV
            );
        }
    }
}

/// Refresh `cache` from `fetchers`, one language at a time.
///
/// Fresh languages are left alone unless forced. Once any language hits the
/// GitHub rate limit, the remaining ones are skipped. A failed fetch never
/// touches the cached entry. The cache is saved once at the end.
pub async fn update_versions(
    cache: &mut VersionCache,
    fetchers: &[Box<dyn VersionFetcher>],
    options: &UpdateOptions,
) -> UpdateSummary {
    let mut summary = UpdateSummary::default();

    for fetcher in fetchers {
        let language = fetcher.language();
        let name = language.to_string();

        if !options.force && !cache.is_update_needed(language, options.max_age_days, options.count)
        {
            info!("{}: cache is fresh, skipping", language);
            summary.unchanged.push(name);
            continue;
        }
        if summary.rate_limited {
            warn!("{}: skipped because of the GitHub API rate limit", language);
            summary.skipped.push(name);
            continue;
        }

        info!("{}: fetching {} recent releases", language, options.count);
        let info = fetcher.fetch_versions(options.count).await;

        if let Some(message) = info.error() {
            error!("{}: {}", language, message);
            if info.is_rate_limited() {
                summary.rate_limited = true;
            }
            summary.failed.push(name);
            continue;
        }

        let (changed, new_versions) =
            cache.merge(language, &info, options.count, options.incremental);
        if changed {
            info!("{}: {} new version(s)", language, new_versions.len());
            summary
                .new_versions
                .insert(name.clone(), new_versions.into_iter().collect());
            summary.updated.push(name);
        } else {
            info!("{}: no new versions", language);
            summary.unchanged.push(name);
        }
    }

    cache.save();
    summary.log();
    summary
}
