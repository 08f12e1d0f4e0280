//! GitHub-tag based version fetchers

#[cfg(test)]
use mockall::automock;

use serde_json::{Map, Value, json};
use tracing::{debug, error, warn};

use crate::config::{DEFAULT_TAG_TARGET, Endpoints};
use crate::version::error::FetchError;
use crate::version::languages::{is_stable_tag, parse_tag};
use crate::version::registries::{GitHubClient, NodeDistClient, RustReleasesClient};
use crate::version::stability::{StabilityHints, is_lts_release, select_stability};
use crate::version::types::{Language, ReleaseInfo, VersionInfo};

/// Trait for fetching the recent releases of one language
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionFetcher: Send + Sync {
    /// Returns the language this fetcher handles
    fn language(&self) -> Language;

    /// Fetches up to `recent_count` recent stable releases
    ///
    /// Failures never propagate: they come back as a [`VersionInfo`] whose
    /// `details` carry `error` and `error_type`.
    async fn fetch_versions(&self, recent_count: usize) -> VersionInfo;
}

/// Fetcher that pages through the language's GitHub tags
pub struct TagFetcher {
    language: Language,
    github: GitHubClient,
    node_dist: NodeDistClient,
    rust_releases: RustReleasesClient,
}

impl TagFetcher {
    pub fn new(language: Language, endpoints: &Endpoints, github_token: Option<&str>) -> Self {
        Self {
            language,
            github: GitHubClient::new(&endpoints.github_api, github_token),
            node_dist: NodeDistClient::new(&endpoints.nodejs_dist),
            rust_releases: RustReleasesClient::new(
                &endpoints.rust_channel,
                &endpoints.rust_releases_md,
            ),
        }
    }

    async fn try_fetch(&self, recent_count: usize) -> Result<VersionInfo, FetchError> {
        let (owner, repo) = self.language.github_repo();
        let target = if recent_count == 0 {
            DEFAULT_TAG_TARGET
        } else {
            recent_count
        };

        let tags = self
            .github
            .fetch_stable_tags(owner, repo, target, |name| {
                is_stable_tag(self.language, name)
            })
            .await?;
        if tags.is_empty() {
            return Ok(VersionInfo::from_error("No releases found", "NoReleases"));
        }

        let releases: Vec<ReleaseInfo> = tags
            .iter()
            .filter_map(|tag| {
                parse_tag(self.language, tag)
                    .inspect_err(|e| debug!("Skipping tag {}: {}", tag.name, e))
                    .ok()
            })
            .collect();
        if releases.is_empty() {
            return Ok(VersionInfo::from_error(
                "Failed to parse any releases",
                "ParseError",
            ));
        }

        let mut extras = Map::new();
        let mut hints = StabilityHints::default();
        match self.language {
            Language::Nodejs => {
                hints.lts_versions = self.lts_versions().await;
                hints.lts_release = self.lts_outside_window(&releases, &hints.lts_versions).await;
                let lts_info: Map<String, Value> = hints
                    .lts_versions
                    .iter()
                    .map(|v| (v.clone(), Value::Bool(true)))
                    .collect();
                extras.insert("lts_info".to_string(), Value::Object(lts_info));
            }
            Language::Rust => {
                let available = self.rust_releases.stable_channel_available().await;
                extras.insert(
                    "channel_info".to_string(),
                    json!({"stable_channel_available": available}),
                );
            }
            _ => {}
        }

        let recent_releases: Vec<ReleaseInfo> = releases.iter().take(target).cloned().collect();
        debug!("Using {} recent releases", recent_releases.len());

        let Some((latest, stable)) = select_stability(self.language, &releases, &hints) else {
            return Ok(VersionInfo::from_error("No releases found", "NoReleases"));
        };

        let mut details = Map::new();
        details.insert(
            "fetch_time".to_string(),
            json!(chrono::Utc::now().to_rfc3339()),
        );
        details.insert("source".to_string(), json!(format!("github:{owner}/{repo}")));
        details.insert("latest_info".to_string(), latest.to_value());
        details.insert("stable_info".to_string(), stable.to_value());
        details.extend(extras);

        Ok(VersionInfo {
            latest: Some(latest.version),
            stable: Some(stable.version),
            recent_releases,
            details,
        })
    }

    async fn lts_versions(&self) -> Vec<String> {
        match self.node_dist.fetch_lts_versions().await {
            Ok(versions) => {
                debug!(
                    "Found current LTS versions: {:?} (total: {})",
                    versions.iter().take(3).collect::<Vec<_>>(),
                    versions.len()
                );
                versions
            }
            Err(e) => {
                warn!("Failed to fetch LTS versions: {}", e);
                Vec::new()
            }
        }
    }

    /// Fetch the newest LTS tag directly when no LTS release is in the window
    async fn lts_outside_window(
        &self,
        releases: &[ReleaseInfo],
        lts_versions: &[String],
    ) -> Option<ReleaseInfo> {
        let in_window = lts_versions
            .iter()
            .any(|lts| releases.iter().any(|r| is_lts_release(r, lts)));
        if in_window {
            return None;
        }

        let newest = lts_versions.first()?;
        let (owner, repo) = self.language.github_repo();
        let tag = self
            .github
            .fetch_tag(owner, repo, &format!("v{newest}"))
            .await
            .inspect_err(|e| warn!("Failed to fetch specific LTS tag: {}", e))
            .ok()?;

        let mut release = parse_tag(self.language, &tag).ok()?;
        release
            .additional_info
            .insert("is_lts".to_string(), Value::Bool(true));
        Some(release)
    }
}

#[async_trait::async_trait]
impl VersionFetcher for TagFetcher {
    fn language(&self) -> Language {
        self.language
    }

    async fn fetch_versions(&self, recent_count: usize) -> VersionInfo {
        match self.try_fetch(recent_count).await {
            Ok(info) => info,
            Err(e) => {
                error!("Error fetching {} versions: {}", self.language, e);
                VersionInfo::from_error(e.to_string(), e.kind())
            }
        }
    }
}

/// One boxed [`TagFetcher`] per language, in the given order
pub fn tag_fetchers(
    languages: &[Language],
    endpoints: &Endpoints,
    github_token: Option<&str>,
) -> Vec<Box<dyn VersionFetcher>> {
    languages
        .iter()
        .map(|&language| {
            Box::new(TagFetcher::new(language, endpoints, github_token)) as Box<dyn VersionFetcher>
        })
        .collect()
}
