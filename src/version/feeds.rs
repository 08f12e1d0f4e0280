//! Official per-language release feeds
//!
//! Unlike [`TagFetcher`](crate::version::fetcher::TagFetcher), these read the
//! projects' own download listings and only report `latest`/`stable`:
//!
//! | language | feed                                   | stable                  |
//! |----------|----------------------------------------|-------------------------|
//! | python   | python.org downloads API               | newest without a/b/rc   |
//! | nodejs   | nodejs.org/dist/index.json             | newest LTS              |
//! | ruby     | ruby-lang.org `_data/downloads.yml`    | first `stable` entry    |
//! | go       | go.dev/dl JSON                         | second newest release   |
//! | rust     | GitHub releases, then `RELEASES.md`    | newest non-prerelease   |

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, error, warn};

use crate::config::Endpoints;
use crate::version::error::FetchError;
use crate::version::registries::go_dl::GoRelease;
use crate::version::registries::python_org::PythonRelease;
use crate::version::registries::{
    GitHubClient, GoDownloadsClient, NodeDistClient, PythonReleasesClient, RubyDownloadsClient,
    RustReleasesClient,
};
use crate::version::types::{Language, VersionInfo};

/// Which version a feed projection reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum VersionType {
    Latest,
    #[default]
    Stable,
    Both,
}

/// Versions of every language that produced one, plus per-language details
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedVersions {
    pub versions: IndexMap<String, Value>,
    pub details: IndexMap<String, Value>,
}

/// Project a feed result onto `version_type`.
///
/// `Both` lists latest then stable, without duplicates. `None` when the
/// feed had nothing to report.
pub fn project(info: &VersionInfo, version_type: VersionType) -> Option<Value> {
    match version_type {
        VersionType::Latest => info.latest.clone().map(Value::String),
        VersionType::Stable => info.stable.clone().map(Value::String),
        VersionType::Both => {
            let mut versions = Vec::new();
            if let Some(latest) = &info.latest {
                versions.push(Value::String(latest.clone()));
            }
            if let Some(stable) = &info.stable
                && info.latest.as_ref() != Some(stable)
            {
                versions.push(Value::String(stable.clone()));
            }
            (!versions.is_empty()).then_some(Value::Array(versions))
        }
    }
}

/// Clients for every release feed
pub struct ReleaseFeeds {
    endpoints: Endpoints,
    github: GitHubClient,
    node_dist: NodeDistClient,
    ruby: RubyDownloadsClient,
    go: GoDownloadsClient,
    python: PythonReleasesClient,
    rust: RustReleasesClient,
}

impl ReleaseFeeds {
    pub fn new(endpoints: &Endpoints, github_token: Option<&str>) -> Self {
        Self {
            endpoints: endpoints.clone(),
            github: GitHubClient::new(&endpoints.github_api, github_token),
            node_dist: NodeDistClient::new(&endpoints.nodejs_dist),
            ruby: RubyDownloadsClient::new(&endpoints.ruby_downloads),
            go: GoDownloadsClient::new(&endpoints.go_downloads),
            python: PythonReleasesClient::new(&endpoints.python_releases),
            rust: RustReleasesClient::new(&endpoints.rust_channel, &endpoints.rust_releases_md),
        }
    }

    /// Fetch one language's feed; failures come back in `details`
    pub async fn fetch(&self, language: Language) -> VersionInfo {
        let result = match language {
            Language::Python => self.python().await,
            Language::Nodejs => self.nodejs().await,
            Language::Ruby => self.ruby().await,
            Language::Go => self.go().await,
            Language::Rust => self.rust().await,
        };
        result.unwrap_or_else(|e| {
            error!("Failed to fetch {} release feed: {}", language, e);
            VersionInfo::from_error(e.to_string(), e.kind())
        })
    }

    /// Fetch the feeds of `languages` and project them onto `version_type`
    pub async fn fetch_all(
        &self,
        languages: &[Language],
        version_type: VersionType,
    ) -> FeedVersions {
        let mut result = FeedVersions::default();
        for &language in languages {
            let info = self.fetch(language).await;
            if let Some(version) = project(&info, version_type) {
                result.versions.insert(language.to_string(), version);
            }
            result
                .details
                .insert(language.to_string(), Value::Object(info.details));
        }
        result
    }

    fn details(source: &str) -> Map<String, Value> {
        let mut details = Map::new();
        details.insert("source".to_string(), json!(source));
        details.insert(
            "fetch_time".to_string(),
            json!(chrono::Utc::now().to_rfc3339()),
        );
        details
    }

    async fn python(&self) -> Result<VersionInfo, FetchError> {
        let releases = self.python.fetch_published().await?;
        let mut info = VersionInfo {
            details: Self::details(&self.endpoints.python_releases),
            ..VersionInfo::default()
        };

        let summary = |r: &PythonRelease| {
            json!({
                "version": r.version(),
                "date": r.release_date.clone().unwrap_or_default(),
                "is_stable": r.is_stable(),
            })
        };

        if let Some(latest) = releases.first() {
            info.latest = Some(latest.version().to_string());
            info.details.insert("latest_info".to_string(), summary(latest));
        }
        if let Some(stable) = releases.iter().find(|r| r.is_stable()) {
            info.stable = Some(stable.version().to_string());
            info.details.insert("stable_info".to_string(), summary(stable));
        }
        Ok(info)
    }

    async fn nodejs(&self) -> Result<VersionInfo, FetchError> {
        let releases = self.node_dist.fetch_index().await?;
        let mut info = VersionInfo {
            details: Self::details(&self.endpoints.nodejs_dist),
            ..VersionInfo::default()
        };
        let Some(latest) = releases.first() else {
            return Ok(info);
        };

        info.latest = Some(latest.bare_version().to_string());
        info.details.insert(
            "latest_info".to_string(),
            json!({
                "version": latest.bare_version(),
                "date": latest.date,
                "is_lts": latest.lts,
                "npm": latest.npm,
                "v8": latest.v8,
            }),
        );

        let lts: Vec<_> = releases.iter().filter(|r| r.is_lts()).collect();
        if let Some(stable) = lts.first() {
            info.stable = Some(stable.bare_version().to_string());
            info.details.insert(
                "stable_info".to_string(),
                json!({
                    "version": stable.bare_version(),
                    "date": stable.date,
                    "lts": stable.lts,
                    "npm": stable.npm,
                    "v8": stable.v8,
                }),
            );
        }

        info.details.insert(
            "recent_versions".to_string(),
            json!({
                "all": releases.iter().take(5).map(|r| r.bare_version()).collect::<Vec<_>>(),
                "lts": lts.iter().take(5).map(|r| r.bare_version()).collect::<Vec<_>>(),
            }),
        );
        Ok(info)
    }

    async fn ruby(&self) -> Result<VersionInfo, FetchError> {
        let downloads = self.ruby.fetch().await?;
        let mut info = VersionInfo {
            details: Self::details(&self.endpoints.ruby_downloads),
            ..VersionInfo::default()
        };
        info.details
            .insert("preview_versions".to_string(), json!(downloads.preview));
        info.details
            .insert("stable_versions".to_string(), json!(downloads.stable));
        info.details.insert(
            "security_maintenance_versions".to_string(),
            json!(downloads.security_maintenance),
        );
        info.details
            .insert("eol_versions".to_string(), json!(downloads.eol));

        if let Some(preview) = downloads.preview.first() {
            info.latest = Some(preview.clone());
            info.details.insert(
                "latest_info".to_string(),
                json!({"version": preview, "type": "preview"}),
            );
        }
        if let Some(stable) = downloads.stable.first() {
            info.stable = Some(stable.clone());
            info.details.insert(
                "stable_info".to_string(),
                json!({"version": stable, "type": "stable", "all_stable": downloads.stable}),
            );
            if info.latest.is_none() {
                info.latest = Some(stable.clone());
                info.details.insert(
                    "latest_info".to_string(),
                    json!({"version": stable, "type": "stable"}),
                );
            }
        }
        Ok(info)
    }

    async fn go(&self) -> Result<VersionInfo, FetchError> {
        let releases = self.go.fetch_releases().await?;
        let mut info = VersionInfo {
            details: Self::details(&self.endpoints.go_downloads),
            ..VersionInfo::default()
        };

        let summary = |r: &GoRelease, stable: bool| {
            json!({
                "version": r.bare_version(),
                "stable": stable,
                "files_count": r.files.len(),
                "files_sample": r.files.iter().take(3).map(|f| f.filename.as_str()).collect::<Vec<_>>(),
                "available_platforms": r.platforms(),
            })
        };

        if let Some(latest) = releases.first() {
            info.latest = Some(latest.bare_version().to_string());
            info.details
                .insert("latest_info".to_string(), summary(latest, latest.stable));
        }
        if let Some(stable) = releases.get(1) {
            info.stable = Some(stable.bare_version().to_string());
            info.details
                .insert("stable_info".to_string(), summary(stable, true));
        }
        if releases.is_empty() {
            return Ok(info);
        }

        info.details.insert(
            "versions".to_string(),
            json!({
                "total_count": releases.len(),
                "recent": {
                    "all": releases.iter().take(5).map(|r| r.bare_version()).collect::<Vec<_>>()
                },
            }),
        );

        let mut branches: IndexMap<String, Vec<String>> = IndexMap::new();
        for release in &releases {
            let version = release.bare_version();
            let minor = version.split('.').take(2).collect::<Vec<_>>().join(".");
            let branch = branches.entry(minor).or_default();
            if branch.len() < 3 {
                branch.push(version.to_string());
            }
        }
        info.details
            .insert("version_branches".to_string(), json!(branches));
        Ok(info)
    }

    async fn rust(&self) -> Result<VersionInfo, FetchError> {
        let (owner, repo) = Language::Rust.github_repo();
        match self.github.fetch_releases(owner, repo).await {
            Ok(releases) if !releases.is_empty() => {
                let tag = |name: &str| name.trim_start_matches('v').to_string();
                let latest = tag(&releases[0].tag_name);
                let stable = releases
                    .iter()
                    .find(|r| !r.prerelease)
                    .map(|r| tag(&r.tag_name))
                    .unwrap_or_else(|| latest.clone());

                let mut details = Map::new();
                details.insert("source".to_string(), json!("github_api"));
                details.insert(
                    "release_date".to_string(),
                    json!(
                        releases[0]
                            .published_at
                            .as_deref()
                            .and_then(|d| d.split('T').next())
                            .unwrap_or_default()
                    ),
                );
                details.insert(
                    "recent_versions".to_string(),
                    json!(releases.iter().take(5).map(|r| tag(&r.tag_name)).collect::<Vec<_>>()),
                );
                return Ok(VersionInfo {
                    latest: Some(latest),
                    stable: Some(stable),
                    recent_releases: Vec::new(),
                    details,
                });
            }
            Ok(_) => debug!("No Rust releases on GitHub, falling back to RELEASES.md"),
            Err(e) => warn!("Failed to fetch Rust releases from GitHub: {}", e),
        }

        let headings = self.rust.fetch_release_headings().await?;
        let mut info = VersionInfo::default();
        info.details
            .insert("source".to_string(), json!("releases_md"));
        if let Some(newest) = headings.first() {
            info.latest = Some(newest.version.clone());
            info.stable = Some(newest.version.clone());
            if let Some(date) = &newest.date {
                info.details
                    .insert("release_date".to_string(), json!(date));
            }
            info.details.insert(
                "recent_versions".to_string(),
                json!(headings.iter().take(5).map(|h| h.version.as_str()).collect::<Vec<_>>()),
            );
        }
        Ok(info)
    }
}
