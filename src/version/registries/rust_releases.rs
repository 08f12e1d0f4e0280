//! Rust release channel manifest and `RELEASES.md`

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::config::Endpoints;
use crate::version::error::FetchError;
use crate::version::registries::{build_client, ensure_success, get_text};
use crate::version::semver::compare_versions;

static RELEASE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Version\s+(\d+\.\d+\.\d+)(?:\s+\(([^)]*)\))?").expect("Invalid regex")
});

/// A `Version X.Y.Z (date)` heading of `RELEASES.md`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseHeading {
    pub version: String,
    pub date: Option<String>,
}

/// Every release heading in `content`, highest version first
pub fn parse_releases_md(content: &str) -> Vec<ReleaseHeading> {
    let mut headings: Vec<ReleaseHeading> = RELEASE_HEADING
        .captures_iter(content)
        .map(|c| ReleaseHeading {
            version: c[1].to_string(),
            date: c.get(2).map(|m| m.as_str().to_string()),
        })
        .collect();
    headings.sort_by(|a, b| compare_versions(&b.version, &a.version));
    headings.dedup_by(|a, b| a.version == b.version);
    headings
}

/// Client for static.rust-lang.org and the Rust release notes
pub struct RustReleasesClient {
    client: reqwest::Client,
    channel_url: String,
    releases_md_url: String,
}

impl RustReleasesClient {
    pub fn new(channel_url: &str, releases_md_url: &str) -> Self {
        Self {
            client: build_client(None),
            channel_url: channel_url.to_string(),
            releases_md_url: releases_md_url.to_string(),
        }
    }

    /// Whether the stable channel manifest is reachable
    pub async fn stable_channel_available(&self) -> bool {
        let response = match self.client.get(&self.channel_url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to fetch Rust channel information: {}", e);
                return false;
            }
        };
        ensure_success(response)
            .await
            .inspect_err(|e| warn!("Failed to fetch Rust channel information: {}", e))
            .is_ok()
    }

    pub async fn fetch_release_headings(&self) -> Result<Vec<ReleaseHeading>, FetchError> {
        let content = get_text(&self.client, &self.releases_md_url).await?;
        Ok(parse_releases_md(&content))
    }
}

impl Default for RustReleasesClient {
    fn default() -> Self {
        let endpoints = Endpoints::default();
        Self::new(&endpoints.rust_channel, &endpoints.rust_releases_md)
    }
}
