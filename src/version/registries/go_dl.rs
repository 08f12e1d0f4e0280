//! Go downloads listing (`go.dev/dl/?mode=json`)

use serde::Deserialize;

use crate::config::Endpoints;
use crate::version::error::FetchError;
use crate::version::registries::{build_client, get_json};
use crate::version::semver::compare_feed_versions;

#[derive(Debug, Clone, Deserialize)]
pub struct GoFile {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub kind: String,
}

/// One Go release with its downloadable files
#[derive(Debug, Clone, Deserialize)]
pub struct GoRelease {
    pub version: String,
    #[serde(default = "default_stable")]
    pub stable: bool,
    #[serde(default)]
    pub files: Vec<GoFile>,
}

fn default_stable() -> bool {
    true
}

impl GoRelease {
    /// Version without the leading "go"
    pub fn bare_version(&self) -> &str {
        self.version.strip_prefix("go").unwrap_or(&self.version)
    }

    /// Sorted, deduplicated operating systems with a download
    pub fn platforms(&self) -> Vec<String> {
        let mut platforms: Vec<String> = self
            .files
            .iter()
            .filter(|f| !f.os.is_empty())
            .map(|f| f.os.clone())
            .collect();
        platforms.sort();
        platforms.dedup();
        platforms
    }
}

/// Client for the Go downloads listing
pub struct GoDownloadsClient {
    client: reqwest::Client,
    url: String,
}

impl GoDownloadsClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: build_client(None),
            url: url.to_string(),
        }
    }

    /// Fetch the listing sorted newest first
    pub async fn fetch_releases(&self) -> Result<Vec<GoRelease>, FetchError> {
        let mut releases: Vec<GoRelease> = get_json(&self.client, &self.url).await?;
        releases.sort_by(|a, b| compare_feed_versions(b.bare_version(), a.bare_version()));
        Ok(releases)
    }
}

impl Default for GoDownloadsClient {
    fn default() -> Self {
        Self::new(&Endpoints::default().go_downloads)
    }
}
