//! Node.js distribution index (`nodejs.org/dist/index.json`)

use serde::Deserialize;
use serde_json::Value;

use crate::config::Endpoints;
use crate::version::error::FetchError;
use crate::version::registries::{build_client, get_json};
use crate::version::semver::compare_feed_versions;

/// One entry of the distribution index
#[derive(Debug, Clone, Deserialize)]
pub struct NodeRelease {
    pub version: String,
    #[serde(default)]
    pub date: Option<String>,
    /// `false` or the LTS codename
    #[serde(default)]
    pub lts: Value,
    #[serde(default)]
    pub npm: Option<String>,
    #[serde(default)]
    pub v8: Option<String>,
}

impl NodeRelease {
    /// Version without the leading 'v'
    pub fn bare_version(&self) -> &str {
        self.version.trim_start_matches('v')
    }

    pub fn is_lts(&self) -> bool {
        match &self.lts {
            Value::Bool(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Null => false,
            _ => true,
        }
    }
}

/// Client for the Node.js distribution index
pub struct NodeDistClient {
    client: reqwest::Client,
    url: String,
}

impl NodeDistClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: build_client(None),
            url: url.to_string(),
        }
    }

    /// Fetch the index sorted newest first
    pub async fn fetch_index(&self) -> Result<Vec<NodeRelease>, FetchError> {
        let mut releases: Vec<NodeRelease> = get_json(&self.client, &self.url).await?;
        releases.sort_by(|a, b| compare_feed_versions(b.bare_version(), a.bare_version()));
        Ok(releases)
    }

    /// LTS versions without the 'v' prefix, newest first
    pub async fn fetch_lts_versions(&self) -> Result<Vec<String>, FetchError> {
        Ok(self
            .fetch_index()
            .await?
            .iter()
            .filter(|r| r.is_lts())
            .map(|r| r.bare_version().to_string())
            .collect())
    }
}

impl Default for NodeDistClient {
    fn default() -> Self {
        Self::new(&Endpoints::default().nodejs_dist)
    }
}
