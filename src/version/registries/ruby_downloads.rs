//! Ruby downloads listing (`_data/downloads.yml` of ruby/www.ruby-lang.org)

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::config::Endpoints;
use crate::version::error::FetchError;
use crate::version::registries::{build_client, get_text};

static TRIPLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\d+\.\d+)").expect("Invalid regex"));

/// Release sections of the downloads file, newest first within each
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RubyDownloads {
    pub preview: Vec<String>,
    pub stable: Vec<String>,
    pub security_maintenance: Vec<String>,
    pub eol: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDownloads {
    preview: Option<Vec<serde_yaml::Value>>,
    stable: Option<Vec<serde_yaml::Value>>,
    security_maintenance: Option<Vec<serde_yaml::Value>>,
    eol: Option<Vec<serde_yaml::Value>>,
}

/// Keep the `X.Y.Z` prefix of every entry, dropping anything without one.
///
/// "3.4.0-preview2" -> "3.4.0"
fn versions_of(section: Option<Vec<serde_yaml::Value>>) -> Vec<String> {
    section
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match value {
            serde_yaml::Value::String(s) => Some(s),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter_map(|s| TRIPLE.captures(s.trim()).map(|c| c[1].to_string()))
        .collect()
}

impl RubyDownloads {
    pub fn parse(content: &str) -> Result<Self, FetchError> {
        let raw: RawDownloads = serde_yaml::from_str(content).map_err(|e| {
            warn!("Failed to parse Ruby downloads YAML: {}", e);
            FetchError::InvalidResponse(e.to_string())
        })?;
        Ok(Self {
            preview: versions_of(raw.preview),
            stable: versions_of(raw.stable),
            security_maintenance: versions_of(raw.security_maintenance),
            eol: versions_of(raw.eol),
        })
    }
}

/// Client for the Ruby downloads listing
pub struct RubyDownloadsClient {
    client: reqwest::Client,
    url: String,
}

impl RubyDownloadsClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: build_client(None),
            url: url.to_string(),
        }
    }

    pub async fn fetch(&self) -> Result<RubyDownloads, FetchError> {
        let content = get_text(&self.client, &self.url).await?;
        RubyDownloads::parse(&content)
    }
}

impl Default for RubyDownloadsClient {
    fn default() -> Self {
        Self::new(&Endpoints::default().ruby_downloads)
    }
}
