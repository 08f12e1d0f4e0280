//! Common types for fetched release data

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::version::normalize::{clean, is_prerelease, standardize_date};

/// Languages whose release versions are tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    Python,
    Nodejs,
    Ruby,
    Go,
    Rust,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Python,
        Language::Nodejs,
        Language::Ruby,
        Language::Go,
        Language::Rust,
    ];

    /// Returns the string representation used as cache and template key
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Nodejs => "nodejs",
            Language::Ruby => "ruby",
            Language::Go => "go",
            Language::Rust => "rust",
        }
    }

    /// GitHub `(owner, repo)` holding the language's release tags
    pub fn github_repo(&self) -> (&'static str, &'static str) {
        match self {
            Language::Python => ("python", "cpython"),
            Language::Nodejs => ("nodejs", "node"),
            Language::Ruby => ("ruby", "ruby"),
            Language::Go => ("golang", "go"),
            Language::Rust => ("rust-lang", "rust"),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "python" => Ok(Language::Python),
            "nodejs" => Ok(Language::Nodejs),
            "ruby" => Ok(Language::Ruby),
            "go" => Ok(Language::Go),
            "rust" => Ok(Language::Rust),
            other => Err(format!("Unsupported language: {other}")),
        }
    }
}

/// One concrete release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub version: String,
    pub release_date: Option<String>,
    pub prerelease: bool,
    #[serde(default)]
    pub additional_info: Map<String, Value>,
}

impl ReleaseInfo {
    /// Build a release, normalizing the version and date.
    ///
    /// `prerelease` is forced on when the cleaned version carries a
    /// pre-release marker.
    pub fn new(
        version: &str,
        release_date: Option<&str>,
        prerelease: bool,
        additional_info: Map<String, Value>,
    ) -> Self {
        let version = clean(version);
        let prerelease = prerelease || is_prerelease(&version);
        Self {
            release_date: standardize_date(release_date),
            prerelease,
            version,
            additional_info,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Aggregated result of one fetch for one language
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VersionInfo {
    pub latest: Option<String>,
    pub stable: Option<String>,
    pub recent_releases: Vec<ReleaseInfo>,
    pub details: Map<String, Value>,
}

impl VersionInfo {
    /// A result that only carries an error description
    pub fn from_error(message: impl Into<String>, error_type: &str) -> Self {
        let mut details = Map::new();
        details.insert("error".to_string(), Value::String(message.into()));
        details.insert("error_type".to_string(), Value::String(error_type.to_string()));
        Self {
            details,
            ..Self::default()
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.details.get("error").and_then(Value::as_str)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.details.get("error_type").and_then(Value::as_str) == Some("RateLimited")
    }
}
