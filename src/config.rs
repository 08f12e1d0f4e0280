use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

// =============================================================================
// File locations
// =============================================================================

/// Default cache document path
pub const DEFAULT_CACHE_FILE: &str = ".github/workflows/cache/version_cache.json";

/// Default template document path
pub const DEFAULT_TEMPLATE_FILE: &str = ".github/workflows/cache/version_template.json";

/// Default matrix rewritten by `update-matrix`
pub const DEFAULT_MATRIX_FILE: &str = ".github/workflows/matrix.json";

/// Default output directory for feed-generated matrices
pub const DEFAULT_FEED_OUTPUT_DIR: &str = ".github/workflows";

// =============================================================================
// Template defaults
// =============================================================================

pub const DEFAULT_OS: [&str; 3] = ["ubuntu-latest", "windows-latest", "macos-latest"];

pub const DEFAULT_GHPAGES_BRANCH: &str = "ghpages";

/// Format version written to `metadata.version` of a fresh cache
pub const CACHE_FORMAT_VERSION: &str = "1.1";

// =============================================================================
// Fetch limits
// =============================================================================

/// Timeout applied to every HTTP request (10 seconds)
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Tags requested per GitHub page
pub const TAGS_PER_PAGE: usize = 100;

/// Upper bound on GitHub tag pages per fetch
pub const MAX_TAG_PAGES: usize = 5;

/// Target used when a fetch asks for zero tags
pub const DEFAULT_TAG_TARGET: usize = 5;

/// Default number of versions cached per language
pub const DEFAULT_VERSION_COUNT: usize = 10;

/// Default cache age in days before a refresh
pub const DEFAULT_MAX_AGE_DAYS: i64 = 1;

/// Releases fetched per language by `update-matrix`
pub const MATRIX_FETCH_COUNT: usize = 5;

pub const USER_AGENT: &str = "version-matrix";

/// Environment variable holding an optional GitHub token
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Environment variable naming the GitHub Actions output file
pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Tool configuration loaded from an optional JSON file
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub endpoints: Endpoints,
}

/// Base URLs of every remote service the fetchers talk to
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Endpoints {
    pub github_api: String,
    pub nodejs_dist: String,
    pub ruby_downloads: String,
    pub go_downloads: String,
    pub python_releases: String,
    pub rust_channel: String,
    pub rust_releases_md: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            github_api: "https://api.github.com".to_string(),
            nodejs_dist: "https://nodejs.org/dist/index.json".to_string(),
            ruby_downloads:
                "https://raw.githubusercontent.com/ruby/www.ruby-lang.org/master/_data/downloads.yml"
                    .to_string(),
            go_downloads: "https://go.dev/dl/?mode=json".to_string(),
            python_releases:
                "https://www.python.org/api/v2/downloads/release/?is_published=true".to_string(),
            rust_channel: "https://static.rust-lang.org/dist/channel-rust-stable.toml".to_string(),
            rust_releases_md:
                "https://raw.githubusercontent.com/rust-lang/rust/master/RELEASES.md".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Returns the GitHub token from the environment, if set and non-blank.
pub fn github_token() -> Option<String> {
    github_token_with_env(std::env::var(GITHUB_TOKEN_ENV).ok())
}

fn github_token_with_env(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.trim().is_empty())
}

/// Returns the path to the file named by `GITHUB_OUTPUT`.
pub fn github_output_path() -> Option<PathBuf> {
    std::env::var_os(GITHUB_OUTPUT_ENV).map(PathBuf::from)
}
