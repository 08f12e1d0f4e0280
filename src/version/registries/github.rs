//! GitHub REST API client: tags, git refs and releases

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{DEFAULT_TAG_TARGET, MAX_TAG_PAGES, TAGS_PER_PAGE};
use crate::version::error::FetchError;
use crate::version::registries::{build_client, ensure_success, get_json};

/// Commit a tag points to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagCommit {
    #[serde(default)]
    pub sha: Option<String>,
}

/// One entry of `GET /repos/{owner}/{repo}/tags`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitHubTag {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub commit: TagCommit,
    #[serde(default)]
    pub tarball_url: Option<String>,
    #[serde(default)]
    pub zipball_url: Option<String>,
}

/// One entry of `GET /repos/{owner}/{repo}/releases`
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub published_at: Option<String>,
}

/// Object a git ref or annotated tag points to
#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
    #[serde(rename = "type")]
    kind: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitObject,
}

/// Client for the GitHub REST API
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    /// Creates a new client against `base_url`, authenticated when a token is given
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            client: build_client(token),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Page through the repository tags until `count` of them pass
    /// `is_stable`, a page comes back empty or short, or the page cap is hit.
    ///
    /// A `count` of zero means [`DEFAULT_TAG_TARGET`]. At most `count`
    /// tags are returned, newest first as GitHub lists them.
    pub async fn fetch_stable_tags(
        &self,
        owner: &str,
        repo: &str,
        count: usize,
        is_stable: impl Fn(&str) -> bool,
    ) -> Result<Vec<GitHubTag>, FetchError> {
        let target = if count == 0 { DEFAULT_TAG_TARGET } else { count };
        let url = format!("{}/repos/{}/{}/tags", self.base_url, owner, repo);
        let mut stable_tags = Vec::new();

        debug!("Fetching stable tags for {}/{} (target: {})", owner, repo, target);

        for page in 1..=MAX_TAG_PAGES {
            if stable_tags.len() >= target {
                break;
            }

            let response = self
                .client
                .get(&url)
                .query(&[("page", page), ("per_page", TAGS_PER_PAGE)])
                .send()
                .await?;
            let tags: Vec<GitHubTag> = ensure_success(response)
                .await?
                .json()
                .await
                .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

            debug!("Got {} tags from page {}", tags.len(), page);
            if tags.is_empty() {
                break;
            }

            let page_len = tags.len();
            let accepted: Vec<GitHubTag> =
                tags.into_iter().filter(|tag| is_stable(&tag.name)).collect();
            debug!(
                "Found {} stable tags on page {} (first: {:?})",
                accepted.len(),
                page,
                accepted.iter().take(3).map(|t| t.name.as_str()).collect::<Vec<_>>()
            );
            stable_tags.extend(accepted);

            if page_len < TAGS_PER_PAGE {
                break;
            }
        }

        stable_tags.truncate(target);
        debug!("Returning {} stable tags", stable_tags.len());
        Ok(stable_tags)
    }

    /// Resolve a single tag by name through the git refs API.
    ///
    /// Annotated tags are followed to the commit they point at.
    pub async fn fetch_tag(
        &self,
        owner: &str,
        repo: &str,
        tag_name: &str,
    ) -> Result<GitHubTag, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/git/refs/tags/{}",
            self.base_url, owner, repo, tag_name
        );
        let git_ref: GitRef = get_json(&self.client, &url).await?;

        let sha = if git_ref.object.kind == "tag" {
            let tag_object: GitRef = get_json(&self.client, &git_ref.object.url).await?;
            tag_object.object.sha
        } else {
            git_ref.object.sha
        };

        Ok(GitHubTag {
            name: tag_name.to_string(),
            commit: TagCommit { sha: Some(sha) },
            ..GitHubTag::default()
        })
    }

    /// Fetch the first page of repository releases, newest first
    pub async fn fetch_releases(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<GitHubRelease>, FetchError> {
        let url = format!("{}/repos/{}/{}/releases", self.base_url, owner, repo);
        get_json(&self.client, &url).await
    }
}
