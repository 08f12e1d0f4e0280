//! python.org downloads API (`/api/v2/downloads/release/`)

use serde::Deserialize;

use crate::config::Endpoints;
use crate::version::error::FetchError;
use crate::version::registries::{build_client, get_json};

/// One release as listed by python.org
#[derive(Debug, Clone, Deserialize)]
pub struct PythonRelease {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl PythonRelease {
    /// "Python 3.13.2" -> "3.13.2"
    pub fn version(&self) -> &str {
        self.name.strip_prefix("Python ").unwrap_or(&self.name)
    }

    /// No alpha, beta or release-candidate marker in the version
    pub fn is_stable(&self) -> bool {
        let version = self.version().to_lowercase();
        !["a", "b", "rc"].iter().any(|m| version.contains(m))
    }
}

/// Client for the python.org release listing
pub struct PythonReleasesClient {
    client: reqwest::Client,
    url: String,
}

impl PythonReleasesClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: build_client(None),
            url: url.to_string(),
        }
    }

    /// Published releases, newest release date first
    pub async fn fetch_published(&self) -> Result<Vec<PythonRelease>, FetchError> {
        let releases: Vec<PythonRelease> = get_json(&self.client, &self.url).await?;
        let mut published: Vec<PythonRelease> =
            releases.into_iter().filter(|r| r.is_published).collect();
        // ISO timestamps order lexically
        published.sort_by(|a, b| b.release_date.cmp(&a.release_date));
        Ok(published)
    }
}

impl Default for PythonReleasesClient {
    fn default() -> Self {
        Self::new(&Endpoints::default().python_releases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use rstest::rstest;

    #[rstest]
    #[case("Python 3.13.2", true)]
    #[case("Python 3.14.0a5", false)]
    #[case("Python 3.14.0b1", false)]
    #[case("Python 3.13.0rc3", false)]
    fn is_stable_rejects_pre_releases(#[case] name: &str, #[case] expected: bool) {
        let release = PythonRelease {
            name: name.to_string(),
            is_published: true,
            release_date: None,
        };
        assert_eq!(release.is_stable(), expected);
    }

    #[tokio::test]
    async fn fetch_published_sorts_by_release_date() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v2/downloads/release/")
            .match_query(Matcher::UrlEncoded("is_published".into(), "true".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"name": "Python 3.12.9", "is_published": true, "release_date": "2025-02-04T00:00:00Z"},
                    {"name": "Python 3.14.0a5", "is_published": true, "release_date": "2025-02-11T00:00:00Z"},
                    {"name": "Python 3.13.2", "is_published": true, "release_date": "2025-02-04T12:00:00Z"},
                    {"name": "Python 3.15.0", "is_published": false, "release_date": "2026-10-01T00:00:00Z"}
                ]"#,
            )
            .create_async()
            .await;

        let client = PythonReleasesClient::new(&format!(
            "{}/api/v2/downloads/release/?is_published=true",
            server.url()
        ));
        let releases = client.fetch_published().await.unwrap();

        mock.assert_async().await;
        let versions: Vec<_> = releases.iter().map(|r| r.version()).collect();
        assert_eq!(versions, vec!["3.14.0a5", "3.13.2", "3.12.9"]);
    }
}
