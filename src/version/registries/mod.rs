//! HTTP clients for GitHub and the per-language release feeds

pub mod github;
pub mod go_dl;
pub mod nodejs_dist;
pub mod python_org;
pub mod ruby_downloads;
pub mod rust_releases;

pub use github::GitHubClient;
pub use go_dl::GoDownloadsClient;
pub use nodejs_dist::NodeDistClient;
pub use python_org::PythonReleasesClient;
pub use ruby_downloads::RubyDownloadsClient;
pub use rust_releases::RustReleasesClient;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use tracing::warn;

use crate::config::{HTTP_TIMEOUT, USER_AGENT};
use crate::version::error::FetchError;

/// Build the shared HTTP client: user agent, 10s timeout and, when a
/// token is given, the GitHub `Authorization` header.
pub(crate) fn build_client(github_token: Option<&str>) -> reqwest::Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github.v3+json"),
    );
    if let Some(token) = github_token
        && let Ok(value) = HeaderValue::from_str(&format!("token {token}"))
    {
        headers.insert(AUTHORIZATION, value);
    }

    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(HTTP_TIMEOUT)
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// Turn a non-success response into the matching [`FetchError`].
///
/// GitHub answers an exhausted quota with 403 and a "rate limit exceeded"
/// message, other services with 429.
pub(crate) async fn ensure_success(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();

    if status == StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound(url));
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::RateLimited);
    }

    if status == StatusCode::FORBIDDEN {
        let body = response.text().await.unwrap_or_default();
        if body.to_lowercase().contains("rate limit exceeded") {
            return Err(FetchError::RateLimited);
        }
    }

    warn!("{} returned status {}", url, status);
    Err(FetchError::Status {
        status: status.as_u16(),
        url,
    })
}

/// GET `url` and decode the JSON body
pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, FetchError> {
    let response = ensure_success(client.get(url).send().await?).await?;
    response.json().await.map_err(|e| {
        warn!("Failed to parse response from {}: {}", url, e);
        FetchError::InvalidResponse(e.to_string())
    })
}

/// GET `url` and return the body as text
pub(crate) async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let response = ensure_success(client.get(url).send().await?).await?;
    Ok(response.text().await?)
}
