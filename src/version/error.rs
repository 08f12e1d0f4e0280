use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid version format: {0}")]
    InvalidFormat(String),

    #[error("No tag name found")]
    MissingTagName,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error(
        "GitHub API rate limit exceeded. Please set GITHUB_TOKEN environment variable or wait for rate limit reset."
    )]
    RateLimited,

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Short machine-readable name stored as `error_type` in fetch details
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "Network",
            FetchError::RateLimited => "RateLimited",
            FetchError::Status { .. } => "Status",
            FetchError::NotFound(_) => "NotFound",
            FetchError::InvalidResponse(_) => "InvalidResponse",
        }
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FetchError::RateLimited, "RateLimited")]
    #[case(FetchError::Status { status: 500, url: "u".to_string() }, "Status")]
    #[case(FetchError::NotFound("x".to_string()), "NotFound")]
    #[case(FetchError::InvalidResponse("bad".to_string()), "InvalidResponse")]
    fn kind_names_each_variant(#[case] error: FetchError, #[case] expected: &str) {
        assert_eq!(error.kind(), expected);
    }

    #[test]
    fn rate_limited_message_mentions_rate_limit() {
        let message = FetchError::RateLimited.to_string().to_lowercase();
        assert!(message.contains("rate limit exceeded"));
    }
}
