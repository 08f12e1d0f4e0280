//! Per-language GitHub tag rules
//!
//! Each language tags its releases differently:
//! - python: `v3.12.1`
//! - nodejs: `v22.14.0`
//! - ruby:   `v3_3_0`
//! - go:     `go1.24.0`
//! - rust:   `1.85.0`

use serde_json::{Map, Value, json};

use crate::version::error::ParseError;
use crate::version::registries::github::GitHubTag;
use crate::version::types::{Language, ReleaseInfo};

const PYTHON_UNSTABLE: &[&str] = &[
    "a", "rc", "b", "beta", "alpha", "pre", "preview", "dev", "test", "nightly", "snapshot",
];
const NODEJS_UNSTABLE: &[&str] = &["rc", "alpha", "beta", "nightly", "test", "next", "experimental"];
const RUBY_GO_UNSTABLE: &[&str] = &["rc", "alpha", "beta", "preview", "pre", "test", "dev", "snapshot"];
const RUST_UNSTABLE: &[&str] = &["beta", "alpha", "rc", "nightly", "dev", "test", "pre"];

fn has_marker(name: &str, markers: &[&str]) -> bool {
    let lower = name.to_lowercase();
    markers.iter().any(|m| lower.contains(m))
}

/// Whether `name` is a production release tag for `language`
pub fn is_stable_tag(language: Language, name: &str) -> bool {
    match language {
        Language::Python => {
            (name.starts_with("v3") || name.starts_with("v4")) && !has_marker(name, PYTHON_UNSTABLE)
        }
        Language::Nodejs => {
            name.starts_with('v')
                && name.split('.').count() == 3
                && !has_marker(name, NODEJS_UNSTABLE)
        }
        Language::Ruby => {
            name.starts_with('v')
                && name.split('_').count() == 3
                && !has_marker(name, RUBY_GO_UNSTABLE)
        }
        Language::Go => {
            name.starts_with("go")
                && name.replace("go", "").split('.').count() == 3
                && !has_marker(name, RUBY_GO_UNSTABLE)
        }
        Language::Rust => {
            name.starts_with("1.")
                && name.split('.').count() == 3
                && !has_marker(name, RUST_UNSTABLE)
        }
    }
}

/// Turn an accepted tag into a release.
///
/// The version is the cleaned tag name; tag metadata goes to
/// `additional_info`.
pub fn parse_tag(language: Language, tag: &GitHubTag) -> Result<ReleaseInfo, ParseError> {
    let name = tag.name.trim();
    if name.is_empty() {
        return Err(ParseError::MissingTagName);
    }

    let mut info = Map::new();
    info.insert("tag_name".to_string(), json!(name));
    info.insert("commit".to_string(), json!({"sha": tag.commit.sha}));
    if language == Language::Nodejs {
        info.insert("is_lts".to_string(), Value::Bool(false));
    }
    info.insert("tarball_url".to_string(), json!(tag.tarball_url));
    info.insert("zipball_url".to_string(), json!(tag.zipball_url));

    let release = ReleaseInfo::new(name, None, false, info);
    if release.version.is_empty() {
        return Err(ParseError::InvalidFormat(name.to_string()));
    }
    Ok(release)
}
