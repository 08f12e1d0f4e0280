use std::cmp::Ordering;

use semver::Version;

/// One dot-separated group of a version sort key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyPart {
    /// Digit-only group, compared numerically
    Num(u64),
    /// Anything else, compared as a string. Sorts after every number.
    Text(String),
}

/// Numeric-first sort key shared by cache merging and template generation.
///
/// `-` is treated like `.`, so "1.2.3-rc1" -> [1, 2, 3, "rc1"].
pub fn version_sort_key(version: &str) -> Vec<KeyPart> {
    version
        .replace('-', ".")
        .split('.')
        .map(|part| match part.parse::<u64>() {
            Ok(n) if part.bytes().all(|b| b.is_ascii_digit()) => KeyPart::Num(n),
            _ => KeyPart::Text(part.to_string()),
        })
        .collect()
}

/// Compare two version strings by [`version_sort_key`]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    version_sort_key(a).cmp(&version_sort_key(b))
}

/// Sort version strings newest first
pub fn sort_descending(versions: &mut [String]) {
    versions.sort_by(|a, b| compare_versions(b, a));
}

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros.
/// A leading 'v' or 'go' is dropped.
///
/// Examples:
/// - "v22" -> Version(22, 0, 0)
/// - "go1.22" -> Version(1, 22, 0)
/// - "1.2.3" -> Version(1, 2, 3)
pub fn parse_version(version: &str) -> Option<Version> {
    let version = version
        .strip_prefix("go")
        .or_else(|| version.strip_prefix('v'))
        .unwrap_or(version);
    let parts: Vec<&str> = version.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// Order two release-feed versions, unparseable ones last
pub fn compare_feed_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}
