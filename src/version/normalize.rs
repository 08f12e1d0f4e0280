//! Version string cleanup, pre-release detection and date normalization

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::version::error::ParseError;

/// Prefixes stripped from raw tag names. Longer candidates come first so
/// that `version1.2.3` is not treated as `v` + `ersion1.2.3`.
const VERSION_PREFIXES: &[&str] = &["version", "python", "node", "ruby", "rust", "go", "v"];

const PRERELEASE_MARKERS: &[&str] = &[
    "alpha",
    "beta",
    "rc",
    "dev",
    "preview",
    "pre",
    "nightly",
    "snapshot",
    "test",
    "experimental",
];

const FALLBACK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

static TRIPLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").expect("Invalid regex"));

static UNDERSCORE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("Invalid regex"));

/// Clean a raw tag or version string.
///
/// Strips one known prefix, turns `_` separators into `.` (runs of
/// underscores count as one) and drops a leading `.`.
///
/// Examples:
/// - "v1.2.3" -> "1.2.3"
/// - "v3_0_0" -> "3.0.0"
/// - "go1.22.1" -> "1.22.1"
pub fn clean(version: &str) -> String {
    let lowered = version.trim().to_lowercase();
    let stripped = VERSION_PREFIXES
        .iter()
        .find_map(|prefix| lowered.strip_prefix(prefix))
        .unwrap_or(&lowered);

    let dotted = UNDERSCORE_RUN.replace_all(stripped, ".");
    dotted.trim_start_matches('.').trim().to_string()
}

/// Parse an exact `major.minor.patch` triple after cleaning.
pub fn parse_triple(version: &str) -> Result<(u64, u64, u64), ParseError> {
    let cleaned = clean(version);
    let invalid = || ParseError::InvalidFormat(cleaned.clone());

    let caps = TRIPLE.captures(&cleaned).ok_or_else(invalid)?;
    let part = |i: usize| caps[i].parse::<u64>().map_err(|_| invalid());

    Ok((part(1)?, part(2)?, part(3)?))
}

/// Whether a version string carries a pre-release marker.
///
/// This is a plain substring test, so a stable version that happens to
/// contain one of the markers is reported as a pre-release.
pub fn is_prerelease(version: &str) -> bool {
    let lowered = version.to_lowercase();
    PRERELEASE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Normalize a date string to `YYYY-MM-DD`.
pub fn standardize_date(date: Option<&str>) -> Option<String> {
    let raw = date.map(str::trim).filter(|d| !d.is_empty())?;

    parse_iso(raw)
        .or_else(|| {
            FALLBACK_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_iso(raw: &str) -> Option<NaiveDate> {
    // A trailing `Z` is UTC, same as `+00:00`.
    let utc = raw.strip_suffix('Z').or_else(|| raw.strip_suffix("+00:00"));

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }

    let naive = utc.unwrap_or(raw);
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            utc.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        })
}
