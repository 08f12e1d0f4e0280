//! Latest/stable selection over a window of fetched releases

use tracing::{info, warn};

use crate::version::normalize::parse_triple;
use crate::version::types::{Language, ReleaseInfo};

/// External facts the Node.js rule needs
#[derive(Debug, Clone, Default)]
pub struct StabilityHints {
    /// LTS versions from the distribution index, newest first, without 'v'
    pub lts_versions: Vec<String>,
    /// Newest LTS release fetched directly when it is outside the window
    pub lts_release: Option<ReleaseInfo>,
}

/// Pick `(latest, stable)` from `releases` (newest first).
///
/// Returns `None` only for an empty window.
pub fn select_stability(
    language: Language,
    releases: &[ReleaseInfo],
    hints: &StabilityHints,
) -> Option<(ReleaseInfo, ReleaseInfo)> {
    let latest = releases.first()?;
    let stable = match language {
        Language::Python | Language::Ruby | Language::Go => previous_minor(releases, latest),
        Language::Rust => {
            info!("For Rust, using latest {} as stable (stable channel)", latest.version);
            latest.clone()
        }
        Language::Nodejs => nodejs_lts(releases, latest, hints),
    };
    Some((latest.clone(), stable))
}

/// First release with the same major and `minor - 1`, else `latest`
fn previous_minor(releases: &[ReleaseInfo], latest: &ReleaseInfo) -> ReleaseInfo {
    if let Ok((major, minor, _)) = parse_triple(&latest.version)
        && let Some(prev_minor) = minor.checked_sub(1)
        && let Some(release) = releases.iter().find(|r| {
            matches!(parse_triple(&r.version), Ok((m, n, _)) if m == major && n == prev_minor)
        })
    {
        info!("Using {} as stable vs latest {}", release.version, latest.version);
        return release.clone();
    }

    info!(
        "No suitable stable version found, using latest {} as stable",
        latest.version
    );
    latest.clone()
}

/// Whether `release` is the LTS version `lts`, by version or by `v`-prefixed tag name
pub(crate) fn is_lts_release(release: &ReleaseInfo, lts: &str) -> bool {
    release.version == lts
        || release
            .additional_info
            .get("tag_name")
            .and_then(|t| t.as_str())
            .and_then(|tag| tag.strip_prefix('v'))
            == Some(lts)
}

fn nodejs_lts(
    releases: &[ReleaseInfo],
    latest: &ReleaseInfo,
    hints: &StabilityHints,
) -> ReleaseInfo {
    for lts in &hints.lts_versions {
        if let Some(release) = releases.iter().find(|r| is_lts_release(r, lts)) {
            info!("Found LTS version in current tags: {}", release.version);
            return release.clone();
        }
    }

    if let Some(release) = &hints.lts_release {
        info!("Using LTS version from API: {}", release.version);
        return release.clone();
    }

    let even_major = releases.iter().find(|r| {
        r.version
            .split('.')
            .next()
            .and_then(|major| major.parse::<u64>().ok())
            .is_some_and(|major| major % 2 == 0)
    });
    if let Some(release) = even_major {
        info!("Using even major version {} as stable", release.version);
        return release.clone();
    }

    warn!(
        "No LTS or even major version found. Using latest {} as stable. Consider increasing --count.",
        latest.version
    );
    latest.clone()
}
