//! Version template generation from the cache

use std::path::Path;

use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::config::{DEFAULT_GHPAGES_BRANCH, DEFAULT_OS};
use crate::matrix::{MatrixError, read_json, write_json};
use crate::version::semver::sort_descending;

/// Order of each language's version list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateOptions {
    /// Languages to emit; every cached language when `None`
    pub languages: Option<Vec<String>>,
    /// Carry the existing template's list for languages without data
    pub keep_existing: bool,
    pub sort: SortOrder,
    /// Keep only the newest N versions per language
    pub max_versions: Option<usize>,
}

/// Non-prerelease versions of `entry`, with stable and latest added.
///
/// Empty when the entry has no release window at all. A window holding only
/// prereleases still yields stable and latest.
fn collect_versions(entry: &Map<String, Value>) -> Vec<String> {
    let releases = entry
        .get("recent_releases")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if releases.is_empty() {
        return Vec::new();
    }

    let mut versions: Vec<String> = Vec::new();
    for release in releases {
        let prerelease = release
            .get("prerelease")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if let Some(version) = release.get("version").and_then(Value::as_str)
            && !prerelease
            && !versions.iter().any(|v| v == version)
        {
            versions.push(version.to_string());
        }
    }

    let stable = entry.get("stable").and_then(Value::as_str);
    let latest = entry.get("latest").and_then(Value::as_str);
    if let Some(stable) = stable
        && !versions.iter().any(|v| v == stable)
    {
        versions.insert(0, stable.to_string());
    }
    if let Some(latest) = latest
        && latest != stable.unwrap_or_default()
        && !versions.iter().any(|v| v == latest)
    {
        versions.insert(0, latest.to_string());
    }
    versions
}

/// Sort `versions`, keeping only the newest `max_versions` when given
fn order_versions(
    language: &str,
    mut versions: Vec<String>,
    sort: SortOrder,
    max_versions: Option<usize>,
) -> Vec<String> {
    sort_descending(&mut versions);
    if let Some(max) = max_versions
        && max < versions.len()
    {
        info!(
            "Limiting {} versions from {} to {}",
            language,
            versions.len(),
            max
        );
        versions.truncate(max);
    }
    if sort == SortOrder::Asc {
        versions.reverse();
    }
    versions
}

/// Build the template document.
///
/// `existing` is a previously generated template; its `os` and
/// `ghpages_branch` are reused.
pub fn build_template(
    cache: &Map<String, Value>,
    existing: Option<&Value>,
    options: &TemplateOptions,
) -> Value {
    let os = existing
        .and_then(|e| e.get("os"))
        .cloned()
        .unwrap_or_else(|| json!(DEFAULT_OS));
    let ghpages_branch = existing
        .and_then(|e| e.get("ghpages_branch"))
        .cloned()
        .unwrap_or_else(|| json!(DEFAULT_GHPAGES_BRANCH));

    let cached = cache.get("languages").and_then(Value::as_object);
    let languages: Vec<String> = match &options.languages {
        Some(selected) => selected.clone(),
        None => cached
            .map(|l| l.keys().cloned().collect())
            .unwrap_or_default(),
    };

    let mut versions = Map::new();
    for language in languages {
        let collected = cached
            .and_then(|l| l.get(&language))
            .and_then(Value::as_object)
            .map(collect_versions)
            .unwrap_or_default();

        if !collected.is_empty() {
            let ordered = order_versions(&language, collected, options.sort, options.max_versions);
            info!(
                "Added {} versions to template ({} versions, {:?} order)",
                language,
                ordered.len(),
                options.sort
            );
            versions.insert(language, json!(ordered));
            continue;
        }

        let previous = existing
            .and_then(|e| e.get("versions"))
            .and_then(|v| v.get(&language));
        match previous {
            Some(previous) if options.keep_existing => {
                info!("Maintained existing {} versions", language);
                versions.insert(language, previous.clone());
            }
            _ => {
                warn!("No versions found for {}", language);
                versions.insert(language, json!([]));
            }
        }
    }

    json!({
        "os": os,
        "versions": versions,
        "ghpages_branch": ghpages_branch,
    })
}

/// Generate the template from `cache` and write it to `output`.
///
/// An unreadable or malformed `existing` file is ignored with a warning.
pub fn generate_template(
    cache: &Map<String, Value>,
    output: &Path,
    existing: Option<&Path>,
    options: &TemplateOptions,
) -> Result<Value, MatrixError> {
    let existing = existing.filter(|p| p.exists()).and_then(|path| {
        read_json(path)
            .inspect(|_| info!("Maintained structure from existing file: {:?}", path))
            .inspect_err(|e| warn!("Could not load existing file: {}", e))
            .ok()
            .filter(Value::is_object)
    });

    let template = build_template(cache, existing.as_ref(), options);
    write_json(output, &template, false)?;
    info!("Version template written to {:?}", output);
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn cache(languages: Value) -> Map<String, Value> {
        let Value::Object(map) = json!({"metadata": {}, "languages": languages}) else {
            unreachable!()
        };
        map
    }

    fn python_cache() -> Map<String, Value> {
        cache(json!({
            "python": {
                "latest": "3.11.0",
                "stable": "3.10.0",
                "recent_releases": [{"version": "3.11.0"}, {"version": "3.10.0"}]
            }
        }))
    }

    #[rstest]
    #[case(SortOrder::Desc, json!(["3.11.0", "3.10.0"]))]
    #[case(SortOrder::Asc, json!(["3.10.0", "3.11.0"]))]
    fn build_template_sorts_versions(#[case] sort: SortOrder, #[case] expected: Value) {
        let options = TemplateOptions {
            sort,
            ..TemplateOptions::default()
        };

        let template = build_template(&python_cache(), None, &options);

        assert_eq!(template["versions"]["python"], expected);
        assert_eq!(template["os"], json!(DEFAULT_OS));
        assert_eq!(template["ghpages_branch"], json!("ghpages"));
    }

    #[test]
    fn build_template_adds_stable_and_latest_and_skips_prereleases() {
        let data = cache(json!({
            "go": {
                "latest": "1.24.1",
                "stable": "1.23.6",
                "recent_releases": [
                    {"version": "1.24.0", "prerelease": false},
                    {"version": "1.25.0rc1", "prerelease": true},
                    {"version": "1.24.0"},
                    "inert"
                ]
            }
        }));

        let template = build_template(&data, None, &TemplateOptions::default());

        assert_eq!(
            template["versions"]["go"],
            json!(["1.24.1", "1.24.0", "1.23.6"])
        );
    }

    #[rstest]
    #[case::prereleases_only(
        json!([{"version": "3.14.0a1", "prerelease": true}, "inert"]),
        None,
        json!(["3.14.0", "3.13.2"])
    )]
    #[case::stable_and_latest_outside_capped_window(
        json!([{"version": "3.12.9"}, {"version": "3.12.8"}, {"version": "3.11.11"}]),
        Some(3),
        json!(["3.14.0", "3.13.2", "3.12.9"])
    )]
    fn build_template_always_includes_stable_and_latest(
        #[case] releases: Value,
        #[case] max_versions: Option<usize>,
        #[case] expected: Value,
    ) {
        let data = cache(json!({
            "python": {"latest": "3.14.0", "stable": "3.13.2", "recent_releases": releases}
        }));
        let options = TemplateOptions {
            max_versions,
            ..TemplateOptions::default()
        };

        let template = build_template(&data, None, &options);

        assert_eq!(template["versions"]["python"], expected);
    }

    #[test]
    fn build_template_caps_to_newest_versions() {
        let data = cache(json!({
            "rust": {
                "latest": "1.85.0",
                "stable": "1.85.0",
                "recent_releases": [
                    {"version": "1.83.0"}, {"version": "1.85.0"}, {"version": "1.84.1"}, {"version": "1.84.0"}
                ]
            }
        }));
        let options = TemplateOptions {
            sort: SortOrder::Asc,
            max_versions: Some(2),
            ..TemplateOptions::default()
        };

        let template = build_template(&data, None, &options);

        assert_eq!(template["versions"]["rust"], json!(["1.84.1", "1.85.0"]));
    }

    #[test]
    fn build_template_reuses_existing_structure() {
        let existing = json!({
            "os": ["ubuntu-latest"],
            "versions": {"ruby": ["3.3.0"]},
            "ghpages_branch": "gh-pages"
        });
        let options = TemplateOptions {
            languages: Some(vec!["python".to_string(), "ruby".to_string()]),
            keep_existing: true,
            ..TemplateOptions::default()
        };

        let template = build_template(&python_cache(), Some(&existing), &options);

        assert_eq!(template["os"], json!(["ubuntu-latest"]));
        assert_eq!(template["ghpages_branch"], json!("gh-pages"));
        assert_eq!(template["versions"]["ruby"], json!(["3.3.0"]));
    }

    #[test]
    fn build_template_emits_empty_list_without_data() {
        let existing = json!({"versions": {"ruby": ["3.3.0"]}});
        let options = TemplateOptions {
            languages: Some(vec!["ruby".to_string()]),
            keep_existing: false,
            ..TemplateOptions::default()
        };

        let template = build_template(&python_cache(), Some(&existing), &options);

        assert_eq!(template["versions"], json!({"ruby": []}));
    }

    #[test]
    fn generate_template_ignores_malformed_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let existing = temp_dir.path().join("template.json");
        std::fs::write(&existing, "{ broken").unwrap();
        let output = temp_dir.path().join("out/version_template.json");

        let template = generate_template(
            &python_cache(),
            &output,
            Some(&existing),
            &TemplateOptions::default(),
        )
        .unwrap();

        assert_eq!(template["os"], json!(DEFAULT_OS));
        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written, template);
    }

    #[test]
    fn generate_template_keeps_key_order() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("version_template.json");

        generate_template(&python_cache(), &output, None, &TemplateOptions::default()).unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        let os = content.find("\"os\"").unwrap();
        let versions = content.find("\"versions\"").unwrap();
        let branch = content.find("\"ghpages_branch\"").unwrap();
        assert!(os < versions && versions < branch);
    }
}
