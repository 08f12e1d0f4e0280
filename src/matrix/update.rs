//! In-place rewrite of an existing matrix file

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use tracing::{error, info, warn};

use crate::config::MATRIX_FETCH_COUNT;
use crate::json_format::to_string_pretty4;
use crate::matrix::{MatrixError, read_json, write_json};
use crate::version::fetcher::VersionFetcher;
use crate::version::types::{Language, VersionInfo};

/// Which versions replace a language's matrix entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    Stable,
    Latest,
    Both,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Strategy::Stable => "stable",
            Strategy::Latest => "latest",
            Strategy::Both => "both",
        })
    }
}

/// Versions of `info` selected by `strategy`; `Both` lists stable first
pub fn select_versions(info: &VersionInfo, strategy: Strategy) -> Vec<String> {
    let mut versions = Vec::new();
    if matches!(strategy, Strategy::Stable | Strategy::Both)
        && let Some(stable) = &info.stable
    {
        versions.push(stable.clone());
    }
    if matches!(strategy, Strategy::Latest | Strategy::Both)
        && let Some(latest) = &info.latest
        && !versions.contains(latest)
    {
        versions.push(latest.clone());
    }
    versions
}

fn backup_path(json_file: &Path) -> PathBuf {
    let mut name = json_file.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Replace the `versions` lists of `json_file` per language strategy.
///
/// Every other key of the document is kept as is. Languages whose fetch
/// fails or selects nothing keep their current list. Without `dry_run` the
/// current file is first copied to `<json_file>.bak`.
pub async fn update_matrix(
    json_file: &Path,
    strategies: &IndexMap<Language, Strategy>,
    fetchers: &[Box<dyn VersionFetcher>],
    dry_run: bool,
) -> Result<Value, MatrixError> {
    info!("Updating {:?} with strategies: {:?}", json_file, strategies);

    let mut matrix = read_json(json_file)?;
    let Value::Object(document) = &mut matrix else {
        return Err(MatrixError::Invalid(format!(
            "{} is not a JSON object",
            json_file.display()
        )));
    };
    if !document.get("versions").is_some_and(Value::is_object) {
        document.insert("versions".to_string(), Value::Object(Map::new()));
    }

    if !dry_run {
        let backup = backup_path(json_file);
        match std::fs::copy(json_file, &backup) {
            Ok(_) => info!("Created backup at {:?}", backup),
            Err(e) => warn!("Could not create backup: {}", e),
        }
    }

    let mut changes = Vec::new();
    for (&language, &strategy) in strategies {
        let Some(fetcher) = fetchers.iter().find(|f| f.language() == language) else {
            warn!("No fetcher for {}", language);
            continue;
        };
        info!("Processing {} with strategy: {}", language, strategy);

        let info = fetcher.fetch_versions(MATRIX_FETCH_COUNT).await;
        if let Some(message) = info.error() {
            error!("Error updating {} versions: {}", language, message);
            continue;
        }
        let versions = select_versions(&info, strategy);
        if versions.is_empty() {
            warn!("No {} versions found for {}", strategy, language);
            continue;
        }

        info!("Replacing {} versions with: {:?}", language, versions);
        if let Some(Value::Object(lists)) = document.get_mut("versions") {
            lists.insert(language.to_string(), json!(versions));
        }
        changes.push((language, strategy, info, versions));
    }

    if dry_run {
        info!("Dry run - would have written:");
        info!("{}", to_string_pretty4(&matrix)?);
    } else {
        write_json(json_file, &matrix, true)?;
        info!("Successfully updated {:?}", json_file);
    }

    info!("Changes summary:");
    for (language, strategy, info, versions) in &changes {
        info!("- {} ({}):", language, strategy);
        info!("  - Latest: {}", info.latest.as_deref().unwrap_or("none"));
        info!("  - Stable: {}", info.stable.as_deref().unwrap_or("none"));
        info!("  - Set to: {}", versions.join(", "));
    }

    Ok(matrix)
}
