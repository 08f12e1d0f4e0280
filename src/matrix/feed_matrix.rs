//! Matrix files built from the official release feeds

use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tracing::info;

use crate::config::{DEFAULT_GHPAGES_BRANCH, DEFAULT_OS};
use crate::matrix::{MatrixError, write_json};
use crate::version::feeds::FeedVersions;
use crate::version::types::Language;

/// File name for a matrix of all languages, or of `language` only
pub fn matrix_file_name(language: Option<Language>) -> String {
    match language {
        Some(language) => format!("matrix-{language}-stable.json"),
        None => "matrix-stable.json".to_string(),
    }
}

/// Matrix document with the default `os` and `ghpages_branch`.
///
/// With `language` set, only that language's versions are kept.
pub fn build_matrix(feeds: &FeedVersions, language: Option<Language>) -> Value {
    let versions: serde_json::Map<String, Value> = feeds
        .versions
        .iter()
        .filter(|(name, _)| language.is_none_or(|l| l.as_str() == name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    json!({
        "os": DEFAULT_OS,
        "versions": versions,
        "ghpages_branch": DEFAULT_GHPAGES_BRANCH,
    })
}

/// Write the feed matrix into `output_dir`, returning the file written
pub fn generate_matrix(
    output_dir: &Path,
    language: Option<Language>,
    feeds: &FeedVersions,
) -> Result<PathBuf, MatrixError> {
    let matrix = build_matrix(feeds, language);
    let path = output_dir.join(matrix_file_name(language));
    write_json(&path, &matrix, false)?;
    info!("Matrix written to {:?}", path);
    Ok(path)
}
