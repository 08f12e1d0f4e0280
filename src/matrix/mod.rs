//! Build-matrix documents derived from release data
//!
//! - [`refresh`]: refresh the version cache from the tag fetchers
//! - [`template`]: project the cache into an `os / versions / ghpages_branch` template
//! - [`update`]: rewrite an existing matrix in place from per-language strategies
//! - [`feed_matrix`]: build a matrix straight from the official release feeds
//! - [`github_output`]: flatten a matrix into `KEY=value` lines for GitHub Actions

pub mod error;
pub mod feed_matrix;
pub mod github_output;
pub mod refresh;
pub mod template;
pub mod update;

use std::path::Path;

use serde_json::Value;

pub use error::MatrixError;

use crate::json_format::to_string_pretty4;

/// Read and parse a JSON file
pub(crate) fn read_json(path: &Path) -> Result<Value, MatrixError> {
    let content = std::fs::read_to_string(path).map_err(|e| MatrixError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| MatrixError::json(path, e))
}

/// Write `value` with a 4-space indent, creating parent directories
pub(crate) fn write_json(
    path: &Path,
    value: &Value,
    trailing_newline: bool,
) -> Result<(), MatrixError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| MatrixError::io(parent, e))?;
    }
    let mut content = to_string_pretty4(value)?;
    if trailing_newline {
        content.push('\n');
    }
    std::fs::write(path, content).map_err(|e| MatrixError::io(path, e))
}
