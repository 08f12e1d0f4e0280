//! Flatten matrix JSON into GitHub Actions step outputs
//!
//! ```text
//! {"os": ["ubuntu-latest"], "versions": {"python": ["3.13"]}}
//!
//! OS=["ubuntu-latest"]
//! OS_0=ubuntu-latest
//! VERSIONS_PYTHON=["3.13"]
//! VERSIONS_PYTHON_0=3.13
//! ```

use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::github_output_path;
use crate::json_format::to_string_spaced;
use crate::matrix::MatrixError;

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}_{key}")
    }
}

fn flatten(
    value: &Value,
    prefix: &str,
    outputs: &mut IndexMap<String, String>,
) -> Result<(), MatrixError> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten(child, &join_key(prefix, key), outputs)?;
            }
        }
        Value::Array(items) => {
            outputs.insert(prefix.to_uppercase(), to_string_spaced(items)?);
            for (index, item) in items.iter().enumerate() {
                flatten(item, &join_key(prefix, &index.to_string()), outputs)?;
            }
        }
        Value::String(s) => {
            outputs.insert(prefix.to_uppercase(), s.clone());
        }
        scalar => {
            outputs.insert(prefix.to_uppercase(), scalar.to_string());
        }
    }
    Ok(())
}

/// Flatten `value` into uppercase `KEY -> value` pairs.
///
/// Nested keys are joined with `_`. A list is emitted as its JSON text and
/// then item by item under its index. Only objects and lists are accepted
/// at the top level.
pub fn parse_json(value: &Value) -> Result<IndexMap<String, String>, MatrixError> {
    if !value.is_object() && !value.is_array() {
        return Err(MatrixError::Invalid(format!(
            "expected a JSON object or array, got {value}"
        )));
    }
    let mut outputs = IndexMap::new();
    flatten(value, "", &mut outputs)?;
    Ok(outputs)
}

/// Append `KEY=value` lines to `path`
pub fn write_github_output(
    path: &Path,
    outputs: &IndexMap<String, String>,
) -> Result<(), MatrixError> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| MatrixError::io(path, e))?;
    for (key, value) in outputs {
        writeln!(file, "{key}={value}").map_err(|e| MatrixError::io(path, e))?;
        debug!("Written to GITHUB_OUTPUT: {}={}", key, value);
    }
    info!("Wrote {} output(s) to {:?}", outputs.len(), path);
    Ok(())
}

/// Append `outputs` to the file named by `GITHUB_OUTPUT`
pub fn set_github_output(outputs: &IndexMap<String, String>) -> Result<(), MatrixError> {
    let path = github_output_path().ok_or(MatrixError::MissingOutputVariable)?;
    write_github_output(&path, outputs)
}
