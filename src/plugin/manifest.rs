//! Plugin list loading
//!
//! Two JSON shapes are accepted:
//!
//! ```json
//! [{ "file": "akismet/akismet.php", "name": "Akismet Anti-spam" }]
//! ```
//!
//! or the keyed form host tools export:
//!
//! ```json
//! { "akismet/akismet.php": { "Name": "Akismet Anti-spam", "Version": "5.3" } }
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::plugin::types::{PluginInfo, slug_from_plugin_file};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read plugin list {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid plugin list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Empty plugin file in argument: {0:?}")]
    EmptyFile(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Manifest {
    List(Vec<ListEntry>),
    Keyed(IndexMap<String, KeyedEntry>),
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    file: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeyedEntry {
    #[serde(rename = "Name")]
    name: Option<String>,
}

/// Load a plugin list from a JSON file
pub fn load_plugin_list(path: &Path) -> Result<Vec<PluginInfo>, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_plugin_list(&content)
}

/// Parse a plugin list from JSON text, preserving the listed order
pub fn parse_plugin_list(content: &str) -> Result<Vec<PluginInfo>, ManifestError> {
    let manifest: Manifest = serde_json::from_str(content)?;

    let plugins = match manifest {
        Manifest::List(entries) => entries
            .into_iter()
            .map(|entry| plugin_with_fallback_name(entry.file, entry.name))
            .collect(),
        Manifest::Keyed(entries) => entries
            .into_iter()
            .map(|(file, entry)| plugin_with_fallback_name(file, entry.name))
            .collect(),
    };

    Ok(plugins)
}

/// Parse a command-line argument of the form `file[=Display Name]`
pub fn parse_plugin_arg(arg: &str) -> Result<PluginInfo, ManifestError> {
    let (file, name) = match arg.split_once('=') {
        Some((file, name)) => (file.trim(), Some(name.trim().to_string())),
        None => (arg.trim(), None),
    };

    if file.is_empty() {
        return Err(ManifestError::EmptyFile(arg.to_string()));
    }

    Ok(plugin_with_fallback_name(file.to_string(), name))
}

fn plugin_with_fallback_name(file: String, name: Option<String>) -> PluginInfo {
    let name = name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| slug_from_plugin_file(&file).to_string());
    PluginInfo { file, name }
}
