//! # Definitions
//!
//! Reading age definitions from data-pack style JSON.
//!
//! Layout on disk:
//!
//! ```text
//! <root>/<namespace>/<path>.json   ->   id "<namespace>:<path>"
//! ```
//!
//! e.g. `packs/genesis/bronze/tools.json` declares `genesis:bronze/tools`.
//! Files are visited in sorted order so that a load is deterministic.

use crate::error::ConfigError;
use crate::node::NodeDefinition;
use crate::primitives::{NAMESPACE_SEPARATOR, NodeId, PATH_SEPARATOR};
use std::fs;
use std::path::Path;

/// Extension of definition files.
pub const DEFINITION_EXTENSION: &str = "json";

/// Parse one definition document.
pub fn parse_document(id: &NodeId, text: &str) -> Result<NodeDefinition, ConfigError> {
    serde_json::from_str(text).map_err(|err| ConfigError::InvalidDefinition {
        source_name: id.to_string(),
        reason: err.to_string(),
    })
}

/// Parse a batch of `(id, document)` pairs.
pub fn parse_documents<'a, I>(documents: I) -> Result<Vec<(NodeId, NodeDefinition)>, ConfigError>
where
    I: IntoIterator<Item = (NodeId, &'a str)>,
{
    documents
        .into_iter()
        .map(|(id, text)| parse_document(&id, text).map(|definition| (id, definition)))
        .collect()
}

/// Load every definition under `root`.
pub fn load_dir(root: &Path) -> Result<Vec<(NodeId, NodeDefinition)>, ConfigError> {
    let mut definitions = Vec::new();

    for namespace_dir in sorted_entries(root)? {
        if !namespace_dir.is_dir() {
            continue;
        }
        let Some(namespace) = namespace_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let namespace = namespace.to_string();
        collect(&namespace_dir, &namespace, "", &mut definitions)?;
    }

    Ok(definitions)
}

fn collect(
    dir: &Path,
    namespace: &str,
    prefix: &str,
    out: &mut Vec<(NodeId, NodeDefinition)>,
) -> Result<(), ConfigError> {
    for entry in sorted_entries(dir)? {
        let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if entry.is_dir() {
            let nested = format!("{prefix}{name}{PATH_SEPARATOR}");
            collect(&entry, namespace, &nested, out)?;
            continue;
        }

        let Some(stem) = name.strip_suffix(&format!(".{DEFINITION_EXTENSION}")) else {
            continue;
        };

        let id_text = format!("{namespace}{NAMESPACE_SEPARATOR}{prefix}{stem}");
        let id = NodeId::parse(id_text.as_str()).map_err(|err| ConfigError::InvalidDefinition {
            source_name: entry.display().to_string(),
            reason: err.to_string(),
        })?;

        let text = fs::read_to_string(&entry).map_err(|err| ConfigError::InvalidDefinition {
            source_name: entry.display().to_string(),
            reason: err.to_string(),
        })?;

        out.push((id.clone(), parse_document(&id, &text)?));
    }
    Ok(())
}

fn sorted_entries(dir: &Path) -> Result<Vec<std::path::PathBuf>, ConfigError> {
    let read = fs::read_dir(dir).map_err(|err| ConfigError::InvalidDefinition {
        source_name: dir.display().to_string(),
        reason: err.to_string(),
    })?;

    let mut paths = Vec::new();
    for entry in read {
        let entry = entry.map_err(|err| ConfigError::InvalidDefinition {
            source_name: dir.display().to_string(),
            reason: err.to_string(),
        })?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}
