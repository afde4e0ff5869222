//! # Primitives
//!
//! Identifier newtypes and engine-wide constants.
//!
//! Node ids follow the `namespace:path` shape (namespace optional). The record
//! id used by the external progress store is derived from a node id by a
//! fixed, reversible prefix rule, so reverse lookups never need a table scan.

use crate::error::IdError;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Separator between namespace and path.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Separator between path segments. The first segment is the category.
pub const PATH_SEPARATOR: char = '/';

/// Prefix inserted in front of a node path to form its record path.
pub const RECORD_PREFIX: &str = "age/";

/// Path of the well-known root record (after the prefix).
pub const ROOT_PATH: &str = "root";

/// Upper bound on ancestor walks. Built graphs are acyclic, this only keeps
/// every walk computationally bounded.
pub const MAX_ANCESTOR_DEPTH: usize = 1024;

/// Namespace used for the root record when none is configured.
pub const DEFAULT_NAMESPACE: &str = "genesis";

/// Name under which the shared state is persisted by default.
pub const DEFAULT_STATE_NAME: &str = "ages";

fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-')
}

fn is_path_char(c: char) -> bool {
    is_namespace_char(c) || c == PATH_SEPARATOR
}

fn validate(text: &str) -> Result<(), IdError> {
    if text.is_empty() {
        return Err(IdError::Empty);
    }

    let (namespace, path) = match text.split_once(NAMESPACE_SEPARATOR) {
        Some((ns, path)) => (Some(ns), path),
        None => (None, text),
    };

    if let Some(ns) = namespace {
        if ns.is_empty() {
            return Err(IdError::EmptyNamespace(text.to_string()));
        }
        if let Some(c) = ns.chars().find(|c| !is_namespace_char(*c)) {
            return Err(IdError::InvalidCharacter {
                id: text.to_string(),
                character: c,
            });
        }
    }

    if path.is_empty() {
        return Err(IdError::EmptyPath(text.to_string()));
    }
    if let Some(c) = path.chars().find(|c| !is_path_char(*c)) {
        return Err(IdError::InvalidCharacter {
            id: text.to_string(),
            character: c,
        });
    }

    Ok(())
}

// =============================================================================
// NODE ID
// =============================================================================

/// Identifier of an age node, e.g. `genesis:stone/tools`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Parse and validate an identifier.
    pub fn parse(text: impl Into<String>) -> Result<Self, IdError> {
        let text = text.into();
        validate(&text)?;
        Ok(Self(text))
    }

    /// Build an identifier from a namespace and a path.
    pub fn new(namespace: &str, path: &str) -> Result<Self, IdError> {
        Self::parse(format!("{namespace}{NAMESPACE_SEPARATOR}{path}"))
    }

    /// The namespace, if the identifier carries one.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.0.split_once(NAMESPACE_SEPARATOR).map(|(ns, _)| ns)
    }

    /// The path part (everything after the namespace separator).
    #[must_use]
    pub fn path(&self) -> &str {
        self.0
            .split_once(NAMESPACE_SEPARATOR)
            .map(|(_, path)| path)
            .unwrap_or(&self.0)
    }

    /// Category: the path segment before the first `/`.
    ///
    /// `genesis:stone/tools` has category `stone`; `genesis:stone` has none.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.path().split_once(PATH_SEPARATOR).map(|(cat, _)| cat)
    }

    /// Sub-path: everything after the first `/`, if non-empty.
    #[must_use]
    pub fn sub_path(&self) -> Option<&str> {
        self.path()
            .split_once(PATH_SEPARATOR)
            .map(|(_, rest)| rest)
            .filter(|rest| !rest.is_empty())
    }

    /// The record id this node is tracked under in the progress store.
    #[must_use]
    pub fn record_id(&self) -> RecordId {
        match self.namespace() {
            Some(ns) => RecordId(format!(
                "{ns}{NAMESPACE_SEPARATOR}{RECORD_PREFIX}{}",
                self.path()
            )),
            None => RecordId(format!("{RECORD_PREFIX}{}", self.path())),
        }
    }

    /// Borrow the raw identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NodeId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for NodeId {
    type Error = IdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// RECORD ID
// =============================================================================

/// Identifier of a progress record in the external [`crate::ProgressStore`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap raw record text as handed out by the progress store.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The root record every top-level node attaches to.
    #[must_use]
    pub fn root(namespace: &str) -> Self {
        Self(format!(
            "{namespace}{NAMESPACE_SEPARATOR}{RECORD_PREFIX}{ROOT_PATH}"
        ))
    }

    /// Reverse of [`NodeId::record_id`]. Records without the age prefix map to
    /// `None`. The root record maps to the node id `<ns>:root`, which a built
    /// graph never contains.
    #[must_use]
    pub fn node_id(&self) -> Option<NodeId> {
        let (namespace, path) = match self.0.split_once(NAMESPACE_SEPARATOR) {
            Some((ns, path)) => (Some(ns), path),
            None => (None, self.0.as_str()),
        };
        let stripped = path.strip_prefix(RECORD_PREFIX)?;

        let text = match namespace {
            Some(ns) => format!("{ns}{NAMESPACE_SEPARATOR}{stripped}"),
            None => stripped.to_string(),
        };
        NodeId::parse(text).ok()
    }

    /// Borrow the raw record text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// RESOURCE / SESSION / GROUP
// =============================================================================

/// A gated content item (block, item, recipe output...). Opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A connected actor whose progress is tracked by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Group (team) name. Free-form; any string is accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_namespaced_and_bare_ids() {
        assert!(NodeId::parse("genesis:stone/tools").is_ok());
        assert!(NodeId::parse("stone").is_ok());
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        assert_eq!(NodeId::parse(""), Err(IdError::Empty));
        assert!(matches!(
            NodeId::parse(":stone"),
            Err(IdError::EmptyNamespace(_))
        ));
        assert!(matches!(
            NodeId::parse("genesis:"),
            Err(IdError::EmptyPath(_))
        ));
        assert!(matches!(
            NodeId::parse("genesis:Stone"),
            Err(IdError::InvalidCharacter { character: 'S', .. })
        ));
        assert!(matches!(
            NodeId::parse("gen/esis:stone"),
            Err(IdError::InvalidCharacter { character: '/', .. })
        ));
    }

    #[test]
    fn category_and_sub_path() {
        let id = NodeId::parse("genesis:stone/tools/pickaxe").unwrap();
        assert_eq!(id.namespace(), Some("genesis"));
        assert_eq!(id.path(), "stone/tools/pickaxe");
        assert_eq!(id.category(), Some("stone"));
        assert_eq!(id.sub_path(), Some("tools/pickaxe"));

        let flat = NodeId::parse("genesis:stone").unwrap();
        assert_eq!(flat.category(), None);
        assert_eq!(flat.sub_path(), None);

        let trailing = NodeId::parse("genesis:stone/").unwrap();
        assert_eq!(trailing.category(), Some("stone"));
        assert_eq!(trailing.sub_path(), None);
    }

    #[test]
    fn record_id_prefixes_path() {
        let id = NodeId::parse("genesis:stone/tools").unwrap();
        assert_eq!(id.record_id().as_str(), "genesis:age/stone/tools");

        let bare = NodeId::parse("bronze").unwrap();
        assert_eq!(bare.record_id().as_str(), "age/bronze");
    }

    #[test]
    fn record_id_reverses_to_node_id() {
        let id = NodeId::parse("genesis:iron/armor").unwrap();
        assert_eq!(id.record_id().node_id(), Some(id));

        let bare = NodeId::parse("bronze").unwrap();
        assert_eq!(bare.record_id().node_id(), Some(bare));
    }

    #[test]
    fn foreign_records_do_not_reverse() {
        assert_eq!(RecordId::new("genesis:story/mine_stone").node_id(), None);
        assert_eq!(RecordId::new("genesis:age/").node_id(), None);
    }

    #[test]
    fn root_record_shape() {
        assert_eq!(RecordId::root("genesis").as_str(), "genesis:age/root");
    }

    #[test]
    fn node_id_serde_validates() {
        let ok: Result<NodeId, _> = serde_json::from_str("\"genesis:stone\"");
        assert!(ok.is_ok());

        let bad: Result<NodeId, _> = serde_json::from_str("\"Not Valid\"");
        assert!(bad.is_err());
    }
}
