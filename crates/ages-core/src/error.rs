//! # Errors
//!
//! One error enum per concern:
//!
//! - [`IdError`]: malformed identifier text
//! - [`ConfigError`]: fatal graph build/reload failures
//! - [`PersistenceError`]: storage and decoding failures
//! - [`AdminError`]: administrative operations that affected nothing
//!
//! Lookup misses and no-op conditions are not errors; they surface as
//! `None`, empty collections, or zero counts.

use crate::primitives::{MAX_ANCESTOR_DEPTH, NodeId};
use std::path::PathBuf;
use thiserror::Error;

/// Identifier parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier {0:?} has an empty namespace")]
    EmptyNamespace(String),

    #[error("identifier {0:?} has an empty path")]
    EmptyPath(String),

    #[error("identifier {id:?} contains invalid character {character:?}")]
    InvalidCharacter { id: String, character: char },
}

/// Graph build errors. Any of these aborts a (re)load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Two definitions share one id.
    #[error("duplicate age id {0}")]
    DuplicateId(NodeId),

    /// A node names a parent that is not part of the same graph.
    #[error("age {node} names unknown parent {parent}")]
    UnresolvedParent { node: NodeId, parent: NodeId },

    /// Following parent links from `node` returns to `node`.
    #[error("parent cycle through age {node}: {}", format_cycle(.cycle))]
    ParentCycle { node: NodeId, cycle: Vec<NodeId> },

    /// The node has more ancestors than an ancestor walk visits.
    #[error(
        "age {node} has {depth} ancestors, more than the limit of {limit}",
        limit = MAX_ANCESTOR_DEPTH
    )]
    TooDeep { node: NodeId, depth: usize },

    /// The node's record would collide with the root record.
    #[error("age {0} maps onto the reserved root record")]
    ReservedId(NodeId),

    /// A definition document could not be parsed.
    #[error("invalid age definition {source_name}: {reason}")]
    InvalidDefinition { source_name: String, reason: String },

    /// Store settings could not be read.
    #[error("invalid store config: {0}")]
    InvalidStoreConfig(String),
}

fn format_cycle(cycle: &[NodeId]) -> String {
    cycle
        .iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Persistence failures.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored data has the wrong shape. Treated as storage corruption.
    #[error("malformed shared state: {0}")]
    Malformed(String),

    /// Binary payload without the expected framing.
    #[error("invalid binary header: {0}")]
    BadHeader(String),

    #[error("database error: {0}")]
    Database(#[from] redb::Error),
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl From<postcard::Error> for PersistenceError {
    fn from(err: postcard::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Administrative operation outcomes that the caller must report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdminError {
    /// No record changed state.
    #[error("no records were affected")]
    NothingAffected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_path() {
        let a = NodeId::parse("genesis:a").ok();
        let b = NodeId::parse("genesis:b").ok();
        let (Some(a), Some(b)) = (a, b) else {
            return;
        };

        let err = ConfigError::ParentCycle {
            node: a.clone(),
            cycle: vec![a.clone(), b, a],
        };
        assert_eq!(
            err.to_string(),
            "parent cycle through age genesis:a: genesis:a -> genesis:b -> genesis:a"
        );
    }

    #[test]
    fn json_errors_become_malformed() {
        let err = serde_json::from_str::<Vec<String>>("42")
            .map_err(PersistenceError::from)
            .err();
        assert!(matches!(err, Some(PersistenceError::Malformed(_))));
    }
}
