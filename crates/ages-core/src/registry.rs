//! # Age Registry
//!
//! Process-scoped owner of the active [`ProgressionGraph`].
//!
//! The host builds one registry at startup and reloads it whenever its data
//! packs reload. A reload builds a complete new graph first and only then
//! swaps it in, so a failed reload leaves the previous graph active and
//! readers holding an `Arc` keep a consistent view.

use crate::definitions;
use crate::error::ConfigError;
use crate::graph::ProgressionGraph;
use crate::node::NodeDefinition;
use crate::primitives::{DEFAULT_NAMESPACE, NodeId};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Holder of the active graph.
#[derive(Debug, Clone)]
pub struct AgeRegistry {
    namespace: String,
    current: Arc<ProgressionGraph>,
    /// Incremented on every successful reload.
    generation: u64,
}

impl Default for AgeRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl AgeRegistry {
    /// A registry with an empty graph.
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            current: Arc::new(ProgressionGraph::empty(&namespace)),
            namespace,
            generation: 0,
        }
    }

    /// The active graph.
    #[must_use]
    pub fn graph(&self) -> &ProgressionGraph {
        &self.current
    }

    /// Shared handle to the active graph, for readers that outlive a reload.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ProgressionGraph> {
        Arc::clone(&self.current)
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Replace the graph with one built from `definitions`.
    ///
    /// Returns the new node count. On error the previous graph stays active.
    pub fn reload<I>(&mut self, definitions: I) -> Result<usize, ConfigError>
    where
        I: IntoIterator<Item = (NodeId, NodeDefinition)>,
    {
        match ProgressionGraph::build(&self.namespace, definitions) {
            Ok(graph) => {
                let count = graph.len();
                self.current = Arc::new(graph);
                self.generation = self.generation.saturating_add(1);
                info!(
                    ages = count,
                    generation = self.generation,
                    "Loaded progression graph"
                );
                Ok(count)
            }
            Err(err) => {
                warn!(error = %err, "Rejected progression graph reload, keeping previous graph");
                Err(err)
            }
        }
    }

    /// Reload from a data-pack directory (see [`crate::definitions::load_dir`]).
    pub fn reload_from_dir(&mut self, root: &Path) -> Result<usize, ConfigError> {
        let loaded = definitions::load_dir(root).inspect_err(|err| {
            warn!(error = %err, path = %root.display(), "Failed to read age definitions");
        })?;
        self.reload(loaded)
    }
}
