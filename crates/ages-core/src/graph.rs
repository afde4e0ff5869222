//! # Progression Graph
//!
//! The age forest: an arena of nodes keyed by id, each with an optional
//! parent id, plus a reverse index from gated resource to gating ages.
//!
//! All data structures use `BTreeMap` for deterministic ordering. A graph is
//! built once per (re)load and is read-only afterwards; reload replaces the
//! whole arena (see [`crate::registry::AgeRegistry`]).

use crate::error::ConfigError;
use crate::node::{Node, NodeDefinition};
use crate::primitives::{MAX_ANCESTOR_DEPTH, NodeId, RecordId, ResourceId, SessionId};
use crate::progress::ProgressStore;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// GRAPH
// =============================================================================

/// Validated progression graph.
///
/// Invariants (checked by [`ProgressionGraph::build`]):
/// - every id is unique
/// - every parent resolves to a node of this graph
/// - parent chains are acyclic and end at a top-level node
/// - no node has more than [`MAX_ANCESTOR_DEPTH`] ancestors
/// - no node maps onto the root record
#[derive(Debug, Clone)]
pub struct ProgressionGraph {
    /// Node storage: NodeId -> Node
    nodes: BTreeMap<NodeId, Node>,

    /// Reverse index: ResourceId -> gating nodes
    gates: BTreeMap<ResourceId, BTreeSet<NodeId>>,

    /// Record every top-level node hangs off.
    root: RecordId,
}

impl ProgressionGraph {
    /// An empty graph whose root record lives in `namespace`.
    #[must_use]
    pub fn empty(namespace: &str) -> Self {
        Self {
            nodes: BTreeMap::new(),
            gates: BTreeMap::new(),
            root: RecordId::root(namespace),
        }
    }

    /// Build and validate a graph from declared definitions.
    ///
    /// Fails on duplicate ids, unresolved parents, parent cycles, over-deep
    /// chains and ids that collide with the root record.
    pub fn build<I>(namespace: &str, definitions: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (NodeId, NodeDefinition)>,
    {
        let mut graph = Self::empty(namespace);

        for (id, definition) in definitions {
            if graph.nodes.contains_key(&id) {
                return Err(ConfigError::DuplicateId(id));
            }
            let node = Node::new(id.clone(), definition);
            if *node.record_id() == graph.root {
                return Err(ConfigError::ReservedId(id));
            }
            graph.nodes.insert(id, node);
        }

        graph.check_parents()?;
        graph.check_chains()?;

        for node in graph.nodes.values() {
            for resource in node.unlocks() {
                graph
                    .gates
                    .entry(resource.clone())
                    .or_default()
                    .insert(node.id().clone());
            }
        }

        Ok(graph)
    }

    fn check_parents(&self) -> Result<(), ConfigError> {
        for node in self.nodes.values() {
            if let Some(parent) = node.parent() {
                if !self.nodes.contains_key(parent) {
                    return Err(ConfigError::UnresolvedParent {
                        node: node.id().clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Walk each parent chain once, rejecting cycles and chains deeper than
    /// [`MAX_ANCESTOR_DEPTH`]. Depths of finished chains are remembered, so the
    /// whole check is linear in the node count.
    fn check_chains(&self) -> Result<(), ConfigError> {
        let mut depths: BTreeMap<&NodeId, usize> = BTreeMap::new();

        for start in self.nodes.keys() {
            let mut chain: Vec<&NodeId> = Vec::new();
            let mut on_chain: BTreeSet<&NodeId> = BTreeSet::new();
            let mut current = Some(start);
            let mut parent_depth = None;

            while let Some(id) = current {
                if let Some(&depth) = depths.get(id) {
                    parent_depth = Some(depth);
                    break;
                }
                if !on_chain.insert(id) {
                    let first = chain.iter().position(|c| *c == id).unwrap_or(0);
                    let mut cycle: Vec<NodeId> =
                        chain[first..].iter().map(|c| (*c).clone()).collect();
                    cycle.push(id.clone());
                    return Err(ConfigError::ParentCycle {
                        node: id.clone(),
                        cycle,
                    });
                }
                chain.push(id);
                current = self.nodes.get(id).and_then(Node::parent);
            }

            // The last chain entry is top-level, or hangs under a settled node.
            let mut depth = parent_depth.map_or(0, |d: usize| d.saturating_add(1));
            for id in chain.into_iter().rev() {
                if depth > MAX_ANCESTOR_DEPTH {
                    return Err(ConfigError::TooDeep {
                        node: id.clone(),
                        depth,
                    });
                }
                depths.insert(id, depth);
                depth = depth.saturating_add(1);
            }
        }

        Ok(())
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    /// Lookup a node by id.
    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Reverse lookup from a progress record to its node.
    ///
    /// Pure prefix rule; the root record and foreign records miss.
    #[must_use]
    pub fn find(&self, record: &RecordId) -> Option<&Node> {
        let id = record.node_id()?;
        self.nodes.get(&id)
    }

    /// The root record top-level nodes attach to.
    #[must_use]
    pub fn root_record(&self) -> &RecordId {
        &self.root
    }

    /// Record id of a node's parent, or the root record for top-level nodes.
    #[must_use]
    pub fn parent_record(&self, node: &Node) -> RecordId {
        node.parent()
            .map(NodeId::record_id)
            .unwrap_or_else(|| self.root.clone())
    }

    /// All nodes in deterministic order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Ancestors of `id`, nearest first. Empty for unknown or top-level ids.
    pub fn ancestors<'a>(&'a self, id: &NodeId) -> Ancestors<'a> {
        Ancestors {
            graph: self,
            next: self.nodes.get(id).and_then(Node::parent),
            steps: 0,
        }
    }

    /// Number of ancestors above a node.
    #[must_use]
    pub fn depth(&self, id: &NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Every node, each parent before its children. Ties break on id.
    #[must_use]
    pub fn topological_order(&self) -> Vec<&Node> {
        let mut ordered: Vec<(usize, &Node)> = self
            .nodes
            .values()
            .map(|node| (self.depth(node.id()), node))
            .collect();
        ordered.sort_by(|(da, a), (db, b)| da.cmp(db).then_with(|| a.id().cmp(b.id())));
        ordered.into_iter().map(|(_, node)| node).collect()
    }

    // =========================================================================
    // GATING
    // =========================================================================

    /// Every node that gates the resource. Empty means ungated.
    #[must_use]
    pub fn required_nodes(&self, resource: &ResourceId) -> Vec<&Node> {
        self.gates
            .get(resource)
            .into_iter()
            .flatten()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    /// Whether any node gates the resource at all.
    #[must_use]
    pub fn is_gated(&self, resource: &ResourceId) -> bool {
        self.gates.get(resource).is_some_and(|ids| !ids.is_empty())
    }

    /// Whether the resource is available to the session.
    ///
    /// Gating nodes are alternatives: any single completed gate unlocks.
    pub fn is_unlocked<P>(&self, progress: &P, session: SessionId, resource: &ResourceId) -> bool
    where
        P: ProgressStore + ?Sized,
    {
        let gates = self.required_nodes(resource);
        gates.is_empty()
            || gates
                .iter()
                .any(|node| progress.is_done(session, node.record_id()))
    }

    /// One gating node to mention in "locked" messaging: the first by id.
    #[must_use]
    pub fn representative_gate(&self, resource: &ResourceId) -> Option<&Node> {
        self.required_nodes(resource).into_iter().next()
    }

    /// The gate to report when the resource is locked for the session.
    pub fn locking_gate<P>(
        &self,
        progress: &P,
        session: SessionId,
        resource: &ResourceId,
    ) -> Option<&Node>
    where
        P: ProgressStore + ?Sized,
    {
        if self.is_unlocked(progress, session, resource) {
            None
        } else {
            self.representative_gate(resource)
        }
    }
}

// =============================================================================
// ANCESTOR ITERATOR
// =============================================================================

/// Iterator over a node's ancestors, nearest first.
///
/// Bounded by [`MAX_ANCESTOR_DEPTH`], which a built graph never exceeds.
pub struct Ancestors<'a> {
    graph: &'a ProgressionGraph,
    next: Option<&'a NodeId>,
    steps: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        if self.steps >= MAX_ANCESTOR_DEPTH {
            return None;
        }
        let node = self.graph.nodes.get(self.next?)?;
        self.steps = self.steps.saturating_add(1);
        self.next = node.parent();
        Some(node)
    }
}

// =============================================================================
// TESTS
// =============================================================================
