//! # Shared State
//!
//! The authoritative record of which ages are unlocked for everyone
//! (global scope) and for each group, plus the propagation of those unlocks
//! to sessions.
//!
//! Propagation is ancestor-aware: applying an age to a session first grants
//! every ancestor (top-most first) and then the age itself, so a session never
//! holds a child record without its parents regardless of share order.
//!
//! ## Ownership
//!
//! Only this module mutates the sets. Every mutating operation marks the store
//! dirty (except the no-group no-op), and the owner flushes a consistent
//! snapshot at its save points via [`SharedStateStore::take_snapshot`] or
//! [`SharedStateStore::persist`].
//!
//! The store holds no lock. Hosts that share it between threads wrap it in a
//! `Mutex` and treat each public operation as one critical section.

use crate::error::PersistenceError;
use crate::formats::Packed;
use crate::graph::ProgressionGraph;
use crate::node::Node;
use crate::primitives::{GroupId, NodeId, SessionId};
use crate::progress::{GroupSessionIndex, ProgressStore};
use crate::storage::StateStorage;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

// =============================================================================
// SCOPE / CONTEXT / REPORT
// =============================================================================

/// Which sets a [`SharedStateStore::clear`] empties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The global set.
    Global,
    /// Every group's set.
    Group,
}

/// The active graph plus the host collaborators a share operation needs.
pub struct ShareContext<'a, P: ?Sized, G: ?Sized> {
    pub graph: &'a ProgressionGraph,
    pub progress: &'a mut P,
    pub groups: &'a G,
}

impl<'a, P, G> ShareContext<'a, P, G>
where
    P: ProgressStore + ?Sized,
    G: GroupSessionIndex + ?Sized,
{
    pub fn new(graph: &'a ProgressionGraph, progress: &'a mut P, groups: &'a G) -> Self {
        Self {
            graph,
            progress,
            groups,
        }
    }
}

/// Outcome of a propagation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShareReport {
    /// Sessions the age was applied to.
    pub sessions: usize,
    /// Grants that changed a record (already-held records count zero).
    pub granted: usize,
}

impl ShareReport {
    fn absorb(&mut self, granted: usize) {
        self.sessions = self.sessions.saturating_add(1);
        self.granted = self.granted.saturating_add(granted);
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Global and per-group unlocked ages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedStateStore {
    pub(crate) global: BTreeSet<NodeId>,
    pub(crate) groups: BTreeMap<GroupId, BTreeSet<NodeId>>,
    pub(crate) dirty: bool,
}

impl Default for SharedStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedStateStore {
    /// A fresh, empty store. Starts dirty so that its first save point
    /// creates the persisted record.
    #[must_use]
    pub fn new() -> Self {
        Self {
            global: BTreeSet::new(),
            groups: BTreeMap::new(),
            dirty: true,
        }
    }

    // =========================================================================
    // SHARING
    // =========================================================================

    /// Unlock an age for every session, now and on future joins.
    pub fn share_globally<P, G>(
        &mut self,
        ctx: &mut ShareContext<'_, P, G>,
        node: &Node,
    ) -> ShareReport
    where
        P: ProgressStore + ?Sized,
        G: GroupSessionIndex + ?Sized,
    {
        self.global.insert(node.id().clone());
        self.mark_dirty();

        let sessions = ctx.groups.all_sessions();
        info!(
            age = %node.id(),
            sessions = sessions.len(),
            "Preparing to share age with all sessions"
        );

        Self::broadcast(ctx.graph, &mut *ctx.progress, sessions, node)
    }

    /// Unlock an age for the acting session's group.
    ///
    /// A session without a group makes this a no-op: nothing is stored,
    /// nothing is marked dirty and nobody is notified.
    pub fn share_with_group<P, G>(
        &mut self,
        ctx: &mut ShareContext<'_, P, G>,
        session: SessionId,
        node: &Node,
    ) -> ShareReport
    where
        P: ProgressStore + ?Sized,
        G: GroupSessionIndex + ?Sized,
    {
        let Some(group) = ctx.groups.group_of(session) else {
            debug!(%session, age = %node.id(), "Session has no group, nothing to share");
            return ShareReport::default();
        };

        let sessions = ctx.groups.members_of(&group);
        info!(
            age = %node.id(),
            group = %group,
            sessions = sessions.len(),
            "Preparing to share age with group"
        );

        self.groups
            .entry(group)
            .or_default()
            .insert(node.id().clone());
        self.mark_dirty();

        Self::broadcast(ctx.graph, &mut *ctx.progress, sessions, node)
    }

    /// Apply everything shared with a session: the global set plus its
    /// group's set. Called when a session joins or changes group.
    ///
    /// Ids missing from the current graph are skipped. Idempotent.
    pub fn apply_all_shared_to<P, G>(
        &self,
        ctx: &mut ShareContext<'_, P, G>,
        session: SessionId,
    ) -> ShareReport
    where
        P: ProgressStore + ?Sized,
        G: GroupSessionIndex + ?Sized,
    {
        let mut pending: BTreeSet<&NodeId> = self.global.iter().collect();
        if let Some(group) = ctx.groups.group_of(session) {
            if let Some(ids) = self.groups.get(&group) {
                pending.extend(ids);
            }
        }

        let mut granted = 0usize;
        for id in pending {
            match ctx.graph.get(id) {
                Some(node) => {
                    granted = granted.saturating_add(Self::apply_to(
                        ctx.graph,
                        &mut *ctx.progress,
                        session,
                        node,
                    ));
                }
                None => debug!(age = %id, "Skipping shared age missing from current graph"),
            }
        }

        ShareReport {
            sessions: 1,
            granted,
        }
    }

    /// Grant an age and its whole ancestor chain to one session, top-most
    /// ancestor first. Returns the number of records that changed.
    pub fn apply_to<P>(
        graph: &ProgressionGraph,
        progress: &mut P,
        session: SessionId,
        node: &Node,
    ) -> usize
    where
        P: ProgressStore + ?Sized,
    {
        let mut chain: Vec<&Node> = graph.ancestors(node.id()).collect();
        chain.reverse();
        chain.push(node);

        chain
            .into_iter()
            .filter(|age| progress.grant(session, age.record_id()))
            .count()
    }

    fn broadcast<P>(
        graph: &ProgressionGraph,
        progress: &mut P,
        sessions: BTreeSet<SessionId>,
        node: &Node,
    ) -> ShareReport
    where
        P: ProgressStore + ?Sized,
    {
        let mut report = ShareReport::default();
        for session in sessions {
            report.absorb(Self::apply_to(graph, progress, session, node));
        }
        report
    }

    // =========================================================================
    // CLEARING
    // =========================================================================

    /// Empty a scope. Returns how many ids were removed (for `Group`, the
    /// total across all groups). Always marks dirty.
    pub fn clear(&mut self, scope: Scope) -> usize {
        let cleared = match scope {
            Scope::Global => {
                let count = self.global.len();
                self.global.clear();
                count
            }
            Scope::Group => {
                let count = self.groups.values().map(BTreeSet::len).sum();
                self.groups.clear();
                count
            }
        };

        self.mark_dirty();
        cleared
    }

    // =========================================================================
    // INTROSPECTION
    // =========================================================================

    /// Globally shared ids in deterministic order.
    pub fn global_nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.global.iter()
    }

    /// Ids shared with one group.
    pub fn group_nodes(&self, group: &GroupId) -> impl Iterator<Item = &NodeId> {
        self.groups.get(group).into_iter().flatten()
    }

    /// Groups that have at least one shared id recorded.
    pub fn groups(&self) -> impl Iterator<Item = &GroupId> {
        self.groups.keys()
    }

    #[must_use]
    pub fn is_shared_globally(&self, id: &NodeId) -> bool {
        self.global.contains(id)
    }

    #[must_use]
    pub fn is_shared_with_group(&self, group: &GroupId, id: &NodeId) -> bool {
        self.groups.get(group).is_some_and(|ids| ids.contains(id))
    }

    #[must_use]
    pub fn global_count(&self) -> usize {
        self.global.len()
    }

    /// Total ids across every group set.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.values().map(BTreeSet::len).sum()
    }

    // =========================================================================
    // DIRTY TRACKING / PERSISTENCE
    // =========================================================================

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Owned snapshot of the current state if it changed since the last
    /// one. Clears the dirty flag; call [`Self::mark_dirty`] if writing the
    /// snapshot fails.
    pub fn take_snapshot(&mut self) -> Option<Packed> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.pack())
    }

    /// Load the store persisted under `name`, or create a fresh one.
    pub fn load_or_create(
        storage: &dyn StateStorage,
        name: &str,
    ) -> Result<Self, PersistenceError> {
        match storage.load(name)? {
            Some(packed) => {
                let store = Self::from_packed(packed);
                info!(
                    state = name,
                    global = store.global_count(),
                    group = store.group_count(),
                    "Loaded shared age state"
                );
                Ok(store)
            }
            None => {
                debug!(state = name, "No persisted shared age state, starting empty");
                Ok(Self::new())
            }
        }
    }

    /// Flush to `storage` if dirty. Returns whether a write happened.
    pub fn persist(
        &mut self,
        storage: &dyn StateStorage,
        name: &str,
    ) -> Result<bool, PersistenceError> {
        let Some(snapshot) = self.take_snapshot() else {
            return Ok(false);
        };

        if let Err(err) = storage.save(name, &snapshot) {
            self.mark_dirty();
            return Err(err);
        }

        info!(
            state = name,
            global = snapshot.global_nodes.len(),
            groups = snapshot.group_nodes.len(),
            "Flushed shared age state"
        );
        Ok(true)
    }
}

// =============================================================================
// TESTS
// =============================================================================
