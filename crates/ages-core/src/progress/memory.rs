//! In-memory collaborators.
//!
//! Deterministic (BTree-backed) implementations of [`ProgressStore`] and
//! [`GroupSessionIndex`]. Used by the test-suite and by hosts that keep
//! progress in process.

use super::{GroupSessionIndex, ProgressStore};
use crate::primitives::{GroupId, RecordId, SessionId};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// MEMORY PROGRESS
// =============================================================================

/// Completed records per session.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgress {
    done: BTreeMap<SessionId, BTreeSet<RecordId>>,
}

impl MemoryProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed records for a session, in deterministic order.
    pub fn records(&self, session: SessionId) -> impl Iterator<Item = &RecordId> {
        self.done.get(&session).into_iter().flatten()
    }

    /// Number of completed records for a session.
    #[must_use]
    pub fn completed_count(&self, session: SessionId) -> usize {
        self.done.get(&session).map_or(0, BTreeSet::len)
    }

    /// Drop every record of a session.
    pub fn forget(&mut self, session: SessionId) {
        self.done.remove(&session);
    }
}

impl ProgressStore for MemoryProgress {
    fn is_done(&self, session: SessionId, record: &RecordId) -> bool {
        self.done
            .get(&session)
            .is_some_and(|records| records.contains(record))
    }

    fn grant(&mut self, session: SessionId, record: &RecordId) -> bool {
        self.done.entry(session).or_default().insert(record.clone())
    }

    fn revoke(&mut self, session: SessionId, record: &RecordId) -> bool {
        let Some(records) = self.done.get_mut(&session) else {
            return false;
        };
        let removed = records.remove(record);
        if records.is_empty() {
            self.done.remove(&session);
        }
        removed
    }
}

// =============================================================================
// MEMORY GROUPS
// =============================================================================

/// Connected sessions and their group membership.
#[derive(Debug, Clone, Default)]
pub struct MemoryGroups {
    connected: BTreeSet<SessionId>,
    membership: BTreeMap<SessionId, GroupId>,
}

impl MemoryGroups {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a session as connected.
    pub fn connect(&mut self, session: SessionId) {
        self.connected.insert(session);
    }

    /// Mark a session as gone. Its group membership is kept so that a
    /// reconnect lands in the same group.
    pub fn disconnect(&mut self, session: SessionId) {
        self.connected.remove(&session);
    }

    /// Put a session into a group, replacing any previous membership.
    pub fn join(&mut self, session: SessionId, group: impl Into<GroupId>) {
        self.membership.insert(session, group.into());
    }

    /// Remove a session from its group.
    pub fn leave(&mut self, session: SessionId) -> Option<GroupId> {
        self.membership.remove(&session)
    }

    #[must_use]
    pub fn is_connected(&self, session: SessionId) -> bool {
        self.connected.contains(&session)
    }
}

impl GroupSessionIndex for MemoryGroups {
    fn group_of(&self, session: SessionId) -> Option<GroupId> {
        self.membership.get(&session).cloned()
    }

    fn members_of(&self, group: &GroupId) -> BTreeSet<SessionId> {
        self.membership
            .iter()
            .filter(|(session, member_of)| *member_of == group && self.connected.contains(session))
            .map(|(session, _)| *session)
            .collect()
    }

    fn all_sessions(&self) -> BTreeSet<SessionId> {
        self.connected.clone()
    }
}

// =============================================================================
// TESTS
// =============================================================================
