//! # Progress Module
//!
//! Seams to the host's per-session bookkeeping.
//!
//! The core never tracks completion itself. It asks a [`ProgressStore`]
//! whether a record is done and asks it to grant or revoke records, and it
//! asks a [`GroupSessionIndex`] who is connected and who belongs to which
//! group.
//!
//! This module contains:
//! - The two collaborator traits
//! - In-memory implementations (`memory`) for hosts without their own tracker

mod memory;

pub use memory::*;

use crate::primitives::{GroupId, RecordId, SessionId};
use std::collections::BTreeSet;

// =============================================================================
// PROGRESS STORE
// =============================================================================

/// Per-session completion records.
///
/// `grant` and `revoke` must be idempotent: repeating either on a record
/// already in the target state returns `false` and changes nothing. The core
/// relies on this instead of de-duplicating grants itself.
pub trait ProgressStore {
    /// Whether the record is complete for the session.
    fn is_done(&self, session: SessionId, record: &RecordId) -> bool;

    /// Mark the record complete. Returns whether state changed.
    fn grant(&mut self, session: SessionId, record: &RecordId) -> bool;

    /// Mark the record incomplete. Returns whether state changed.
    fn revoke(&mut self, session: SessionId, record: &RecordId) -> bool;
}

impl<P: ProgressStore + ?Sized> ProgressStore for &mut P {
    fn is_done(&self, session: SessionId, record: &RecordId) -> bool {
        (**self).is_done(session, record)
    }

    fn grant(&mut self, session: SessionId, record: &RecordId) -> bool {
        (**self).grant(session, record)
    }

    fn revoke(&mut self, session: SessionId, record: &RecordId) -> bool {
        (**self).revoke(session, record)
    }
}

// =============================================================================
// GROUP SESSION INDEX
// =============================================================================

/// Session membership view.
///
/// A session belongs to zero or one group. Results are snapshots; the core
/// iterates the returned sets and tolerates sessions that disappear while
/// it does so.
pub trait GroupSessionIndex {
    /// The session's current group, if any.
    fn group_of(&self, session: SessionId) -> Option<GroupId>;

    /// Connected members of a group.
    fn members_of(&self, group: &GroupId) -> BTreeSet<SessionId>;

    /// Every connected session.
    fn all_sessions(&self) -> BTreeSet<SessionId>;
}

impl<G: GroupSessionIndex + ?Sized> GroupSessionIndex for &G {
    fn group_of(&self, session: SessionId) -> Option<GroupId> {
        (**self).group_of(session)
    }

    fn members_of(&self, group: &GroupId) -> BTreeSet<SessionId> {
        (**self).members_of(group)
    }

    fn all_sessions(&self) -> BTreeSet<SessionId> {
        (**self).all_sessions()
    }
}
