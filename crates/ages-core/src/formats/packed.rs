//! Packed shared state and the codec between it and the live store.

use crate::primitives::{GroupId, NodeId};
use crate::shared::SharedStateStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serializable snapshot of a [`SharedStateStore`].
///
/// Field names are the persisted keys. Both sections default to empty so
/// that records written without one of them still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packed {
    /// Ages unlocked for every session.
    #[serde(rename = "GlobalAges", default)]
    pub global_nodes: Vec<NodeId>,

    /// Ages unlocked per group.
    #[serde(rename = "TeamAges", default)]
    pub group_nodes: BTreeMap<GroupId, Vec<NodeId>>,
}

impl Packed {
    /// Total ids across both sections (duplicates included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.group_nodes
            .values()
            .map(Vec::len)
            .fold(self.global_nodes.len(), usize::saturating_add)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SharedStateStore {
    /// Snapshot both sets. Sequences come out sorted, but readers must not
    /// rely on any order.
    #[must_use]
    pub fn pack(&self) -> Packed {
        Packed {
            global_nodes: self.global.iter().cloned().collect(),
            group_nodes: self
                .groups
                .iter()
                .map(|(group, ids)| (group.clone(), ids.iter().cloned().collect()))
                .collect(),
        }
    }

    /// Merge a packed snapshot into this store. Duplicates collapse.
    pub fn unpack(&mut self, packed: Packed) {
        self.global.extend(packed.global_nodes);
        for (group, ids) in packed.group_nodes {
            self.groups.entry(group).or_default().extend(ids);
        }
    }

    /// Rebuild a clean (not dirty) store from a snapshot.
    #[must_use]
    pub fn from_packed(packed: Packed) -> Self {
        let mut store = Self::new();
        store.dirty = false;
        store.unpack(packed);
        store
    }
}

impl From<&SharedStateStore> for Packed {
    fn from(store: &SharedStateStore) -> Self {
        store.pack()
    }
}

impl From<Packed> for SharedStateStore {
    fn from(packed: Packed) -> Self {
        Self::from_packed(packed)
    }
}
