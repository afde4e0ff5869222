//! Integration tests for sharing, gating and admin flows.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use ages_core::admin::{reset_all, skip_all};
use ages_core::{
    AdminError, AgeRegistry, Criterion, Display, GroupId, GroupSessionIndex, MemoryGroups,
    MemoryProgress, NodeDefinition, NodeId, ProgressStore, RecordId, ResourceId, Scope,
    SessionId, ShareContext, ShareReport, SharedStateStore,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn id(text: &str) -> NodeId {
    NodeId::parse(text).unwrap()
}

/// stone -> bronze -> iron, stone -> farming; anvil gated by bronze or iron.
fn registry() -> AgeRegistry {
    let mut registry = AgeRegistry::new("genesis");
    registry
        .reload(vec![
            (
                id("genesis:stone"),
                NodeDefinition::new(Display::new("Stone")).with_unlock("minecraft:stone_pickaxe"),
            ),
            (
                id("genesis:bronze"),
                NodeDefinition::new(Display::new("Bronze"))
                    .with_parent(id("genesis:stone"))
                    .with_criterion("smelt_bronze", Criterion::new("item_smelted"))
                    .with_unlock("minecraft:anvil"),
            ),
            (
                id("genesis:iron"),
                NodeDefinition::new(Display::new("Iron"))
                    .with_parent(id("genesis:bronze"))
                    .with_unlock("minecraft:anvil"),
            ),
            (
                id("genesis:farming"),
                NodeDefinition::new(Display::new("Farming")).with_parent(id("genesis:stone")),
            ),
        ])
        .unwrap();
    registry
}

/// Sessions 1..=4; 1 and 2 in "red", 3 in "blue", 4 alone.
fn world() -> MemoryGroups {
    let mut groups = MemoryGroups::new();
    for n in 1..=4 {
        groups.connect(SessionId(n));
    }
    groups.join(SessionId(1), "red");
    groups.join(SessionId(2), "red");
    groups.join(SessionId(3), "blue");
    groups
}

/// Progress store that drops a session after its first grant, simulating a
/// disconnect in the middle of a broadcast.
#[derive(Default)]
struct DroppingProgress {
    inner: MemoryProgress,
    dropped: BTreeSet<SessionId>,
    drop_after_first: Option<SessionId>,
}

impl ProgressStore for DroppingProgress {
    fn is_done(&self, session: SessionId, record: &RecordId) -> bool {
        self.inner.is_done(session, record)
    }

    fn grant(&mut self, session: SessionId, record: &RecordId) -> bool {
        if self.dropped.contains(&session) {
            return false;
        }
        let changed = self.inner.grant(session, record);
        if self.drop_after_first == Some(session) {
            self.dropped.insert(session);
        }
        changed
    }

    fn revoke(&mut self, session: SessionId, record: &RecordId) -> bool {
        self.inner.revoke(session, record)
    }
}

// =============================================================================
// PROPAGATION
// =============================================================================

#[test]
fn applying_child_marks_whole_chain() {
    let registry = registry();
    let graph = registry.graph();
    let mut progress = MemoryProgress::new();
    let iron = graph.get(&id("genesis:iron")).unwrap();

    SharedStateStore::apply_to(graph, &mut progress, SessionId(1), iron);

    for name in ["genesis:stone", "genesis:bronze", "genesis:iron"] {
        assert!(progress.is_done(SessionId(1), &id(name).record_id()), "{name}");
    }
    assert!(!progress.is_done(SessionId(1), &id("genesis:farming").record_id()));
    assert!(!progress.is_done(SessionId(1), graph.root_record()));
}

#[test]
fn global_share_is_idempotent() {
    let registry = registry();
    let graph = registry.graph();
    let groups = world();
    let mut progress = MemoryProgress::new();
    let mut store = SharedStateStore::new();
    let farming = graph.get(&id("genesis:farming")).unwrap();

    let mut ctx = ShareContext::new(graph, &mut progress, &groups);
    let first = store.share_globally(&mut ctx, farming);
    let second = store.share_globally(&mut ctx, farming);

    assert_eq!(first, ShareReport { sessions: 4, granted: 8 });
    assert_eq!(second.granted, 0);
    assert_eq!(store.global_count(), 1);
}

#[test]
fn group_share_reaches_members_only() {
    let registry = registry();
    let graph = registry.graph();
    let groups = world();
    let mut progress = MemoryProgress::new();
    let mut store = SharedStateStore::new();
    let bronze = graph.get(&id("genesis:bronze")).unwrap();

    let mut ctx = ShareContext::new(graph, &mut progress, &groups);
    let report = store.share_with_group(&mut ctx, SessionId(2), bronze);

    assert_eq!(report.sessions, 2);
    assert!(progress.is_done(SessionId(1), bronze.record_id()));
    assert!(!progress.is_done(SessionId(3), bronze.record_id()));
    assert!(!progress.is_done(SessionId(4), bronze.record_id()));
}

#[test]
fn group_share_without_group_is_noop() {
    let registry = registry();
    let graph = registry.graph();
    let groups = world();
    let mut progress = MemoryProgress::new();
    let mut store = SharedStateStore::from_packed(Default::default());
    let bronze = graph.get(&id("genesis:bronze")).unwrap();

    let mut ctx = ShareContext::new(graph, &mut progress, &groups);
    let report = store.share_with_group(&mut ctx, SessionId(4), bronze);

    assert_eq!(report, ShareReport::default());
    assert_eq!(store.groups().count(), 0);
    assert!(!store.is_dirty());
    assert_eq!(progress.completed_count(SessionId(4)), 0);
}

#[test]
fn joining_session_catches_up() {
    let registry = registry();
    let graph = registry.graph();
    let mut groups = world();
    let mut progress = MemoryProgress::new();
    let mut store = SharedStateStore::new();

    {
        let mut ctx = ShareContext::new(graph, &mut progress, &groups);
        store.share_globally(&mut ctx, graph.get(&id("genesis:farming")).unwrap());
        store.share_with_group(&mut ctx, SessionId(1), graph.get(&id("genesis:iron")).unwrap());
    }

    let newcomer = SessionId(10);
    groups.connect(newcomer);
    groups.join(newcomer, "red");

    let mut ctx = ShareContext::new(graph, &mut progress, &groups);
    let report = store.apply_all_shared_to(&mut ctx, newcomer);

    // stone, farming, bronze, iron
    assert_eq!(report.granted, 4);
    assert_eq!(store.apply_all_shared_to(&mut ctx, newcomer).granted, 0);
}

#[test]
fn disconnect_mid_broadcast_skips_without_rollback() {
    let registry = registry();
    let graph = registry.graph();
    let groups = world();
    let mut progress = DroppingProgress {
        drop_after_first: Some(SessionId(2)),
        ..DroppingProgress::default()
    };
    let mut store = SharedStateStore::new();
    let iron = graph.get(&id("genesis:iron")).unwrap();

    let mut ctx = ShareContext::new(graph, &mut progress, &groups);
    let report = store.share_globally(&mut ctx, iron);

    assert_eq!(report.sessions, 4);
    // three sessions get the full chain, session 2 only its first ancestor
    assert_eq!(report.granted, 3 * 3 + 1);
    assert!(progress.is_done(SessionId(1), iron.record_id()));
    assert!(!progress.is_done(SessionId(2), iron.record_id()));
}

#[test]
fn reload_dropping_shared_age_does_not_fault() {
    let mut registry = registry();
    let groups = world();
    let mut progress = MemoryProgress::new();
    let mut store = SharedStateStore::new();

    {
        let graph = registry.graph();
        let mut ctx = ShareContext::new(graph, &mut progress, &groups);
        store.share_globally(&mut ctx, graph.get(&id("genesis:farming")).unwrap());
    }

    registry
        .reload(vec![(id("genesis:stone"), NodeDefinition::new(Display::new("Stone")))])
        .unwrap();

    let newcomer = SessionId(20);
    let mut ctx = ShareContext::new(registry.graph(), &mut progress, &groups);
    let report = store.apply_all_shared_to(&mut ctx, newcomer);

    assert_eq!(report.granted, 0);
    assert!(store.is_shared_globally(&id("genesis:farming")));
}

// =============================================================================
// CLEARING
// =============================================================================

#[test]
fn clear_global_then_again_returns_zero() {
    let registry = registry();
    let graph = registry.graph();
    let groups = world();
    let mut progress = MemoryProgress::new();
    let mut store = SharedStateStore::new();

    let mut ctx = ShareContext::new(graph, &mut progress, &groups);
    store.share_globally(&mut ctx, graph.get(&id("genesis:stone")).unwrap());
    store.share_globally(&mut ctx, graph.get(&id("genesis:iron")).unwrap());
    store.share_with_group(&mut ctx, SessionId(1), graph.get(&id("genesis:bronze")).unwrap());
    store.share_with_group(&mut ctx, SessionId(3), graph.get(&id("genesis:bronze")).unwrap());

    assert_eq!(store.clear(Scope::Global), 2);
    assert_eq!(store.clear(Scope::Global), 0);
    assert_eq!(store.clear(Scope::Group), 2);
    assert_eq!(store.clear(Scope::Group), 0);
    assert!(store.group_nodes(&GroupId::from("red")).next().is_none());
}

// =============================================================================
// GATING
// =============================================================================

#[test]
fn alternative_gates() {
    let registry = registry();
    let graph = registry.graph();
    let anvil = ResourceId::from("minecraft:anvil");
    let mut progress = MemoryProgress::new();

    let with_iron = SessionId(1);
    let with_nothing = SessionId(2);
    progress.grant(with_iron, &id("genesis:iron").record_id());

    assert!(graph.is_unlocked(&progress, with_iron, &anvil));
    assert!(!graph.is_unlocked(&progress, with_nothing, &anvil));
    assert_eq!(graph.required_nodes(&anvil).len(), 2);
}

#[test]
fn silent_and_announcing_ages() {
    let registry = registry();
    let graph = registry.graph();

    assert!(!graph.get(&id("genesis:stone")).unwrap().announces());
    assert!(graph.get(&id("genesis:bronze")).unwrap().announces());
}

#[test]
fn find_maps_records_back() {
    let registry = registry();
    let graph = registry.graph();

    let found = graph.find(&RecordId::new("genesis:age/farming")).unwrap();
    assert_eq!(found.id(), &id("genesis:farming"));
    assert!(graph.find(&RecordId::new("genesis:age/root")).is_none());
}

// =============================================================================
// ADMIN
// =============================================================================

#[test]
fn skip_and_reset_all() {
    let registry = registry();
    let graph = registry.graph();
    let mut progress = MemoryProgress::new();
    let session = SessionId(1);
    progress.grant(session, &id("genesis:stone").record_id());

    assert_eq!(skip_all(graph, &mut progress, session), Ok(3));
    assert_eq!(reset_all(graph, &mut progress, session), Ok(4));
    assert_eq!(
        reset_all(graph, &mut progress, session),
        Err(AdminError::NothingAffected)
    );
}

#[test]
fn memory_groups_snapshot_members() {
    let groups = world();
    assert_eq!(groups.members_of(&GroupId::from("red")).len(), 2);
    assert_eq!(groups.all_sessions().len(), 4);
}

// =============================================================================
// PROPERTIES
// =============================================================================

/// Forest where node `i` hangs under node `parent % i` when a parent is drawn.
fn forest(parents: &[Option<usize>]) -> AgeRegistry {
    let definitions = parents.iter().enumerate().map(|(i, parent)| {
        let mut definition = NodeDefinition::new(Display::new(format!("Age {i}")));
        if let Some(parent) = parent.filter(|_| i > 0) {
            definition = definition.with_parent(id(&format!("genesis:age_{}", parent % i)));
        }
        (id(&format!("genesis:age_{i}")), definition)
    });

    let mut registry = AgeRegistry::new("genesis");
    registry.reload(definitions.collect::<Vec<_>>()).unwrap();
    registry
}

/// Replay `(node, session, global)` shares against a fresh store.
fn replay(
    registry: &AgeRegistry,
    groups: &MemoryGroups,
    progress: &mut MemoryProgress,
    shares: &[(usize, u64, bool)],
) -> SharedStateStore {
    let graph = registry.graph();
    let nodes: Vec<_> = graph.nodes().collect();
    let mut store = SharedStateStore::new();
    let mut ctx = ShareContext::new(graph, progress, groups);

    for &(pick, session, global) in shares {
        let node = nodes[pick % nodes.len()];
        if global {
            store.share_globally(&mut ctx, node);
        } else {
            store.share_with_group(&mut ctx, SessionId(session % 5), node);
        }
    }
    store
}

fn parents_strategy() -> impl Strategy<Value = Vec<Option<usize>>> {
    prop::collection::vec(prop::option::of(0usize..64), 1..12)
}

fn shares_strategy() -> impl Strategy<Value = Vec<(usize, u64, bool)>> {
    prop::collection::vec((0usize..64, 0u64..5, any::<bool>()), 0..24)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn sessions_never_hold_child_without_parent(
        parents in parents_strategy(),
        shares in shares_strategy(),
    ) {
        let registry = forest(&parents);
        let groups = world();
        let mut progress = MemoryProgress::new();
        let store = replay(&registry, &groups, &mut progress, &shares);

        let late = SessionId(99);
        let mut ctx = ShareContext::new(registry.graph(), &mut progress, &groups);
        store.apply_all_shared_to(&mut ctx, late);

        let graph = registry.graph();
        for session in groups.all_sessions().into_iter().chain([late]) {
            for node in graph.nodes() {
                if progress.is_done(session, node.record_id()) {
                    for ancestor in graph.ancestors(node.id()) {
                        prop_assert!(
                            progress.is_done(session, ancestor.record_id()),
                            "{session} holds {} without {}",
                            node.id(),
                            ancestor.id()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn pack_then_unpack_keeps_sets(
        parents in parents_strategy(),
        shares in shares_strategy(),
    ) {
        let registry = forest(&parents);
        let groups = world();
        let mut progress = MemoryProgress::new();
        let store = replay(&registry, &groups, &mut progress, &shares);

        let restored = SharedStateStore::from_packed(store.pack());

        prop_assert_eq!(
            restored.global_nodes().collect::<Vec<_>>(),
            store.global_nodes().collect::<Vec<_>>()
        );
        for group in store.groups() {
            prop_assert_eq!(
                restored.group_nodes(group).collect::<Vec<_>>(),
                store.group_nodes(group).collect::<Vec<_>>()
            );
        }
        prop_assert_eq!(restored.group_count(), store.group_count());
        prop_assert!(!restored.is_dirty());
    }
}

// =============================================================================
// THREADING
// =============================================================================

#[test]
fn state_types_can_cross_threads() {
    fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<SharedStateStore>();
    assert_send_sync::<AgeRegistry>();
    assert_send_sync::<ages_core::Packed>();
    assert_send_sync::<MemoryProgress>();
    assert_send_sync::<MemoryGroups>();
}
