//! # Ages Core
//!
//! Progression gating ("ages") with shared unlock state.
//!
//! ## Components
//!
//! - **graph**: the age forest, resource gating and ancestor walks
//! - **registry**: process-scoped holder of the active graph, atomic reload
//! - **shared**: global and per-group unlocked ages, ancestor-aware
//!   propagation to sessions, dirty tracking
//! - **formats**: packed persisted form and its encodings
//! - **storage**: file and redb backends
//! - **admin**: reset-all / skip-all per session
//!
//! Per-session completion and group membership belong to the host and are
//! reached through [`ProgressStore`] and [`GroupSessionIndex`].
//!
//! ## Example
//!
//! ```
//! use ages_core::{
//!     Display, MemoryGroups, MemoryProgress, NodeDefinition, NodeId, ProgressStore,
//!     ProgressionGraph, SessionId, ShareContext, SharedStateStore,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stone = NodeId::parse("genesis:stone")?;
//! let bronze = NodeId::parse("genesis:bronze")?;
//! let graph = ProgressionGraph::build(
//!     "genesis",
//!     vec![
//!         (stone.clone(), NodeDefinition::new(Display::new("Stone"))),
//!         (
//!             bronze.clone(),
//!             NodeDefinition::new(Display::new("Bronze")).with_parent(stone.clone()),
//!         ),
//!     ],
//! )?;
//!
//! let mut groups = MemoryGroups::new();
//! groups.connect(SessionId(1));
//! let mut progress = MemoryProgress::new();
//! let mut store = SharedStateStore::new();
//!
//! if let Some(node) = graph.get(&bronze) {
//!     let mut ctx = ShareContext::new(&graph, &mut progress, &groups);
//!     store.share_globally(&mut ctx, node);
//! }
//!
//! assert!(progress.is_done(SessionId(1), &stone.record_id()));
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod config;
pub mod definitions;
pub mod error;
pub mod formats;
pub mod graph;
pub mod node;
pub mod primitives;
pub mod progress;
pub mod registry;
pub mod shared;
pub mod storage;

pub use config::{Backend, StoreConfig};
pub use error::{AdminError, ConfigError, IdError, PersistenceError};
pub use formats::{Encoding, Packed};
pub use graph::{Ancestors, ProgressionGraph};
pub use node::{Criterion, Display, Node, NodeDefinition, Requirement};
pub use primitives::{GroupId, NodeId, RecordId, ResourceId, SessionId};
pub use progress::{GroupSessionIndex, MemoryGroups, MemoryProgress, ProgressStore};
pub use registry::AgeRegistry;
pub use shared::{Scope, ShareContext, ShareReport, SharedStateStore};
pub use storage::{FileStorage, RedbStorage, StateStorage};
