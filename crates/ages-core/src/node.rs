//! # Node Module
//!
//! Age nodes and their declared definitions.
//!
//! A [`NodeDefinition`] is what a data pack declares (parent, display,
//! criteria, gated resources). A [`Node`] is the immutable, validated form the
//! graph stores, with its [`Requirement`] derived once at construction.

use crate::primitives::{NodeId, RecordId, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// DEFINITION TYPES
// =============================================================================

/// Presentational metadata. The core never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
}

impl Display {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            icon: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// A completion condition, evaluated by the host's progress mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    /// Trigger name understood by the host (e.g. `inventory_changed`).
    pub trigger: String,
    /// Trigger-specific conditions, passed through untouched.
    #[serde(default)]
    pub conditions: serde_json::Value,
}

impl Criterion {
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            conditions: serde_json::Value::Null,
        }
    }
}

/// Declared shape of an age, as read from a data pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    #[serde(default)]
    pub parent: Option<NodeId>,
    pub display: Display,
    #[serde(default)]
    pub criteria: BTreeMap<String, Criterion>,
    /// Resources this age gates.
    #[serde(default)]
    pub unlocks: BTreeSet<ResourceId>,
}

impl NodeDefinition {
    pub fn new(display: Display) -> Self {
        Self {
            parent: None,
            display,
            criteria: BTreeMap::new(),
            unlocks: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn with_criterion(mut self, name: impl Into<String>, criterion: Criterion) -> Self {
        self.criteria.insert(name.into(), criterion);
        self
    }

    #[must_use]
    pub fn with_unlock(mut self, resource: impl Into<ResourceId>) -> Self {
        self.unlocks.insert(resource.into());
        self
    }
}

// =============================================================================
// REQUIREMENT
// =============================================================================

/// What completing a node takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Every named criterion must be satisfied (logical AND).
    Explicit(BTreeSet<String>),
    /// No declared criteria. The node completes trivially and silently.
    TriviallySatisfied,
}

impl Requirement {
    /// Derive the requirement from declared criteria.
    pub fn from_criteria(criteria: &BTreeMap<String, Criterion>) -> Self {
        if criteria.is_empty() {
            Self::TriviallySatisfied
        } else {
            Self::Explicit(criteria.keys().cloned().collect())
        }
    }

    /// Evaluate against a per-criterion predicate.
    pub fn is_met<F>(&self, satisfied: F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        match self {
            Self::Explicit(names) => names.iter().all(|name| satisfied(name)),
            Self::TriviallySatisfied => true,
        }
    }

    /// Whether completion should be announced to the session.
    #[must_use]
    pub fn announces(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }
}

// =============================================================================
// NODE
// =============================================================================

/// A validated age. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    record: RecordId,
    parent: Option<NodeId>,
    display: Display,
    criteria: BTreeMap<String, Criterion>,
    unlocks: BTreeSet<ResourceId>,
    requirement: Requirement,
}

impl Node {
    /// Build a node from its definition. Parent validity is the graph's job.
    pub fn new(id: NodeId, definition: NodeDefinition) -> Self {
        let requirement = Requirement::from_criteria(&definition.criteria);
        Self {
            record: id.record_id(),
            id,
            parent: definition.parent,
            display: definition.display,
            criteria: definition.criteria,
            unlocks: definition.unlocks,
            requirement,
        }
    }

    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Record id in the external progress store.
    #[must_use]
    pub fn record_id(&self) -> &RecordId {
        &self.record
    }

    #[must_use]
    pub fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    #[must_use]
    pub fn display(&self) -> &Display {
        &self.display
    }

    #[must_use]
    pub fn criteria(&self) -> &BTreeMap<String, Criterion> {
        &self.criteria
    }

    #[must_use]
    pub fn unlocks(&self) -> &BTreeSet<ResourceId> {
        &self.unlocks
    }

    #[must_use]
    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    /// False for silent nodes (no declared criteria).
    #[must_use]
    pub fn announces(&self) -> bool {
        self.requirement.announces()
    }

    /// Category of the node id (path segment before the first `/`).
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.id.category()
    }
}

// =============================================================================
// TESTS
// =============================================================================
