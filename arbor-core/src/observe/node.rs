//! Per-handle bookkeeping.
//!
//! One [`Node`] exists per observed value. It owns the underlying data, the
//! two listener lists, the parent-link map, and the pending-batch state. The
//! parent map supports multiple simultaneous parents for a shared child: the
//! graph is a DAG, not a tree. Re-registering the same parent under a new
//! key replaces the old entry, so each parent appears at most once.

use indexmap::{IndexMap, IndexSet};

use super::adapter::ContainerKind;
use super::event::{BatchFn, PropFn};
use super::handle::{Handle, ListenerId};
use crate::value::{MapValue, SetValue, TimeValue, Value};

/// Controls which nested record values are wrapped when a record is
/// observed (and by later writes into its slots).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExcludeNested {
    /// Wrap every nested record, recursively. The default.
    #[default]
    None,
    /// Treat all nested values as opaque; wrap nothing.
    All,
    /// Wrap every nested record, but the records under the listed top-level
    /// keys are wrapped shallowly: their own nested values stay opaque.
    Keys(Vec<String>),
}

impl ExcludeNested {
    /// Whether this node wraps nested records at all.
    pub(crate) fn wraps_children(&self) -> bool {
        !matches!(self, ExcludeNested::All)
    }

    /// Options for a child record wrapped under `key`.
    pub(crate) fn options_for_child(&self, key: &str) -> MakeOptions {
        let nested = match self {
            ExcludeNested::Keys(keys) if keys.iter().any(|k| k == key) => ExcludeNested::All,
            _ => ExcludeNested::None,
        };
        MakeOptions {
            exclude_nested: nested,
        }
    }
}

/// Options for [`Registry::make_with`](super::Registry::make_with).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MakeOptions {
    pub exclude_nested: ExcludeNested,
}

/// The data owned by a registry slot.
pub(crate) enum RawObject {
    Record(IndexMap<String, Value>),
    Time(TimeValue),
    Set(SetValue),
    Map(MapValue),
}

impl RawObject {
    pub(crate) fn kind(&self) -> ContainerKind {
        match self {
            RawObject::Record(_) => ContainerKind::Record,
            RawObject::Time(_) => ContainerKind::Time,
            RawObject::Set(_) => ContainerKind::Set,
            RawObject::Map(_) => ContainerKind::Map,
        }
    }

    /// Canonicalization key for shared-cell containers. Records are moved
    /// into the registry and have no external identity.
    pub(crate) fn canonical_ptr(&self) -> Option<usize> {
        match self {
            RawObject::Record(_) => None,
            RawObject::Time(t) => Some(t.as_ptr()),
            RawObject::Set(s) => Some(s.as_ptr()),
            RawObject::Map(m) => Some(m.as_ptr()),
        }
    }
}

/// Internal bookkeeping record for one observed value.
pub(crate) struct Node {
    pub(crate) raw: RawObject,
    /// Synchronous per-property listeners, in registration order.
    pub(crate) prop_listeners: Vec<(ListenerId, PropFn)>,
    /// Batched listeners, in registration order.
    pub(crate) change_listeners: Vec<(ListenerId, BatchFn)>,
    /// Parent links: the key under which each parent reaches this node.
    pub(crate) parents: IndexMap<Handle, String>,
    /// Distinct property names changed since the last flush.
    pub(crate) pending: IndexSet<String>,
    /// Whether this node is already on the flush queue.
    pub(crate) scheduled: bool,
    /// False during two-phase construction; writes pass through silently.
    pub(crate) ready: bool,
    /// Resolved nested-wrapping policy, consulted again by later writes.
    pub(crate) exclude: ExcludeNested,
}

impl Node {
    pub(crate) fn new(raw: RawObject, exclude: ExcludeNested, ready: bool) -> Self {
        Self {
            raw,
            prop_listeners: Vec::new(),
            change_listeners: Vec::new(),
            parents: IndexMap::new(),
            pending: IndexSet::new(),
            scheduled: false,
            ready,
            exclude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_wraps_everything() {
        let policy = ExcludeNested::None;
        assert!(policy.wraps_children());
        assert_eq!(policy.options_for_child("x"), MakeOptions::default());
    }

    #[test]
    fn all_policy_wraps_nothing() {
        assert!(!ExcludeNested::All.wraps_children());
    }

    #[test]
    fn keyed_policy_pushes_exclusion_one_level_down() {
        let policy = ExcludeNested::Keys(vec!["config".to_string()]);
        assert!(policy.wraps_children());
        assert_eq!(
            policy.options_for_child("config").exclude_nested,
            ExcludeNested::All
        );
        assert_eq!(
            policy.options_for_child("other").exclude_nested,
            ExcludeNested::None
        );
    }
}
