//! Observation Registry
//!
//! The registry is the central coordinator: an arena of observed values plus
//! the identity and scheduling state that ties the engine together. It
//! replaces ambient global bookkeeping with an explicit context that is
//! passed to (or owns) every operation.
//!
//! # How It Works
//!
//! 1. `make()` registers a value: it allocates a generation-counted arena
//!    slot, records the canonical identity of shared-cell containers, and
//!    recursively registers nested records before the node is activated.
//!
//! 2. Writes and deletes go through the mutation methods (see the `mutate`
//!    module), which maintain parent links and fan out change events.
//!
//! 3. Nodes with batched listeners accumulate changed property names; an
//!    explicit `flush()` (see the `batch` module) delivers the coalesced
//!    events at the caller's tick boundary.
//!
//! # Identity
//!
//! Every raw value maps to at most one handle. Registering an existing
//! handle returns it unchanged, and registering a shared container cell that
//! is already known returns its existing handle (pointer identity). Slots
//! freed by `dispose` bump their generation so stale handles are rejected
//! rather than resurrected.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use super::adapter::ContainerKind;
use super::event::{BatchChange, BatchFn, PropChange, PropFn};
use super::handle::{Handle, ListenerId, ListenerKind, Subscription};
use super::node::{ExcludeNested, MakeOptions, Node, RawObject};
use crate::error::{ObserveError, Result};
use crate::value::Value;

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-backed registry of observed values.
#[derive(Default)]
pub struct Registry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Shared-cell address -> handle, for container canonicalization.
    canonical: HashMap<usize, Handle>,
    /// FIFO queue of nodes with a scheduled batch flush.
    pub(crate) flush_queue: VecDeque<Handle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value for observation with default options.
    ///
    /// Idempotent: registering an existing handle, or a container cell that
    /// is already registered, returns the existing handle.
    pub fn make(&mut self, raw: Value) -> Result<Handle> {
        self.make_inner(raw, None, MakeOptions::default())
    }

    /// Register a value with explicit nested-wrapping options.
    pub fn make_with(&mut self, raw: Value, options: MakeOptions) -> Result<Handle> {
        self.make_inner(raw, None, options)
    }

    pub(crate) fn make_inner(
        &mut self,
        raw: Value,
        parent: Option<(Handle, &str)>,
        options: MakeOptions,
    ) -> Result<Handle> {
        match raw {
            Value::Ref(handle) => {
                self.node(handle)?;
                if let Some((parent, key)) = parent {
                    self.add_parent(handle, parent, key);
                }
                Ok(handle)
            }
            Value::Record(map) => {
                let handle = self.alloc(RawObject::Record(map), options.exclude_nested, false);
                if let Some((parent, key)) = parent {
                    self.add_parent(handle, parent, key);
                }
                self.wrap_children(handle)?;
                if let Ok(node) = self.node_mut(handle) {
                    node.ready = true;
                }
                tracing::debug!(handle = handle.index(), "registered record");
                Ok(handle)
            }
            Value::Time(t) => self.make_container(RawObject::Time(t), parent),
            Value::Set(s) => self.make_container(RawObject::Set(s), parent),
            Value::Map(m) => self.make_container(RawObject::Map(m), parent),
            other => Err(ObserveError::NotObservable { kind: other.kind() }),
        }
    }

    fn make_container(
        &mut self,
        raw: RawObject,
        parent: Option<(Handle, &str)>,
    ) -> Result<Handle> {
        let ptr = raw
            .canonical_ptr()
            .expect("containers always have a canonical address");
        if let Some(&existing) = self.canonical.get(&ptr) {
            if let Some((parent, key)) = parent {
                self.add_parent(existing, parent, key);
            }
            return Ok(existing);
        }
        let kind = raw.kind();
        let handle = self.alloc(raw, ExcludeNested::None, true);
        self.canonical.insert(ptr, handle);
        if let Some((parent, key)) = parent {
            self.add_parent(handle, parent, key);
        }
        tracing::debug!(handle = handle.index(), %kind, "registered container");
        Ok(handle)
    }

    fn alloc(&mut self, raw: RawObject, exclude: ExcludeNested, ready: bool) -> Handle {
        let node = Node::new(raw, exclude, ready);
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            Handle::new(index, slot.generation)
        } else {
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            Handle::new(self.slots.len() as u32 - 1, 0)
        }
    }

    /// Recursively register the record-valued properties of a freshly
    /// allocated record node, replacing each slot with a child handle.
    /// Handles already sitting in the record gain their parent link here.
    ///
    /// Runs during phase one of construction: the node is not ready, so no
    /// events can fire.
    fn wrap_children(&mut self, handle: Handle) -> Result<()> {
        let (keys, exclude) = {
            let node = self.node(handle)?;
            if !node.exclude.wraps_children() {
                return Ok(());
            }
            let RawObject::Record(rec) = &node.raw else {
                return Ok(());
            };
            let keys: Vec<String> = rec
                .iter()
                .filter(|(_, v)| matches!(v, Value::Record(_) | Value::Ref(_)))
                .map(|(k, _)| k.clone())
                .collect();
            (keys, node.exclude.clone())
        };
        for key in keys {
            let child_raw = {
                let rec = self.record_mut(handle)?;
                match rec.get_mut(&key) {
                    Some(slot) => std::mem::replace(slot, Value::Null),
                    None => continue,
                }
            };
            let child = self.make_inner(
                child_raw,
                Some((handle, key.as_str())),
                exclude.options_for_child(&key),
            )?;
            // Re-inserting an existing key keeps its position.
            self.record_mut(handle)?.insert(key, Value::Ref(child));
        }
        Ok(())
    }

    /// Whether a value is currently observed by this registry.
    pub fn is_observed(&self, value: &Value) -> bool {
        match value {
            Value::Ref(handle) => self.contains(*handle),
            Value::Time(t) => self.canonical.contains_key(&t.as_ptr()),
            Value::Set(s) => self.canonical.contains_key(&s.as_ptr()),
            Value::Map(m) => self.canonical.contains_key(&m.as_ptr()),
            _ => false,
        }
    }

    /// Whether the handle names a live slot.
    pub fn contains(&self, handle: Handle) -> bool {
        self.node(handle).is_ok()
    }

    /// The container kind of an observed value.
    pub fn kind(&self, handle: Handle) -> Result<ContainerKind> {
        Ok(self.node(handle)?.raw.kind())
    }

    /// Read one property of an observed record. Absent keys read as `Null`.
    pub fn get(&self, handle: Handle, key: &str) -> Result<Value> {
        let node = self.node(handle)?;
        match &node.raw {
            RawObject::Record(rec) => Ok(rec.get(key).cloned().unwrap_or(Value::Null)),
            other => Err(ObserveError::KindMismatch {
                expected: ContainerKind::Record,
                found: other.kind(),
            }),
        }
    }

    /// Property names of an observed record, in insertion order.
    pub fn keys(&self, handle: Handle) -> Result<Vec<String>> {
        let node = self.node(handle)?;
        match &node.raw {
            RawObject::Record(rec) => Ok(rec.keys().cloned().collect()),
            other => Err(ObserveError::KindMismatch {
                expected: ContainerKind::Record,
                found: other.kind(),
            }),
        }
    }

    /// Register a synchronous per-property listener.
    ///
    /// Fails with `StaleHandle` if the value was never registered or has
    /// been disposed; listening on an unobserved value is programmer error.
    pub fn on_prop_changed<F>(&mut self, handle: Handle, callback: F) -> Result<Subscription>
    where
        F: FnMut(&mut Registry, &PropChange) + 'static,
    {
        let id = ListenerId::new();
        let callback: PropFn = Rc::new(RefCell::new(callback));
        self.node_mut(handle)?.prop_listeners.push((id, callback));
        Ok(Subscription {
            handle,
            listener: id,
            kind: ListenerKind::Prop,
        })
    }

    /// Register a batched listener, delivered at most once per node per
    /// flush with the deduplicated list of changed property names.
    pub fn on_changed<F>(&mut self, handle: Handle, callback: F) -> Result<Subscription>
    where
        F: FnMut(&mut Registry, &BatchChange) + 'static,
    {
        let id = ListenerId::new();
        let callback: BatchFn = Rc::new(RefCell::new(callback));
        self.node_mut(handle)?.change_listeners.push((id, callback));
        Ok(Subscription {
            handle,
            listener: id,
            kind: ListenerKind::Change,
        })
    }

    /// Remove a previously registered listener. No-op if the listener or
    /// its node is already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) {
        let Ok(node) = self.node_mut(subscription.handle) else {
            return;
        };
        match subscription.kind {
            ListenerKind::Prop => {
                node.prop_listeners
                    .retain(|(id, _)| *id != subscription.listener);
            }
            ListenerKind::Change => {
                node.change_listeners
                    .retain(|(id, _)| *id != subscription.listener);
            }
        }
    }

    /// Sever all edges of an observed value and free its slot.
    ///
    /// Children lose their parent link to this node. Parents' record slots
    /// keep a now-stale handle that every later operation rejects via the
    /// generation counter. A scheduled batch for this node is dropped at
    /// flush time.
    pub fn dispose(&mut self, handle: Handle) -> Result<()> {
        let (children, ptr) = {
            let node = self.node(handle)?;
            let children: Vec<Handle> = match &node.raw {
                RawObject::Record(rec) => rec.values().filter_map(Value::as_handle).collect(),
                _ => Vec::new(),
            };
            (children, node.raw.canonical_ptr())
        };
        for child in children {
            if let Ok(child_node) = self.node_mut(child) {
                child_node.parents.shift_remove(&handle);
            }
        }
        if let Some(ptr) = ptr {
            self.canonical.remove(&ptr);
        }
        let slot = &mut self.slots[handle.index() as usize];
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index());
        tracing::debug!(handle = handle.index(), "disposed");
        Ok(())
    }

    pub(crate) fn node(&self, handle: Handle) -> Result<&Node> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.node.as_ref())
            .ok_or(ObserveError::StaleHandle)
    }

    pub(crate) fn node_mut(&mut self, handle: Handle) -> Result<&mut Node> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.node.as_mut())
            .ok_or(ObserveError::StaleHandle)
    }

    pub(crate) fn record_mut(
        &mut self,
        handle: Handle,
    ) -> Result<&mut indexmap::IndexMap<String, Value>> {
        match &mut self.node_mut(handle)?.raw {
            RawObject::Record(rec) => Ok(rec),
            other => Err(ObserveError::KindMismatch {
                expected: ContainerKind::Record,
                found: other.kind(),
            }),
        }
    }

    pub(crate) fn add_parent(&mut self, child: Handle, parent: Handle, key: &str) {
        if let Ok(node) = self.node_mut(child) {
            node.parents.insert(parent, key.to_string());
        }
    }

    /// Remove the parent link, but only if the child is still reachable
    /// from `parent` under `key`; a link re-registered under another key
    /// stays intact.
    pub(crate) fn remove_parent(&mut self, child: Handle, parent: Handle, key: &str) {
        if let Ok(node) = self.node_mut(child) {
            if node.parents.get(&parent).is_some_and(|k| k == key) {
                node.parents.shift_remove(&parent);
            }
        }
    }
}
