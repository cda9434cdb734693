//! Mutation Interception
//!
//! All observable writes go through here: record slot writes and deletes,
//! plus the instrumented container methods. The flow for a slot write is:
//!
//! 1. If the incoming value is a different object than the current one,
//!    maintain parent links: wrap a plain record into a new child or link
//!    an assigned existing handle, then detach the replaced observed child.
//!    Validation happens before the detach, so a rejected value leaves the
//!    old link untouched.
//! 2. Perform the write. Failures (stale handle, kind mismatch) return
//!    before this point, so a failed write never emits events.
//! 3. If anyone up-chain is listening and the observable value actually
//!    moved, fan out the synchronous event and, when batched listeners
//!    exist, accumulate the property into the node's pending batch.
//!
//! During two-phase construction (node not ready) writes pass through with
//! no interception at all.

use super::adapter::{self, ContainerKind, PROP_SIZE, PROP_VALUE_OF};
use super::equality::{same_identity, values_equal};
use super::handle::Handle;
use super::node::RawObject;
use super::registry::Registry;
use crate::error::{ObserveError, Result};
use crate::value::{DateField, MapValue, Scalar, SetValue, TimeValue, Value};

impl Registry {
    /// Write one property of an observed record.
    ///
    /// Assigning a plain record wraps it into a new observed child (unless
    /// excluded for this key); assigning an existing handle links it as a
    /// shared child. Replacing or deleting an observed child detaches its
    /// parent link.
    pub fn set(&mut self, handle: Handle, key: impl Into<String>, value: Value) -> Result<()> {
        let key = key.into();
        let ready = self.node(handle)?.ready;
        let prev = {
            let rec = self.record_mut(handle)?;
            rec.get(&key).cloned().unwrap_or(Value::Null)
        };

        if !ready {
            self.record_mut(handle)?.insert(key, value);
            return Ok(());
        }

        let mut next = value;
        if !same_identity(&prev, &next) {
            // Validate and link the incoming value first: a failed write
            // must leave the slot and the old child's parent link intact.
            let exclude = self.node(handle)?.exclude.clone();
            next = match next {
                Value::Record(map) if exclude.wraps_children() => {
                    let child = self.make_inner(
                        Value::Record(map),
                        Some((handle, key.as_str())),
                        exclude.options_for_child(&key),
                    )?;
                    Value::Ref(child)
                }
                Value::Ref(other) => {
                    // Validates the handle and records the shared-child link.
                    self.make_inner(
                        Value::Ref(other),
                        Some((handle, key.as_str())),
                        Default::default(),
                    )?;
                    Value::Ref(other)
                }
                other => other,
            };
            if let Value::Ref(old_child) = &prev {
                self.remove_parent(*old_child, handle, &key);
            }
        }

        self.record_mut(handle)?.insert(key.clone(), next.clone());

        if self.has_listeners(handle) && !values_equal(&prev, &next) {
            self.prop_changed(handle, &key, prev, next);
        }
        Ok(())
    }

    /// Delete one property of an observed record.
    ///
    /// Fires the event with `next = Null` whenever anyone is listening,
    /// mirroring a delete trap: no equality check is applied.
    pub fn remove(&mut self, handle: Handle, key: &str) -> Result<Option<Value>> {
        let ready = self.node(handle)?.ready;
        let prev = self.record_mut(handle)?.shift_remove(key);
        if let Some(Value::Ref(child)) = &prev {
            self.remove_parent(*child, handle, key);
        }
        if ready && self.has_listeners(handle) {
            let prev_value = prev.clone().unwrap_or(Value::Null);
            self.prop_changed(handle, key, prev_value, Value::Null);
        }
        Ok(prev)
    }

    /// Fan out an elementary change: synchronous dispatch always, batch
    /// accumulation only when batched listeners exist somewhere up-chain.
    pub(crate) fn prop_changed(&mut self, handle: Handle, prop: &str, prev: Value, next: Value) {
        self.dispatch_prop_changed(handle, prop, &prev, &next);
        if self.has_change_listeners(handle) {
            let needs_schedule = match self.node_mut(handle) {
                Ok(node) => {
                    node.pending.insert(prop.to_string());
                    !std::mem::replace(&mut node.scheduled, true)
                }
                Err(_) => false,
            };
            if needs_schedule {
                self.flush_queue.push_back(handle);
                tracing::trace!(handle = handle.index(), "scheduled batch flush");
            }
        }
    }

    // ------------------------------------------------------------------
    // Container adapters
    //
    // Each method is the instrumented form of one mutating container call:
    // with zero listeners up-chain it mutates and returns; otherwise it
    // snapshots the adapter key around the call and reports a change when
    // the key moved.
    // ------------------------------------------------------------------

    /// Set one civil field of an observed time value.
    pub fn date_set(&mut self, handle: Handle, field: DateField, value: i64) -> Result<()> {
        let time = self.time_value(handle)?;
        if !self.has_listeners(handle) {
            time.set(field, value);
            return Ok(());
        }
        let before = adapter::time_key(&time);
        time.set(field, value);
        let after = adapter::time_key(&time);
        if before != after {
            self.prop_changed(handle, PROP_VALUE_OF, Value::Int(before), Value::Int(after));
        }
        Ok(())
    }

    /// Set an observed time value from epoch milliseconds.
    pub fn date_set_time(&mut self, handle: Handle, epoch_millis: i64) -> Result<()> {
        let time = self.time_value(handle)?;
        if !self.has_listeners(handle) {
            time.set_time(epoch_millis);
            return Ok(());
        }
        let before = adapter::time_key(&time);
        time.set_time(epoch_millis);
        let after = adapter::time_key(&time);
        if before != after {
            self.prop_changed(handle, PROP_VALUE_OF, Value::Int(before), Value::Int(after));
        }
        Ok(())
    }

    /// Insert into an observed set; returns `true` if the element was new.
    pub fn set_add(&mut self, handle: Handle, elem: Scalar) -> Result<bool> {
        let set = self.set_value(handle)?;
        if !self.has_listeners(handle) {
            return Ok(set.insert(elem));
        }
        let before = adapter::set_key(&set);
        let inserted = set.insert(elem);
        let after = adapter::set_key(&set);
        if before != after {
            self.prop_changed(handle, PROP_SIZE, Value::Int(before), Value::Int(after));
        }
        Ok(inserted)
    }

    /// Remove from an observed set; returns `true` if the element existed.
    pub fn set_remove(&mut self, handle: Handle, elem: &Scalar) -> Result<bool> {
        let set = self.set_value(handle)?;
        if !self.has_listeners(handle) {
            return Ok(set.remove(elem));
        }
        let before = adapter::set_key(&set);
        let removed = set.remove(elem);
        let after = adapter::set_key(&set);
        if before != after {
            self.prop_changed(handle, PROP_SIZE, Value::Int(before), Value::Int(after));
        }
        Ok(removed)
    }

    /// Clear an observed set.
    pub fn set_clear(&mut self, handle: Handle) -> Result<()> {
        let set = self.set_value(handle)?;
        if !self.has_listeners(handle) {
            set.clear();
            return Ok(());
        }
        let before = adapter::set_key(&set);
        set.clear();
        let after = adapter::set_key(&set);
        if before != after {
            self.prop_changed(handle, PROP_SIZE, Value::Int(before), Value::Int(after));
        }
        Ok(())
    }

    /// Insert into an observed map; returns the replaced value, if any.
    ///
    /// Replacing the value under an existing key leaves the entry count
    /// unchanged and therefore reports nothing; the adapter key for maps is
    /// the size, not the contents.
    pub fn map_insert(&mut self, handle: Handle, key: Scalar, value: Value) -> Result<Option<Value>> {
        let map = self.map_value(handle)?;
        if !self.has_listeners(handle) {
            return Ok(map.insert(key, value));
        }
        let before = adapter::map_key(&map);
        let replaced = map.insert(key, value);
        let after = adapter::map_key(&map);
        if before != after {
            self.prop_changed(handle, PROP_SIZE, Value::Int(before), Value::Int(after));
        }
        Ok(replaced)
    }

    /// Remove from an observed map; returns the removed value, if any.
    pub fn map_remove(&mut self, handle: Handle, key: &Scalar) -> Result<Option<Value>> {
        let map = self.map_value(handle)?;
        if !self.has_listeners(handle) {
            return Ok(map.remove(key));
        }
        let before = adapter::map_key(&map);
        let removed = map.remove(key);
        let after = adapter::map_key(&map);
        if before != after {
            self.prop_changed(handle, PROP_SIZE, Value::Int(before), Value::Int(after));
        }
        Ok(removed)
    }

    /// Clear an observed map.
    pub fn map_clear(&mut self, handle: Handle) -> Result<()> {
        let map = self.map_value(handle)?;
        if !self.has_listeners(handle) {
            map.clear();
            return Ok(());
        }
        let before = adapter::map_key(&map);
        map.clear();
        let after = adapter::map_key(&map);
        if before != after {
            self.prop_changed(handle, PROP_SIZE, Value::Int(before), Value::Int(after));
        }
        Ok(())
    }

    fn time_value(&self, handle: Handle) -> Result<TimeValue> {
        match &self.node(handle)?.raw {
            RawObject::Time(t) => Ok(t.clone()),
            other => Err(ObserveError::KindMismatch {
                expected: ContainerKind::Time,
                found: other.kind(),
            }),
        }
    }

    fn set_value(&self, handle: Handle) -> Result<SetValue> {
        match &self.node(handle)?.raw {
            RawObject::Set(s) => Ok(s.clone()),
            other => Err(ObserveError::KindMismatch {
                expected: ContainerKind::Set,
                found: other.kind(),
            }),
        }
    }

    fn map_value(&self, handle: Handle) -> Result<MapValue> {
        match &self.node(handle)?.raw {
            RawObject::Map(m) => Ok(m.clone()),
            other => Err(ObserveError::KindMismatch {
                expected: ContainerKind::Map,
                found: other.kind(),
            }),
        }
    }
}
