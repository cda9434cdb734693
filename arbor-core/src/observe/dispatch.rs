//! Event fan-out and bubbling.
//!
//! A change on one node is visible at every ancestor: the event is
//! re-delivered at each parent with `prop` renamed to the parent's own key
//! for the child and `target` rewritten to the parent's handle, so a change
//! three levels deep appears at every level as "my own direct slot changed".
//!
//! # Traversal
//!
//! Bubbling re-emits once per parent link: a diamond (two paths from the
//! change to one grandparent) notifies the grandparent under both slot
//! keys. Parent links form a DAG in the intended use but nothing stops a
//! caller from building a cycle, so every walk carries the chain of nodes
//! currently on the stack and refuses to re-enter one, which terminates
//! cycles without collapsing distinct acyclic paths.
//!
//! # Listener isolation
//!
//! Each callback runs under `catch_unwind`: a panicking listener is logged
//! and skipped, and siblings plus the rest of the bubbling chain still run.
//! A callback that mutates the graph re-enters the registry through the
//! `&mut Registry` argument it receives; if that re-entry reaches the same
//! callback again it is skipped for the inner event instead of recursing.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use smallvec::SmallVec;

use super::event::{BatchChange, BatchFn, PropChange, PropFn};
use super::handle::Handle;
use super::registry::Registry;
use crate::value::Value;

impl Registry {
    /// True if the node or any ancestor has listeners of either class.
    pub(crate) fn has_listeners(&self, handle: Handle) -> bool {
        self.walk_listeners(handle, false, &mut HashSet::new())
    }

    /// True if the node or any ancestor has batched listeners.
    pub(crate) fn has_change_listeners(&self, handle: Handle) -> bool {
        self.walk_listeners(handle, true, &mut HashSet::new())
    }

    fn walk_listeners(
        &self,
        handle: Handle,
        change_only: bool,
        visited: &mut HashSet<Handle>,
    ) -> bool {
        if !visited.insert(handle) {
            return false;
        }
        let Ok(node) = self.node(handle) else {
            return false;
        };
        let own = if change_only {
            !node.change_listeners.is_empty()
        } else {
            !node.prop_listeners.is_empty() || !node.change_listeners.is_empty()
        };
        if own {
            return true;
        }
        for parent in node.parents.keys() {
            if self.walk_listeners(*parent, change_only, visited) {
                return true;
            }
        }
        false
    }

    /// Deliver a synchronous per-property event at `origin` and bubble it up
    /// through every parent link.
    pub(crate) fn dispatch_prop_changed(
        &mut self,
        origin: Handle,
        prop: &str,
        prev: &Value,
        next: &Value,
    ) {
        let mut chain = HashSet::new();
        self.bubble_prop(origin, prop, prev, next, &mut chain);
    }

    fn bubble_prop(
        &mut self,
        handle: Handle,
        prop: &str,
        prev: &Value,
        next: &Value,
        chain: &mut HashSet<Handle>,
    ) {
        // The chain holds the nodes currently on the recursion stack, not
        // everything seen: a node reachable along two acyclic paths is
        // delivered to once per path.
        if !chain.insert(handle) {
            return;
        }
        let Ok(node) = self.node(handle) else {
            return;
        };
        let listeners: SmallVec<[PropFn; 4]> =
            node.prop_listeners.iter().map(|(_, f)| Rc::clone(f)).collect();
        let parents: SmallVec<[(Handle, String); 2]> = node
            .parents
            .iter()
            .map(|(&parent, key)| (parent, key.clone()))
            .collect();

        if !listeners.is_empty() {
            let event = PropChange {
                target: handle,
                prop: prop.to_string(),
                prev: prev.clone(),
                next: next.clone(),
            };
            tracing::trace!(handle = handle.index(), prop = %event.prop, "prop change");
            for cb in listeners {
                let Ok(mut guard) = cb.try_borrow_mut() else {
                    tracing::trace!(handle = handle.index(), "skipping re-entrant listener");
                    continue;
                };
                let this = &mut *self;
                let ev = &event;
                if catch_unwind(AssertUnwindSafe(move || (&mut *guard)(this, ev))).is_err() {
                    tracing::error!(
                        handle = handle.index(),
                        prop = %event.prop,
                        "prop listener panicked; continuing with remaining listeners"
                    );
                }
            }
        }

        for (parent, key) in parents {
            self.bubble_prop(parent, &key, prev, next, chain);
        }
        chain.remove(&handle);
    }

    /// Deliver a batched event at `origin` and bubble it up; each ancestor
    /// sees a single-element prop list naming only its own slot.
    pub(crate) fn dispatch_changed(&mut self, origin: Handle, props: Vec<String>) {
        let mut chain = HashSet::new();
        self.bubble_batch(origin, props, &mut chain);
    }

    fn bubble_batch(&mut self, handle: Handle, props: Vec<String>, chain: &mut HashSet<Handle>) {
        if !chain.insert(handle) {
            return;
        }
        let Ok(node) = self.node(handle) else {
            return;
        };
        let listeners: SmallVec<[BatchFn; 4]> = node
            .change_listeners
            .iter()
            .map(|(_, f)| Rc::clone(f))
            .collect();
        let parents: SmallVec<[(Handle, String); 2]> = node
            .parents
            .iter()
            .map(|(&parent, key)| (parent, key.clone()))
            .collect();

        if !listeners.is_empty() {
            let event = BatchChange {
                target: handle,
                props,
            };
            tracing::trace!(
                handle = handle.index(),
                props = event.props.len(),
                "batch change"
            );
            for cb in listeners {
                let Ok(mut guard) = cb.try_borrow_mut() else {
                    tracing::trace!(handle = handle.index(), "skipping re-entrant listener");
                    continue;
                };
                let this = &mut *self;
                let ev = &event;
                if catch_unwind(AssertUnwindSafe(move || (&mut *guard)(this, ev))).is_err() {
                    tracing::error!(
                        handle = handle.index(),
                        "batch listener panicked; continuing with remaining listeners"
                    );
                }
            }
        }

        for (parent, key) in parents {
            self.bubble_batch(parent, vec![key], chain);
        }
        chain.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn record_with_v() -> Value {
        Value::record([("v", Value::from(1))])
    }

    #[test]
    fn listener_predicates_see_ancestors() {
        let mut reg = Registry::new();
        let root = reg
            .make(Value::record([("child", record_with_v())]))
            .unwrap();
        let child = reg.get(root, "child").unwrap().as_handle().unwrap();

        assert!(!reg.has_listeners(child));
        let sub = reg.on_changed(root, |_, _| {}).unwrap();
        assert!(reg.has_listeners(child));
        assert!(reg.has_change_listeners(child));

        reg.unsubscribe(sub);
        assert!(!reg.has_listeners(child));
    }

    #[test]
    fn prop_events_bubble_with_renamed_props() {
        let mut reg = Registry::new();
        let root = reg
            .make(Value::record([(
                "mid",
                Value::record([("leaf", record_with_v())]),
            )]))
            .unwrap();
        let mid = reg.get(root, "mid").unwrap().as_handle().unwrap();
        let leaf = reg.get(mid, "leaf").unwrap().as_handle().unwrap();

        let seen: Rc<RefCell<Vec<(Handle, String)>>> = Rc::new(RefCell::new(Vec::new()));
        for h in [root, mid, leaf] {
            let seen = seen.clone();
            reg.on_prop_changed(h, move |_, e| {
                seen.borrow_mut().push((e.target, e.prop.clone()));
            })
            .unwrap();
        }

        reg.set(leaf, "v", Value::from(2)).unwrap();

        let seen = seen.borrow();
        assert_eq!(
            *seen,
            vec![
                (leaf, "v".to_string()),
                (mid, "leaf".to_string()),
                (root, "mid".to_string()),
            ]
        );
    }

    #[test]
    fn diamond_delivers_under_both_keys() {
        let mut reg = Registry::new();
        let leaf = reg.make(record_with_v()).unwrap();
        let root = reg
            .make(Value::record([
                ("a", Value::record([("leaf", Value::Ref(leaf))])),
                ("b", Value::record([("leaf", Value::Ref(leaf))])),
            ]))
            .unwrap();

        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        reg.on_prop_changed(root, move |_, e| {
            sink.borrow_mut().push(e.prop.clone());
        })
        .unwrap();

        reg.set(leaf, "v", Value::from(2)).unwrap();

        // The shared leaf reaches the root along two paths; the root is
        // notified once per path, under that path's own slot key.
        let mut seen = seen.borrow().clone();
        seen.sort();
        assert_eq!(seen, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn diamond_batches_deliver_under_both_keys() {
        let mut reg = Registry::new();
        let leaf = reg.make(record_with_v()).unwrap();
        let root = reg
            .make(Value::record([
                ("a", Value::record([("leaf", Value::Ref(leaf))])),
                ("b", Value::record([("leaf", Value::Ref(leaf))])),
            ]))
            .unwrap();

        let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        reg.on_changed(root, move |_, e| {
            sink.borrow_mut().push(e.props.clone());
        })
        .unwrap();

        reg.set(leaf, "v", Value::from(2)).unwrap();
        reg.flush();

        let mut seen = seen.borrow().clone();
        seen.sort();
        assert_eq!(
            seen,
            vec![vec!["a".to_string()], vec!["b".to_string()]]
        );
    }

    #[test]
    fn cyclic_parent_links_terminate() {
        let mut reg = Registry::new();
        let a = reg.make(record_with_v()).unwrap();
        let b = reg.make(record_with_v()).unwrap();
        // a.other = b; b.other = a
        reg.set(a, "other", Value::Ref(b)).unwrap();
        reg.set(b, "other", Value::Ref(a)).unwrap();

        let count = Rc::new(RefCell::new(0));
        let count2 = count.clone();
        reg.on_prop_changed(a, move |_, _| {
            *count2.borrow_mut() += 1;
        })
        .unwrap();

        // Must terminate, and 'a' is notified once per event.
        reg.set(b, "v", Value::from(9)).unwrap();
        assert!(reg.has_listeners(b));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn panicking_listener_does_not_silence_siblings() {
        let mut reg = Registry::new();
        let h = reg.make(record_with_v()).unwrap();

        reg.on_prop_changed(h, |_, _| panic!("boom")).unwrap();
        let fired = Rc::new(RefCell::new(false));
        let fired2 = fired.clone();
        reg.on_prop_changed(h, move |_, _| {
            *fired2.borrow_mut() = true;
        })
        .unwrap();

        reg.set(h, "v", Value::from(2)).unwrap();
        assert!(*fired.borrow());
        // The write itself took effect despite the panic.
        assert_eq!(reg.get(h, "v").unwrap(), Value::Int(2));
    }

    #[test]
    fn reentrant_mutation_inside_listener_does_not_recurse_into_itself() {
        let mut reg = Registry::new();
        let h = reg.make(record_with_v()).unwrap();

        let calls = Rc::new(RefCell::new(0));
        let calls2 = calls.clone();
        reg.on_prop_changed(h, move |reg, e| {
            *calls2.borrow_mut() += 1;
            if e.prop == "v" {
                // Triggers a nested dispatch; this same callback is skipped
                // for the inner event rather than recursing.
                reg.set(e.target, "w", Value::from(1)).unwrap();
            }
        })
        .unwrap();

        reg.set(h, "v", Value::from(2)).unwrap();
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(reg.get(h, "w").unwrap(), Value::Int(1));
    }
}
