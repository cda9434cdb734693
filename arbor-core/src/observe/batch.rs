//! Deferred Batch Flush
//!
//! The first change on a node (with batched listeners up-chain) pushes the
//! node onto a FIFO flush queue; further changes before the flush only add
//! property names to the node's pending set. `flush()` is the explicit tick
//! boundary: callers invoke it once their synchronous work settles, and each
//! queued node delivers exactly one batched event with its deduplicated
//! property list.
//!
//! Two deliberate policies:
//!
//! - A scheduled flush always fires. Listeners removed between scheduling
//!   and flush simply receive nothing; there is no re-check of
//!   `has_change_listeners` at flush time, and no cancellation primitive.
//! - `flush()` drains only the nodes queued before it started. Mutations
//!   made by listeners during the flush schedule into the *next* flush, so
//!   a node is delivered at most once per tick and a flush never nests.

use super::registry::Registry;

impl Registry {
    /// Deliver all batches scheduled before this call, in FIFO order.
    ///
    /// Nodes disposed after scheduling are skipped silently.
    pub fn flush(&mut self) {
        let due = std::mem::take(&mut self.flush_queue);
        for handle in due {
            let props: Vec<String> = match self.node_mut(handle) {
                Ok(node) => {
                    node.scheduled = false;
                    node.pending.drain(..).collect()
                }
                Err(_) => {
                    tracing::trace!(handle = handle.index(), "dropping batch for disposed node");
                    continue;
                }
            };
            if props.is_empty() {
                continue;
            }
            tracing::trace!(handle = handle.index(), props = props.len(), "flushing batch");
            self.dispatch_changed(handle, props);
        }
    }

    /// Whether any node has a scheduled batch.
    pub fn has_pending(&self) -> bool {
        !self.flush_queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::value::Value;

    #[test]
    fn burst_coalesces_into_one_deduplicated_batch() {
        let mut reg = Registry::new();
        let h = reg
            .make(Value::record([("a", Value::from(0)), ("b", Value::from(0))]))
            .unwrap();

        let batches: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = batches.clone();
        reg.on_changed(h, move |_, e| {
            sink.borrow_mut().push(e.props.clone());
        })
        .unwrap();

        reg.set(h, "a", Value::from(1)).unwrap();
        reg.set(h, "b", Value::from(2)).unwrap();
        reg.set(h, "a", Value::from(3)).unwrap();
        assert!(batches.borrow().is_empty());
        assert!(reg.has_pending());

        reg.flush();
        assert_eq!(*batches.borrow(), vec![vec!["a".to_string(), "b".to_string()]]);

        // Nothing left over for the next tick.
        reg.flush();
        assert_eq!(batches.borrow().len(), 1);
        assert!(!reg.has_pending());
    }

    #[test]
    fn ancestors_see_single_element_prop_lists() {
        let mut reg = Registry::new();
        let root = reg
            .make(Value::record([(
                "child",
                Value::record([("a", Value::from(0)), ("b", Value::from(0))]),
            )]))
            .unwrap();
        let child = reg.get(root, "child").unwrap().as_handle().unwrap();

        let batches: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = batches.clone();
        reg.on_changed(root, move |_, e| {
            sink.borrow_mut().push(e.props.clone());
        })
        .unwrap();

        reg.set(child, "a", Value::from(1)).unwrap();
        reg.set(child, "b", Value::from(2)).unwrap();
        reg.flush();

        // The root never sees "a"/"b", only its own slot name.
        assert_eq!(*batches.borrow(), vec![vec!["child".to_string()]]);
    }

    #[test]
    fn scheduled_flush_fires_even_after_unsubscribe() {
        let mut reg = Registry::new();
        let h = reg.make(Value::record([("v", Value::from(0))])).unwrap();

        let fired = Rc::new(RefCell::new(0));
        let sink = fired.clone();
        let sub = reg
            .on_changed(h, move |_, _| {
                *sink.borrow_mut() += 1;
            })
            .unwrap();

        reg.set(h, "v", Value::from(1)).unwrap();
        assert!(reg.has_pending());
        reg.unsubscribe(sub);

        // The flush still runs (no re-check), but the removed listener
        // receives nothing and the pending state is cleared.
        reg.flush();
        assert_eq!(*fired.borrow(), 0);
        assert!(reg.node(h).unwrap().pending.is_empty());
        assert!(!reg.node(h).unwrap().scheduled);
    }

    #[test]
    fn disposed_node_batches_are_dropped() {
        let mut reg = Registry::new();
        let h = reg.make(Value::record([("v", Value::from(0))])).unwrap();
        reg.on_changed(h, |_, _| {}).unwrap();

        reg.set(h, "v", Value::from(1)).unwrap();
        reg.dispose(h).unwrap();
        reg.flush();
        assert!(!reg.has_pending());
    }

    #[test]
    fn mutation_during_flush_schedules_the_next_tick() {
        let mut reg = Registry::new();
        let h = reg
            .make(Value::record([("v", Value::from(0)), ("w", Value::from(0))]))
            .unwrap();

        let batches: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = batches.clone();
        reg.on_changed(h, move |reg, e| {
            sink.borrow_mut().push(e.props.clone());
            if e.props == ["v"] {
                reg.set(e.target, "w", Value::from(1)).unwrap();
            }
        })
        .unwrap();

        reg.set(h, "v", Value::from(1)).unwrap();
        reg.flush();

        // The re-entrant write landed in a new batch, not the one in flight.
        assert_eq!(*batches.borrow(), vec![vec!["v".to_string()]]);
        assert!(reg.has_pending());

        reg.flush();
        assert_eq!(
            *batches.borrow(),
            vec![vec!["v".to_string()], vec!["w".to_string()]]
        );
    }

    #[test]
    fn independent_nodes_flush_in_scheduling_order() {
        let mut reg = Registry::new();
        let a = reg.make(Value::record([("v", Value::from(0))])).unwrap();
        let b = reg.make(Value::record([("v", Value::from(0))])).unwrap();

        let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
        let sink_a = order.clone();
        reg.on_changed(a, move |_, _| sink_a.borrow_mut().push("a"))
            .unwrap();
        let sink_b = order.clone();
        reg.on_changed(b, move |_, _| sink_b.borrow_mut().push("b"))
            .unwrap();

        reg.set(b, "v", Value::from(1)).unwrap();
        reg.set(a, "v", Value::from(1)).unwrap();
        reg.flush();

        assert_eq!(*order.borrow(), vec!["b", "a"]);
    }
}
