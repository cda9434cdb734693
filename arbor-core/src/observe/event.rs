//! Change event types and listener callback aliases.

use std::cell::RefCell;
use std::rc::Rc;

use super::{Handle, Registry};
use crate::value::Value;

/// A single elementary change, delivered synchronously.
///
/// During bubbling the same underlying change is re-delivered at every
/// ancestor with `target` set to that ancestor's handle and `prop` renamed to
/// the key under which the ancestor reaches the changed child.
#[derive(Debug, Clone)]
pub struct PropChange {
    /// Handle the event is delivered on.
    pub target: Handle,
    /// Property name as seen from `target`.
    pub prop: String,
    /// Value before the change; `Null` when the key was absent.
    pub prev: Value,
    /// Value after the change; `Null` after a delete.
    pub next: Value,
}

/// A batched change: the deduplicated set of properties that changed on one
/// node since the last flush.
///
/// Ancestors receive a single-element `props` list naming only their own
/// slot, never the descendant's original property names.
#[derive(Debug, Clone)]
pub struct BatchChange {
    /// Handle the event is delivered on.
    pub target: Handle,
    /// Distinct changed property names, in first-change order.
    pub props: Vec<String>,
}

/// Listener callbacks receive the registry so re-entrant mutation is
/// explicit; mutations made inside a callback schedule further batches
/// instead of nesting into an in-progress flush.
pub(crate) type PropFn = Rc<RefCell<dyn FnMut(&mut Registry, &PropChange)>>;
pub(crate) type BatchFn = Rc<RefCell<dyn FnMut(&mut Registry, &BatchChange)>>;
