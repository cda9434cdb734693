//! Set-like and Map-like Shared Values
//!
//! Both types are shared cells: cloning clones the reference, and the
//! registry canonicalizes them by cell address so the same underlying
//! container can never end up behind two handles.
//!
//! The methods here are the raw, un-instrumented mutators. Observed mutation
//! goes through the registry (`set_add`, `map_insert`, ...), which snapshots
//! the container's size around the call and reports a change when it moved.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use super::{Scalar, Value};

/// A shared Set-like value with insertion-ordered elements.
#[derive(Debug, Clone, Default)]
pub struct SetValue(Rc<RefCell<IndexSet<Scalar>>>);

impl SetValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an element; returns `true` if it was not already present.
    pub fn insert(&self, elem: Scalar) -> bool {
        self.0.borrow_mut().insert(elem)
    }

    /// Remove an element, preserving the order of the rest.
    pub fn remove(&self, elem: &Scalar) -> bool {
        self.0.borrow_mut().shift_remove(elem)
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn contains(&self, elem: &Scalar) -> bool {
        self.0.borrow().contains(elem)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Snapshot of the elements in insertion order.
    pub fn elements(&self) -> Vec<Scalar> {
        self.0.borrow().iter().cloned().collect()
    }

    pub(crate) fn as_ptr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for SetValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_ptr() == other.as_ptr() || *self.0.borrow() == *other.0.borrow()
    }
}

impl FromIterator<Scalar> for SetValue {
    fn from_iter<I: IntoIterator<Item = Scalar>>(iter: I) -> Self {
        Self(Rc::new(RefCell::new(iter.into_iter().collect())))
    }
}

/// A shared Map-like value with insertion-ordered entries.
#[derive(Debug, Clone, Default)]
pub struct MapValue(Rc<RefCell<IndexMap<Scalar, Value>>>);

impl MapValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry; returns the previous value, if any.
    pub fn insert(&self, key: Scalar, value: Value) -> Option<Value> {
        self.0.borrow_mut().insert(key, value)
    }

    /// Remove an entry, preserving the order of the rest.
    pub fn remove(&self, key: &Scalar) -> Option<Value> {
        self.0.borrow_mut().shift_remove(key)
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn get(&self, key: &Scalar) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &Scalar) -> bool {
        self.0.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Snapshot of the keys in insertion order.
    pub fn keys(&self) -> Vec<Scalar> {
        self.0.borrow().keys().cloned().collect()
    }

    pub(crate) fn as_ptr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for MapValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_ptr() == other.as_ptr() || *self.0.borrow() == *other.0.borrow()
    }
}

impl FromIterator<(Scalar, Value)> for MapValue {
    fn from_iter<I: IntoIterator<Item = (Scalar, Value)>>(iter: I) -> Self {
        Self(Rc::new(RefCell::new(iter.into_iter().collect())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_insert_is_idempotent() {
        let set = SetValue::new();
        assert!(set.insert(Scalar::from(1)));
        assert!(!set.insert(Scalar::from(1)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn set_clones_share_contents() {
        let a = SetValue::new();
        let b = a.clone();
        a.insert(Scalar::from("x"));
        assert!(b.contains(&Scalar::from("x")));
    }

    #[test]
    fn map_insert_returns_previous_value() {
        let map = MapValue::new();
        assert_eq!(map.insert(Scalar::from("k"), Value::from(1)), None);
        assert_eq!(
            map.insert(Scalar::from("k"), Value::from(2)),
            Some(Value::Int(1))
        );
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn remove_preserves_order() {
        let set: SetValue = [Scalar::from(1), Scalar::from(2), Scalar::from(3)]
            .into_iter()
            .collect();
        set.remove(&Scalar::from(2));
        assert_eq!(set.elements(), vec![Scalar::from(1), Scalar::from(3)]);
    }
}
