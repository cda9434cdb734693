//! Dynamic Value Model
//!
//! This module defines the value types that flow through the observation
//! engine: a dynamic [`Value`] enum covering records, lists, scalars, and the
//! mutable container types (time/set/map) that change state through method
//! calls rather than slot assignment.
//!
//! # Design Notes
//!
//! 1. Records are plain `IndexMap`s moved into the engine; the registry
//!    replaces nested record slots with handles when a record is observed.
//!
//! 2. Containers ([`TimeValue`], [`SetValue`], [`MapValue`]) are shared
//!    cells (`Rc<RefCell<..>>`). Cloning one clones the reference, not the
//!    contents, which lets the registry canonicalize them by pointer
//!    identity: observing the same cell twice yields the same handle.
//!
//! 3. [`Scalar`] is the hashable subset of `Value` used for set elements and
//!    map keys.

mod container;
mod model;
mod time;

pub use container::{MapValue, SetValue};
pub use model::{Scalar, Value, ValueKind};
pub use time::{DateField, TimeValue};
