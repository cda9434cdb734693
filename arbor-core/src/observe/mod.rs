//! Object-Graph Observation
//!
//! This module implements the observation engine: registering mutable values
//! produces handles whose reads pass through untouched but whose writes and
//! deletes notify listeners, both per-property (synchronous) and batched
//! (per-flush, deduplicated).
//!
//! # Concepts
//!
//! ## Registry
//!
//! The explicit context everything runs in: an arena of observed values plus
//! identity canonicalization and the flush queue. Each raw value maps to at
//! most one handle.
//!
//! ## Bubbling
//!
//! One node can be a child of several parents at once (a DAG). A change
//! anywhere is re-delivered at every ancestor with the property renamed to
//! that ancestor's own slot key, so listeners only ever see "my direct child
//! changed".
//!
//! ## Batching
//!
//! Bursts of mutations within one tick coalesce into a single batched event
//! per node with a deduplicated property list, delivered by an explicit
//! `flush()` at the caller's tick boundary.
//!
//! ## Container adapters
//!
//! Date/Set/Map-like values mutate through method calls rather than slot
//! writes; their registry methods snapshot a cheap adapter key around each
//! call and report the mutation as a synthetic property change.

mod adapter;
mod batch;
mod dispatch;
mod equality;
mod event;
mod handle;
mod mutate;
mod node;
mod registry;

pub use adapter::{ContainerKind, PROP_SIZE, PROP_VALUE_OF};
pub use event::{BatchChange, PropChange};
pub use handle::{Handle, ListenerId, Subscription};
pub use node::{ExcludeNested, MakeOptions};
pub use registry::Registry;
