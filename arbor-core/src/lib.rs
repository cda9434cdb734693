//! Arbor Core
//!
//! This crate provides the core engine for the Arbor reactive
//! object-observation library. It implements:
//!
//! - A dynamic value model (records, lists, scalars, time/set/map cells)
//! - An arena-backed registry with canonical value identity
//! - Write/delete interception with parent-link maintenance
//! - Change bubbling across multi-parent object graphs
//! - Per-tick batch coalescing of mutation bursts
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `value`: the dynamic value types that flow through the engine
//! - `observe`: the registry, mutation interception, bubbling, and batching
//!
//! # Example
//!
//! ```rust
//! use arbor_core::observe::Registry;
//! use arbor_core::value::Value;
//!
//! let mut reg = Registry::new();
//! let user = reg
//!     .make(Value::record([("name", Value::from("ada"))]))
//!     .unwrap();
//!
//! // Synchronous per-property notifications
//! reg.on_prop_changed(user, |_, e| {
//!     println!("{} changed: {:?} -> {:?}", e.prop, e.prev, e.next);
//! })
//! .unwrap();
//!
//! // Batched, deduplicated notifications
//! reg.on_changed(user, |_, e| {
//!     println!("changed props: {:?}", e.props);
//! })
//! .unwrap();
//!
//! reg.set(user, "name", Value::from("grace")).unwrap();
//! reg.set(user, "age", Value::from(36)).unwrap();
//! reg.flush(); // delivers one batch: ["name", "age"]
//! ```

pub mod error;
pub mod observe;
pub mod value;

pub use error::ObserveError;
pub use observe::{Handle, Registry, Subscription};
pub use value::Value;
