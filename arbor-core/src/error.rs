//! Error types for the observation engine.
//!
//! Errors fall into two groups:
//!
//! - Programmer misuse (subscribing to a value that was never registered,
//!   using a handle after `dispose`). These fail loudly with an `Err` so the
//!   bug surfaces at the call site.
//! - Kind mismatches (record operations on a container handle and vice
//!   versa). These are returned before any mutation takes place, so a failed
//!   write never emits a change event.
//!
//! Panics inside listener callbacks are not errors in this sense; they are
//! caught during dispatch so one failing listener cannot silence its
//! siblings. See the `observe::dispatch` module.

use thiserror::Error;

use crate::observe::ContainerKind;
use crate::value::ValueKind;

/// Errors produced by [`Registry`](crate::observe::Registry) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserveError {
    /// The handle does not name a live registry slot.
    ///
    /// Either the value was never passed through `make()`, or the slot was
    /// freed by `dispose()` and the generation counter no longer matches.
    #[error("stale or unobserved handle")]
    StaleHandle,

    /// `make()` was called on a value kind that cannot be observed.
    ///
    /// Only records, time values, sets, maps, and existing handles are
    /// observable; scalars and lists are plain data.
    #[error("{kind} values cannot be observed")]
    NotObservable {
        /// Kind of the rejected value.
        kind: ValueKind,
    },

    /// An operation was invoked on a handle of the wrong container kind,
    /// e.g. `set_add` on a record handle.
    #[error("operation expects a {expected} handle, found {found}")]
    KindMismatch {
        /// Kind the operation requires.
        expected: ContainerKind,
        /// Kind the handle actually refers to.
        found: ContainerKind,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ObserveError>;
