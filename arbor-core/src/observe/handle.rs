//! Handles and subscription tokens.
//!
//! A [`Handle`] is a generation-counted index into the registry arena. The
//! generation guards against stale back-references: once a slot is freed by
//! `dispose`, its generation is bumped and any handle still pointing at the
//! old occupant is rejected with `StaleHandle`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Externally used handle to an observed value.
///
/// Handles are cheap to copy and compare; they carry no ownership. All
/// operations on a handle go through the [`Registry`](super::Registry) that
/// issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot index. Stable for the lifetime of the observed value.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

/// Unique identifier for a registered listener.
///
/// Uses an atomic counter so IDs never collide even across registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Which listener list a subscription belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListenerKind {
    Prop,
    Change,
}

/// Token returned by `on_prop_changed`/`on_changed`.
///
/// Pass it back to [`Registry::unsubscribe`](super::Registry::unsubscribe) to
/// remove the callback. Unsubscribing twice, or after the handle was
/// disposed, is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct Subscription {
    pub(crate) handle: Handle,
    pub(crate) listener: ListenerId,
    pub(crate) kind: ListenerKind,
}

impl Subscription {
    /// The handle this subscription listens on.
    pub fn handle(&self) -> Handle {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_ids_are_unique() {
        let a = ListenerId::new();
        let b = ListenerId::new();
        let c = ListenerId::new();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn handles_compare_by_index_and_generation() {
        assert_eq!(Handle::new(1, 0), Handle::new(1, 0));
        assert_ne!(Handle::new(1, 0), Handle::new(1, 1));
        assert_ne!(Handle::new(1, 0), Handle::new(2, 0));
    }
}
