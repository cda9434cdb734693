//! Container Adapters
//!
//! Date-like, Set-like, and Map-like values change state through method
//! calls, not slot assignment, so plain write interception never sees them
//! move. The adapter strategy is: resolve the container kind once at
//! registration, and around each mutating call snapshot a cheap *adapter
//! key* (epoch milliseconds for time values, element count for sets and
//! maps). When the key moved, the mutation is reported as a property change
//! on a synthetic property name.
//!
//! With no listeners anywhere up-chain the snapshots are skipped entirely;
//! the call mutates the container and nothing else happens.

use std::fmt;

use crate::value::{MapValue, SetValue, TimeValue};

/// Synthetic property name reported for time-value mutations.
pub const PROP_VALUE_OF: &str = "valueOf";

/// Synthetic property name reported for set/map mutations.
pub const PROP_SIZE: &str = "size";

/// Kind of an observed value, resolved once at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Plain record; mutates through `set`/`remove`.
    Record,
    /// Date-like; mutates through field setters, keyed by epoch millis.
    Time,
    /// Set-like; keyed by element count.
    Set,
    /// Map-like; keyed by entry count.
    Map,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerKind::Record => "record",
            ContainerKind::Time => "time",
            ContainerKind::Set => "set",
            ContainerKind::Map => "map",
        };
        f.write_str(name)
    }
}

/// Adapter key of a time value.
pub(crate) fn time_key(t: &TimeValue) -> i64 {
    t.epoch_millis()
}

/// Adapter key of a set value.
pub(crate) fn set_key(s: &SetValue) -> i64 {
    s.len() as i64
}

/// Adapter key of a map value.
pub(crate) fn map_key(m: &MapValue) -> i64 {
    m.len() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Scalar;

    #[test]
    fn set_key_tracks_len_not_contents() {
        let set = SetValue::new();
        assert_eq!(set_key(&set), 0);
        set.insert(Scalar::from(1));
        assert_eq!(set_key(&set), 1);
        // Re-inserting an existing element leaves the key unchanged.
        set.insert(Scalar::from(1));
        assert_eq!(set_key(&set), 1);
    }

    #[test]
    fn time_key_is_epoch_millis() {
        let t = TimeValue::from_epoch_millis(12_345);
        assert_eq!(time_key(&t), 12_345);
    }
}
