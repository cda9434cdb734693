//! Value-change predicates.
//!
//! Two different questions are asked about a write:
//!
//! - [`same_identity`] is the reference-level check that gates parent-link
//!   maintenance: did the slot receive a *different object*? Shared cells
//!   and handles compare by identity, scalars and lists by value.
//! - [`values_equal`] is the change predicate that gates event emission:
//!   did the observable value move? Numbers compare numerically across
//!   int/float, NaN replacing NaN counts as unchanged, and time values
//!   compare by epoch (the wrapper-type `valueOf` rule).

use crate::value::Value;

/// Reference/primitive identity, the strict-inequality analog.
pub(crate) fn same_identity(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        // NaN is not identical to NaN here; the equality predicate below is
        // what keeps NaN-over-NaN writes silent.
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::List(x), Value::List(y)) => x == y,
        (Value::Time(x), Value::Time(y)) => x.as_ptr() == y.as_ptr(),
        (Value::Set(x), Value::Set(y)) => x.as_ptr() == y.as_ptr(),
        (Value::Map(x), Value::Map(y)) => x.as_ptr() == y.as_ptr(),
        (Value::Ref(x), Value::Ref(y)) => x == y,
        _ => false,
    }
}

/// Did the observable value change? `false` means "changed, emit an event".
pub(crate) fn values_equal(prev: &Value, next: &Value) -> bool {
    if let (Some(a), Some(b)) = (prev.as_f64(), next.as_f64()) {
        return a == b || (a.is_nan() && b.is_nan());
    }
    match (prev, next) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::List(a), Value::List(b)) => a == b,
        // Plain records only appear in excluded (unwrapped) slots; they are
        // owned data with no stable identity, so they compare by contents.
        // Replacing one with an equal-content record is not a change.
        (Value::Record(a), Value::Record(b)) => a == b,
        (Value::Time(a), Value::Time(b)) => a.epoch_millis() == b.epoch_millis(),
        (Value::Set(a), Value::Set(b)) => a.as_ptr() == b.as_ptr(),
        (Value::Map(a), Value::Map(b)) => a.as_ptr() == b.as_ptr(),
        (Value::Ref(a), Value::Ref(b)) => a == b,
        _ => false,
    }
}
