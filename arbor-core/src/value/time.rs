//! Date-like Shared Value
//!
//! [`TimeValue`] is the engine's Date analog: a shared mutable cell holding a
//! civil date-time that mutates through field setters rather than slot
//! assignment. Its observable identity is the epoch-millisecond value, which
//! the container adapter snapshots around each mutating call.
//!
//! # Semantics
//!
//! - Fields are civil (proleptic Gregorian, no time zone): year, month 1-12,
//!   day 1-31, hour/minute/second/millisecond.
//! - Setters normalize out-of-range fields by carrying into the next field,
//!   so `set(Month, 13)` rolls into January of the following year.
//! - Cloning a `TimeValue` clones the reference: both clones see the same
//!   underlying cell. Equality compares the epoch value, not the reference.
//!
//! Civil/epoch conversions use the standard era-based algorithms
//! (`days_from_civil` / `civil_from_days`).

use std::cell::RefCell;
use std::rc::Rc;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// A settable field of a [`TimeValue`].
///
/// UTC and local variants of the original setters collapse into one set of
/// fields here since the value carries no time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Year,
    /// Month, 1-12.
    Month,
    /// Day of month, 1-31.
    Day,
    Hours,
    Minutes,
    Seconds,
    Millis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CivilTime {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    millis: u32,
}

impl CivilTime {
    fn from_epoch(ms: i64) -> Self {
        let days = ms.div_euclid(MS_PER_DAY);
        let rem = ms.rem_euclid(MS_PER_DAY);
        let (year, month, day) = civil_from_days(days);
        Self {
            year: year as i32,
            month,
            day,
            hour: (rem / MS_PER_HOUR) as u32,
            minute: (rem / MS_PER_MINUTE % 60) as u32,
            second: (rem / MS_PER_SECOND % 60) as u32,
            millis: (rem % MS_PER_SECOND) as u32,
        }
    }

    fn epoch(&self) -> i64 {
        days_from_civil(self.year as i64, self.month, self.day) * MS_PER_DAY
            + self.hour as i64 * MS_PER_HOUR
            + self.minute as i64 * MS_PER_MINUTE
            + self.second as i64 * MS_PER_SECOND
            + self.millis as i64
    }
}

/// A shared Date-like value.
#[derive(Debug, Clone)]
pub struct TimeValue(Rc<RefCell<CivilTime>>);

impl TimeValue {
    /// Midnight on the given civil date.
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        // Out-of-range month/day carry over, same as the field setters.
        let parts = [year as i64, month as i64, day as i64, 0, 0, 0, 0];
        Self(Rc::new(RefCell::new(CivilTime::from_epoch(epoch_from_parts(
            parts,
        )))))
    }

    pub fn from_epoch_millis(ms: i64) -> Self {
        Self(Rc::new(RefCell::new(CivilTime::from_epoch(ms))))
    }

    /// Milliseconds since the Unix epoch; the value's observable identity.
    pub fn epoch_millis(&self) -> i64 {
        self.0.borrow().epoch()
    }

    /// Read one civil field.
    pub fn get(&self, field: DateField) -> i64 {
        let c = *self.0.borrow();
        match field {
            DateField::Year => c.year as i64,
            DateField::Month => c.month as i64,
            DateField::Day => c.day as i64,
            DateField::Hours => c.hour as i64,
            DateField::Minutes => c.minute as i64,
            DateField::Seconds => c.second as i64,
            DateField::Millis => c.millis as i64,
        }
    }

    /// Set one civil field, normalizing carries through the epoch.
    pub fn set(&self, field: DateField, value: i64) {
        let c = *self.0.borrow();
        let mut parts = [
            c.year as i64,
            c.month as i64,
            c.day as i64,
            c.hour as i64,
            c.minute as i64,
            c.second as i64,
            c.millis as i64,
        ];
        parts[field as usize] = value;
        *self.0.borrow_mut() = CivilTime::from_epoch(epoch_from_parts(parts));
    }

    /// Set the whole value from epoch milliseconds.
    pub fn set_time(&self, ms: i64) {
        *self.0.borrow_mut() = CivilTime::from_epoch(ms);
    }

    /// Address of the shared cell; registry canonicalization key.
    pub(crate) fn as_ptr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for TimeValue {
    fn eq(&self, other: &Self) -> bool {
        self.epoch_millis() == other.epoch_millis()
    }
}

fn epoch_from_parts(parts: [i64; 7]) -> i64 {
    let [year, month, day, hour, minute, second, millis] = parts;
    let year = year + (month - 1).div_euclid(12);
    let month = ((month - 1).rem_euclid(12) + 1) as u32;
    days_from_civil(year, month, 1) * MS_PER_DAY
        + (day - 1) * MS_PER_DAY
        + hour * MS_PER_HOUR
        + minute * MS_PER_MINUTE
        + second * MS_PER_SECOND
        + millis
}

/// Days since 1970-01-01 for a civil date (proleptic Gregorian).
fn days_from_civil(y: i64, m: u32, d: u32) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = (if y >= 0 { y } else { y - 399 }) / 400;
    let yoe = y - era * 400; // [0, 399]
    let mp = i64::from(if m > 2 { m - 3 } else { m + 9 }); // [0, 11]
    let doy = (153 * mp + 2) / 5 + d as i64 - 1; // [0, 365]
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // [0, 146096]
    era * 146097 + doe - 719468
}

/// Inverse of [`days_from_civil`].
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719468;
    let era = (if z >= 0 { z } else { z - 146096 }) / 146097;
    let doe = z - era * 146097; // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // [0, 399]
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11]
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32; // [1, 31]
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32; // [1, 12]
    (if m <= 2 { y + 1 } else { y }, m, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_of_unix_origin_is_zero() {
        assert_eq!(TimeValue::new(1970, 1, 1).epoch_millis(), 0);
    }

    #[test]
    fn known_epoch_values() {
        // 2000-01-01T00:00:00Z
        assert_eq!(TimeValue::new(2000, 1, 1).epoch_millis(), 946_684_800_000);
        // One day before the epoch
        assert_eq!(TimeValue::new(1969, 12, 31).epoch_millis(), -86_400_000);
    }

    #[test]
    fn epoch_round_trips_through_civil_fields() {
        for ms in [0_i64, 946_684_800_000, -86_400_000, 1_234_567_890_123] {
            let t = TimeValue::from_epoch_millis(ms);
            assert_eq!(t.epoch_millis(), ms);
        }
    }

    #[test]
    fn set_field_changes_epoch() {
        let t = TimeValue::new(1999, 6, 15);
        let before = t.epoch_millis();
        t.set(DateField::Year, 2000);
        assert_ne!(t.epoch_millis(), before);
        assert_eq!(t.get(DateField::Year), 2000);
        assert_eq!(t.get(DateField::Month), 6);
        assert_eq!(t.get(DateField::Day), 15);
    }

    #[test]
    fn out_of_range_month_carries_into_year() {
        let t = TimeValue::new(2001, 1, 1);
        t.set(DateField::Month, 13);
        assert_eq!(t.get(DateField::Year), 2002);
        assert_eq!(t.get(DateField::Month), 1);
    }

    #[test]
    fn clones_share_the_cell() {
        let a = TimeValue::new(2020, 2, 29);
        let b = a.clone();
        b.set(DateField::Day, 1);
        assert_eq!(a.get(DateField::Day), 1);
        assert_eq!(a.as_ptr(), b.as_ptr());
    }

    #[test]
    fn equality_is_by_epoch_not_reference() {
        let a = TimeValue::new(2020, 1, 1);
        let b = TimeValue::new(2020, 1, 1);
        assert_ne!(a.as_ptr(), b.as_ptr());
        assert_eq!(a, b);
    }
}
