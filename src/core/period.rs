use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("date range ends before it starts: {start} .. {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// An inclusive range of calendar days.
///
/// Used for statement coverage periods, analysis windows and the gaps
/// between them.
///
/// # Examples
///
/// ```
/// use libr_trace::core::period::DateRange;
/// use chrono::NaiveDate;
///
/// let jan = DateRange::new(
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
/// ).unwrap();
/// assert_eq!(jan.days(), 31);
/// assert!(jan.contains(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = RangeError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if end < start {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering exactly one day.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days in the range, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn intersection(&self, other: &DateRange) -> Option<DateRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(DateRange { start, end })
    }

    /// Smallest range containing both.
    pub fn hull(&self, other: &DateRange) -> DateRange {
        DateRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = DateRange::new(d(2024, 2, 1), d(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, RangeError::Inverted { .. }));
    }

    #[test]
    fn test_overlap_is_inclusive() {
        let jan = DateRange::new(d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        let feb = DateRange::new(d(2024, 1, 31), d(2024, 2, 29)).unwrap();
        let mar = DateRange::new(d(2024, 3, 1), d(2024, 3, 31)).unwrap();
        assert!(jan.overlaps(&feb));
        assert!(!jan.overlaps(&mar));
        assert_eq!(jan.intersection(&feb), Some(DateRange::single(d(2024, 1, 31))));
        assert_eq!(jan.intersection(&mar), None);
    }

    #[test]
    fn test_hull_and_days() {
        let a = DateRange::new(d(2024, 1, 10), d(2024, 1, 20)).unwrap();
        let b = DateRange::new(d(2024, 1, 1), d(2024, 1, 5)).unwrap();
        let h = a.hull(&b);
        assert_eq!(h.start(), d(2024, 1, 1));
        assert_eq!(h.end(), d(2024, 1, 20));
        assert_eq!(h.days(), 20);
        assert_eq!(DateRange::single(d(2024, 1, 1)).days(), 1);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: DateRange =
            serde_json::from_str(r#"{"start":"2024-01-01","end":"2024-01-31"}"#).unwrap();
        assert_eq!(ok.days(), 31);
        let bad = serde_json::from_str::<DateRange>(r#"{"start":"2024-02-01","end":"2024-01-31"}"#);
        assert!(bad.is_err());
    }
}
