//! Weekly billing segmentation over recorded time entries.
//!
//! Invoices bill by calendar week (Monday through Sunday). Within a week,
//! consecutive billed days sharing an hourly rate collapse into one line
//! item; a rate change or an unbilled day closes the open item. Every week
//! contributes one trailing item: the segment still open on its last day,
//! or a zero-hour row spanning the week when that day carries no entry.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use homefin_common::types::TimeEntry;

/// One invoice line item: consecutive days billed at a single hourly rate.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekBill {
    /// Rate charged per hour over this item's date span.
    pub hourly_rate: f64,
    /// Total hours billed over the span.
    pub quantity: f64,
    /// First day covered by the item.
    pub start_date: NaiveDate,
    /// Last day covered by the item.
    pub end_date: NaiveDate,
}

impl WeekBill {
    /// Returns the line amount (`rate * hours`).
    #[must_use]
    pub fn amount(&self) -> f64 {
        self.hourly_rate * self.quantity
    }
}

/// A fixed-length billing segment used by the offline generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentSpec {
    /// Number of consecutive days the segment covers.
    pub days: u32,
    /// Total hours billed over the segment.
    pub hours: f64,
    /// Rate charged per hour.
    pub rate: f64,
}

/// Running segment state while walking one week.
struct Segment {
    rate: f64,
    hours: f64,
    start: NaiveDate,
    end: NaiveDate,
}

impl Segment {
    fn open(entry: &TimeEntry, day: NaiveDate) -> Self {
        Self {
            rate: entry.hourly_rate,
            hours: entry.hours,
            start: day,
            end: day,
        }
    }

    fn close(self) -> WeekBill {
        WeekBill {
            hourly_rate: self.rate,
            quantity: self.hours,
            start_date: self.start,
            end_date: self.end,
        }
    }
}

/// Groups `entries` between `start` and `end` (inclusive) into week-bounded,
/// rate-homogeneous line items.
///
/// Entries outside the range are ignored. A week whose last walked day has
/// an open segment closes that segment as its final item; otherwise the week
/// emits a zero-hour row spanning its whole clamped range, carrying the
/// earliest entry's rate (or zero when the range has no entries anywhere).
/// An empty range (`start > end`) yields nothing.
#[must_use]
pub fn week_bills(entries: &[TimeEntry], start: NaiveDate, end: NaiveDate) -> Vec<WeekBill> {
    let mut by_date: BTreeMap<NaiveDate, &TimeEntry> = BTreeMap::new();
    for entry in entries {
        let _ = by_date.insert(entry.date, entry);
    }
    let default_rate = by_date.values().next().map_or(0.0, |e| e.hourly_rate);

    let mut bills = Vec::new();
    let mut current = start;
    while current <= end {
        // weekday() is 0 for Monday, 6 for Sunday.
        let days_to_sunday = u64::from(6 - current.weekday().num_days_from_monday());
        let week_end = current
            .checked_add_days(Days::new(days_to_sunday))
            .map_or(end, |sunday| sunday.min(end));

        let mut segment: Option<Segment> = None;
        let mut walk = current;
        while walk <= week_end {
            if let Some(entry) = by_date.get(&walk) {
                match segment.as_mut() {
                    None => segment = Some(Segment::open(entry, walk)),
                    Some(open) if rates_equal(open.rate, entry.hourly_rate) => {
                        open.hours += entry.hours;
                        open.end = walk;
                    }
                    Some(open) => {
                        let closed = std::mem::replace(open, Segment::open(entry, walk));
                        bills.push(closed.close());
                    }
                }
            } else if let Some(open) = segment.take() {
                bills.push(open.close());
            }
            walk = next_day(walk);
        }

        match segment {
            Some(open) => bills.push(open.close()),
            None => bills.push(WeekBill {
                hourly_rate: default_rate,
                quantity: 0.0,
                start_date: current,
                end_date: week_end,
            }),
        }

        current = next_day(week_end);
    }
    bills
}

/// Builds back-to-back line items from fixed-length segments, the model the
/// offline generator uses: each segment starts the day after the previous
/// one ends.
#[must_use]
pub fn consecutive_bills(start: NaiveDate, segments: &[SegmentSpec]) -> Vec<WeekBill> {
    let mut bills = Vec::with_capacity(segments.len());
    let mut current = start;
    for spec in segments {
        let span = u64::from(spec.days.saturating_sub(1));
        let end = current.checked_add_days(Days::new(span)).unwrap_or(current);
        bills.push(WeekBill {
            hourly_rate: spec.rate,
            quantity: spec.hours,
            start_date: current,
            end_date: end,
        });
        current = next_day(end);
    }
    bills
}

/// Inclusive date ranges for the two billing halves of a month: the 1st
/// through the 15th, and the 16th through the last day. Returns `None` for
/// an invalid month.
#[must_use]
pub fn month_halves(
    year: i32,
    month: u32,
) -> Option<((NaiveDate, NaiveDate), (NaiveDate, NaiveDate))> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let fifteenth = NaiveDate::from_ymd_opt(year, month, 15)?;
    let sixteenth = NaiveDate::from_ymd_opt(year, month, 16)?;
    let next_month_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = next_month_first.pred_opt()?;
    Some(((first, fifteenth), (sixteenth, last)))
}

fn rates_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < f64::EPSILON
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(NaiveDate::MAX)
}
