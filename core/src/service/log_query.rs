//! Month-scoped filtering and aggregation over an unordered entry collection.
//!
//! Day counts are taken over distinct dates so that several entries for the same
//! day never count twice.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::model::{EntryType, LogEntry};
use crate::time::same_month;

/// Entries dated in `month_date`'s month, newest date first. Entries sharing a
/// date keep their relative order.
pub fn logs_for_month<'a>(month_date: NaiveDate, logs: &'a [LogEntry]) -> Vec<&'a LogEntry> {
    let mut month: Vec<&LogEntry> = logs.iter()
        .filter(|l| same_month(l.date, month_date))
        .collect();
    month.sort_by(|a, b| b.date.cmp(&a.date));
    month
}

pub fn sum_hours<'a, I>(logs: I) -> f64
where
    I: IntoIterator<Item = &'a LogEntry>,
{
    logs.into_iter()
        .filter(|l| l.counts_hours())
        .map(|l| l.hours)
        .sum()
}

/// Non-leave hours of entries dated on or before `cutoff`.
pub fn hours_up_to<'a, I>(logs: I, cutoff: NaiveDate) -> f64
where
    I: IntoIterator<Item = &'a LogEntry>,
{
    sum_hours(logs.into_iter().filter(|l| l.date <= cutoff))
}

pub fn distinct_dates<'a, I>(logs: I, entry_type: EntryType) -> HashSet<NaiveDate>
where
    I: IntoIterator<Item = &'a LogEntry>,
{
    logs.into_iter()
        .filter(|l| l.entry_type == entry_type)
        .map(|l| l.date)
        .collect()
}

pub fn count_office_days<'a, I>(logs: I) -> usize
where
    I: IntoIterator<Item = &'a LogEntry>,
{
    distinct_dates(logs, EntryType::Office).len()
}

pub fn count_wfh_days<'a, I>(logs: I) -> usize
where
    I: IntoIterator<Item = &'a LogEntry>,
{
    distinct_dates(logs, EntryType::Wfh).len()
}

pub fn count_leaves<'a, I>(logs: I) -> usize
where
    I: IntoIterator<Item = &'a LogEntry>,
{
    distinct_dates(logs, EntryType::Leave).len()
}
