//! Read-only figures derived from a month of entries: office-time averages,
//! month-over-month trends, leaves per week and the daily hours series.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{EntryType, LogEntry, PolicyConfig};
use crate::service::log_query::{count_office_days, logs_for_month};
use crate::service::policy::mandatory_day_slots;
use crate::time::{minutes_of_day, previous_month, round2, same_month, weeks_in_month};

/// Length of the hours series, cutoff included.
pub const SERIES_DAYS: i64 = 30;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct OfficeAverages {
    /// Mean arrival, minutes after midnight.
    pub avg_in: Option<f64>,
    /// Mean departure, minutes after midnight.
    pub avg_out: Option<f64>,
    pub avg_hours: Option<f64>,
    pub sessions: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Same,
    #[serde(rename = "none")]
    NoData,
}

impl Trend {
    fn of(diff: f64) -> Self {
        if diff > 0.0 {
            Trend::Up
        } else if diff < 0.0 {
            Trend::Down
        } else {
            Trend::Same
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MetricComparison {
    pub value: Option<f64>,
    pub previous: Option<f64>,
    pub diff: Option<f64>,
    pub trend: Trend,
}

impl MetricComparison {
    fn between(value: Option<f64>, previous: Option<f64>) -> Self {
        let raw = match (value, previous) {
            (Some(v), Some(p)) => Some(v - p),
            _ => None,
        };
        Self {
            value,
            previous,
            diff: raw.map(round2),
            trend: raw.map(Trend::of).unwrap_or(Trend::NoData),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CountComparison {
    pub value: usize,
    pub previous: usize,
    pub diff: i64,
    pub trend: Trend,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MonthComparison {
    pub previous_month: NaiveDate,
    pub avg_in: MetricComparison,
    pub avg_out: MetricComparison,
    pub avg_hours: MetricComparison,
    pub office_days: CountComparison,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WeekLeaves {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub leave_dates: Vec<NaiveDate>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WeeklyLeaveSummary {
    pub weeks: Vec<WeekLeaves>,
    pub total_leaves: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct DailyHours {
    pub date: NaiveDate,
    pub planned: f64,
    pub actual: f64,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Averages over the month's office entries that carry both punches with the
/// departure later in the day than the arrival.
pub fn office_averages(month_date: NaiveDate, logs: &[LogEntry]) -> OfficeAverages {
    let mut ins = Vec::new();
    let mut outs = Vec::new();
    let mut hours = Vec::new();

    for log in logs_for_month(month_date, logs) {
        if log.entry_type != EntryType::Office {
            continue;
        }
        let (Some(in_time), Some(out_time)) = (log.in_time, log.out_time) else {
            continue;
        };
        let (in_min, out_min) = (minutes_of_day(in_time), minutes_of_day(out_time));
        if out_min <= in_min {
            continue;
        }
        ins.push(in_min as f64);
        outs.push(out_min as f64);
        hours.push((out_min - in_min) as f64 / 60.0);
    }

    OfficeAverages {
        avg_in: mean(&ins),
        avg_out: mean(&outs),
        avg_hours: mean(&hours).map(round2),
        sessions: hours.len(),
    }
}

pub fn month_comparison(month_date: NaiveDate, logs: &[LogEntry]) -> MonthComparison {
    let prev_month = previous_month(month_date);
    let current = office_averages(month_date, logs);
    let previous = office_averages(prev_month, logs);

    let office_now = count_office_days(logs.iter().filter(|l| same_month(l.date, month_date)));
    let office_prev = count_office_days(logs.iter().filter(|l| same_month(l.date, prev_month)));
    let office_diff = office_now as i64 - office_prev as i64;

    MonthComparison {
        previous_month: prev_month,
        avg_in: MetricComparison::between(current.avg_in, previous.avg_in),
        avg_out: MetricComparison::between(current.avg_out, previous.avg_out),
        avg_hours: MetricComparison::between(current.avg_hours, previous.avg_hours),
        office_days: CountComparison {
            value: office_now,
            previous: office_prev,
            diff: office_diff,
            trend: Trend::of(office_diff as f64),
        },
    }
}

/// Leave dates of the month grouped by week. Boundary weeks only list the
/// dates that fall inside the month.
pub fn weekly_leave_summary(month_date: NaiveDate, logs: &[LogEntry]) -> WeeklyLeaveSummary {
    let leaves: BTreeSet<NaiveDate> = logs.iter()
        .filter(|l| l.entry_type == EntryType::Leave && same_month(l.date, month_date))
        .map(|l| l.date)
        .collect();

    let weeks: Vec<WeekLeaves> = weeks_in_month(month_date)
        .into_iter()
        .map(|wk| WeekLeaves {
            start: wk.start,
            end: wk.end,
            leave_dates: leaves.range(wk.start..=wk.end).copied().collect(),
        })
        .collect();

    WeeklyLeaveSummary {
        weeks,
        total_leaves: leaves.len(),
    }
}

/// Planned against logged hours for the thirty days ending at `cutoff`.
///
/// Planned hours come from the mandatory slots of `month_date` only; days outside
/// the viewed month plan nothing. Actual hours count every non-leave entry.
pub fn rolling_hours_series(
    month_date: NaiveDate,
    cutoff: NaiveDate,
    cfg: &PolicyConfig,
    logs: &[LogEntry],
) -> Vec<DailyHours> {
    let slots: HashSet<NaiveDate> = mandatory_day_slots(month_date, cfg).into_iter().collect();

    let mut actual: HashMap<NaiveDate, f64> = HashMap::new();
    for log in logs.iter().filter(|l| l.counts_hours()) {
        *actual.entry(log.date).or_insert(0.0) += log.hours;
    }

    (0..SERIES_DAYS)
        .rev()
        .map(|back| {
            let date = cutoff - Duration::days(back);
            DailyHours {
                date,
                planned: if slots.contains(&date) { cfg.mandatory_hours_per_day } else { 0.0 },
                actual: round2(actual.get(&date).copied().unwrap_or(0.0)),
            }
        })
        .collect()
}
