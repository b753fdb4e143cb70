//! Return-to-office requirement calculations.
//!
//! Every function here is pure over its arguments: configuration, the month (or
//! cutoff) being evaluated, the entry collection and, where relevant, `today`.
//! Results are clamped at zero and hour figures are rounded to two decimals.
//! Configuration ranges are checked by the caller before a save, not here.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{EntryType, LogEntry, PolicyConfig, Week};
use crate::service::log_query::{count_leaves, count_office_days, distinct_dates, hours_up_to, logs_for_month};
use crate::time::{days_in_month, end_of_month, is_planned_weekday, is_weekend, round2, same_month, start_of_month, weeks_in_month};

/// Policies requiring at least this many office days per week get the leave cushion.
pub const FULL_WFO_THRESHOLD: u32 = 5;
/// Leaves per week that do not have to be made up under a full in-office policy.
pub const FREE_LEAVES_PER_WEEK_FOR_FULL_WFO: usize = 1;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OvertimeStatus {
    pub cutoff: NaiveDate,
    pub required: f64,
    pub actual: f64,
    /// Positive is overtime, negative undertime.
    pub balance: f64,
}

impl OvertimeStatus {
    pub fn is_overtime(&self) -> bool {
        self.balance >= 0.0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LeaveAdvice {
    pub planned_office_days: u32,
    pub leaves_count: usize,
    pub office_logged: usize,
    pub remaining_rto: u32,
    pub allowed_free_leaves_month: usize,
    pub leaves_this_week: usize,
    pub suggested_makeup_per_week: u32,
    pub remaining_weeks_count: u32,
    pub this_week_start: NaiveDate,
    pub this_week_end: NaiveDate,
}

fn cushion_eligible(cfg: &PolicyConfig) -> bool {
    cfg.mandatory_days_per_week >= FULL_WFO_THRESHOLD
}

fn planned_days_in_week<F>(week: &Week, month_date: NaiveDate, cfg: &PolicyConfig, include: F) -> u32
where
    F: Fn(NaiveDate) -> bool,
{
    let weekdays = week.days.iter()
        .filter(|d| is_planned_weekday(**d, month_date, cfg) && include(**d))
        .count() as u32;
    cfg.mandatory_days_per_week.min(weekdays)
}

/// Office days the policy asks for in the month. A boundary week can demand no
/// more days than it contributes to the month.
pub fn planned_office_days(month_date: NaiveDate, cfg: &PolicyConfig) -> u32 {
    weeks_in_month(month_date)
        .iter()
        .map(|wk| planned_days_in_week(wk, month_date, cfg, |_| true))
        .sum()
}

/// Hours the policy requires for the whole month.
///
/// The monthly WFH allowance always lowers the figure. Leaves only lower it
/// through the full in-office cushion: one free leave per week of the month,
/// applied up to the number of distinct leave dates actually logged.
pub fn monthly_mandatory_hours(month_date: NaiveDate, cfg: &PolicyConfig, logs: &[LogEntry]) -> f64 {
    let hours_per_day = cfg.mandatory_hours_per_day;
    let mut total = planned_office_days(month_date, cfg) as f64 * hours_per_day;

    let reduced_by_wfh = cfg.allowed_wfh_per_month * hours_per_day;
    total = (total - reduced_by_wfh).max(0.0);

    if cushion_eligible(cfg) {
        let allowed = FREE_LEAVES_PER_WEEK_FOR_FULL_WFO * weeks_in_month(month_date).len();
        let month_logs = logs_for_month(month_date, logs);
        let taken = count_leaves(month_logs.iter().copied());
        let applied = allowed.min(taken);
        total = (total - applied as f64 * hours_per_day).max(0.0);
    }

    round2(total)
}

/// Hours required from the start of `cutoff`'s month through `cutoff` itself.
///
/// Weeks are clipped at the cutoff; the WFH allowance and the cushion are scaled
/// by the elapsed fraction of the month. The cushion is truncated to whole days
/// and never exceeds the leave dates logged up to the cutoff.
pub fn projected_required_hours_up_to(cutoff: NaiveDate, cfg: &PolicyConfig, logs: &[LogEntry]) -> f64 {
    let month_date = start_of_month(cutoff);
    let weeks = weeks_in_month(month_date);
    let hours_per_day = cfg.mandatory_hours_per_day;

    let mut total = 0.0;
    for wk in weeks.iter().take_while(|wk| wk.start <= cutoff) {
        let planned = planned_days_in_week(wk, month_date, cfg, |d| d <= cutoff);
        total += planned as f64 * hours_per_day;
    }

    let elapsed = cutoff.day() as f64 / days_in_month(cutoff) as f64;
    let prorated_wfh = cfg.allowed_wfh_per_month * elapsed;
    let mut required = (total - prorated_wfh * hours_per_day).max(0.0);

    if cushion_eligible(cfg) {
        let allowed_month = (FREE_LEAVES_PER_WEEK_FOR_FULL_WFO * weeks.len()) as f64;
        let allowed_up_to = (allowed_month * elapsed).floor() as usize;
        let taken = distinct_dates(
            logs.iter().filter(|l| same_month(l.date, month_date) && l.date <= cutoff),
            EntryType::Leave,
        ).len();
        let applied = allowed_up_to.min(taken);
        required = (required - applied as f64 * hours_per_day).max(0.0);
    }

    round2(required)
}

/// Last day that counts when viewing `month_date`: today for the current month,
/// otherwise the month's final day.
pub fn cutoff_for(month_date: NaiveDate, today: NaiveDate) -> NaiveDate {
    if same_month(month_date, today) {
        today
    } else {
        end_of_month(month_date)
    }
}

/// Running overtime for the viewed month: measured through `today` while the
/// month is current, otherwise through its last day.
pub fn overtime_up_to(month_date: NaiveDate, today: NaiveDate, cfg: &PolicyConfig, logs: &[LogEntry]) -> OvertimeStatus {
    let cutoff = cutoff_for(month_date, today);
    let required = projected_required_hours_up_to(cutoff, cfg, logs);
    let month_logs = logs_for_month(month_date, logs);
    let actual = round2(hours_up_to(month_logs.iter().copied(), cutoff));

    OvertimeStatus {
        cutoff,
        required,
        actual,
        balance: round2(actual - required),
    }
}

/// How many office days are still owed this month and how to spread them over
/// the weeks that remain.
pub fn compute_leave_advice_for_month(
    month_date: NaiveDate,
    cfg: &PolicyConfig,
    logs: &[LogEntry],
    today: NaiveDate,
) -> LeaveAdvice {
    let planned = planned_office_days(month_date, cfg);
    let month_logs = logs_for_month(month_date, logs);
    let leaves_count = count_leaves(month_logs.iter().copied());
    let office_logged = count_office_days(month_logs.iter().copied());

    // Leaves do not lower the target
    let mut remaining_rto = (planned as usize).saturating_sub(office_logged) as u32;

    let weeks = weeks_in_month(month_date);
    let mut allowed_free_leaves_month = 0;
    if cushion_eligible(cfg) {
        allowed_free_leaves_month = FREE_LEAVES_PER_WEEK_FOR_FULL_WFO * weeks.len();
        let applied = allowed_free_leaves_month.min(leaves_count) as u32;
        remaining_rto = remaining_rto.saturating_sub(applied);
    }

    let this_week = weeks.iter()
        .find(|w| w.contains(today))
        .unwrap_or(&weeks[0]);
    let leaves_this_week = distinct_dates(
        month_logs.iter().copied().filter(|l| this_week.contains(l.date)),
        EntryType::Leave,
    ).len();

    let remaining_weeks_count = (weeks.iter().filter(|w| w.end >= today).count() as u32).max(1);
    let suggested_makeup_per_week = if remaining_rto > 0 {
        remaining_rto.div_ceil(remaining_weeks_count)
    } else {
        0
    };

    LeaveAdvice {
        planned_office_days: planned,
        leaves_count,
        office_logged,
        remaining_rto,
        allowed_free_leaves_month,
        leaves_this_week,
        suggested_makeup_per_week,
        remaining_weeks_count,
        this_week_start: this_week.start,
        this_week_end: this_week.end,
    }
}

/// Planned weekdays of the month that carry a mandatory day, per week in date
/// order: the first `min(mandatoryDaysPerWeek, n)` weekdays of each week.
pub fn mandatory_day_slots(month_date: NaiveDate, cfg: &PolicyConfig) -> Vec<NaiveDate> {
    let mut slots = Vec::new();
    for wk in weeks_in_month(month_date) {
        let take = planned_days_in_week(&wk, month_date, cfg, |_| true) as usize;
        slots.extend(
            wk.days.iter()
                .copied()
                .filter(|d| same_month(*d, month_date) && !is_weekend(*d, cfg))
                .take(take),
        );
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cfg(days: u32, wfh: f64, hours: f64) -> PolicyConfig {
        PolicyConfig {
            mandatory_days_per_week: days,
            allowed_wfh_per_month: wfh,
            mandatory_hours_per_day: hours,
            ..PolicyConfig::default()
        }
    }

    fn leave(d: NaiveDate) -> LogEntry {
        LogEntry::new(d, EntryType::Leave, 0.0)
    }

    fn office(d: NaiveDate, hours: f64) -> LogEntry {
        LogEntry::new(d, EntryType::Office, hours)
    }

    // February 2027 starts on a Monday and spans exactly four whole weeks.
    fn four_week_month() -> NaiveDate {
        date(2027, 2, 1)
    }

    #[test]
    fn test_three_day_policy_in_four_week_month() {
        let c = cfg(3, 0.0, 9.0);
        assert_eq!(planned_office_days(four_week_month(), &c), 12);
        assert_eq!(monthly_mandatory_hours(four_week_month(), &c, &[]), 108.0);
    }

    #[test]
    fn test_full_wfo_cushion_limited_by_leaves_taken() {
        let c = cfg(5, 0.0, 8.0);
        let logs = vec![leave(date(2027, 2, 3)), leave(date(2027, 2, 17)), leave(date(2027, 2, 17))];
        assert_eq!(monthly_mandatory_hours(four_week_month(), &c, &logs), 144.0);

        // never more cushion than weeks in the month
        let many: Vec<LogEntry> = (1..=12).map(|d| leave(date(2027, 2, d))).collect();
        assert_eq!(monthly_mandatory_hours(four_week_month(), &c, &many), 160.0 - 32.0);
    }

    #[test]
    fn test_wfh_allowance_reduces_unconditionally() {
        let c = cfg(3, 2.0, 9.0);
        assert_eq!(monthly_mandatory_hours(four_week_month(), &c, &[]), 90.0);
        let c = cfg(1, 22.0, 9.0);
        assert_eq!(monthly_mandatory_hours(four_week_month(), &c, &[]), 0.0);
    }

    #[test]
    fn test_leaves_do_not_change_requirement_below_threshold() {
        let c = cfg(4, 0.0, 9.0);
        let base = monthly_mandatory_hours(four_week_month(), &c, &[]);
        let logs: Vec<LogEntry> = (1..=5).map(|d| leave(date(2027, 2, d))).collect();
        assert_eq!(monthly_mandatory_hours(four_week_month(), &c, &logs), base);
    }

    #[test]
    fn test_requirement_non_increasing_as_leaves_grow() {
        let c = cfg(5, 1.0, 8.0);
        let mut logs = Vec::new();
        let mut previous = monthly_mandatory_hours(date(2026, 10, 1), &c, &logs);
        for d in [1, 2, 5, 6, 7, 8, 9, 12] {
            logs.push(leave(date(2026, 10, d)));
            let current = monthly_mandatory_hours(date(2026, 10, 1), &c, &logs);
            assert!(current <= previous);
            previous = current;
        }
    }

    #[test]
    fn test_boundary_weeks_are_capped() {
        // October 2026: Thu 1st .. Sat 31st, five weeks
        let c = cfg(5, 0.0, 8.0);
        let weeks = weeks_in_month(date(2026, 10, 1));
        assert_eq!(weeks.len(), 5);
        // 2 + 5 + 5 + 5 + 5 weekdays
        assert_eq!(planned_office_days(date(2026, 10, 1), &c), 22);

        let c = cfg(3, 0.0, 8.0);
        assert_eq!(planned_office_days(date(2026, 10, 1), &c), 2 + 3 * 4);
        for month in 1..=12 {
            let m = date(2026, month, 1);
            let weeks = weeks_in_month(m).len() as u32;
            assert!(planned_office_days(m, &cfg(7, 0.0, 8.0)) <= 7 * weeks);
        }
    }

    #[test]
    fn test_prorated_requirement_at_month_end_matches_monthly() {
        let logs = vec![leave(date(2026, 10, 6)), office(date(2026, 10, 7), 9.0)];
        for c in [cfg(3, 0.0, 9.0), cfg(3, 2.0, 9.0), cfg(2, 1.5, 7.5), cfg(5, 2.0, 8.0)] {
            for month in 1..=12 {
                let m = date(2026, month, 1);
                assert_eq!(
                    projected_required_hours_up_to(end_of_month(m), &c, &logs),
                    monthly_mandatory_hours(m, &c, &logs),
                );
            }
        }
    }

    #[test]
    fn test_prorated_requirement_mid_month() {
        // Feb 2027, cutoff Wed 10th: week 1 full (3 days), week 2 Mon-Wed (3 days)
        let c = cfg(3, 0.0, 9.0);
        assert_eq!(projected_required_hours_up_to(date(2027, 2, 10), &c, &[]), 54.0);

        // 2 WFH days pro-rated over 10/28 of the month
        let c = cfg(3, 2.0, 9.0);
        assert_eq!(projected_required_hours_up_to(date(2027, 2, 10), &c, &[]), round2(54.0 - 2.0 * 10.0 / 28.0 * 9.0));

        // cushion: floor(4 * 10 / 28) = 1 applied against two leaves so far
        let c = cfg(5, 0.0, 8.0);
        let logs = vec![leave(date(2027, 2, 2)), leave(date(2027, 2, 9)), leave(date(2027, 2, 20))];
        assert_eq!(projected_required_hours_up_to(date(2027, 2, 10), &c, &logs), 8.0 * 8.0 - 8.0);
    }

    #[test]
    fn test_overtime_uses_today_only_for_current_month() {
        let c = cfg(3, 0.0, 9.0);
        let logs = vec![
            office(date(2027, 2, 1), 10.0),
            office(date(2027, 2, 2), 9.5),
            office(date(2027, 2, 3), 9.0),
            office(date(2027, 2, 15), 9.0),
        ];
        let current = overtime_up_to(date(2027, 2, 1), date(2027, 2, 7), &c, &logs);
        assert_eq!(current.cutoff, date(2027, 2, 7));
        assert_eq!(current.required, 27.0);
        assert_eq!(current.actual, 28.5);
        assert_eq!(current.balance, 1.5);
        assert!(current.is_overtime());

        let past = overtime_up_to(date(2027, 2, 1), date(2027, 4, 2), &c, &logs);
        assert_eq!(past.cutoff, date(2027, 2, 28));
        assert_eq!(past.balance, 37.5 - 108.0);
    }

    #[test]
    fn test_leave_advice_spreads_remaining_days() {
        let c = cfg(3, 0.0, 9.0);
        let logs = vec![
            office(date(2027, 2, 1), 9.0),
            office(date(2027, 2, 2), 9.0),
            office(date(2027, 2, 2), 9.0),
            leave(date(2027, 2, 9)),
        ];
        let advice = compute_leave_advice_for_month(four_week_month(), &c, &logs, date(2027, 2, 10));
        assert_eq!(advice.planned_office_days, 12);
        assert_eq!(advice.office_logged, 2);
        assert_eq!(advice.leaves_count, 1);
        assert_eq!(advice.remaining_rto, 10);
        assert_eq!(advice.allowed_free_leaves_month, 0);
        assert_eq!(advice.this_week_start, date(2027, 2, 8));
        assert_eq!(advice.leaves_this_week, 1);
        assert_eq!(advice.remaining_weeks_count, 3);
        assert_eq!(advice.suggested_makeup_per_week, 4);
    }

    #[test]
    fn test_leave_advice_outside_month_falls_back_to_first_week() {
        let c = cfg(5, 0.0, 8.0);
        let logs = vec![leave(date(2027, 2, 3)), leave(date(2027, 2, 4))];
        let advice = compute_leave_advice_for_month(four_week_month(), &c, &logs, date(2027, 5, 1));
        assert_eq!(advice.this_week_start, date(2027, 2, 1));
        assert_eq!(advice.leaves_this_week, 2);
        assert_eq!(advice.allowed_free_leaves_month, 4);
        // 20 planned, 2 forgiven
        assert_eq!(advice.remaining_rto, 18);
        assert_eq!(advice.remaining_weeks_count, 1);
        assert_eq!(advice.suggested_makeup_per_week, 18);
    }

    #[test]
    fn test_mandatory_day_slots_take_first_weekdays() {
        let c = cfg(3, 0.0, 9.0);
        let slots = mandatory_day_slots(date(2026, 10, 1), &c);
        // Thu 1, Fri 2, then Mon-Wed of each following week
        assert_eq!(&slots[..5], &[date(2026, 10, 1), date(2026, 10, 2), date(2026, 10, 5), date(2026, 10, 6), date(2026, 10, 7)]);
        assert_eq!(slots.len() as u32, planned_office_days(date(2026, 10, 1), &c));
    }
}
