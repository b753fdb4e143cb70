use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use anyhow::{anyhow, Result};

use crate::model::{PolicyConfig, Week};

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    // Day 1 exists in every month
    date.with_day(1).unwrap_or(date)
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    next_month(date).pred_opt().unwrap_or(date)
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    end_of_month(date).day()
}

/// First day of the month after `date`'s month.
pub fn next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// First day of the month before `date`'s month.
pub fn previous_month(date: NaiveDate) -> NaiveDate {
    start_of_month(start_of_month(date) - Duration::days(1))
}

/// First day of the month `count` months before `date`'s month.
pub fn months_back(date: NaiveDate, count: u32) -> NaiveDate {
    (0..count).fold(start_of_month(date), |month, _| previous_month(month))
}

pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Monday-aligned weeks fully covering the month of `month_date`. Only the
/// year and month of the argument matter.
pub fn weeks_in_month(month_date: NaiveDate) -> Vec<Week> {
    let first = start_of_month(month_date);
    let last = end_of_month(month_date);
    let start = first - Duration::days(first.weekday().num_days_from_monday() as i64);
    let end = last + Duration::days(6 - last.weekday().num_days_from_monday() as i64);

    let mut weeks = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let days: [NaiveDate; 7] = std::array::from_fn(|i| cursor + Duration::days(i as i64));
        weeks.push(Week {
            start: cursor,
            end: days[6],
            days,
        });
        cursor += Duration::days(7);
    }
    weeks
}

pub fn is_weekend(date: NaiveDate, cfg: &PolicyConfig) -> bool {
    match date.weekday() {
        Weekday::Sat => cfg.saturday_off,
        Weekday::Sun => cfg.sunday_off,
        _ => false,
    }
}

/// A day of `month_date`'s month that is not a configured weekend day.
pub fn is_planned_weekday(date: NaiveDate, month_date: NaiveDate, cfg: &PolicyConfig) -> bool {
    same_month(date, month_date) && !is_weekend(date, cfg)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parses a date typed by the user relative to `today`.
///
/// Accepts `today`, `yesterday`, `-3d` / `-2w`, weekday names (`fri` is the most
/// recent Friday on or before today, `2:fri` the one before that) and `YYYY-MM-DD`.
pub fn parse_log_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let input = input.trim();

    // 1. Reserved keywords
    match input.to_lowercase().as_str() {
        "today" | "tod" => return Ok(today),
        "yesterday" | "yest" => return days_before(today, 1),
        _ => {}
    }

    // 2. Relative format (-Nd, -Nw)
    if let Some(rest) = input.strip_prefix('-') {
        if rest.len() >= 2 && rest.is_char_boundary(rest.len() - 1) {
            let (num_str, unit) = rest.split_at(rest.len() - 1);
            let count: i64 = num_str.parse().map_err(|_| anyhow!("Invalid relative format"))?;
            if count < 0 {
                return Err(anyhow!("Relative dates count backwards only: {}", input));
            }
            return match unit {
                "d" => days_before(today, count),
                "w" => days_before(today, count.checked_mul(7).unwrap_or(i64::MAX)),
                _ => Err(anyhow!("Unknown unit in relative date: {}", unit)),
            };
        }
    }

    // 3. Explicit date
    if let Ok(d) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(d);
    }

    // 4. Weekday format (fri, 2:fri)
    if let Some((count, day_str)) = parse_weekday_token(input) {
        if let Ok(target) = parse_weekday_str(day_str) {
            let back = (today.weekday().num_days_from_monday() + 7
                - target.num_days_from_monday()) % 7;
            let weeks_back = (count.max(1) - 1).checked_mul(7).unwrap_or(i64::MAX);
            return days_before(today, weeks_back.saturating_add(back as i64));
        }
    }

    Err(anyhow!("Could not parse date: {}", input))
}

fn days_before(today: NaiveDate, days: i64) -> Result<NaiveDate> {
    Duration::try_days(days)
        .and_then(|delta| today.checked_sub_signed(delta))
        .ok_or_else(|| anyhow!("Date out of range"))
}

/// `YYYY-MM` to the first day of that month.
pub fn parse_month(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", input.trim()), "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid month (expected YYYY-MM): {}", input))
}

/// Wall-clock time of day, `9:05` or `09:05`.
pub fn parse_clock_time(input: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input.trim(), "%H:%M:%S"))
        .map_err(|_| anyhow!("Invalid time (expected HH:MM): {}", input))
}

/// Reads a stored punch timestamp. Naive ISO date-times are taken as local wall
/// clock; RFC 3339 values are converted to local time.
pub fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|dt| dt.with_timezone(&Local).naive_local())
}

pub fn minutes_of_day(dt: NaiveDateTime) -> u32 {
    dt.time().hour() * 60 + dt.time().minute()
}

/// `545.0` -> `9:05 AM`.
pub fn minutes_to_time_label(minutes: f64) -> String {
    let total = minutes.round() as i64;
    let h24 = (total / 60).rem_euclid(24);
    let m = total.rem_euclid(60);
    let ampm = if h24 >= 12 { "PM" } else { "AM" };
    let h12 = if h24 % 12 == 0 { 12 } else { h24 % 12 };
    format!("{}:{:02} {}", h12, m, ampm)
}

fn parse_weekday_token(input: &str) -> Option<(i64, &str)> {
    if input.contains(':') {
        let parts: Vec<&str> = input.split(':').collect();
        if parts.len() == 2 {
            if let Ok(count) = parts[0].parse::<i64>() {
                return Some((count, parts[1]));
            }
        }
    } else {
        // Just "fri" means 1:fri
        return Some((1, input));
    }
    None
}

fn parse_weekday_str(s: &str) -> Result<Weekday> {
    match s.to_lowercase().as_str() {
        "mon" | "monday" => Ok(Weekday::Mon),
        "tue" | "tuesday" => Ok(Weekday::Tue),
        "wed" | "wednesday" => Ok(Weekday::Wed),
        "thu" | "thursday" => Ok(Weekday::Thu),
        "fri" | "friday" => Ok(Weekday::Fri),
        "sat" | "saturday" => Ok(Weekday::Sat),
        "sun" | "sunday" => Ok(Weekday::Sun),
        _ => Err(anyhow!("Invalid weekday")),
    }
}
