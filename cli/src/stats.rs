use rtotrack_core::DashboardSummary;
use rtotrack_core::time::minutes_to_time_label;
use rtotrack_core::usecase::analytics::{DailyHours, MetricComparison, Trend};
use tabled::{Table, Tabled};
use tabled::settings::{Style, Color, Modify};
use tabled::settings::object::Rows;

const BAR_WIDTH: usize = 20;

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct WeekRow {
    #[tabled(rename = "Week")]
    week: String,
    #[tabled(rename = "Leaves")]
    count: usize,
    #[tabled(rename = "Dates")]
    dates: String,
}

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Plan")]
    planned: String,
    #[tabled(rename = "Actual")]
    actual: String,
    #[tabled(rename = "")]
    bar: String,
}

fn render<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));
    println!("{}", table);
}

fn row(metric: &str, value: String) -> MetricRow {
    MetricRow { metric: metric.to_string(), value }
}

fn trend_arrow(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "↑",
        Trend::Down => "↓",
        Trend::Same => "→",
        Trend::NoData => "",
    }
}

fn progress_bar(percent: u32) -> String {
    let filled = (percent.min(100) as usize * BAR_WIDTH) / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn signed(value: f64, unit: &str) -> String {
    format!("{}{:.2}{}", if value >= 0.0 { "+" } else { "" }, value, unit)
}

fn time_metric(cmp: &MetricComparison) -> String {
    let Some(value) = cmp.value else {
        return "-".to_string();
    };
    match cmp.diff {
        Some(diff) => format!("{} {} {:+}m", minutes_to_time_label(value), trend_arrow(cmp.trend), diff.round() as i64),
        None => minutes_to_time_label(value),
    }
}

fn hours_metric(cmp: &MetricComparison) -> String {
    let Some(value) = cmp.value else {
        return "-".to_string();
    };
    match cmp.diff {
        Some(diff) => format!("{:.2}h {} {}", value, trend_arrow(cmp.trend), signed(diff, "h")),
        None => format!("{:.2}h", value),
    }
}

fn header(summary: &DashboardSummary) {
    let cfg = &summary.config;
    println!(
        "\n\x1b[1;36m{}\x1b[0m  ({} office days/week, {}h/day, {} WFH days/month)",
        summary.month.format("%B %Y"),
        cfg.mandatory_days_per_week,
        cfg.mandatory_hours_per_day,
        cfg.allowed_wfh_per_month,
    );
}

pub fn show_dashboard(summary: &DashboardSummary) {
    header(summary);

    let ot = &summary.overtime;
    let advice = &summary.advice;
    let cmp = &summary.comparison;
    let prev = cmp.previous_month.format("%b").to_string();

    let rows = vec![
        row("Required hours", format!("{:.2}h", summary.monthly_mandatory)),
        row("Logged hours", format!("{:.2}h {} {}%", summary.hours_logged, progress_bar(summary.progress_percent), summary.progress_percent)),
        row("Office hours", format!("{:.2}h", summary.office_hours)),
        row("Office days", format!("{} of {} planned, {} remaining", summary.office_days_logged, summary.planned_office_days, summary.office_remaining)),
        row("WFH days", summary.wfh_days_logged.to_string()),
        row("Leaves", summary.leaves.to_string()),
        row(
            &format!("Balance to {}", ot.cutoff.format("%b %d")),
            format!(
                "{} ({:.2}h of {:.2}h, {})",
                signed(ot.balance, "h"),
                ot.actual,
                ot.required,
                if ot.is_overtime() { "overtime" } else { "undertime" },
            ),
        ),
        row("Avg arrival", time_metric(&cmp.avg_in)),
        row("Avg departure", time_metric(&cmp.avg_out)),
        row("Avg office session", hours_metric(&cmp.avg_hours)),
        row(
            &format!("Office days vs {}", prev),
            format!("{} {} {:+}", cmp.office_days.value, trend_arrow(cmp.office_days.trend), cmp.office_days.diff),
        ),
    ];
    render(rows);

    if advice.remaining_rto > 0 {
        println!(
            "Go in {} more day(s) this month: about {} per week over the {} remaining week(s).",
            advice.remaining_rto, advice.suggested_makeup_per_week, advice.remaining_weeks_count,
        );
    } else {
        println!("Office quota met for this month.");
    }
    if advice.allowed_free_leaves_month > 0 {
        println!(
            "Leave cushion: {} free leave(s) this month, {} taken.",
            advice.allowed_free_leaves_month, advice.leaves_count,
        );
    }
}

pub fn show_weeks(summary: &DashboardSummary) {
    header(summary);

    let rows: Vec<WeekRow> = summary.weekly_leaves.weeks.iter()
        .map(|wk| WeekRow {
            week: format!("{} - {}", wk.start.format("%b %d"), wk.end.format("%b %d")),
            count: wk.leave_dates.len(),
            dates: wk.leave_dates.iter()
                .map(|d| d.format("%a %d").to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();
    render(rows);

    let advice = &summary.advice;
    println!(
        "Total leaves: {}. This week ({} - {}): {} leave(s).",
        summary.weekly_leaves.total_leaves,
        advice.this_week_start.format("%b %d"),
        advice.this_week_end.format("%b %d"),
        advice.leaves_this_week,
    );
}

pub fn show_chart(summary: &DashboardSummary) {
    header(summary);

    let series: &[DailyHours] = &summary.series;
    let scale = series.iter()
        .map(|d| d.planned.max(d.actual))
        .fold(summary.config.mandatory_hours_per_day, f64::max);

    let rows: Vec<DayRow> = series.iter()
        .map(|d| {
            let filled = if scale > 0.0 {
                ((d.actual / scale) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            let marker = if d.planned > 0.0 && d.actual < d.planned { " !" } else { "" };
            DayRow {
                date: d.date.format("%m-%d %a").to_string(),
                planned: if d.planned > 0.0 { format!("{:.1}", d.planned) } else { "-".to_string() },
                actual: if d.actual > 0.0 { format!("{:.1}", d.actual) } else { "-".to_string() },
                bar: format!("{}{}", "█".repeat(filled.min(BAR_WIDTH)), marker),
            }
        })
        .collect();
    render(rows);
    println!("! marks a mandatory day short of its planned hours.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0), format!("[{}]", ".".repeat(BAR_WIDTH)));
        assert_eq!(progress_bar(50), format!("[{}{}]", "#".repeat(10), ".".repeat(10)));
        assert_eq!(progress_bar(250), format!("[{}]", "#".repeat(BAR_WIDTH)));
    }

    #[test]
    fn test_metric_labels() {
        let cmp = MetricComparison { value: Some(545.0), previous: Some(540.0), diff: Some(5.0), trend: Trend::Up };
        assert_eq!(time_metric(&cmp), "9:05 AM ↑ +5m");

        let none = MetricComparison { value: None, previous: None, diff: None, trend: Trend::NoData };
        assert_eq!(hours_metric(&none), "-");
        assert_eq!(signed(-1.5, "h"), "-1.50h");
    }
}
