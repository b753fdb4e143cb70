use crate::model::{EntryType, LogEntry, PolicyConfig};
use crate::repository::{ConfigRepository, LogRepository};
use crate::service::config_service::ConfigService;
use crate::service::log_query::{count_leaves, count_office_days, count_wfh_days, logs_for_month, sum_hours};
use crate::service::log_service::LogService;
use crate::service::policy::{
    compute_leave_advice_for_month, cutoff_for, monthly_mandatory_hours, overtime_up_to,
    planned_office_days, LeaveAdvice, OvertimeStatus,
};
use crate::time::{months_back, round2, start_of_month};
use crate::usecase::analytics::{
    month_comparison, office_averages, rolling_hours_series, weekly_leave_summary, DailyHours,
    MonthComparison, OfficeAverages, WeeklyLeaveSummary,
};
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Months reachable from the current one, the current month included.
pub const MONTH_WINDOW: u32 = 3;
pub const PAGE_SIZE: usize = 10;

/// Which month the dashboard shows: the current month or one of the two before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthView {
    current: NaiveDate,
    offset: u32,
}

impl MonthView {
    pub fn new(today: NaiveDate) -> Self {
        Self { current: start_of_month(today), offset: 0 }
    }

    /// `back` months before today's month, clamped to the oldest reachable one.
    pub fn months_back(today: NaiveDate, back: u32) -> Self {
        Self { current: start_of_month(today), offset: back.min(MONTH_WINDOW - 1) }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn selected_month(&self) -> NaiveDate {
        months_back(self.current, self.offset)
    }

    /// Moves one month back. Returns false when already at the oldest month.
    pub fn older(&mut self) -> bool {
        if self.offset + 1 >= MONTH_WINDOW {
            return false;
        }
        self.offset += 1;
        true
    }

    /// Moves one month forward. Returns false when already at the current month.
    pub fn newer(&mut self) -> bool {
        if self.offset == 0 {
            return false;
        }
        self.offset -= 1;
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogPage {
    pub entries: Vec<LogEntry>,
    /// 1-based.
    pub page: usize,
    pub pages: usize,
    pub total: usize,
}

/// Newest-first page of the log. Out-of-range pages are clamped.
pub fn paginate(mut logs: Vec<LogEntry>, page: usize) -> LogPage {
    logs.sort_by(|a, b| b.date.cmp(&a.date));
    let total = logs.len();
    let pages = total.div_ceil(PAGE_SIZE).max(1);
    let page = page.clamp(1, pages);
    let entries = logs.into_iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect();
    LogPage { entries, page, pages, total }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub month: NaiveDate,
    pub config: PolicyConfig,
    pub monthly_mandatory: f64,
    pub planned_office_days: u32,
    pub hours_logged: f64,
    pub office_hours: f64,
    pub office_days_logged: usize,
    pub wfh_days_logged: usize,
    pub leaves: usize,
    /// Office days still owed, after the leave cushion.
    pub office_remaining: u32,
    pub progress_percent: u32,
    pub overtime: OvertimeStatus,
    pub advice: LeaveAdvice,
    pub averages: OfficeAverages,
    pub comparison: MonthComparison,
    pub weekly_leaves: WeeklyLeaveSummary,
    pub series: Vec<DailyHours>,
}

pub struct DashboardUseCase<'a, C: ConfigRepository, L: LogRepository> {
    config_service: &'a ConfigService<C>,
    log_service: &'a LogService<L>,
}

impl<'a, C: ConfigRepository, L: LogRepository> DashboardUseCase<'a, C, L> {
    pub fn new(config_service: &'a ConfigService<C>, log_service: &'a LogService<L>) -> Self {
        Self {
            config_service,
            log_service,
        }
    }

    pub fn summary(&self, view: &MonthView, today: NaiveDate) -> Result<DashboardSummary> {
        let cfg = self.config_service.current()?;
        let logs = self.log_service.list()?;
        let month = view.selected_month();
        let month_logs = logs_for_month(month, &logs);

        let monthly_mandatory = monthly_mandatory_hours(month, &cfg, &logs);
        let hours_logged = round2(sum_hours(month_logs.iter().copied()));
        let office_hours = round2(sum_hours(
            month_logs.iter().copied().filter(|l| l.entry_type == EntryType::Office),
        ));
        let progress_percent = if monthly_mandatory > 0.0 {
            ((hours_logged / monthly_mandatory) * 100.0).round().min(100.0) as u32
        } else {
            0
        };
        let advice = compute_leave_advice_for_month(month, &cfg, &logs, today);

        Ok(DashboardSummary {
            month,
            monthly_mandatory,
            planned_office_days: planned_office_days(month, &cfg),
            hours_logged,
            office_hours,
            office_days_logged: count_office_days(month_logs.iter().copied()),
            wfh_days_logged: count_wfh_days(month_logs.iter().copied()),
            leaves: count_leaves(month_logs.iter().copied()),
            office_remaining: advice.remaining_rto,
            progress_percent,
            overtime: overtime_up_to(month, today, &cfg, &logs),
            averages: office_averages(month, &logs),
            comparison: month_comparison(month, &logs),
            weekly_leaves: weekly_leave_summary(month, &logs),
            series: rolling_hours_series(month, cutoff_for(month, today), &cfg, &logs),
            advice,
            config: cfg,
        })
    }
}
