use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

pub const DEFAULT_MANDATORY_DAYS_PER_WEEK: u32 = 3;
pub const DEFAULT_ALLOWED_WFH_PER_MONTH: f64 = 0.0;
pub const DEFAULT_MANDATORY_HOURS_PER_DAY: f64 = 9.0;

/// Weekly office-attendance policy. Stored as a single record under its own key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    pub mandatory_days_per_week: u32,
    #[serde(rename = "allowedWFHPerMonth")]
    pub allowed_wfh_per_month: f64,
    pub mandatory_hours_per_day: f64,
    pub saturday_off: bool,
    pub sunday_off: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            mandatory_days_per_week: DEFAULT_MANDATORY_DAYS_PER_WEEK,
            allowed_wfh_per_month: DEFAULT_ALLOWED_WFH_PER_MONTH,
            mandatory_hours_per_day: DEFAULT_MANDATORY_HOURS_PER_DAY,
            saturday_off: true,
            sunday_off: true,
            updated_at: None,
        }
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Mandatory office days per week must be 1-7 (got {0})")]
    MandatoryDaysOutOfRange(u32),
    #[error("Allowed WFH days per month must be 0-22 (got {0})")]
    AllowedWfhOutOfRange(f64),
    #[error("Mandatory hours per day must be 1-24 (got {0})")]
    HoursPerDayOutOfRange(f64),
}

impl PolicyConfig {
    /// Range checks applied before a save. The calculation engine never calls this.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=7).contains(&self.mandatory_days_per_week) {
            return Err(ConfigError::MandatoryDaysOutOfRange(self.mandatory_days_per_week));
        }
        let wfh = self.allowed_wfh_per_month;
        if !wfh.is_finite() || !(0.0..=22.0).contains(&wfh) {
            return Err(ConfigError::AllowedWfhOutOfRange(wfh));
        }
        let hours = self.mandatory_hours_per_day;
        if !hours.is_finite() || !(1.0..=24.0).contains(&hours) {
            return Err(ConfigError::HoursPerDayOutOfRange(hours));
        }
        Ok(())
    }

    /// Hours expected in a week where every mandatory day is worked.
    pub fn weekly_hours(&self) -> f64 {
        self.mandatory_days_per_week as f64 * self.mandatory_hours_per_day
    }
}
