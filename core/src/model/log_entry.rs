use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::time::{parse_timestamp, round2};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    Office,
    #[serde(rename = "WFH")]
    Wfh,
    Leave,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Office => "Office",
            EntryType::Wfh => "WFH",
            EntryType::Leave => "Leave",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "office" | "o" | "wfo" => Ok(EntryType::Office),
            "wfh" | "w" | "home" => Ok(EntryType::Wfh),
            "leave" | "l" | "off" => Ok(EntryType::Leave),
            _ => Err(anyhow!("Unknown entry type: {}", s)),
        }
    }
}

/// One attendance event. Several entries may share a date; aggregation counts
/// dates, not entries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub hours: f64,
    #[serde(default, deserialize_with = "deserialize_punch")]
    pub in_time: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "deserialize_punch")]
    pub out_time: Option<NaiveDateTime>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

// Punches written by older exports carry a UTC offset; unreadable values become absent.
fn deserialize_punch<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

impl LogEntry {
    pub fn new(date: NaiveDate, entry_type: EntryType, hours: f64) -> Self {
        let hours = if entry_type == EntryType::Leave || !hours.is_finite() {
            0.0
        } else {
            hours.max(0.0)
        };
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            entry_type,
            hours,
            in_time: None,
            out_time: None,
            created_at: Utc::now(),
        }
    }

    /// Attaches punch times on the entry's own date. When both are present the
    /// hours become the elapsed time (0 if out is not after in). Leave ignores punches.
    pub fn with_punches(mut self, in_time: Option<NaiveTime>, out_time: Option<NaiveTime>) -> Self {
        if self.entry_type == EntryType::Leave {
            return self;
        }
        let day = self.date;
        self.in_time = in_time.map(|t| day.and_time(t));
        self.out_time = out_time.map(|t| day.and_time(t));
        if let (Some(start), Some(end)) = (self.in_time, self.out_time) {
            self.hours = punched_hours(start, end).unwrap_or(0.0);
        }
        self
    }

    pub fn counts_hours(&self) -> bool {
        self.entry_type != EntryType::Leave
    }

    /// Clock hours between punches, when both exist and out is after in.
    pub fn session_hours(&self) -> Option<f64> {
        punched_hours(self.in_time?, self.out_time?)
    }

    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }
}

pub fn punched_hours(in_time: NaiveDateTime, out_time: NaiveDateTime) -> Option<f64> {
    if out_time <= in_time {
        return None;
    }
    let minutes = (out_time - in_time).num_seconds() as f64 / 60.0;
    Some(round2(minutes / 60.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_leave_never_carries_hours() {
        let entry = LogEntry::new(date(2026, 6, 1), EntryType::Leave, 8.0)
            .with_punches(Some(time(9, 0)), Some(time(17, 0)));
        assert_eq!(entry.hours, 0.0);
        assert!(entry.in_time.is_none());
        assert!(!entry.counts_hours());
    }

    #[test]
    fn test_non_finite_hours_become_zero() {
        for hours in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let entry = LogEntry::new(date(2026, 6, 1), EntryType::Office, hours);
            assert_eq!(entry.hours, 0.0);
        }
        assert_eq!(LogEntry::new(date(2026, 6, 1), EntryType::Wfh, -2.0).hours, 0.0);
    }

    #[test]
    fn test_punches_override_manual_hours() {
        let entry = LogEntry::new(date(2026, 6, 1), EntryType::Office, 4.0)
            .with_punches(Some(time(9, 15)), Some(time(18, 0)));
        assert_eq!(entry.hours, 8.75);
        assert_eq!(entry.session_hours(), Some(8.75));

        let inverted = LogEntry::new(date(2026, 6, 1), EntryType::Wfh, 4.0)
            .with_punches(Some(time(18, 0)), Some(time(9, 0)));
        assert_eq!(inverted.hours, 0.0);

        let half = LogEntry::new(date(2026, 6, 1), EntryType::Wfh, 4.0)
            .with_punches(Some(time(9, 0)), None);
        assert_eq!(half.hours, 4.0);
    }

    #[test]
    fn test_entry_type_parsing() {
        assert_eq!("office".parse::<EntryType>().unwrap(), EntryType::Office);
        assert_eq!("WFH".parse::<EntryType>().unwrap(), EntryType::Wfh);
        assert_eq!("l".parse::<EntryType>().unwrap(), EntryType::Leave);
        assert!("vacation".parse::<EntryType>().is_err());
    }

    #[test]
    fn test_deserializes_stored_shape() {
        let json = r#"{
            "id": "k3j9x0a",
            "date": "2026-05-04",
            "type": "WFH",
            "hours": 7.5,
            "inTime": "2026-05-04T09:00:00",
            "outTime": "garbage",
            "createdAt": "2026-05-04T18:00:00Z"
        }"#;
        let entry: LogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.entry_type, EntryType::Wfh);
        assert_eq!(entry.in_time, Some(date(2026, 5, 4).and_time(time(9, 0))));
        assert!(entry.out_time.is_none());

        let unknown = r#"{"id":"a","date":"2026-05-04","type":"Holiday","hours":0}"#;
        assert!(serde_json::from_str::<LogEntry>(unknown).is_err());
    }
}
