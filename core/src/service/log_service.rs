use crate::model::{EntryType, LogEntry};
use crate::repository::LogRepository;
use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("No log entry with id {0}")]
    NotFound(String),
    #[error("Id prefix '{0}' matches {1} entries")]
    AmbiguousId(String, usize),
}

/// What the user typed for one day, before it becomes a `LogEntry`.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub date: NaiveDate,
    pub entry_type: EntryType,
    pub in_time: Option<NaiveTime>,
    pub out_time: Option<NaiveTime>,
    /// Used only when the punches do not determine the hours.
    pub hours: Option<f64>,
}

impl EntryDraft {
    pub fn new(date: NaiveDate, entry_type: EntryType) -> Self {
        Self {
            date,
            entry_type,
            in_time: None,
            out_time: None,
            hours: None,
        }
    }

    fn into_entry(self) -> LogEntry {
        LogEntry::new(self.date, self.entry_type, self.hours.unwrap_or(0.0))
            .with_punches(self.in_time, self.out_time)
    }
}

/// Changes to an existing entry. Unset fields keep the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub date: Option<NaiveDate>,
    pub entry_type: Option<EntryType>,
    pub in_time: Option<NaiveTime>,
    pub out_time: Option<NaiveTime>,
    pub hours: Option<f64>,
}

impl EntryPatch {
    fn apply(self, existing: &LogEntry) -> LogEntry {
        let in_time = self.in_time.or(existing.in_time.map(|t| t.time()));
        let out_time = self.out_time.or(existing.out_time.map(|t| t.time()));
        let mut entry = LogEntry::new(
            self.date.unwrap_or(existing.date),
            self.entry_type.unwrap_or(existing.entry_type),
            self.hours.unwrap_or(existing.hours),
        )
        .with_punches(in_time, out_time);
        entry.id = existing.id.clone();
        entry.created_at = existing.created_at;
        entry
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(LogEntry),
    Replaced { previous: LogEntry, entry: LogEntry },
    /// The date already has an entry and replacement was not confirmed. Nothing
    /// was written.
    Conflict { existing: LogEntry },
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// `displaced` is the entry that held the new date and was removed.
    Updated { previous: LogEntry, entry: LogEntry, displaced: Option<LogEntry> },
    /// Another entry holds the new date and replacement was not confirmed.
    Conflict { existing: LogEntry },
}

pub struct LogService<R: LogRepository> {
    repo: R,
}

impl<R: LogRepository> LogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Every entry, newest date first.
    pub fn list(&self) -> Result<Vec<LogEntry>> {
        let mut logs = self.repo.list()?;
        logs.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(logs)
    }

    /// Logs a day. A date holds one entry: an occupied date is only overwritten
    /// when `replace` is set, and the replacement keeps the existing id.
    pub fn submit(&self, draft: EntryDraft, replace: bool) -> Result<SubmitOutcome> {
        let mut logs = self.repo.list()?;
        let mut entry = draft.into_entry();

        match logs.iter().position(|l| l.date == entry.date) {
            Some(pos) if !replace => Ok(SubmitOutcome::Conflict { existing: logs[pos].clone() }),
            Some(pos) => {
                entry.id = logs[pos].id.clone();
                let previous = std::mem::replace(&mut logs[pos], entry.clone());
                self.repo.replace_all(&logs)?;
                info!(date = %entry.date, kind = %entry.entry_type, "entry replaced");
                Ok(SubmitOutcome::Replaced { previous, entry })
            }
            None => {
                logs.push(entry.clone());
                self.repo.replace_all(&logs)?;
                info!(date = %entry.date, kind = %entry.entry_type, hours = entry.hours, "entry logged");
                Ok(SubmitOutcome::Created(entry))
            }
        }
    }

    /// Applies `patch` to the entry with `id`, keeping its id and creation time.
    /// Moving onto a date held by another entry needs `replace`, which removes
    /// that other entry.
    pub fn update(&self, id: &str, patch: EntryPatch, replace: bool) -> Result<UpdateOutcome> {
        let mut logs = self.repo.list()?;
        let pos = logs.iter()
            .position(|l| l.id == id)
            .ok_or_else(|| LogError::NotFound(id.to_string()))?;

        let entry = patch.apply(&logs[pos]);
        let clash = logs.iter().position(|l| l.id != id && l.date == entry.date);
        if let (Some(other), false) = (clash, replace) {
            return Ok(UpdateOutcome::Conflict { existing: logs[other].clone() });
        }

        let previous = std::mem::replace(&mut logs[pos], entry.clone());
        let displaced = clash.map(|other| logs.remove(other));
        self.repo.replace_all(&logs)?;
        info!(id, date = %entry.date, "entry updated");
        Ok(UpdateOutcome::Updated { previous, entry, displaced })
    }

    pub fn delete(&self, id: &str) -> Result<LogEntry> {
        let mut logs = self.repo.list()?;
        let pos = logs.iter()
            .position(|l| l.id == id)
            .ok_or_else(|| LogError::NotFound(id.to_string()))?;
        let removed = logs.remove(pos);
        self.repo.replace_all(&logs)?;
        info!(id, date = %removed.date, "entry deleted");
        Ok(removed)
    }

    /// Looks an entry up by full id or by a unique id prefix.
    pub fn find(&self, id_or_prefix: &str) -> Result<LogEntry> {
        let logs = self.repo.list()?;
        if let Some(exact) = logs.iter().find(|l| l.id == id_or_prefix) {
            return Ok(exact.clone());
        }
        let matches: Vec<&LogEntry> = logs.iter()
            .filter(|l| l.id.starts_with(id_or_prefix))
            .collect();
        match matches.len() {
            1 => Ok(matches[0].clone()),
            0 => Err(LogError::NotFound(id_or_prefix.to_string()).into()),
            n => Err(LogError::AmbiguousId(id_or_prefix.to_string(), n).into()),
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.repo.clear()?;
        info!("log cleared");
        Ok(())
    }
}
