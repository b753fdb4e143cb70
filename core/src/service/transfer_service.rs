//! CSV and JSON import/export of the stored state.

use std::io::{Read, Write};
use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::{EntryType, LogEntry, PolicyConfig};
use crate::repository::{ConfigRepository, LogRepository};
use crate::time::parse_timestamp;

pub const CSV_COLUMNS: [&str; 7] = ["id", "date", "type", "hours", "inTime", "outTime", "createdAt"];

const PUNCH_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("CSV is missing the '{0}' column")]
    MissingColumn(&'static str),
    #[error("CSV contains no usable rows")]
    Empty,
    #[error("No logs to export")]
    NothingToExport,
}

/// Whole-state JSON export.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub config: PolicyConfig,
    pub logs: Vec<LogEntry>,
    pub exported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Header line unquoted, every data field quoted with embedded quotes doubled.
pub fn write_csv<W: Write>(logs: &[LogEntry], mut out: W) -> Result<()> {
    writeln!(out, "{}", CSV_COLUMNS.join(","))?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(out);

    for l in logs {
        let hours = l.hours.to_string();
        let in_time = l.in_time.map(|t| t.format(PUNCH_FORMAT).to_string()).unwrap_or_default();
        let out_time = l.out_time.map(|t| t.format(PUNCH_FORMAT).to_string()).unwrap_or_default();
        let created_at = l.created_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        let date = l.date.format("%Y-%m-%d").to_string();
        writer.write_record([
            l.id.as_str(),
            date.as_str(),
            l.entry_type.as_str(),
            hours.as_str(),
            in_time.as_str(),
            out_time.as_str(),
            created_at.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

struct Columns {
    id: Option<usize>,
    date: usize,
    entry_type: usize,
    hours: Option<usize>,
    in_time: Option<usize>,
    out_time: Option<usize>,
    created_at: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, TransferError> {
        let find = |name: &str| headers.iter().position(|h| h.trim_matches('"') == name);
        Ok(Self {
            id: find("id"),
            date: find("date").ok_or(TransferError::MissingColumn("date"))?,
            entry_type: find("type").ok_or(TransferError::MissingColumn("type"))?,
            hours: find("hours"),
            in_time: find("inTime"),
            out_time: find("outTime"),
            created_at: find("createdAt"),
        })
    }
}

fn field(record: &StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

fn parse_row(record: &StringRecord, cols: &Columns) -> Option<LogEntry> {
    let date = NaiveDate::parse_from_str(field(record, Some(cols.date)), "%Y-%m-%d").ok()?;
    let entry_type = EntryType::from_str(field(record, Some(cols.entry_type))).ok()?;

    let hours = field(record, cols.hours).parse::<f64>().unwrap_or(0.0);
    let mut entry = LogEntry::new(date, entry_type, hours);
    let id = field(record, cols.id);
    if !id.is_empty() {
        entry.id = id.to_string();
    }
    if entry_type != EntryType::Leave {
        entry.in_time = parse_timestamp(field(record, cols.in_time));
        entry.out_time = parse_timestamp(field(record, cols.out_time));
    }
    if let Ok(created) = DateTime::parse_from_rfc3339(field(record, cols.created_at)) {
        entry.created_at = created.with_timezone(&Utc);
    }
    Some(entry)
}

/// Reads entries from CSV. Rows with an unusable date or type are skipped and
/// counted; a missing or non-numeric `hours` becomes 0.
pub fn parse_csv<R: Read>(input: R) -> Result<(Vec<LogEntry>, usize)> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);
    let cols = Columns::from_headers(reader.headers()?)?;

    let mut logs = Vec::new();
    let mut skipped = 0;
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        match parse_row(&record, &cols) {
            Some(entry) => logs.push(entry),
            None => {
                warn!(row = line + 1, "skipping CSV row with invalid date or type");
                skipped += 1;
            }
        }
    }
    Ok((logs, skipped))
}

pub struct TransferService<C: ConfigRepository, L: LogRepository> {
    config_repo: C,
    log_repo: L,
}

impl<C: ConfigRepository, L: LogRepository> TransferService<C, L> {
    pub fn new(config_repo: C, log_repo: L) -> Self {
        Self { config_repo, log_repo }
    }

    /// Fails with `NothingToExport` before writing anything when the log is empty.
    pub fn export_csv<W: Write>(&self, out: W) -> Result<usize> {
        let logs = self.log_repo.list()?;
        if logs.is_empty() {
            return Err(TransferError::NothingToExport.into());
        }
        write_csv(&logs, out)?;
        Ok(logs.len())
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            config: self.config_repo.load()?.unwrap_or_default(),
            logs: self.log_repo.list()?,
            exported_at: Utc::now(),
        })
    }

    pub fn export_json<W: Write>(&self, out: W) -> Result<usize> {
        let snapshot = self.snapshot()?;
        serde_json::to_writer_pretty(out, &snapshot)?;
        Ok(snapshot.logs.len())
    }

    /// Replaces the entire log with the CSV contents. The caller is expected to
    /// have confirmed the overwrite. Nothing is written when no row is usable.
    pub fn import_csv<R: Read>(&self, input: R) -> Result<ImportReport> {
        let (logs, skipped) = parse_csv(input)?;
        if logs.is_empty() {
            return Err(TransferError::Empty.into());
        }
        self.log_repo.replace_all(&logs)?;
        info!(imported = logs.len(), skipped, "log replaced from CSV");
        Ok(ImportReport { imported: logs.len(), skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use std::cell::RefCell;

    #[derive(Default)]
    struct MemoryStore {
        config: RefCell<Option<PolicyConfig>>,
        logs: RefCell<Vec<LogEntry>>,
    }

    impl ConfigRepository for &MemoryStore {
        fn load(&self) -> Result<Option<PolicyConfig>> { Ok(self.config.borrow().clone()) }
        fn save(&self, cfg: &PolicyConfig) -> Result<()> { *self.config.borrow_mut() = Some(cfg.clone()); Ok(()) }
        fn clear(&self) -> Result<()> { *self.config.borrow_mut() = None; Ok(()) }
    }

    impl LogRepository for &MemoryStore {
        fn list(&self) -> Result<Vec<LogEntry>> { Ok(self.logs.borrow().clone()) }
        fn replace_all(&self, logs: &[LogEntry]) -> Result<()> { *self.logs.borrow_mut() = logs.to_vec(); Ok(()) }
        fn clear(&self) -> Result<()> { self.logs.borrow_mut().clear(); Ok(()) }
    }

    fn sample_entry() -> LogEntry {
        let date = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();
        let mut entry = LogEntry::new(date, EntryType::Office, 0.0).with_punches(
            Some(NaiveTime::from_hms_opt(9, 0, 0).unwrap()),
            Some(NaiveTime::from_hms_opt(17, 30, 0).unwrap()),
        );
        entry.id = "a\"b".to_string();
        entry.created_at = DateTime::parse_from_rfc3339("2026-10-12T18:00:00Z").unwrap().with_timezone(&Utc);
        entry
    }

    #[test]
    fn test_csv_export_format() {
        let mut buf = Vec::new();
        write_csv(&[sample_entry()], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,date,type,hours,inTime,outTime,createdAt");
        assert_eq!(
            lines[1],
            r#""a""b","2026-10-12","Office","8.5","2026-10-12T09:00:00","2026-10-12T17:30:00","2026-10-12T18:00:00.000Z""#
        );
    }

    #[test]
    fn test_csv_export_then_import_keeps_fields() {
        let mut buf = Vec::new();
        write_csv(&[sample_entry()], &mut buf).unwrap();
        let (logs, skipped) = parse_csv(buf.as_slice()).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(logs, vec![sample_entry()]);
    }

    #[test]
    fn test_csv_import_coerces_and_skips() {
        let csv = "\"id\",\"date\",\"type\",\"hours\",\"inTime\",\"outTime\",\"createdAt\"\n\
            \"x1\",\"2026-10-01\",\"Office\",\"\",\"\",\"\",\"\"\n\
            \"x2\",\"2026-10-02\",\"Leave\",\"7\",\"\",\"\",\"\"\n\
            \"x3\",\"not-a-date\",\"Office\",\"8\",\"\",\"\",\"\"\n\
            \"x4\",\"2026-10-03\",\"Remote\",\"8\",\"\",\"\",\"\"\n\
            \"x5\",\"2026-10-05\",\"WFH\",\"abc\",\"2026-10-05T04:00:00.000Z\",\"\",\"\"\n";
        let (logs, skipped) = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(skipped, 2);
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].hours, 0.0);
        assert_eq!(logs[1].entry_type, EntryType::Leave);
        assert_eq!(logs[1].hours, 0.0);
        assert_eq!(logs[2].hours, 0.0);
        assert!(logs[2].in_time.is_some());
    }

    #[test]
    fn test_csv_infinite_hours_survive_reload() {
        let csv = "id,date,type,hours\n\"i1\",\"2026-10-06\",\"Office\",\"inf\"\n\"i2\",\"2026-10-07\",\"WFH\",\"NaN\"\n";
        let (logs, skipped) = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(skipped, 0);
        assert!(logs.iter().all(|l| l.hours == 0.0));

        let stored = serde_json::to_string(&logs).unwrap();
        let reloaded: Vec<LogEntry> = serde_json::from_str(&stored).unwrap();
        assert_eq!(reloaded, logs);
    }

    #[test]
    fn test_csv_export_of_empty_log_writes_nothing() {
        let store = MemoryStore::default();
        let service = TransferService::new(&store, &store);
        let mut buf = Vec::new();
        let err = service.export_csv(&mut buf).unwrap_err();
        assert!(matches!(err.downcast_ref::<TransferError>(), Some(TransferError::NothingToExport)));
        assert!(buf.is_empty());

        store.logs.borrow_mut().push(sample_entry());
        assert_eq!(service.export_csv(&mut buf).unwrap(), 1);
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_csv_without_date_column_is_rejected() {
        let err = parse_csv("id,type,hours\n1,Office,8\n".as_bytes()).unwrap_err();
        assert!(matches!(err.downcast_ref::<TransferError>(), Some(TransferError::MissingColumn("date"))));
    }

    #[test]
    fn test_import_replaces_whole_log() {
        let store = MemoryStore::default();
        store.logs.borrow_mut().push(LogEntry::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), EntryType::Wfh, 8.0));
        let service = TransferService::new(&store, &store);

        let csv = "id,date,type,hours,inTime,outTime,createdAt\n\"n1\",\"2026-10-01\",\"Office\",\"9\",\"\",\"\",\"\"\n";
        let report = service.import_csv(csv.as_bytes()).unwrap();
        assert_eq!(report, ImportReport { imported: 1, skipped: 0 });
        let logs = store.logs.borrow();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].id, "n1");
    }

    #[test]
    fn test_empty_import_leaves_log_untouched() {
        let store = MemoryStore::default();
        store.logs.borrow_mut().push(LogEntry::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), EntryType::Wfh, 8.0));
        let service = TransferService::new(&store, &store);
        let err = service.import_csv("id,date,type\n".as_bytes()).unwrap_err();
        assert!(matches!(err.downcast_ref::<TransferError>(), Some(TransferError::Empty)));
        assert_eq!(store.logs.borrow().len(), 1);
    }

    #[test]
    fn test_json_snapshot_shape() {
        let store = MemoryStore::default();
        store.logs.borrow_mut().push(sample_entry());
        let service = TransferService::new(&store, &store);
        let mut buf = Vec::new();
        assert_eq!(service.export_json(&mut buf).unwrap(), 1);
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["config"]["mandatoryDaysPerWeek"], 3);
        assert_eq!(value["logs"][0]["type"], "Office");
        assert!(value["exportedAt"].is_string());
    }
}
