use rtotrack_core::{EntryType, LogEntry, LogPage};
use tabled::{Table, Tabled};
use tabled::settings::{Style, Color, Modify};
use tabled::settings::object::Rows;

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "In")]
    in_time: String,
    #[tabled(rename = "Out")]
    out_time: String,
    #[tabled(rename = "Hours")]
    hours: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl From<&LogEntry> for LogRow {
    fn from(entry: &LogEntry) -> Self {
        let punch = |t: Option<chrono::NaiveDateTime>| {
            t.map(|t| t.format("%H:%M").to_string()).unwrap_or_else(|| "-".to_string())
        };
        let hours = if entry.entry_type == EntryType::Leave {
            "-".to_string()
        } else {
            format!("{:.2}", entry.hours)
        };
        Self {
            date: entry.date.format("%Y-%m-%d (%a)").to_string(),
            kind: entry.entry_type.to_string(),
            in_time: punch(entry.in_time),
            out_time: punch(entry.out_time),
            hours,
            id: entry.short_id().to_string(),
        }
    }
}

pub fn show_log_page(page: &LogPage) {
    if page.total == 0 {
        println!("No entries logged yet.");
        return;
    }

    let rows: Vec<LogRow> = page.entries.iter().map(LogRow::from).collect();
    let mut table = Table::new(rows);
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));
    println!("{}", table);
    println!("Page {}/{} ({} entries)", page.page, page.pages, page.total);
}

pub fn describe(entry: &LogEntry) -> String {
    match entry.entry_type {
        EntryType::Leave => format!("{} on {}", entry.entry_type, entry.date),
        _ => format!("{} on {} ({:.2}h)", entry.entry_type, entry.date, entry.hours),
    }
}

pub fn show_conflict(existing: &LogEntry) {
    println!(
        "{} is already logged as {} (ID: {}). Re-run with --replace to overwrite it.",
        existing.date,
        describe(existing),
        existing.short_id(),
    );
}
