mod history;
mod stats;

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use rtotrack_core::{
    paginate, parse_log_command, ConfigService, DashboardUseCase, FileConfigRepository,
    FileLogRepository, LogCommand, LogService, MonthView, PolicyConfig, SubmitOutcome,
    TransferService, UpdateOutcome,
};
use tabled::{Table, Tabled};
use tabled::settings::Style;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "rtotrack")]
#[command(about = "Track office attendance against a return-to-office policy", long_about = None)]
struct Cli {
    /// Directory holding config.json and logs.json (default: ~/.rtotrack)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change the attendance policy
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Log a day (usage: log office date:yest in:9:00 out:17:30)
    Log {
        /// Entry type followed by key:value pairs (date, in, out, hours, edit)
        #[arg(required = true)]
        args: Vec<String>,
        /// Overwrite an existing entry for the same date
        #[arg(long)]
        replace: bool,
    },
    /// List logged entries, newest first
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Delete an entry by id or unique id prefix
    Delete { id: String },
    /// Month summary: requirement, progress, balance and advice
    Dashboard {
        /// Months before the current one (0-2)
        #[arg(long, default_value_t = 0)]
        back: u32,
    },
    /// Leaves per week of the month
    Weeks {
        #[arg(long, default_value_t = 0)]
        back: u32,
    },
    /// Planned against logged hours for the last 30 days
    Chart {
        #[arg(long, default_value_t = 0)]
        back: u32,
    },
    /// Export the log as CSV or a JSON snapshot
    Export {
        #[arg(value_enum)]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace the whole log with a CSV file
    Import {
        file: PathBuf,
        #[arg(long)]
        yes: bool,
    },
    /// Delete every logged entry
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    Set {
        /// Mandatory office days per week (1-7)
        #[arg(long)]
        days: Option<u32>,
        /// WFH days allowed per month (0-22)
        #[arg(long)]
        wfh: Option<f64>,
        /// Mandatory hours per day (1-24)
        #[arg(long)]
        hours: Option<f64>,
        #[arg(long)]
        saturday_off: Option<bool>,
        #[arg(long)]
        sunday_off: Option<bool>,
    },
    /// Forget the stored policy and fall back to defaults
    Reset,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    setting: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn config_rows(cfg: &PolicyConfig) -> Vec<SettingRow> {
    vec![
        SettingRow { setting: "Office days per week", value: cfg.mandatory_days_per_week.to_string() },
        SettingRow { setting: "WFH days per month", value: cfg.allowed_wfh_per_month.to_string() },
        SettingRow { setting: "Hours per day", value: cfg.mandatory_hours_per_day.to_string() },
        SettingRow { setting: "Hours per full week", value: format!("{:.2}", cfg.weekly_hours()) },
        SettingRow { setting: "Saturday off", value: cfg.saturday_off.to_string() },
        SettingRow { setting: "Sunday off", value: cfg.sunday_off.to_string() },
        SettingRow {
            setting: "Updated",
            value: cfg.updated_at
                .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        },
    ]
}

fn show_config(cfg: &PolicyConfig, configured: bool) {
    let mut table = Table::new(config_rows(cfg));
    table.with(Style::modern());
    println!("{}", table);
    if !configured {
        println!("No policy saved yet, showing defaults. Use `rtotrack config set`.");
    }
}

fn write_output(out: &Option<PathBuf>, bytes: &[u8]) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, bytes)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config_repo = FileConfigRepository::new(cli.data_dir.clone())?;
    let log_repo = FileLogRepository::new(cli.data_dir)?;
    debug!(config = %config_repo.path().display(), logs = %log_repo.path().display(), "store files");
    let config_service = ConfigService::new(config_repo.clone());
    let log_service = LogService::new(log_repo.clone());
    let today = Local::now().date_naive();

    match cli.command.unwrap_or(Commands::Dashboard { back: 0 }) {
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                show_config(&config_service.current()?, config_service.is_configured()?);
            }
            ConfigAction::Set { days, wfh, hours, saturday_off, sunday_off } => {
                let mut cfg = config_service.current()?;
                if let Some(v) = days { cfg.mandatory_days_per_week = v; }
                if let Some(v) = wfh { cfg.allowed_wfh_per_month = v; }
                if let Some(v) = hours { cfg.mandatory_hours_per_day = v; }
                if let Some(v) = saturday_off { cfg.saturday_off = v; }
                if let Some(v) = sunday_off { cfg.sunday_off = v; }
                let saved = config_service.save(cfg)?;
                println!("Policy saved.");
                show_config(&saved, true);
            }
            ConfigAction::Reset => {
                config_service.reset()?;
                println!("Policy reset to defaults.");
            }
        },
        Commands::Log { args, replace } => match parse_log_command(&args, today)? {
            LogCommand::Edit { id, patch } => {
                let target = log_service.find(&id)?;
                match log_service.update(&target.id, patch, replace)? {
                    UpdateOutcome::Updated { entry, displaced, .. } => {
                        println!("Updated {} (ID: {})", history::describe(&entry), entry.short_id());
                        if let Some(removed) = displaced {
                            println!("Removed {} (ID: {})", history::describe(&removed), removed.short_id());
                        }
                    }
                    UpdateOutcome::Conflict { existing } => {
                        history::show_conflict(&existing);
                    }
                }
            }
            LogCommand::New(draft) => match log_service.submit(draft, replace)? {
                SubmitOutcome::Created(entry) => {
                    println!("Logged {} (ID: {})", history::describe(&entry), entry.short_id());
                }
                SubmitOutcome::Replaced { previous, entry } => {
                    println!("Replaced {} with {}", history::describe(&previous), history::describe(&entry));
                }
                SubmitOutcome::Conflict { existing } => {
                    history::show_conflict(&existing);
                }
            },
        },
        Commands::List { page } => {
            history::show_log_page(&paginate(log_service.list()?, page));
        }
        Commands::Delete { id } => {
            let target = log_service.find(&id)?;
            let removed = log_service.delete(&target.id)?;
            println!("Deleted {}", history::describe(&removed));
        }
        Commands::Dashboard { back } => {
            let dashboard = DashboardUseCase::new(&config_service, &log_service);
            stats::show_dashboard(&dashboard.summary(&MonthView::months_back(today, back), today)?);
        }
        Commands::Weeks { back } => {
            let dashboard = DashboardUseCase::new(&config_service, &log_service);
            stats::show_weeks(&dashboard.summary(&MonthView::months_back(today, back), today)?);
        }
        Commands::Chart { back } => {
            let dashboard = DashboardUseCase::new(&config_service, &log_service);
            stats::show_chart(&dashboard.summary(&MonthView::months_back(today, back), today)?);
        }
        Commands::Export { format, out } => {
            let transfer = TransferService::new(config_repo, log_repo);
            // Rendered in memory so a failed export leaves no file behind
            let mut buf = Vec::new();
            let count = match format {
                ExportFormat::Csv => transfer.export_csv(&mut buf)?,
                ExportFormat::Json => transfer.export_json(&mut buf)?,
            };
            write_output(&out, &buf)?;
            if let Some(path) = out {
                println!("Exported {} entries to {}", count, path.display());
            }
        }
        Commands::Import { file, yes } => {
            if !yes {
                let existing = log_service.list()?.len();
                println!("Import replaces all {} logged entries. Re-run with --yes to confirm.", existing);
                return Ok(());
            }
            let transfer = TransferService::new(config_repo, log_repo);
            let report = transfer.import_csv(BufReader::new(File::open(&file)?))?;
            println!("Imported {} entries ({} rows skipped).", report.imported, report.skipped);
        }
        Commands::Clear { yes } => {
            if !yes {
                println!("This deletes every logged entry. Re-run with --yes to confirm.");
                return Ok(());
            }
            log_service.clear()?;
            println!("Log cleared.");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_rows_include_weekly_hours() {
        let mut cfg = PolicyConfig::default();
        cfg.mandatory_hours_per_day = 8.5;
        let rows = config_rows(&cfg);
        let weekly = rows.iter().find(|r| r.setting == "Hours per full week").unwrap();
        assert_eq!(weekly.value, "25.50");
        assert_eq!(rows.last().unwrap().value, "-");
    }
}
