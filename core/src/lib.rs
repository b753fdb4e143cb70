pub mod model;
pub mod repository;
pub mod input;
pub mod time;
pub mod service;
pub mod usecase;

pub use model::{ConfigError, EntryType, LogEntry, PolicyConfig, Week};
pub use repository::{ConfigRepository, FileConfigRepository, FileLogRepository, LogRepository};
pub use input::{parse_args, expand_key, parse_log_command, LogCommand, ParsedInput};
pub use time::{parse_log_date, parse_month, weeks_in_month};
pub use service::config_service::ConfigService;
pub use service::log_service::{EntryDraft, EntryPatch, LogError, LogService, SubmitOutcome, UpdateOutcome};
pub use service::transfer_service::{ImportReport, TransferError, TransferService};
pub use usecase::dashboard::{paginate, DashboardSummary, DashboardUseCase, LogPage, MonthView};
