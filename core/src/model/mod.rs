pub mod config;
pub mod log_entry;
pub mod week;

pub use config::{ConfigError, PolicyConfig};
pub use log_entry::{EntryType, LogEntry};
pub use week::Week;
