pub mod config;
pub mod file;
pub mod traits;

// Re-export
pub use config::FileConfigRepository;
pub use file::{resolve_data_dir, FileLogRepository};
pub use traits::{ConfigRepository, LogRepository};
