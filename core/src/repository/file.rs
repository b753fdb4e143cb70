use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::LogEntry;
use crate::repository::traits::LogRepository;

const DEFAULT_DIR_NAME: &str = ".rtotrack";
const LOG_FILE_NAME: &str = "logs.json";

/// The data directory: `base_dir` when given, otherwise `~/.rtotrack`. Created if missing.
pub fn resolve_data_dir(base_dir: Option<PathBuf>) -> Result<PathBuf> {
    let path = match base_dir {
        Some(dir) => dir,
        None => {
            let home_dir = dirs::home_dir()
                .ok_or_else(|| anyhow!("Could not determine home directory"))?;
            home_dir.join(DEFAULT_DIR_NAME)
        }
    };
    fs::create_dir_all(&path)?;
    Ok(path)
}

#[derive(Clone)]
pub struct FileLogRepository {
    file_path: PathBuf,
}

impl FileLogRepository {
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self> {
        let path = resolve_data_dir(base_dir)?.join(LOG_FILE_NAME);
        Ok(FileLogRepository { file_path: path })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    // A missing or unreadable document is an empty log. Records that do not
    // deserialize (bad date, unknown type) are dropped one by one.
    fn read_logs(&self) -> Result<Vec<LogEntry>> {
        if !self.file_path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.file_path)?;
        let raw: Vec<Value> = match serde_json::from_str(&content) {
            Ok(values) => values,
            Err(e) => {
                warn!(path = %self.file_path.display(), error = %e, "log store unreadable, treating as empty");
                return Ok(Vec::new());
            }
        };

        let total = raw.len();
        let logs: Vec<LogEntry> = raw.into_iter()
            .filter_map(|value| match serde_json::from_value::<LogEntry>(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "dropping malformed log record");
                    None
                }
            })
            .collect();
        debug!(kept = logs.len(), total, "loaded log entries");
        Ok(logs)
    }

    fn write_logs(&self, logs: &[LogEntry]) -> Result<()> {
        let file = File::create(&self.file_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, logs)?;
        writer.flush()?;
        debug!(count = logs.len(), "wrote log entries");
        Ok(())
    }
}

impl LogRepository for FileLogRepository {
    fn list(&self) -> Result<Vec<LogEntry>> {
        self.read_logs()
    }

    fn replace_all(&self, logs: &[LogEntry]) -> Result<()> {
        self.write_logs(logs)
    }

    fn clear(&self) -> Result<()> {
        if self.file_path.exists() {
            fs::remove_file(&self.file_path)?;
        }
        Ok(())
    }
}
