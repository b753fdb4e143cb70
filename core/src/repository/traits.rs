use crate::model::{LogEntry, PolicyConfig};
use anyhow::Result;

/// The attendance log, read and written as a whole collection.
pub trait LogRepository {
    fn list(&self) -> Result<Vec<LogEntry>>;
    fn replace_all(&self, logs: &[LogEntry]) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// The single policy record. `load` yields `None` when nothing usable is stored.
pub trait ConfigRepository {
    fn load(&self) -> Result<Option<PolicyConfig>>;
    fn save(&self, cfg: &PolicyConfig) -> Result<()>;
    fn clear(&self) -> Result<()>;
}
