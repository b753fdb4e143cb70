use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, warn};

use crate::model::PolicyConfig;
use crate::repository::file::resolve_data_dir;
use crate::repository::traits::ConfigRepository;

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Clone)]
pub struct FileConfigRepository {
    file_path: PathBuf,
}

impl FileConfigRepository {
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self> {
        let path = resolve_data_dir(base_dir)?.join(CONFIG_FILE_NAME);
        Ok(Self { file_path: path })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

impl ConfigRepository for FileConfigRepository {
    fn load(&self) -> Result<Option<PolicyConfig>> {
        if !self.file_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.file_path)?;
        match serde_json::from_str::<PolicyConfig>(&content) {
            Ok(cfg) => Ok(Some(cfg)),
            Err(e) => {
                warn!(path = %self.file_path.display(), error = %e, "config unreadable, ignoring");
                Ok(None)
            }
        }
    }

    fn save(&self, cfg: &PolicyConfig) -> Result<()> {
        let content = serde_json::to_string_pretty(cfg)?;
        fs::write(&self.file_path, content)?;
        debug!(path = %self.file_path.display(), "saved config");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.file_path.exists() {
            fs::remove_file(&self.file_path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_save_clear() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileConfigRepository::new(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(repo.load().unwrap(), None);

        let cfg = PolicyConfig { mandatory_days_per_week: 5, ..PolicyConfig::default() };
        repo.save(&cfg).unwrap();
        assert_eq!(repo.load().unwrap(), Some(cfg));

        repo.clear().unwrap();
        assert_eq!(repo.load().unwrap(), None);
    }

    #[test]
    fn test_corrupt_config_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileConfigRepository::new(Some(dir.path().to_path_buf())).unwrap();
        fs::write(repo.path(), "mandatoryDaysPerWeek=3").unwrap();
        assert_eq!(repo.load().unwrap(), None);
    }
}
