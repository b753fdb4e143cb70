use crate::model::PolicyConfig;
use crate::repository::ConfigRepository;
use anyhow::Result;
use chrono::Utc;
use tracing::info;

pub struct ConfigService<R: ConfigRepository> {
    repo: R,
}

impl<R: ConfigRepository> ConfigService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// The stored policy, or the documented default when none is saved.
    pub fn current(&self) -> Result<PolicyConfig> {
        Ok(self.repo.load()?.unwrap_or_default())
    }

    pub fn is_configured(&self) -> Result<bool> {
        Ok(self.repo.load()?.is_some())
    }

    /// Validates, stamps `updated_at` and stores. Out-of-range values abort the
    /// save with a `ConfigError`.
    pub fn save(&self, mut cfg: PolicyConfig) -> Result<PolicyConfig> {
        cfg.validate()?;
        cfg.updated_at = Some(Utc::now());
        self.repo.save(&cfg)?;
        info!(
            days = cfg.mandatory_days_per_week,
            wfh = cfg.allowed_wfh_per_month,
            hours = cfg.mandatory_hours_per_day,
            "policy saved"
        );
        Ok(cfg)
    }

    pub fn reset(&self) -> Result<()> {
        self.repo.clear()
    }
}
