use rps_core::{EngineConfig, EscrowError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Account name of the controller, kept for display.
    pub controller_account: Option<String>,
    pub engine: EngineConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            controller_account: None,
            engine: EngineConfig::default(),
        }
    }
}

impl CliConfig {
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE)
    }

    /// Read the config from `data_dir`, falling back to defaults when the
    /// engine was never initialized there.
    pub async fn load(data_dir: &Path) -> Result<Self> {
        let path = Self::path(data_dir);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(Self::path(data_dir), content).await?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        !self.engine.controller.is_zero()
    }

    pub fn engine_config(&self) -> Result<EngineConfig> {
        if !self.is_initialized() {
            return Err(EscrowError::config(
                "Engine not initialized. Run 'rps init <controller-account>' first",
            ));
        }
        self.engine.validate()?;
        Ok(self.engine.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rps_core::PlayerId;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_config_is_uninitialized() {
        let temp_dir = tempdir().unwrap();
        let config = CliConfig::load(temp_dir.path()).await.unwrap();
        assert!(!config.is_initialized());
        assert!(matches!(config.engine_config(), Err(EscrowError::Config(_))));
    }

    #[tokio::test]
    async fn test_config_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let mut config = CliConfig::default();
        config.controller_account = Some("admin".to_string());
        config.engine.controller = PlayerId::new([0xc0; 20]);
        config.engine.extend_expiry_on_join = true;
        config.save(temp_dir.path()).await.unwrap();

        let loaded = CliConfig::load(temp_dir.path()).await.unwrap();
        assert_eq!(loaded.controller_account.as_deref(), Some("admin"));
        let engine = loaded.engine_config().unwrap();
        assert_eq!(engine.controller, PlayerId::new([0xc0; 20]));
        assert!(engine.extend_expiry_on_join);
    }
}
