//! Config store for loading and saving quarry.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{QuarryConfig, parser};

pub const CONFIG_FILE_NAME: &str = "quarry.toml";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// `quarry.toml` in the global config directory.
    pub fn global() -> anyhow::Result<Self> {
        let global_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("quarry");
        Ok(Self::at(global_dir.join(CONFIG_FILE_NAME)))
    }

    /// `quarry.toml` in a project root.
    pub fn for_project(project_root: &Path) -> Self {
        Self::at(project_root.join(CONFIG_FILE_NAME))
    }

    /// Project config in the current directory if present, otherwise global.
    pub fn discover() -> anyhow::Result<Self> {
        let project_root = std::env::current_dir()?;
        let project = Self::for_project(&project_root);
        if project.config_path.exists() {
            return Ok(project);
        }
        Self::global()
    }

    pub fn at(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> anyhow::Result<QuarryConfig> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(QuarryConfig::new());
        }
        parser::parse_quarry_toml(&self.config_path)
    }

    pub fn save(&self, config: &QuarryConfig) -> anyhow::Result<()> {
        let content = parser::to_toml(config).context("Failed to serialize config to TOML")?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;
        Ok(())
    }
}
