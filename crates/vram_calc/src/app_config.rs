//! Application Config
//!
//! User preferences persisted as pretty JSON next to the working directory.
//! A missing file means defaults; every field is optional on disk.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "vram_calc.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Entries kept by the shell history before the oldest is evicted.
    pub history_capacity: usize,
    /// GPU id the advisor compares against when none is given on the command line.
    pub target_gpu: Option<String>,
    pub json_output: bool,
    pub log_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            target_gpu: None,
            json_output: false,
            log_dir: "logs".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Where logs go for a load attempt, so a bad config file can still be logged.
    pub fn log_dir_for(loaded: &Result<Self>) -> String {
        match loaded {
            Ok(config) => config.log_dir.clone(),
            Err(_) => Self::default().log_dir,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to save config {}", path.display()))?;
        tracing::info!("✅ Configuration saved to {}", path.display());
        Ok(())
    }
}
