//! Application configuration
//!
//! Loaded with confy from the platform config directory
//! (`~/.config/acsched/config.yml` on Linux). Missing or unreadable
//! configuration falls back to defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use acsched_core::store::default_store_path;
use acsched_types::SchedulerConfig;

const APP_NAME: &str = "acsched";
const CONFIG_NAME: &str = "config";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Timer store file (defaults to the platform data directory)
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    /// Shell command run when an "on" timer fires
    #[serde(default)]
    pub on_command: Option<String>,

    /// Shell command run when an "off" timer fires
    #[serde(default)]
    pub off_command: Option<String>,
}

impl AppConfig {
    pub fn load() -> Self {
        confy::load(APP_NAME, CONFIG_NAME).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load configuration, using defaults");
            Self::default()
        })
    }

    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    pub fn store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(default_store_path)
    }
}
