use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TallyError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn settings_path() -> PathBuf {
    home().join(".config").join("tally").join("settings.json")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: home()
                .join("Documents")
                .join("tally")
                .to_string_lossy()
                .to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        std::fs::read_to_string(settings_path())
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    pub fn save(&self) -> Result<()> {
        let path = settings_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TallyError::Settings(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Data directory for the database. TALLY_DATA_DIR overrides the settings
/// file, which also keeps integration tests away from the real config.
pub fn get_data_dir() -> PathBuf {
    std::env::var("TALLY_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(Settings::load().data_dir))
}

pub fn db_path() -> PathBuf {
    get_data_dir().join("tally.db")
}
