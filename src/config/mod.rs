// Configuration management for OnlyPlayer
// Handles loading/saving settings, with sensible defaults when config is missing

use crate::media::MAX_ITEMS;
use crate::ui::Locale;
use anyhow::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    pub snapshot_dir: PathBuf,
    pub log_dir: PathBuf,
    pub library: LibraryConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub max_items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub locale: Locale,
    pub volume_step: f32,
    pub tick_ms: u64,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self { max_items: MAX_ITEMS }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            locale: Locale::detect(&std::env::var("LANG").unwrap_or_default()),
            volume_step: 0.05,
            tick_ms: 250,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let app_dir = Self::app_dir();

        Self {
            database_path: app_dir.join("folders.db"),
            snapshot_dir: dirs::picture_dir().unwrap_or_else(|| PathBuf::from(".")),
            log_dir: app_dir.join("logs"),
            library: LibraryConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Read `path`, writing the defaults there first if it does not exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    /// Where the profile preference area lives, if the host has a config dir.
    pub fn profile_dir() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("onlyplayer"))
    }

    /// Preference fallback when the profile area is unusable.
    pub fn fallback_dir() -> PathBuf {
        std::env::temp_dir().join("onlyplayer")
    }

    fn app_dir() -> PathBuf {
        Self::profile_dir().unwrap_or_else(|| PathBuf::from(".").join("onlyplayer"))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = Self::profile_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;

        Ok(config_dir.join("config.toml"))
    }
}
