use crate::player::QueueMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const PREF_KEY: &str = "onlyplayer:prefs";

/// The persisted record, written in full on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub playback_rate: f32,
    pub queue_mode: QueueMode,
}

/// Whatever could be read back. Fields are kept raw; the player decides
/// which ones are valid when it hydrates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialPreferences {
    pub playback_rate: Option<f64>,
    pub queue_mode: Option<String>,
}

impl PartialPreferences {
    pub fn from_value(value: &Value) -> Self {
        Self {
            playback_rate: value.get("playbackRate").and_then(Value::as_f64),
            queue_mode: value.get("queueMode").and_then(Value::as_str).map(|s| s.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.playback_rate.is_none() && self.queue_mode.is_none()
    }
}

/// A small key-value backend preferences can live in.
pub trait KeyValueArea {
    fn kind(&self) -> &'static str;
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Profile-scoped area: one JSON document holding every key.
pub struct ProfileArea {
    path: PathBuf,
}

impl ProfileArea {
    pub const FILE_NAME: &'static str = "storage.json";

    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(Self::FILE_NAME),
        }
    }

    fn read_document(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let document: Map<String, Value> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(document)
    }
}

impl KeyValueArea for ProfileArea {
    fn kind(&self) -> &'static str {
        "profile"
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_document()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        // A corrupt document is replaced rather than blocking every later save
        let mut document = self.read_document().unwrap_or_default();
        document.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&document)?)?;
        Ok(())
    }
}

/// Fallback area: one file per key, each holding the value as a JSON string.
pub struct LocalArea {
    dir: PathBuf,
}

impl LocalArea {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

impl KeyValueArea for LocalArea {
    fn kind(&self) -> &'static str {
        "local"
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let stored: String = serde_json::from_str(&fs::read_to_string(&path)?)?;
        Ok(Some(serde_json::from_str(&stored)?))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let stored = serde_json::to_string(&value)?;
        fs::write(self.key_path(key), serde_json::to_string(&stored)?)?;
        Ok(())
    }
}

/// Best-effort preference persistence over whichever area the host offers.
pub struct PreferenceStore {
    area: Box<dyn KeyValueArea>,
}

impl PreferenceStore {
    pub fn new(area: Box<dyn KeyValueArea>) -> Self {
        Self { area }
    }

    /// Pick the backend once: the profile area when a profile directory is
    /// usable, the local fallback otherwise.
    pub fn detect(profile_dir: Option<PathBuf>, fallback_dir: PathBuf) -> Self {
        let area: Box<dyn KeyValueArea> = match profile_dir {
            Some(dir) if fs::create_dir_all(&dir).is_ok() => Box::new(ProfileArea::new(dir)),
            _ => Box::new(LocalArea::new(fallback_dir)),
        };
        info!("Preferences stored in the {} area", area.kind());
        Self::new(area)
    }

    pub fn backend(&self) -> &'static str {
        self.area.kind()
    }

    /// Never fails: missing or unreadable data comes back empty.
    pub async fn load(&self) -> PartialPreferences {
        match self.area.get(PREF_KEY) {
            Ok(Some(value)) => PartialPreferences::from_value(&value),
            Ok(None) => PartialPreferences::default(),
            Err(e) => {
                warn!("Failed to load preferences: {:#}", e);
                PartialPreferences::default()
            }
        }
    }

    pub async fn save(&self, prefs: &Preferences) {
        let result = serde_json::to_value(prefs)
            .map_err(anyhow::Error::from)
            .and_then(|value| self.area.set(PREF_KEY, value));

        if let Err(e) = result {
            warn!("Failed to persist preferences: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample() -> Preferences {
        Preferences {
            playback_rate: 1.5,
            queue_mode: QueueMode::Shuffle,
        }
    }

    #[tokio::test]
    async fn test_round_trip_profile_area() {
        let dir = tempdir().unwrap();
        let store = PreferenceStore::new(Box::new(ProfileArea::new(dir.path())));

        store.save(&sample()).await;
        let loaded = store.load().await;

        assert_eq!(loaded.playback_rate, Some(1.5));
        assert_eq!(loaded.queue_mode.as_deref(), Some("shuffle"));
    }

    #[tokio::test]
    async fn test_round_trip_local_area() {
        let dir = tempdir().unwrap();
        let store = PreferenceStore::new(Box::new(LocalArea::new(dir.path())));

        store.save(&sample()).await;
        let loaded = store.load().await;

        assert_eq!(loaded.playback_rate, Some(1.5));
        assert_eq!(loaded.queue_mode.as_deref(), Some("shuffle"));
        assert!(dir.path().join("onlyplayer_prefs.json").exists());
    }

    #[tokio::test]
    async fn test_profile_area_keeps_other_keys() {
        let dir = tempdir().unwrap();
        let area = ProfileArea::new(dir.path());
        area.set("other", json!({"keep": true})).unwrap();

        let store = PreferenceStore::new(Box::new(area));
        store.save(&sample()).await;

        let raw = fs::read_to_string(dir.path().join(ProfileArea::FILE_NAME)).unwrap();
        let document: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(document["other"], json!({"keep": true}));
        assert_eq!(document[PREF_KEY], json!({"playbackRate": 1.5, "queueMode": "shuffle"}));
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_data_load_empty() {
        let dir = tempdir().unwrap();
        let store = PreferenceStore::new(Box::new(ProfileArea::new(dir.path())));
        assert!(store.load().await.is_empty());

        fs::write(dir.path().join(ProfileArea::FILE_NAME), "{not json").unwrap();
        assert!(store.load().await.is_empty());

        // Saving over a corrupt document recovers it
        store.save(&sample()).await;
        assert_eq!(store.load().await.playback_rate, Some(1.5));
    }

    #[test]
    fn test_partial_ignores_wrong_types() {
        let partial = PartialPreferences::from_value(&json!({
            "playbackRate": "fast",
            "queueMode": "sequence"
        }));
        assert_eq!(partial.playback_rate, None);
        assert_eq!(partial.queue_mode.as_deref(), Some("sequence"));
    }

    #[test]
    fn test_detect_prefers_profile_area() {
        let dir = tempdir().unwrap();
        let store =
            PreferenceStore::detect(Some(dir.path().join("profile")), dir.path().join("fallback"));
        assert_eq!(store.backend(), "profile");

        let store = PreferenceStore::detect(None, dir.path().join("fallback"));
        assert_eq!(store.backend(), "local");
    }
}
