//! Settings persistence.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::Result;
use crate::settings::DanmakuSettings;

/// Local preference store for [`DanmakuSettings`].
pub trait SettingsStore: Send + Sync {
    /// Return the stored settings, or `None` if nothing has been saved yet.
    fn load(&self) -> Result<Option<DanmakuSettings>>;

    /// Persist the given settings, replacing whatever was stored.
    fn save(&self, settings: &DanmakuSettings) -> Result<()>;
}

/// Settings stored as a TOML file.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self) -> Result<Option<DanmakuSettings>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No danmaku settings file");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let settings: DanmakuSettings = toml::from_str(&text)?;
        Ok(Some(settings))
    }

    fn save(&self, settings: &DanmakuSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(settings)?;

        // write next to the target and rename so a crash never leaves half a file
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        info!(path = %self.path.display(), "Saved danmaku settings");
        Ok(())
    }
}

/// In-memory store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    inner: Mutex<Option<DanmakuSettings>>,
}

impl MemorySettingsStore {
    pub fn with_settings(settings: DanmakuSettings) -> Self {
        Self {
            inner: Mutex::new(Some(settings)),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Option<DanmakuSettings>> {
        Ok(self.inner.lock().clone())
    }

    fn save(&self, settings: &DanmakuSettings) -> Result<()> {
        *self.inner.lock() = Some(settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::BlockLevel;

    #[test]
    fn test_toml_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlSettingsStore::new(dir.path().join("settings.toml"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_toml_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlSettingsStore::new(dir.path().join("nested").join("settings.toml"));

        let mut settings = DanmakuSettings {
            opacity: 0.5,
            block_visitor: true,
            block_level: BlockLevel::Medium,
            ..Default::default()
        };
        settings.add_keyword("剧透");
        store.save(&settings).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, settings);
        assert!(!store.path().with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_toml_store_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "enabled = false\nblock_level = 3\n").unwrap();

        let loaded = TomlSettingsStore::new(&path).load().unwrap().unwrap();
        assert!(!loaded.enabled);
        assert_eq!(loaded.block_level, BlockLevel::High);
        assert_eq!(loaded.font_size, 25);
    }

    #[test]
    fn test_toml_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "enabled = \"maybe\"").unwrap();
        assert!(TomlSettingsStore::new(&path).load().is_err());
    }
}
