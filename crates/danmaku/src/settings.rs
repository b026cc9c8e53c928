//! Viewer-side danmaku settings.
//!
//! [`DanmakuSettings`] is a plain value. Shared access goes through
//! [`SettingsHandle`], which only ever swaps whole snapshots so readers never
//! observe a half-applied change.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::item::font_size;
use crate::store::SettingsStore;

/// Cloud-block strictness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum BlockLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl BlockLevel {
    /// Minimum weight a danmaku needs to pass at this level.
    pub fn min_weight(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Low => 3,
            Self::Medium => 6,
            Self::High => 9,
        }
    }
}

impl From<u8> for BlockLevel {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Low,
            2 => Self::Medium,
            // anything stricter than "high" is clamped
            _ => Self::High,
        }
    }
}

impl From<BlockLevel> for u8 {
    fn from(level: BlockLevel) -> Self {
        level as u8
    }
}

/// User-editable danmaku configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DanmakuSettings {
    pub enabled: bool,
    pub font_size: u32,
    /// 0.0 - 1.0
    pub opacity: f32,
    /// Scroll speed multiplier
    pub speed: f32,
    /// Fraction of the screen height danmaku may occupy, 0.0 - 1.0
    pub display_area: f32,
    pub show_top: bool,
    pub show_bottom: bool,
    pub show_scroll: bool,
    pub show_color: bool,
    pub block_repeat: bool,
    pub block_scroll: bool,
    pub block_top: bool,
    pub block_bottom: bool,
    pub block_color: bool,
    pub block_visitor: bool,
    pub block_level: BlockLevel,
    pub block_keywords: Vec<String>,
}

impl Default for DanmakuSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            font_size: font_size::NORMAL,
            opacity: 1.0,
            speed: 1.0,
            display_area: 1.0,
            show_top: true,
            show_bottom: true,
            show_scroll: true,
            show_color: true,
            block_repeat: false,
            block_scroll: false,
            block_top: false,
            block_bottom: false,
            block_color: false,
            block_visitor: false,
            block_level: BlockLevel::None,
            block_keywords: Vec::new(),
        }
    }
}

impl DanmakuSettings {
    pub const MIN_SPEED: f32 = 0.1;
    pub const MAX_SPEED: f32 = 4.0;

    /// Clamp numeric fields into their valid ranges and tidy the keyword list.
    pub fn normalized(mut self) -> Self {
        self.opacity = clamp_unit(self.opacity, 1.0);
        self.display_area = clamp_unit(self.display_area, 1.0);
        self.speed = if self.speed.is_finite() {
            self.speed.clamp(Self::MIN_SPEED, Self::MAX_SPEED)
        } else {
            1.0
        };
        if self.font_size == 0 {
            self.font_size = font_size::NORMAL;
        }

        let keywords = std::mem::take(&mut self.block_keywords);
        for keyword in keywords {
            self.add_keyword(&keyword);
        }
        self
    }

    /// Add a block keyword. Returns `false` if it was blank or already present.
    pub fn add_keyword(&mut self, keyword: &str) -> bool {
        let keyword = keyword.trim();
        if keyword.is_empty() || self.has_keyword(keyword) {
            return false;
        }
        self.block_keywords.push(keyword.to_string());
        true
    }

    /// Remove a block keyword, compared case-insensitively.
    pub fn remove_keyword(&mut self, keyword: &str) -> bool {
        let needle = keyword.trim().to_lowercase();
        let before = self.block_keywords.len();
        self.block_keywords.retain(|k| k.to_lowercase() != needle);
        before != self.block_keywords.len()
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.trim().to_lowercase();
        self.block_keywords.iter().any(|k| k.to_lowercase() == needle)
    }
}

fn clamp_unit(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

/// Shared, atomically replaced settings.
///
/// Changes are persisted through the store before they become visible.
pub struct SettingsHandle {
    current: RwLock<Arc<DanmakuSettings>>,
    store: Arc<dyn SettingsStore>,
}

impl SettingsHandle {
    /// Load the persisted settings, falling back to defaults when nothing is stored yet.
    pub fn load(store: Arc<dyn SettingsStore>) -> Result<Self> {
        let settings = store.load()?.unwrap_or_default().normalized();
        debug!(?settings, "Loaded danmaku settings");
        Ok(Self {
            current: RwLock::new(Arc::new(settings)),
            store,
        })
    }

    /// Consistent snapshot of the current settings.
    pub fn snapshot(&self) -> Arc<DanmakuSettings> {
        self.current.read().clone()
    }

    /// Persist and publish a complete new settings value.
    ///
    /// Like [`update`](Self::update), the write lock spans the save so the
    /// stored and published values never diverge.
    pub fn replace(&self, settings: DanmakuSettings) -> Result<Arc<DanmakuSettings>> {
        let settings = Arc::new(settings.normalized());
        let mut guard = self.current.write();
        self.store.save(&settings)?;
        *guard = settings.clone();
        Ok(settings)
    }

    /// Apply an edit to a copy of the current settings, then persist and publish it.
    ///
    /// The write lock is held across the edit so concurrent updates do not lose
    /// each other's changes.
    pub fn update<F>(&self, edit: F) -> Result<Arc<DanmakuSettings>>
    where
        F: FnOnce(&mut DanmakuSettings),
    {
        let mut guard = self.current.write();
        let mut next = DanmakuSettings::clone(&guard);
        edit(&mut next);
        let next = Arc::new(next.normalized());
        self.store.save(&next)?;
        *guard = next.clone();
        Ok(next)
    }

    /// Reset to defaults.
    pub fn reset(&self) -> Result<Arc<DanmakuSettings>> {
        self.replace(DanmakuSettings::default())
    }
}
