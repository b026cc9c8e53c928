//! Danmaku: overlay comment model, viewer settings and filtering.
//!
//! ## Core Types
//!
//! - [`DanmakuItem`] - A single timed overlay comment
//! - [`DanmakuMode`] / [`DanmakuPool`] / [`DanmakuAttr`] - Item classification
//!
//! ## Settings
//!
//! - [`DanmakuSettings`] - Viewer preferences (visibility, blocking, style)
//! - [`SettingsHandle`] - Shared snapshot access with persistence
//! - [`SettingsStore`] - Storage seam, with [`TomlSettingsStore`] and [`MemorySettingsStore`]
//!
//! ## Filtering
//!
//! - [`DanmakuFilter`] - Applies the settings to a batch of items
//! - [`FilterReport`] - Per-reason suppression counts
//!
//! ## Input
//!
//! - [`parse_danmaku_xml`] - Decode the platform's XML danmaku list

pub mod error;
pub mod filter;
pub mod item;
pub mod settings;
pub mod store;
pub mod xml;

pub use error::{DanmakuError, Result};
pub use filter::{
    DanmakuFilter, DanmakuStyle, FilterReport, Placement, StyledDanmaku, SuppressReason, Verdict,
    filter_batch,
};
pub use item::{DanmakuAttr, DanmakuItem, DanmakuMode, DanmakuPool, color, font_size};
pub use settings::{BlockLevel, DanmakuSettings, SettingsHandle};
pub use store::{MemorySettingsStore, SettingsStore, TomlSettingsStore};
pub use xml::parse_danmaku_xml;
