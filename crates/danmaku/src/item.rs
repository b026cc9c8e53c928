//! Danmaku item types.
//!
//! A [`DanmakuItem`] is one timed overlay comment attached to a content stream
//! (`cid`). The wire keys follow the platform's JSON naming so items can be
//! round-tripped through caches and the CLI output unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placement mode of a danmaku.
///
/// Unknown values are kept as [`DanmakuMode::Unknown`] instead of being rejected,
/// the platform adds new modes from time to time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum DanmakuMode {
    /// Scrolls right to left
    #[default]
    Scroll,
    /// Fixed at the bottom
    Bottom,
    /// Fixed at the top
    Top,
    /// Scrolls left to right
    Reverse,
    /// Positioned/advanced danmaku
    Special,
    /// Scripted danmaku
    Code,
    /// BAS (structured advanced) danmaku
    Bas,
    /// Any value this client does not know about
    Unknown(i32),
}

impl DanmakuMode {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Scroll => 1,
            Self::Bottom => 2,
            Self::Top => 3,
            Self::Reverse => 4,
            Self::Special => 5,
            Self::Code => 6,
            Self::Bas => 7,
            Self::Unknown(v) => v,
        }
    }

    /// Human readable name, as shown in the player menus.
    pub fn description(self) -> &'static str {
        match self {
            Self::Scroll => "滚动",
            Self::Bottom => "底部",
            Self::Top => "顶部",
            Self::Reverse => "反转",
            Self::Special => "特殊",
            Self::Code => "代码",
            Self::Bas => "BAS",
            Self::Unknown(_) => "未知",
        }
    }
}

impl From<i32> for DanmakuMode {
    fn from(value: i32) -> Self {
        match value {
            1 => Self::Scroll,
            2 => Self::Bottom,
            3 => Self::Top,
            4 => Self::Reverse,
            5 => Self::Special,
            6 => Self::Code,
            7 => Self::Bas,
            other => Self::Unknown(other),
        }
    }
}

impl From<DanmakuMode> for i32 {
    fn from(mode: DanmakuMode) -> Self {
        mode.as_i32()
    }
}

impl fmt::Display for DanmakuMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Danmaku pool a comment belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum DanmakuPool {
    #[default]
    Normal,
    Subtitle,
    Special,
    Unknown(i32),
}

impl DanmakuPool {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Normal => 0,
            Self::Subtitle => 1,
            Self::Special => 2,
            Self::Unknown(v) => v,
        }
    }
}

impl From<i32> for DanmakuPool {
    fn from(value: i32) -> Self {
        match value {
            0 => Self::Normal,
            1 => Self::Subtitle,
            2 => Self::Special,
            other => Self::Unknown(other),
        }
    }
}

impl From<DanmakuPool> for i32 {
    fn from(pool: DanmakuPool) -> Self {
        pool.as_i32()
    }
}

/// Attribute bitmask of a danmaku.
///
/// The integer layout is the platform's; the accessors only name the bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DanmakuAttr(u32);

impl DanmakuAttr {
    pub const PROTECTED: u32 = 1 << 0;
    pub const LIVE: u32 = 1 << 1;
    pub const HIGH_LIKE: u32 = 1 << 2;

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Protected from the viewer-side cloud block.
    pub const fn is_protected(self) -> bool {
        self.0 & Self::PROTECTED != 0
    }

    /// Originally sent during a live broadcast.
    pub const fn is_live(self) -> bool {
        self.0 & Self::LIVE != 0
    }

    /// Marked as a highly-liked comment.
    pub const fn is_high_like(self) -> bool {
        self.0 & Self::HIGH_LIKE != 0
    }

    pub const fn with(self, bit: u32) -> Self {
        Self(self.0 | bit)
    }
}

/// Named colour presets offered by the send panel.
pub mod color {
    pub const WHITE: u32 = 0xFFFFFF;
    pub const RED: u32 = 0xFF0000;
    pub const BLUE: u32 = 0x0000FF;
    pub const GREEN: u32 = 0x00FF00;
    pub const YELLOW: u32 = 0xFFFF00;
    pub const PURPLE: u32 = 0x800080;
    pub const CYAN: u32 = 0x00FFFF;
    pub const ORANGE: u32 = 0xFFA500;
    pub const PINK: u32 = 0xFF69B4;
    pub const GRAY: u32 = 0x808080;

    pub const PRESETS: [u32; 10] = [
        WHITE, RED, BLUE, GREEN, YELLOW, PURPLE, CYAN, ORANGE, PINK, GRAY,
    ];

    pub fn name(color: u32) -> &'static str {
        match color & 0xFFFFFF {
            WHITE => "白色",
            RED => "红色",
            BLUE => "蓝色",
            GREEN => "绿色",
            YELLOW => "黄色",
            PURPLE => "紫色",
            CYAN => "青色",
            ORANGE => "橙色",
            PINK => "粉色",
            GRAY => "灰色",
            _ => "自定义",
        }
    }
}

/// Font size presets offered by the send panel.
pub mod font_size {
    pub const SMALL: u32 = 18;
    pub const NORMAL: u32 = 25;
    pub const LARGE: u32 = 36;
    pub const EXTRA_LARGE: u32 = 45;

    pub const PRESETS: [u32; 4] = [SMALL, NORMAL, LARGE, EXTRA_LARGE];

    pub fn name(size: u32) -> &'static str {
        match size {
            SMALL => "小",
            NORMAL => "中",
            LARGE => "大",
            EXTRA_LARGE => "特大",
            _ => "自定义",
        }
    }
}

/// Sender hashes of guest (not logged in) senders start with this marker.
pub const GUEST_HASH_PREFIX: char = 'D';

/// A single danmaku.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DanmakuItem {
    /// Danmaku id (dmid)
    pub id: u64,
    /// Appearance offset into the video in milliseconds
    pub progress: u64,
    pub mode: DanmakuMode,
    /// Font size; 0 means "use the viewer's preference"
    #[serde(rename = "fontsize")]
    pub font_size: u32,
    /// 24-bit RGB colour
    pub color: u32,
    /// Opaque hash of the sender
    #[serde(rename = "midHash")]
    pub sender_hash: String,
    pub content: String,
    /// Creation time (unix seconds)
    #[serde(rename = "ctime")]
    pub create_time: i64,
    /// Cloud-block weight (0-10)
    pub weight: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<String>,
    pub pool: DanmakuPool,
    pub attr: DanmakuAttr,
}

impl DanmakuItem {
    /// Create a plain white scrolling danmaku.
    pub fn new(id: u64, progress: u64, content: impl Into<String>) -> Self {
        Self {
            id,
            progress,
            mode: DanmakuMode::Scroll,
            font_size: font_size::NORMAL,
            color: color::WHITE,
            content: content.into(),
            ..Default::default()
        }
    }

    /// Set the placement mode.
    pub fn with_mode(mut self, mode: DanmakuMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the colour, masked to 24 bits.
    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color & 0xFFFFFF;
        self
    }

    /// Set the sender hash.
    pub fn with_sender_hash(mut self, hash: impl Into<String>) -> Self {
        self.sender_hash = hash.into();
        self
    }

    /// Set the weight.
    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    /// Set the font size.
    pub fn with_font_size(mut self, size: u32) -> Self {
        self.font_size = size;
        self
    }

    /// Whether the colour differs from plain white.
    pub fn is_colored(&self) -> bool {
        self.color & 0xFFFFFF != color::WHITE
    }

    /// Whether the sender was not logged in.
    ///
    /// Only the marker prefix is inspected, the hash itself is never decoded.
    pub fn is_guest_sender(&self) -> bool {
        self.sender_hash.starts_with(GUEST_HASH_PREFIX)
    }

    /// Appearance offset in seconds.
    pub fn progress_secs(&self) -> f64 {
        self.progress as f64 / 1000.0
    }
}
