//! Posting danmaku.

use ::danmaku::{DanmakuMode, DanmakuPool, color, font_size};
use serde::{Deserialize, Serialize};

use super::de::lenient_u64;

/// Platform tag of posts made by this client (android).
pub const DEFAULT_PLATFORM: u32 = 2;

/// Outbound danmaku, sent as a form POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendDanmakuRequest {
    /// Content-stream id.
    pub oid: u64,
    pub aid: u64,
    pub bvid: String,
    pub message: String,
    /// Offset into the video, in milliseconds.
    pub progress: u64,
    pub color: u32,
    pub font_size: u32,
    pub mode: DanmakuMode,
    pub pool: DanmakuPool,
    pub platform: u32,
    /// Anti-forgery token; taken from the session when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf: Option<String>,
}

impl SendDanmakuRequest {
    pub fn new(oid: u64, message: impl Into<String>) -> Self {
        Self {
            oid,
            aid: 0,
            bvid: String::new(),
            message: message.into(),
            progress: 0,
            color: color::WHITE,
            font_size: font_size::NORMAL,
            mode: DanmakuMode::Scroll,
            pool: DanmakuPool::Normal,
            platform: DEFAULT_PLATFORM,
            csrf: None,
        }
    }

    pub fn video(mut self, aid: u64, bvid: impl Into<String>) -> Self {
        self.aid = aid;
        self.bvid = bvid.into();
        self
    }

    pub fn progress(mut self, progress_ms: u64) -> Self {
        self.progress = progress_ms;
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = color & 0xFF_FFFF;
        self
    }

    pub fn font_size(mut self, font_size: u32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn mode(mut self, mode: DanmakuMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn pool(mut self, pool: DanmakuPool) -> Self {
        self.pool = pool;
        self
    }

    pub fn csrf(mut self, token: impl Into<String>) -> Self {
        self.csrf = Some(token.into());
        self
    }

    /// Form fields, with the resolved anti-forgery token.
    pub fn form(&self, csrf: &str) -> Vec<(String, String)> {
        let mut form = vec![
            ("type".to_string(), "1".to_string()),
            ("oid".to_string(), self.oid.to_string()),
            ("msg".to_string(), self.message.clone()),
        ];
        if self.aid != 0 {
            form.push(("aid".to_string(), self.aid.to_string()));
        }
        if !self.bvid.is_empty() {
            form.push(("bvid".to_string(), self.bvid.clone()));
        }
        form.extend([
            ("progress".to_string(), self.progress.to_string()),
            ("color".to_string(), self.color.to_string()),
            ("fontsize".to_string(), self.font_size.to_string()),
            ("mode".to_string(), self.mode.as_i32().to_string()),
            ("pool".to_string(), self.pool.as_i32().to_string()),
            ("plat".to_string(), self.platform.to_string()),
            ("csrf".to_string(), csrf.to_string()),
        ]);
        form
    }
}

/// Outcome of a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostDanmakuResult {
    #[serde(deserialize_with = "lenient_u64")]
    pub dmid: u64,
    pub dmid_str: String,
    /// Moderation mask applied to the new item, if any.
    pub dm_mask: Option<serde_json::Value>,
    pub visible: Option<bool>,
}

impl PostDanmakuResult {
    /// The assigned id, preferring the string form (ids exceed 2^53).
    pub fn id(&self) -> String {
        if self.dmid_str.is_empty() {
            self.dmid.to_string()
        } else {
            self.dmid_str.clone()
        }
    }

    pub fn is_masked(&self) -> bool {
        self.dm_mask.as_ref().is_some_and(|m| !m.is_null())
    }
}
