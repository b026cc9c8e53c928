//! Message centre: unread counters and @-mentions.

use serde::{Deserialize, Serialize};

use super::de::{lenient_i64, lenient_u64, null_default};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnreadCount {
    #[serde(deserialize_with = "lenient_u64")]
    pub at: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub chat: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub like: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub reply: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub sys_msg: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub up: u64,
}

impl UnreadCount {
    pub fn total(&self) -> u64 {
        self.at + self.chat + self.like + self.reply + self.sys_msg + self.up
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtUser {
    #[serde(deserialize_with = "lenient_u64")]
    pub mid: u64,
    #[serde(alias = "nickname")]
    pub uname: String,
    #[serde(alias = "avatar")]
    pub face: String,
}

/// Where the mention was made.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtContent {
    pub business: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub subject_id: u64,
    pub title: String,
    pub image: String,
    pub uri: String,
    pub source_content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtMessage {
    #[serde(deserialize_with = "lenient_u64")]
    pub id: u64,
    pub user: AtUser,
    pub item: AtContent,
    #[serde(deserialize_with = "lenient_i64")]
    pub at_time: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtCursor {
    pub is_end: bool,
    #[serde(deserialize_with = "lenient_u64")]
    pub id: u64,
    #[serde(deserialize_with = "lenient_i64")]
    pub time: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtMessagePage {
    #[serde(deserialize_with = "null_default")]
    pub items: Vec<AtMessage>,
    pub cursor: AtCursor,
}

impl AtMessagePage {
    pub fn has_more(&self) -> bool {
        !self.cursor.is_end && !self.items.is_empty()
    }
}
