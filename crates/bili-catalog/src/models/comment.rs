//! Comment threads of a video.

use serde::{Deserialize, Serialize};

use super::de::{lenient_i64, lenient_u64, null_default, string_or_number};
use super::user::{LevelInfo, OfficialVerify, PageInfo};

/// Ordering of the reply list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentSort {
    /// Newest first.
    Time,
    /// Most liked first.
    #[default]
    Hot,
    /// Most replied first.
    Replies,
}

impl CommentSort {
    pub fn as_param(self) -> u8 {
        match self {
            Self::Time => 0,
            Self::Hot => 1,
            Self::Replies => 2,
        }
    }
}

/// Named view over a comment's `attr` bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentAttr(u32);

impl CommentAttr {
    pub const PINNED: u32 = 1 << 1;
    pub const FEATURED: u32 = 1 << 2;
    pub const FOLDED: u32 = 1 << 3;

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Pinned to the top by the uploader.
    pub const fn is_pinned(self) -> bool {
        self.0 & Self::PINNED != 0
    }

    /// Selected for display by the uploader.
    pub const fn is_featured(self) -> bool {
        self.0 & Self::FEATURED != 0
    }

    pub const fn is_folded(self) -> bool {
        self.0 & Self::FOLDED != 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberVip {
    #[serde(rename = "vipType")]
    pub vip_type: i32,
    #[serde(rename = "vipStatus")]
    pub vip_status: i32,
    #[serde(rename = "vipDueDate", deserialize_with = "lenient_i64")]
    pub vip_due_date: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentMember {
    #[serde(deserialize_with = "string_or_number")]
    pub mid: String,
    pub uname: String,
    pub sex: String,
    pub sign: String,
    pub avatar: String,
    pub level_info: LevelInfo,
    pub official_verify: OfficialVerify,
    pub vip: MemberVip,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentContent {
    pub message: String,
    pub plat: i32,
    pub device: String,
    pub max_line: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpAction {
    pub like: bool,
    pub reply: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    #[serde(deserialize_with = "lenient_u64")]
    pub rpid: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub oid: u64,
    #[serde(rename = "type")]
    pub kind: i32,
    #[serde(deserialize_with = "lenient_u64")]
    pub mid: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub root: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub parent: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub count: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub rcount: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub like: u64,
    #[serde(deserialize_with = "lenient_i64")]
    pub ctime: i64,
    pub attr: CommentAttr,
    pub member: CommentMember,
    pub content: CommentContent,
    #[serde(deserialize_with = "null_default")]
    pub replies: Vec<Comment>,
    pub up_action: UpAction,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.root == 0
    }

    pub fn message(&self) -> &str {
        &self.content.message
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentPage {
    pub page: PageInfo,
    #[serde(deserialize_with = "null_default")]
    pub replies: Vec<Comment>,
    #[serde(rename = "hots", deserialize_with = "null_default")]
    pub hot_replies: Vec<Comment>,
}

impl CommentPage {
    pub fn has_more(&self) -> bool {
        self.page.has_more()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_attr() {
        let attr = CommentAttr::new(CommentAttr::PINNED | CommentAttr::FOLDED);
        assert!(attr.is_pinned());
        assert!(!attr.is_featured());
        assert!(attr.is_folded());
        assert_eq!(attr.bits(), 10);
        assert!(!CommentAttr::default().is_pinned());
    }

    #[test]
    fn test_sort_params() {
        assert_eq!(CommentSort::default(), CommentSort::Hot);
        assert_eq!(CommentSort::Time.as_param(), 0);
        assert_eq!(CommentSort::Replies.as_param(), 2);
    }

    #[test]
    fn test_comment_page() {
        let page: CommentPage = serde_json::from_str(
            r#"{"page":{"num":1,"size":20,"count":2,"acount":3},
                "replies":[{"rpid":1,"oid":170001,"type":1,"mid":2,"root":0,"parent":0,"like":30,
                    "attr":4,"ctime":1700000000,
                    "member":{"mid":"2","uname":"u","avatar":"a","level_info":{"current_level":5},
                              "vip":{"vipType":2,"vipStatus":1}},
                    "content":{"message":"first","plat":2},
                    "replies":[{"rpid":3,"root":1,"parent":1,"member":{"mid":4},"content":{"message":"reply"}}],
                    "up_action":{"like":true,"reply":false}},
                   {"rpid":2,"content":{"message":"second"},"replies":null}],
                "hots":null}"#,
        )
        .unwrap();
        assert_eq!(page.replies.len(), 2);
        let first = &page.replies[0];
        assert!(first.is_root());
        assert!(first.attr.is_featured());
        assert_eq!(first.member.level_info.current_level, 5);
        assert_eq!(first.member.vip.vip_type, 2);
        assert!(first.up_action.like);
        assert_eq!(first.replies[0].message(), "reply");
        assert_eq!(first.replies[0].member.mid, "4");
        assert!(!first.replies[0].is_root());
        assert!(page.replies[1].replies.is_empty());
        assert!(page.hot_replies.is_empty());
        assert!(!page.has_more());
    }
}
