//! The signed-in user's profile and a user's uploads.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::de::{lenient_i64, lenient_u64, null_default};
use super::video::Video;
use crate::wbi::WbiImg;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelInfo {
    pub current_level: u32,
    #[serde(deserialize_with = "lenient_u64")]
    pub current_min: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub current_exp: u64,
    /// `"--"` at the top level.
    #[serde(deserialize_with = "lenient_u64")]
    pub next_exp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficialInfo {
    pub role: i32,
    pub title: String,
    pub desc: String,
    #[serde(rename = "type")]
    pub kind: i32,
}

/// `type` is -1 when unverified, 0 for people and 1 for organisations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficialVerify {
    #[serde(rename = "type")]
    pub kind: i32,
    pub desc: String,
}

impl Default for OfficialVerify {
    fn default() -> Self {
        Self {
            kind: -1,
            desc: String::new(),
        }
    }
}

impl OfficialVerify {
    pub fn is_verified(&self) -> bool {
        self.kind >= 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pendant {
    #[serde(deserialize_with = "lenient_u64")]
    pub pid: u64,
    pub name: String,
    pub image: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub expire: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wallet {
    #[serde(deserialize_with = "lenient_u64")]
    pub mid: u64,
    pub bcoin_balance: f64,
    pub coupon_balance: f64,
    #[serde(deserialize_with = "lenient_i64")]
    pub coupon_due_time: i64,
}

/// Profile of the signed-in user, from `nav`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavInfo {
    #[serde(rename = "isLogin")]
    pub is_login: bool,
    pub email_verified: i32,
    pub face: String,
    pub level_info: LevelInfo,
    #[serde(deserialize_with = "lenient_u64")]
    pub mid: u64,
    pub mobile_verified: i32,
    pub money: f64,
    pub moral: i32,
    pub official: OfficialInfo,
    #[serde(rename = "officialVerify")]
    pub official_verify: OfficialVerify,
    pub pendant: Pendant,
    pub scores: i32,
    pub uname: String,
    #[serde(rename = "vipDueDate", deserialize_with = "lenient_i64")]
    pub vip_due_date: i64,
    #[serde(rename = "vipStatus")]
    pub vip_status: i32,
    #[serde(rename = "vipType")]
    pub vip_type: i32,
    pub wallet: Wallet,
    pub wbi_img: WbiImg,
}

impl NavInfo {
    pub fn is_vip(&self) -> bool {
        self.vip_status == 1 && self.vip_type > 0
    }

    pub fn level(&self) -> u32 {
        self.level_info.current_level
    }
}

/// `page` block of paged list payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageInfo {
    #[serde(alias = "num", deserialize_with = "lenient_u64")]
    pub pn: u64,
    #[serde(alias = "size", deserialize_with = "lenient_u64")]
    pub ps: u64,
    #[serde(alias = "total", deserialize_with = "lenient_u64")]
    pub count: u64,
}

impl PageInfo {
    pub fn has_more(&self) -> bool {
        self.pn.saturating_mul(self.ps) < self.count
    }
}

/// Sort order of a user's uploads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadOrder {
    /// Newest first.
    #[default]
    Pubdate,
    /// Most played first.
    Click,
    /// Most favourited first.
    Stow,
}

impl UploadOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pubdate => "pubdate",
            Self::Click => "click",
            Self::Stow => "stow",
        }
    }
}

impl fmt::Display for UploadOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawUploadsPage")]
pub struct UploadsPage {
    pub videos: Vec<Video>,
    pub page: PageInfo,
}

impl UploadsPage {
    pub fn has_more(&self) -> bool {
        self.page.has_more()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawUploadList {
    #[serde(default, deserialize_with = "null_default")]
    vlist: Vec<Video>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawUploadsPage {
    list: Option<RawUploadList>,
    page: PageInfo,
}

impl From<RawUploadsPage> for UploadsPage {
    fn from(raw: RawUploadsPage) -> Self {
        Self {
            videos: raw.list.map(|l| l.vlist).unwrap_or_default(),
            page: raw.page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_info() {
        let nav: NavInfo = serde_json::from_str(
            r#"{"isLogin":true,"email_verified":1,"face":"f","mid":123,"money":12.5,"moral":70,
                "level_info":{"current_level":6,"current_min":28800,"current_exp":30000,"next_exp":"--"},
                "official":{"role":0,"title":"","desc":"","type":-1},
                "officialVerify":{"type":-1,"desc":""},
                "pendant":{"pid":0,"name":"","image":"","expire":0},
                "uname":"name","vipDueDate":1700000000000,"vipStatus":1,"vipType":2,
                "wallet":{"mid":123,"bcoin_balance":5,"coupon_balance":5,"coupon_due_time":0},
                "wbi_img":{"img_url":"https://i0.hdslb.com/bfs/wbi/a.png","sub_url":"https://i0.hdslb.com/bfs/wbi/b.png"}}"#,
        )
        .unwrap();
        assert!(nav.is_login);
        assert_eq!(nav.level(), 6);
        assert_eq!(nav.level_info.next_exp, 0);
        assert!(nav.is_vip());
        assert!(!nav.official_verify.is_verified());
        assert_eq!(nav.wallet.bcoin_balance, 5.0);
        assert!(nav.wbi_img.sub_url.ends_with("b.png"));
    }

    #[test]
    fn test_anonymous_nav_info() {
        let nav: NavInfo = serde_json::from_str(r#"{"isLogin":false,"wbi_img":{}}"#).unwrap();
        assert!(!nav.is_login);
        assert!(!nav.is_vip());
        assert_eq!(nav.mid, 0);
        assert!(!nav.official_verify.is_verified());
    }

    #[test]
    fn test_page_info_aliases() {
        let page: PageInfo = serde_json::from_str(r#"{"num":2,"size":20,"count":41}"#).unwrap();
        assert_eq!(page.pn, 2);
        assert!(page.has_more());
        let last: PageInfo = serde_json::from_str(r#"{"pn":3,"ps":20,"total":41}"#).unwrap();
        assert!(!last.has_more());
    }

    #[test]
    fn test_uploads_page() {
        let page: UploadsPage = serde_json::from_str(
            r#"{"list":{"tlist":{},"vlist":[{"bvid":"BV1","aid":1,"title":"t","author":"a","mid":2,
                "play":10,"video_review":3,"length":"01:02","created":1700000000}]},
                "page":{"pn":1,"ps":30,"count":1}}"#,
        )
        .unwrap();
        assert_eq!(page.videos.len(), 1);
        assert_eq!(page.videos[0].danmaku_count, 3);
        assert_eq!(page.videos[0].duration, "01:02");
        assert_eq!(page.videos[0].publish_time, 1700000000);
        assert!(!page.has_more());
    }
}
