//! Videos, video details and the recommendation feed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de::{DurationValue, lenient_u64, null_default, string_or_number};
use crate::error::Precondition;
use crate::format::format_count;

/// A piece of content.
///
/// Decoded from the flat shape (`author`, `mid`, `play`) as well as the nested
/// one newer endpoints use (`owner`, `stat`). `view_progress` is client-local.
/// Serializes to the flat shape, which decodes back to the same value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawVideo")]
pub struct Video {
    pub bvid: String,
    pub aid: u64,
    pub title: String,
    #[serde(rename = "pic")]
    pub cover: String,
    pub author: String,
    #[serde(rename = "mid")]
    pub author_mid: u64,
    #[serde(rename = "play")]
    pub play_count: u64,
    #[serde(rename = "danmaku")]
    pub danmaku_count: u64,
    #[serde(rename = "like")]
    pub like_count: u64,
    #[serde(rename = "coin")]
    pub coin_count: u64,
    #[serde(rename = "favorite")]
    pub favorite_count: u64,
    #[serde(rename = "share")]
    pub share_count: u64,
    pub duration: String,
    pub cid: u64,
    #[serde(rename = "desc", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "pubdate")]
    pub publish_time: i64,
    /// Playback position in milliseconds.
    pub view_progress: u64,
}

impl Video {
    pub fn formatted_play_count(&self) -> String {
        format_count(self.play_count)
    }

    pub fn formatted_danmaku_count(&self) -> String {
        format_count(self.danmaku_count)
    }

    pub fn set_view_progress(&mut self, progress_ms: u64) {
        self.view_progress = progress_ms;
    }

    /// The preferred identifier, if the record has one.
    pub fn id(&self) -> Option<VideoId> {
        if !self.bvid.is_empty() {
            Some(VideoId::Bvid(self.bvid.clone()))
        } else if self.aid != 0 {
            Some(VideoId::Aid(self.aid))
        } else {
            None
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawOwner {
    #[serde(default, deserialize_with = "lenient_u64")]
    mid: u64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawStat {
    #[serde(default, deserialize_with = "lenient_u64")]
    view: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    danmaku: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    like: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    coin: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    favorite: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    share: u64,
}

#[derive(Debug, Default, Deserialize)]
struct RawCntInfo {
    #[serde(default, deserialize_with = "lenient_u64")]
    play: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    danmaku: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    collect: u64,
}

/// Every spelling of a video the endpoints use.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawVideo {
    bvid: Option<String>,
    bv_id: Option<String>,
    #[serde(deserialize_with = "lenient_u64")]
    aid: u64,
    #[serde(deserialize_with = "lenient_u64")]
    id: u64,
    title: String,
    pic: Option<String>,
    cover: Option<String>,
    author: Option<String>,
    #[serde(deserialize_with = "lenient_u64")]
    mid: u64,
    owner: Option<RawOwner>,
    upper: Option<RawOwner>,
    #[serde(deserialize_with = "lenient_u64")]
    play: u64,
    #[serde(deserialize_with = "lenient_u64")]
    video_review: u64,
    #[serde(deserialize_with = "lenient_u64")]
    danmaku: u64,
    #[serde(deserialize_with = "lenient_u64")]
    like: u64,
    #[serde(deserialize_with = "lenient_u64")]
    coin: u64,
    #[serde(deserialize_with = "lenient_u64")]
    favorite: u64,
    #[serde(deserialize_with = "lenient_u64")]
    favorites: u64,
    #[serde(deserialize_with = "lenient_u64")]
    share: u64,
    stat: Option<RawStat>,
    cnt_info: Option<RawCntInfo>,
    duration: Option<DurationValue>,
    length: Option<String>,
    #[serde(deserialize_with = "lenient_u64")]
    cid: u64,
    desc: Option<String>,
    description: Option<String>,
    intro: Option<String>,
    pubdate: Option<i64>,
    created: Option<i64>,
    #[serde(deserialize_with = "lenient_u64")]
    view_progress: u64,
}

fn first_nonzero(values: &[u64]) -> u64 {
    values.iter().copied().find(|v| *v != 0).unwrap_or_default()
}

impl From<RawVideo> for Video {
    fn from(raw: RawVideo) -> Self {
        let owner = raw.owner.or(raw.upper).unwrap_or_default();
        let stat = raw.stat.unwrap_or_default();
        let cnt = raw.cnt_info.unwrap_or_default();

        let author = raw.author.filter(|a| !a.is_empty()).unwrap_or(owner.name);
        let duration = raw
            .duration
            .map(DurationValue::into_display)
            .or(raw.length)
            .unwrap_or_default();

        Self {
            bvid: raw.bvid.or(raw.bv_id).unwrap_or_default(),
            aid: first_nonzero(&[raw.aid, raw.id]),
            title: raw.title,
            cover: raw.pic.or(raw.cover).unwrap_or_default(),
            author,
            author_mid: first_nonzero(&[raw.mid, owner.mid]),
            play_count: first_nonzero(&[raw.play, stat.view, cnt.play]),
            danmaku_count: first_nonzero(&[raw.danmaku, raw.video_review, stat.danmaku, cnt.danmaku]),
            like_count: first_nonzero(&[raw.like, stat.like]),
            coin_count: first_nonzero(&[raw.coin, stat.coin]),
            favorite_count: first_nonzero(&[raw.favorite, raw.favorites, stat.favorite, cnt.collect]),
            share_count: first_nonzero(&[raw.share, stat.share]),
            duration,
            cid: raw.cid,
            description: raw.desc.or(raw.description).or(raw.intro),
            publish_time: raw.pubdate.or(raw.created).unwrap_or_default(),
            view_progress: raw.view_progress,
        }
    }
}

/// Video lookup key; the two forms are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VideoId {
    Bvid(String),
    Aid(u64),
}

impl VideoId {
    /// Query parameter naming this id.
    pub fn query_pair(&self) -> (&'static str, String) {
        match self {
            Self::Bvid(bvid) => ("bvid", bvid.clone()),
            Self::Aid(aid) => ("aid", aid.to_string()),
        }
    }
}

impl FromStr for VideoId {
    type Err = Precondition;

    /// Accepts `BV1xx411c7mD`, `av170001` or a bare number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(rest) = s.get(..2).filter(|p| p.eq_ignore_ascii_case("bv")).map(|_| &s[2..]) {
            if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Ok(Self::Bvid(format!("BV{rest}")));
            }
        } else {
            let digits = s
                .strip_prefix("av")
                .or_else(|| s.strip_prefix("AV"))
                .unwrap_or(s);
            if let Ok(aid) = digits.parse::<u64>() {
                if aid > 0 {
                    return Ok(Self::Aid(aid));
                }
            }
        }
        Err(Precondition::InvalidVideoId(s.to_string()))
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bvid(bvid) => f.write_str(bvid),
            Self::Aid(aid) => write!(f, "av{aid}"),
        }
    }
}

impl From<u64> for VideoId {
    fn from(aid: u64) -> Self {
        Self::Aid(aid)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoTag {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub tag_id: u64,
    #[serde(default)]
    pub tag_name: String,
}

/// One part of a multi-part video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoPage {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub cid: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub page: u64,
    #[serde(default)]
    pub part: String,
    /// Seconds.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub duration: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub lan: String,
    #[serde(default)]
    pub lan_doc: String,
    #[serde(default)]
    pub subtitle_url: String,
}

/// Video plus tags, parts, subtitle tracks and related videos.
///
/// Only decodes from the `view/detail` payload; the serialized form is for output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawVideoDetail")]
pub struct VideoDetail {
    pub video: Video,
    pub tags: Vec<VideoTag>,
    pub pages: Vec<VideoPage>,
    pub subtitles: Vec<SubtitleTrack>,
    pub related: Vec<Video>,
}

impl VideoDetail {
    /// Content-stream id of part `page` (1-based), falling back to the main cid.
    pub fn cid_of_page(&self, page: u64) -> Option<u64> {
        self.pages
            .iter()
            .find(|p| p.page == page)
            .map(|p| p.cid)
            .or((page <= 1 && self.video.cid != 0).then_some(self.video.cid))
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawSubtitle {
    #[serde(default, deserialize_with = "null_default")]
    list: Vec<SubtitleTrack>,
}

#[derive(Debug, Default, Deserialize)]
struct RawView {
    #[serde(flatten)]
    video: Map<String, Value>,
    #[serde(default, deserialize_with = "null_default")]
    pages: Vec<VideoPage>,
    #[serde(default)]
    subtitle: Option<RawSubtitle>,
}

#[derive(Debug, Default, Deserialize)]
struct RawVideoDetail {
    #[serde(rename = "View", default)]
    view: RawView,
    #[serde(rename = "Tags", default, deserialize_with = "null_default")]
    tags: Vec<VideoTag>,
    #[serde(rename = "Related", default, deserialize_with = "null_default")]
    related: Vec<Video>,
}

impl TryFrom<RawVideoDetail> for VideoDetail {
    type Error = serde_json::Error;

    fn try_from(raw: RawVideoDetail) -> Result<Self, Self::Error> {
        // `flatten` cannot be combined with `from`, so the video is decoded
        // from the captured fields here.
        let video = serde_json::from_value::<Video>(Value::Object(raw.view.video))?;
        Ok(Self {
            video,
            tags: raw.tags,
            pages: raw.view.pages,
            subtitles: raw.view.subtitle.map(|s| s.list).unwrap_or_default(),
            related: raw.related,
        })
    }
}

/// A page of the recommendation feed. Round-trips through its serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFeedPage")]
pub struct FeedPage {
    pub videos: Vec<Video>,
    pub has_more: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFeedPage {
    #[serde(alias = "videos", deserialize_with = "null_default")]
    item: Vec<Video>,
    has_more: Option<bool>,
}

impl From<RawFeedPage> for FeedPage {
    fn from(raw: RawFeedPage) -> Self {
        // ad and live cards come without a video id
        let videos: Vec<Video> = raw.item.into_iter().filter(|v| v.id().is_some()).collect();
        let has_more = raw.has_more.unwrap_or(!videos.is_empty());
        Self { videos, has_more }
    }
}
