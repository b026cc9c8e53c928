//! Typed search and hot keywords.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::de::{lenient_u64, null_default};
use super::video::Video;

static HIGHLIGHT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Strip the `<em class="keyword">` highlight markup from a title.
pub fn strip_highlight(text: &str) -> String {
    HIGHLIGHT_REGEX
        .replace_all(text, "")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
}

/// `search_type` of the typed search endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    #[default]
    Video,
    MediaBangumi,
    MediaFt,
    LiveRoom,
    Article,
    BiliUser,
}

impl SearchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::MediaBangumi => "media_bangumi",
            Self::MediaFt => "media_ft",
            Self::LiveRoom => "live_room",
            Self::Article => "article",
            Self::BiliUser => "bili_user",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub kind: SearchKind,
    pub page: u32,
    pub page_size: u32,
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            kind: SearchKind::Video,
            page: 1,
            page_size: 20,
        }
    }

    pub fn kind(mut self, kind: SearchKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaResult {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub media_id: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub season_id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub areas: String,
    #[serde(default)]
    pub styles: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveRoomResult {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub roomid: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub uid: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub uname: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub online: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub live_status: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleResult {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub mid: u64,
    #[serde(default)]
    pub desc: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub view: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub like: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResult {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub mid: u64,
    #[serde(default)]
    pub uname: String,
    #[serde(default)]
    pub usign: String,
    #[serde(default)]
    pub upic: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub fans: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub videos: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub level: u64,
}

/// One search hit, tagged by its `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchResult {
    Video(Video),
    MediaBangumi(MediaResult),
    MediaFt(MediaResult),
    LiveRoom(LiveRoomResult),
    Article(ArticleResult),
    BiliUser(UserResult),
    #[serde(other)]
    Unknown,
}

impl SearchResult {
    pub fn title(&self) -> &str {
        match self {
            Self::Video(v) => &v.title,
            Self::MediaBangumi(m) | Self::MediaFt(m) => &m.title,
            Self::LiveRoom(r) => &r.title,
            Self::Article(a) => &a.title,
            Self::BiliUser(u) => &u.uname,
            Self::Unknown => "",
        }
    }

    fn strip_markup(mut self) -> Self {
        match &mut self {
            Self::Video(v) => v.title = strip_highlight(&v.title),
            Self::MediaBangumi(m) | Self::MediaFt(m) => m.title = strip_highlight(&m.title),
            Self::LiveRoom(r) => r.title = strip_highlight(&r.title),
            Self::Article(a) => a.title = strip_highlight(&a.title),
            Self::BiliUser(_) | Self::Unknown => {}
        }
        self
    }

    /// Decode one hit. `kind` fills in the tag for hits that lack one.
    fn from_value(mut value: Value, kind: SearchKind) -> Option<Self> {
        if let Value::Object(map) = &mut value {
            let tag = map
                .get("type")
                .and_then(Value::as_str)
                .map(normalize_type)
                .unwrap_or(kind.as_str())
                .to_string();
            map.insert("type".to_string(), Value::String(tag));
        }
        match serde_json::from_value::<Self>(value) {
            Ok(result) => Some(result.strip_markup()),
            Err(e) => {
                warn!(error = %e, kind = %kind, "Skipping undecodable search result");
                None
            }
        }
    }
}

/// The endpoint reports `live_room` hits as `live_room` or `live`.
fn normalize_type(tag: &str) -> &str {
    match tag {
        "live" => "live_room",
        other => other,
    }
}

/// A page of typed search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    pub page: u64,
    pub page_size: u64,
    pub total_results: u64,
    pub total_pages: u64,
    pub results: Vec<SearchResult>,
}

impl SearchPage {
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawSearchPage {
    #[serde(deserialize_with = "lenient_u64")]
    page: u64,
    #[serde(rename = "pagesize", deserialize_with = "lenient_u64")]
    page_size: u64,
    #[serde(rename = "numResults", deserialize_with = "lenient_u64")]
    total_results: u64,
    #[serde(rename = "numPages", deserialize_with = "lenient_u64")]
    total_pages: u64,
    #[serde(deserialize_with = "null_default")]
    result: Vec<Value>,
}

impl RawSearchPage {
    pub(crate) fn into_page(self, kind: SearchKind) -> SearchPage {
        SearchPage {
            page: self.page,
            page_size: self.page_size,
            total_results: self.total_results,
            total_pages: self.total_pages,
            results: self
                .result
                .into_iter()
                .filter_map(|v| SearchResult::from_value(v, kind))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotSearchKeyword {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub show_name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawTrendingList {
    #[serde(default, deserialize_with = "null_default")]
    list: Vec<HotSearchKeyword>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawHotSearch {
    #[serde(default)]
    trending: Option<RawTrendingList>,
}

impl RawHotSearch {
    pub(crate) fn into_keywords(self) -> Vec<HotSearchKeyword> {
        self.trending.map(|t| t.list).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(json: &str, kind: SearchKind) -> SearchPage {
        serde_json::from_str::<RawSearchPage>(json).unwrap().into_page(kind)
    }

    #[test]
    fn test_strip_highlight() {
        assert_eq!(
            strip_highlight(r#"<em class="keyword">Rust</em> 入门 &amp; 实战"#),
            "Rust 入门 & 实战"
        );
    }

    #[test]
    fn test_video_results() {
        let page = page(
            r#"{"page":1,"pagesize":20,"numResults":1000,"numPages":50,"result":[
                {"type":"video","bvid":"BV1","aid":1,"title":"<em class=\"keyword\">rust</em>","author":"a",
                 "play":"--","duration":"3:25","pic":"//i0"},
                {"type":"ketang","title":"course"},
                {"type":"video","bvid":"BV2","title":"plain","play":12}
            ]}"#,
            SearchKind::Video,
        );
        assert_eq!(page.total_pages, 50);
        assert!(page.has_more());
        assert_eq!(page.results.len(), 3);
        match &page.results[0] {
            SearchResult::Video(v) => {
                assert_eq!(v.title, "rust");
                assert_eq!(v.play_count, 0);
                assert_eq!(v.duration, "3:25");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(page.results[1], SearchResult::Unknown);
        assert_eq!(page.results[2].title(), "plain");
    }

    #[test]
    fn test_untagged_results_use_query_kind() {
        let page = page(
            r#"{"page":1,"numPages":1,"result":[{"roomid":5,"uname":"u","title":"live","online":"99"}]}"#,
            SearchKind::LiveRoom,
        );
        assert!(!page.has_more());
        match &page.results[0] {
            SearchResult::LiveRoom(room) => {
                assert_eq!(room.roomid, 5);
                assert_eq!(room.online, 99);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_bad_item_is_skipped() {
        let page = page(
            r#"{"result":[{"type":"video","title":"ok"},{"type":"article","title":{"nested":true}}]}"#,
            SearchKind::Video,
        );
        assert_eq!(page.results.len(), 1);
    }

    #[test]
    fn test_query_defaults() {
        let query = SearchQuery::new("rust");
        assert_eq!(query.kind, SearchKind::Video);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 20);
        assert_eq!(query.page(0).page, 1);
        assert_eq!(SearchKind::BiliUser.to_string(), "bili_user");
    }

    #[test]
    fn test_hot_search() {
        let raw: RawHotSearch = serde_json::from_str(
            r#"{"trending":{"title":"bilibili热搜","list":[
                {"keyword":"k1","show_name":"K1","icon":"","uri":""},{"keyword":"k2","show_name":"K2"}]}}"#,
        )
        .unwrap();
        let keywords = raw.into_keywords();
        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords[1].show_name, "K2");
        assert!(RawHotSearch::default().into_keywords().is_empty());
    }
}
