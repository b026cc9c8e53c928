//! The remote catalog client.
//!
//! Every operation is one request (plus, for WBI-signed endpoints, the key
//! fetch) decoded into a typed result. Nothing is retried and nothing is cached
//! apart from the signing keys.

use std::sync::Arc;

use danmaku::{DanmakuItem, parse_danmaku_xml};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::envelope::{self, parse_envelope};
use crate::error::{CatalogError, Precondition, Result};
use crate::format::VideoQuality;
use crate::models::live::{LIVE_QN_ORIGINAL, RoomPlayInfo};
use crate::models::message::AtCursor;
use crate::models::search::{RawHotSearch, RawSearchPage};
use crate::models::{
    AtMessagePage, CommentPage, CommentSort, FavoriteFolders, FavoritePage, FeedPage, HistoryCursor,
    HistoryPage, HotSearchKeyword, LivePlayback, LiveRoomPage, NavInfo, Playback,
    PostDanmakuResult, RankingPage, RegionPage, RelationPage, SearchPage, SearchQuery,
    SendDanmakuRequest, UnreadCount, UploadOrder, UploadsPage, Video, VideoDetail, VideoId,
};
use crate::session::{NoSession, SessionStore};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
use crate::wbi::{WbiCache, WbiImg, WbiKeys, sign_query};

const FEED: &str = "x/web-interface/index/top/rcmd";
const VIDEO_DETAIL: &str = "x/web-interface/view/detail";
const RELATED: &str = "x/web-interface/archive/related";
const PLAYURL: &str = "x/player/playurl";
const SEARCH: &str = "x/web-interface/search/type";
const HOT_SEARCH: &str = "x/web-interface/search/square";
const DANMAKU_LIST: &str = "x/v1/dm/list.so";
const DANMAKU_POST: &str = "x/v2/dm/post";
const NAV: &str = "x/web-interface/nav";
const UPLOADS: &str = "x/space/wbi/arc/search";
const FAVORITE_FOLDERS: &str = "x/v3/fav/folder/created/list-all";
const FAVORITE_RESOURCES: &str = "x/v3/fav/resource/list";
const HISTORY: &str = "x/web-interface/history/cursor";
const COMMENTS: &str = "x/v2/reply";
const FOLLOWERS: &str = "x/relation/followers";
const FOLLOWINGS: &str = "x/relation/followings";
const RANKING: &str = "x/web-interface/ranking/v2";
const REGION: &str = "x/web-interface/dynamic/region";
const UNREAD: &str = "x/msgfeed/unread";
const AT_MESSAGES: &str = "x/msgfeed/at";
const LIVE_FEED: &str = "xlive/app-interface/v2/index/feed";
const LIVE_PLAY_INFO: &str = "xlive/web-room/v2/index/getRoomPlayInfo";

/// Codes with which the service rejects a WBI signature.
const WBI_REJECTED: [i64; 2] = [-352, -403];

/// Comment thread type of videos.
const REPLY_TYPE_VIDEO: u8 = 1;

/// Page number (1-based) and page size of a paged listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub pn: u32,
    pub ps: u32,
}

impl Page {
    pub fn new(pn: u32, ps: u32) -> Self {
        Self {
            pn: pn.max(1),
            ps: ps.max(1),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { pn: 1, ps: 20 }
    }
}

/// Builder for [`CatalogClient`].
#[derive(Default)]
pub struct CatalogClientBuilder {
    config: ClientConfig,
    session: Option<Arc<dyn SessionStore>>,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl CatalogClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn session(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    /// Use a custom transport instead of the reqwest one built from the config.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<CatalogClient> {
        self.config.validate()?;
        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.config)?),
        };
        Ok(CatalogClient {
            transport,
            session: self.session.unwrap_or_else(|| Arc::new(NoSession)),
            api_base: self.config.api_base_url()?,
            live_base: self.config.live_base_url()?,
            wbi: WbiCache::default(),
        })
    }
}

/// Typed access to the platform's web API.
///
/// Methods take `&self`; share the client behind an [`Arc`] to call it from
/// several tasks. Concurrent identical calls are not merged.
pub struct CatalogClient {
    transport: Arc<dyn HttpTransport>,
    session: Arc<dyn SessionStore>,
    api_base: Url,
    live_base: Url,
    wbi: WbiCache,
}

impl CatalogClient {
    pub fn builder() -> CatalogClientBuilder {
        CatalogClientBuilder::default()
    }

    /// Client with the default configuration and no session.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    fn api_url(&self, path: &str) -> Result<Url> {
        Ok(self.api_base.join(path)?)
    }

    fn live_url(&self, path: &str) -> Result<Url> {
        Ok(self.live_base.join(path)?)
    }

    /// Attach the session cookie and perform one round trip.
    async fn send(&self, endpoint: &str, request: ApiRequest) -> Result<ApiResponse> {
        debug!(endpoint, method = %request.method, "Sending request");
        let request = request.with_cookie(self.session.cookie_header());
        let response = self.transport.execute(request).await?;
        debug!(
            endpoint,
            status = response.status,
            bytes = response.body.len(),
            "Received response"
        );
        Ok(response)
    }

    async fn call<T>(&self, endpoint: &str, request: ApiRequest) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let response = self.send(endpoint, request).await?;
        envelope::decode(endpoint, &response)
    }

    /// Recommended videos for the home feed.
    pub async fn fetch_feed(&self, page_size: u32) -> Result<FeedPage> {
        let request = ApiRequest::get(self.api_url(FEED)?)
            .with_query("ps", page_size.max(1))
            .with_query("fresh_idx", 1)
            .with_query("fresh_type", 3);
        self.call(FEED, request).await
    }

    /// Video with tags, parts, subtitle tracks and related videos.
    pub async fn fetch_video_detail(&self, id: &VideoId) -> Result<VideoDetail> {
        let (key, value) = id.query_pair();
        let request = ApiRequest::get(self.api_url(VIDEO_DETAIL)?).with_query(key, value);
        self.call(VIDEO_DETAIL, request).await
    }

    pub async fn fetch_related(&self, id: &VideoId) -> Result<Vec<Video>> {
        let (key, value) = id.query_pair();
        let request = ApiRequest::get(self.api_url(RELATED)?).with_query(key, value);
        self.call(RELATED, request).await
    }

    /// Resolve playable segments of one part.
    ///
    /// Without a `quality` the highest level is requested; the service answers
    /// with the best one the session may play.
    pub async fn resolve_playback(
        &self,
        id: &VideoId,
        cid: u64,
        quality: Option<VideoQuality>,
    ) -> Result<Playback> {
        if cid == 0 {
            return Err(Precondition::MissingContentId.into());
        }
        let quality = quality.unwrap_or(VideoQuality::HIGHEST);
        let request = match id {
            VideoId::Bvid(bvid) => ApiRequest::get(self.api_url(PLAYURL)?).with_query("bvid", bvid),
            VideoId::Aid(aid) => ApiRequest::get(self.api_url(PLAYURL)?).with_query("avid", aid),
        }
        .with_query("cid", cid)
        .with_query("qn", quality.qn())
        .with_query("fnval", 0)
        .with_query("fnver", 0)
        .with_query("fourk", u8::from(quality.needs_fourk()));
        self.call(PLAYURL, request).await
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
        let keyword = query.keyword.trim();
        if keyword.is_empty() {
            return Err(Precondition::EmptyKeyword.into());
        }
        let request = ApiRequest::get(self.api_url(SEARCH)?)
            .with_query("keyword", keyword)
            .with_query("search_type", query.kind.as_str())
            .with_query("page", query.page.max(1))
            .with_query("pagesize", query.page_size.max(1));
        let raw: RawSearchPage = self.call(SEARCH, request).await?;
        Ok(raw.into_page(query.kind))
    }

    pub async fn fetch_hot_search(&self, limit: u32) -> Result<Vec<HotSearchKeyword>> {
        let request = ApiRequest::get(self.api_url(HOT_SEARCH)?).with_query("limit", limit.max(1));
        let raw: RawHotSearch = self.call(HOT_SEARCH, request).await?;
        Ok(raw.into_keywords())
    }

    /// Danmaku of a content stream, from the XML list.
    ///
    /// Failures come back as a JSON envelope instead of XML.
    pub async fn fetch_danmaku(&self, cid: u64) -> Result<Vec<DanmakuItem>> {
        if cid == 0 {
            return Err(Precondition::MissingContentId.into());
        }
        let request = ApiRequest::get(self.api_url(DANMAKU_LIST)?).with_query("oid", cid);
        let response = self.send(DANMAKU_LIST, request).await?;

        if response.body.trim_ascii_start().starts_with(b"{") {
            envelope::decode::<Value>(DANMAKU_LIST, &response)?;
            return Err(CatalogError::decode(DANMAKU_LIST, "expected an XML document"));
        }
        if !response.is_success() {
            return Err(CatalogError::HttpStatus {
                status: response.status,
                endpoint: DANMAKU_LIST.to_string(),
            });
        }

        let body = std::str::from_utf8(&response.body)
            .map_err(|e| CatalogError::decode(DANMAKU_LIST, e))?;
        let items = parse_danmaku_xml(body).map_err(|e| CatalogError::decode(DANMAKU_LIST, e))?;
        debug!(cid, count = items.len(), "Fetched danmaku");
        Ok(items)
    }

    /// Post a danmaku. This is the only write, and is never repeated.
    ///
    /// Fails without sending anything when the message is empty, the cid is
    /// missing, or no anti-forgery token is available.
    pub async fn post_danmaku(&self, request: &SendDanmakuRequest) -> Result<PostDanmakuResult> {
        if request.message.trim().is_empty() {
            return Err(Precondition::EmptyMessage.into());
        }
        if request.oid == 0 {
            return Err(Precondition::MissingContentId.into());
        }
        let csrf = request
            .csrf
            .clone()
            .filter(|token| !token.is_empty())
            .or_else(|| self.session.csrf_token())
            .filter(|token| !token.is_empty())
            .ok_or(Precondition::MissingCsrfToken)?;

        let form = ApiRequest::post_form(self.api_url(DANMAKU_POST)?, request.form(&csrf));
        self.call(DANMAKU_POST, form).await
    }

    /// Profile of the session's user.
    pub async fn fetch_user_profile(&self) -> Result<NavInfo> {
        self.call(NAV, ApiRequest::get(self.api_url(NAV)?)).await
    }

    async fn wbi_keys(&self) -> Result<WbiKeys> {
        self.wbi
            .get_or_fetch(|| async {
                let response = self.send(NAV, ApiRequest::get(self.api_url(NAV)?)).await?;
                // wbi_img is sent with -101 (not logged in) as well, so the code is ignored
                let envelope = parse_envelope(NAV, &response)?;
                let img = envelope
                    .data
                    .and_then(|mut data| data.get_mut("wbi_img").map(Value::take))
                    .and_then(|img| serde_json::from_value::<WbiImg>(img).ok())
                    .unwrap_or_default();
                WbiKeys::from_img(&img).ok_or_else(|| CatalogError::decode(NAV, "missing wbi_img keys"))
            })
            .await
    }

    /// A user's uploads. Signed with WBI; the keys are fetched on first use.
    pub async fn fetch_user_uploads(
        &self,
        mid: u64,
        page: Page,
        order: UploadOrder,
    ) -> Result<UploadsPage> {
        let keys = self.wbi_keys().await?;
        let params = vec![
            ("mid", mid.to_string()),
            ("pn", page.pn.to_string()),
            ("ps", page.ps.to_string()),
            ("order", order.as_str().to_string()),
            ("tid", "0".to_string()),
            ("keyword", String::new()),
        ];
        let mut url = self.api_url(UPLOADS)?;
        url.set_query(Some(&sign_query(params, &keys)?));

        let result = self.call(UPLOADS, ApiRequest::get(url)).await;
        if let Err(CatalogError::Remote { code, .. }) = &result
            && WBI_REJECTED.contains(code)
        {
            warn!(code, "Signature rejected, dropping cached WBI keys");
            self.wbi.invalidate().await;
        }
        result
    }

    pub async fn fetch_favorite_folders(&self, up_mid: u64) -> Result<FavoriteFolders> {
        let request = ApiRequest::get(self.api_url(FAVORITE_FOLDERS)?).with_query("up_mid", up_mid);
        self.call(FAVORITE_FOLDERS, request).await
    }

    pub async fn fetch_favorites(&self, media_id: u64, page: Page) -> Result<FavoritePage> {
        let request = ApiRequest::get(self.api_url(FAVORITE_RESOURCES)?)
            .with_query("media_id", media_id)
            .with_query("pn", page.pn)
            .with_query("ps", page.ps)
            .with_query("platform", "web");
        self.call(FAVORITE_RESOURCES, request).await
    }

    /// Watch history from `cursor`; pass the returned cursor to continue.
    pub async fn fetch_history(&self, cursor: &HistoryCursor, page_size: u32) -> Result<HistoryPage> {
        let mut request = ApiRequest::get(self.api_url(HISTORY)?)
            .with_query("ps", page_size.max(1))
            .with_query("max", cursor.max)
            .with_query("view_at", cursor.view_at);
        if !cursor.business.is_empty() {
            request = request.with_query("business", &cursor.business);
        }
        self.call(HISTORY, request).await
    }

    /// Comments of a video, by `aid`.
    pub async fn fetch_comments(&self, aid: u64, sort: CommentSort, page: Page) -> Result<CommentPage> {
        let request = ApiRequest::get(self.api_url(COMMENTS)?)
            .with_query("type", REPLY_TYPE_VIDEO)
            .with_query("oid", aid)
            .with_query("sort", sort.as_param())
            .with_query("pn", page.pn)
            .with_query("ps", page.ps);
        self.call(COMMENTS, request).await
    }

    pub async fn fetch_followers(&self, mid: u64, page: Page) -> Result<RelationPage> {
        self.fetch_relation(FOLLOWERS, mid, page).await
    }

    pub async fn fetch_following(&self, mid: u64, page: Page) -> Result<RelationPage> {
        self.fetch_relation(FOLLOWINGS, mid, page).await
    }

    async fn fetch_relation(&self, endpoint: &str, mid: u64, page: Page) -> Result<RelationPage> {
        let request = ApiRequest::get(self.api_url(endpoint)?)
            .with_query("vmid", mid)
            .with_query("pn", page.pn)
            .with_query("ps", page.ps);
        self.call(endpoint, request).await
    }

    /// Ranking board of a region ([`ALL_REGIONS`](crate::models::ranking::ALL_REGIONS) for the whole site).
    pub async fn fetch_ranking(&self, rid: u32) -> Result<RankingPage> {
        let request = ApiRequest::get(self.api_url(RANKING)?)
            .with_query("rid", rid)
            .with_query("type", "all");
        self.call(RANKING, request).await
    }

    pub async fn fetch_region_videos(&self, rid: u32, page: Page) -> Result<RegionPage> {
        let request = ApiRequest::get(self.api_url(REGION)?)
            .with_query("rid", rid)
            .with_query("pn", page.pn)
            .with_query("ps", page.ps);
        self.call(REGION, request).await
    }

    pub async fn fetch_unread(&self) -> Result<UnreadCount> {
        self.call(UNREAD, ApiRequest::get(self.api_url(UNREAD)?)).await
    }

    /// @-mentions, newest first. Pass the previous page's cursor to continue.
    pub async fn fetch_at_messages(&self, cursor: Option<&AtCursor>) -> Result<AtMessagePage> {
        let mut request = ApiRequest::get(self.api_url(AT_MESSAGES)?);
        if let Some(cursor) = cursor.filter(|c| c.id != 0) {
            request = request
                .with_query("id", cursor.id)
                .with_query("at_time", cursor.time);
        }
        self.call(AT_MESSAGES, request).await
    }

    pub async fn fetch_live_rooms(&self, page: Page) -> Result<LiveRoomPage> {
        let request = ApiRequest::get(self.live_url(LIVE_FEED)?)
            .with_query("page", page.pn)
            .with_query("pagesize", page.ps);
        self.call(LIVE_FEED, request).await
    }

    /// Stream URLs of a live room, best first. `qn` defaults to the original quality.
    pub async fn resolve_live_playback(&self, room_id: u64, qn: Option<u32>) -> Result<LivePlayback> {
        let request = ApiRequest::get(self.live_url(LIVE_PLAY_INFO)?)
            .with_query("room_id", room_id)
            .with_query("qn", qn.unwrap_or(LIVE_QN_ORIGINAL))
            .with_query("platform", "html5")
            .with_query("protocol", "0,1")
            .with_query("format", "0,1,2")
            .with_query("codec", "0,1")
            .with_query("dolby", 5);
        let info: RoomPlayInfo = self.call(LIVE_PLAY_INFO, request).await?;
        Ok(info.into_playback())
    }
}
