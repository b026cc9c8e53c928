//! Typed client for the bilibili web API.
//!
//! [`CatalogClient`] covers the read endpoints a browsing client needs (feeds,
//! video details, playback, search, users, favorites, history, comments,
//! rankings, messages and live rooms) plus the single write: posting a danmaku.
//!
//! Requests go through an [`HttpTransport`]; credentials come from a
//! [`SessionStore`]. Both are traits so they can be swapped in tests.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod format;
pub mod models;
pub mod session;
pub mod transport;
pub mod wbi;

pub use client::{CatalogClient, CatalogClientBuilder, Page};
pub use config::ClientConfig;
pub use envelope::ApiEnvelope;
pub use error::{CatalogError, Precondition, Result, TransportError};
pub use format::{VideoQuality, format_count, format_duration, parse_duration};
pub use models::{
    AtCursor, AtMessage, AtMessagePage, Comment, CommentAttr, CommentMember, CommentPage,
    CommentSort, FavoriteFolder, FavoriteFolders, FavoritePage, FeedPage, HistoryCursor,
    HistoryItem, HistoryPage, HotSearchKeyword, LivePlayback, LiveQuality, LiveRoom,
    LiveRoomPage, LiveStream, NavInfo, PageInfo, PlaySegment, Playback, PostDanmakuResult,
    QualityOption, RankingPage, RegionPage, RelationPage, RelationUser, SearchKind, SearchPage,
    SearchQuery, SearchResult, SendDanmakuRequest, SubtitleTrack, UnreadCount, UploadOrder,
    UploadsPage, Video, VideoDetail, VideoId, VideoPage, VideoTag,
};
pub use session::{NoSession, SessionStore, StaticSession};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
