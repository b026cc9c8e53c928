//! Typed payloads of the catalog endpoints.

pub mod comment;
pub mod danmaku;
pub(crate) mod de;
pub mod favorite;
pub mod history;
pub mod live;
pub mod message;
pub mod playback;
pub mod ranking;
pub mod relation;
pub mod search;
pub mod user;
pub mod video;

pub use comment::{Comment, CommentAttr, CommentMember, CommentPage, CommentSort};
pub use self::danmaku::{PostDanmakuResult, SendDanmakuRequest};
pub use favorite::{FavoriteFolder, FavoriteFolders, FavoritePage};
pub use history::{HistoryCursor, HistoryItem, HistoryPage};
pub use live::{LivePlayback, LiveQuality, LiveRoom, LiveRoomPage, LiveStream};
pub use message::{AtCursor, AtMessage, AtMessagePage, UnreadCount};
pub use playback::{PlaySegment, Playback, QualityOption};
pub use ranking::{RankingPage, RegionPage};
pub use relation::{RelationPage, RelationUser};
pub use search::{HotSearchKeyword, SearchKind, SearchPage, SearchQuery, SearchResult};
pub use user::{NavInfo, PageInfo, UploadOrder, UploadsPage};
pub use video::{FeedPage, Video, VideoDetail, VideoId, SubtitleTrack, VideoPage, VideoTag};
