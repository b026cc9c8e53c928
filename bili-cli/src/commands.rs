use std::sync::Arc;

use anyhow::{Context, Result, bail};
use bili_catalog::{
    AtCursor, CatalogClient, HistoryCursor, NoSession, Page, SearchQuery, SendDanmakuRequest,
    SessionStore, StaticSession, VideoId, VideoQuality,
};
use danmaku::{DanmakuFilter, DanmakuSettings, SettingsHandle, TomlSettingsStore};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::{KeywordAction, PageArgs, PartArgs, SettingsAction};
use crate::config::AppConfig;
use crate::output::OutputManager;

impl From<PageArgs> for Page {
    fn from(args: PageArgs) -> Self {
        Page::new(args.page, args.size)
    }
}

/// A resolved video part.
struct PartTarget {
    aid: u64,
    bvid: String,
    cid: u64,
}

#[derive(Serialize)]
struct DanmakuOutput<'a> {
    cid: u64,
    shown: Vec<danmaku::StyledDanmaku<'a>>,
    report: danmaku::FilterReport,
}

pub struct CommandExecutor {
    client: CatalogClient,
    settings: SettingsHandle,
    output: OutputManager,
}

impl CommandExecutor {
    pub fn new(
        config: AppConfig,
        settings_path: std::path::PathBuf,
        output: OutputManager,
    ) -> Result<Self> {
        let session: Arc<dyn SessionStore> = match config.cookies.as_deref() {
            Some(cookies) if !cookies.trim().is_empty() => {
                Arc::new(StaticSession::from_cookie_string(cookies))
            }
            _ => Arc::new(NoSession),
        };
        debug!(logged_in = session.is_logged_in(), "Session prepared");

        let client = CatalogClient::builder()
            .config(config.client)
            .session(session)
            .build()
            .context("failed to build the API client")?;
        let settings = SettingsHandle::load(Arc::new(TomlSettingsStore::new(&settings_path)))
            .with_context(|| format!("failed to load {}", settings_path.display()))?;

        Ok(Self {
            client,
            settings,
            output,
        })
    }

    async fn resolve_part(&self, target: &PartArgs) -> Result<PartTarget> {
        let (aid, bvid) = match &target.id {
            VideoId::Aid(aid) => (*aid, String::new()),
            VideoId::Bvid(bvid) => (0, bvid.clone()),
        };
        if let Some(cid) = target.cid.filter(|cid| *cid != 0) {
            return Ok(PartTarget { aid, bvid, cid });
        }

        let detail = self.client.fetch_video_detail(&target.id).await?;
        let cid = detail
            .cid_of_page(target.part)
            .with_context(|| format!("{} has no part {}", target.id, target.part))?;
        debug!(id = %target.id, part = target.part, cid, "Resolved video part");
        Ok(PartTarget {
            aid: detail.video.aid,
            bvid: detail.video.bvid,
            cid,
        })
    }

    pub async fn feed(&self, size: u32) -> Result<()> {
        let page = self.client.fetch_feed(size).await?;
        self.output.emit(&page, |o| o.videos("Recommended", &page.videos))
    }

    pub async fn video(&self, id: &VideoId) -> Result<()> {
        let detail = self.client.fetch_video_detail(id).await?;
        self.output.emit(&detail, |o| o.video_detail(&detail))
    }

    pub async fn related(&self, id: &VideoId) -> Result<()> {
        let videos = self.client.fetch_related(id).await?;
        self.output.emit(&videos, |o| o.videos("Related", &videos))
    }

    pub async fn play(&self, target: &PartArgs, quality: Option<u32>) -> Result<()> {
        let part = self.resolve_part(target).await?;
        let playback = self
            .client
            .resolve_playback(&target.id, part.cid, quality.map(VideoQuality::from))
            .await?;
        self.output.emit(&playback, |o| o.playback(&playback))
    }

    pub async fn search(&self, query: SearchQuery) -> Result<()> {
        let page = self.client.search(&query).await?;
        self.output.emit(&page, |o| o.search_page(&page))
    }

    pub async fn hot(&self, limit: u32) -> Result<()> {
        let keywords = self.client.fetch_hot_search(limit).await?;
        self.output.emit(&keywords, |o| o.hot_keywords(&keywords))
    }

    pub async fn danmaku(&self, target: &PartArgs, all: bool, report_only: bool) -> Result<()> {
        let part = self.resolve_part(target).await?;
        let items = self.client.fetch_danmaku(part.cid).await?;

        let settings = if all {
            Arc::new(DanmakuSettings::default())
        } else {
            self.settings.snapshot()
        };
        let (shown, report) = DanmakuFilter::new(&settings).apply_with_report(&items);
        info!(
            cid = part.cid,
            total = report.total,
            shown = report.shown,
            "Filtered danmaku"
        );

        if report_only {
            return self.output.emit(&report, |o| o.report(&report));
        }
        let out = DanmakuOutput {
            cid: part.cid,
            shown,
            report,
        };
        self.output.emit(&out, |o| o.danmaku(&out.shown, &out.report))
    }

    pub async fn send(&self, target: &PartArgs, request: SendDanmakuRequest) -> Result<()> {
        let part = self.resolve_part(target).await?;
        let mut request = request.video(part.aid, part.bvid);
        request.oid = part.cid;
        let result = self.client.post_danmaku(&request).await?;
        info!(cid = part.cid, id = %result.id(), "Danmaku posted");
        self.output.emit(&result, |o| o.post_result(&result))
    }

    pub async fn me(&self) -> Result<()> {
        let nav = self.client.fetch_user_profile().await?;
        self.output.emit(&nav, |o| o.profile(&nav))
    }

    pub async fn uploads(&self, mid: u64, order: bili_catalog::UploadOrder, page: Page) -> Result<()> {
        let uploads = self.client.fetch_user_uploads(mid, page, order).await?;
        self.output
            .emit(&uploads, |o| o.videos(&format!("Uploads of {mid}"), &uploads.videos))
    }

    /// Folders of `mid` (the session's own user when absent), or one folder's content.
    pub async fn favorites(&self, mid: Option<u64>, folder: Option<u64>, page: Page) -> Result<()> {
        if let Some(media_id) = folder {
            let favorites = self.client.fetch_favorites(media_id, page).await?;
            return self.output.emit(&favorites, |o| o.favorite_page(&favorites));
        }

        let mid = match mid {
            Some(mid) => mid,
            None => {
                let nav = self.client.fetch_user_profile().await?;
                if !nav.is_login {
                    bail!("not logged in: pass a user id or configure session cookies");
                }
                nav.mid
            }
        };
        let folders = self.client.fetch_favorite_folders(mid).await?;
        self.output.emit(&folders, |o| o.folders(&folders))
    }

    pub async fn history(&self, cursor: HistoryCursor, size: u32) -> Result<()> {
        let page = self.client.fetch_history(&cursor, size).await?;
        self.output.emit(&page, |o| o.history(&page))
    }

    pub async fn comments(
        &self,
        id: &VideoId,
        sort: bili_catalog::CommentSort,
        page: Page,
    ) -> Result<()> {
        let aid = match id {
            VideoId::Aid(aid) => *aid,
            VideoId::Bvid(_) => self.client.fetch_video_detail(id).await?.video.aid,
        };
        let comments = self.client.fetch_comments(aid, sort, page).await?;
        self.output.emit(&comments, |o| o.comments(&comments))
    }

    pub async fn followers(&self, mid: u64, page: Page) -> Result<()> {
        let relations = self.client.fetch_followers(mid, page).await?;
        self.output.emit(&relations, |o| o.relations("Followers", &relations))
    }

    pub async fn following(&self, mid: u64, page: Page) -> Result<()> {
        let relations = self.client.fetch_following(mid, page).await?;
        self.output.emit(&relations, |o| o.relations("Following", &relations))
    }

    pub async fn ranking(&self, rid: u32) -> Result<()> {
        let ranking = self.client.fetch_ranking(rid).await?;
        self.output.emit(&ranking, |o| o.videos("Ranking", &ranking.videos))
    }

    pub async fn region(&self, rid: u32, page: Page) -> Result<()> {
        let region = self.client.fetch_region_videos(rid, page).await?;
        self.output
            .emit(&region, |o| o.videos(&format!("Region {rid}"), &region.videos))
    }

    pub async fn unread(&self) -> Result<()> {
        let unread = self.client.fetch_unread().await?;
        self.output.emit(&unread, |o| o.unread(&unread))
    }

    pub async fn at(&self, id: Option<u64>, time: Option<i64>) -> Result<()> {
        let cursor = id.map(|id| AtCursor {
            id,
            time: time.unwrap_or_default(),
            is_end: false,
        });
        let page = self.client.fetch_at_messages(cursor.as_ref()).await?;
        self.output.emit(&page, |o| o.at_messages(&page))
    }

    pub async fn live(&self, page: Page) -> Result<()> {
        let rooms = self.client.fetch_live_rooms(page).await?;
        self.output.emit(&rooms, |o| o.live_rooms(&rooms))
    }

    pub async fn live_play(&self, room_id: u64, qn: Option<u32>) -> Result<()> {
        let playback = self.client.resolve_live_playback(room_id, qn).await?;
        self.output.emit(&playback, |o| o.live_playback(&playback))
    }

    pub fn settings(&self, action: SettingsAction) -> Result<()> {
        let settings = match action {
            SettingsAction::Show => self.settings.snapshot(),
            SettingsAction::Set { key, value } => {
                self.settings.replace(apply_setting(&self.settings.snapshot(), &key, &value)?)?
            }
            SettingsAction::Reset => self.settings.reset()?,
            SettingsAction::Keyword { action } => match action {
                KeywordAction::Add { keyword } => {
                    let mut added = false;
                    let settings = self.settings.update(|s| added = s.add_keyword(&keyword))?;
                    if !added {
                        bail!("keyword {keyword:?} is blank or already blocked");
                    }
                    settings
                }
                KeywordAction::Remove { keyword } => {
                    let mut removed = false;
                    let settings = self.settings.update(|s| removed = s.remove_keyword(&keyword))?;
                    if !removed {
                        bail!("keyword {keyword:?} is not blocked");
                    }
                    settings
                }
                KeywordAction::List => {
                    let settings = self.settings.snapshot();
                    return self
                        .output
                        .emit(&settings.block_keywords, |_| keyword_lines(&settings.block_keywords));
                }
            },
        };
        self.output.emit(&*settings, |o| o.settings(&settings))
    }
}

fn keyword_lines(keywords: &[String]) -> String {
    keywords.iter().map(|k| format!("{k}\n")).collect()
}

/// Copy of `settings` with one field replaced.
///
/// The value is read as JSON (`true`, `0.5`, `["a"]`) and otherwise taken as a
/// string, then checked against the field's type.
pub fn apply_setting(settings: &DanmakuSettings, key: &str, value: &str) -> Result<DanmakuSettings> {
    let mut fields = serde_json::to_value(settings)?;
    let Some(map) = fields.as_object_mut() else {
        bail!("settings did not serialize to an object");
    };
    let Some(slot) = map.get_mut(key) else {
        let known: Vec<&str> = map.keys().map(String::as_str).collect();
        bail!("unknown setting {key:?}, expected one of: {}", known.join(", "));
    };
    *slot = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));

    serde_json::from_value(fields).with_context(|| format!("invalid value {value:?} for {key}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use danmaku::BlockLevel;

    #[test]
    fn test_apply_bool() {
        let updated = apply_setting(&DanmakuSettings::default(), "block_visitor", "true").unwrap();
        assert!(updated.block_visitor);
    }

    #[test]
    fn test_apply_number() {
        let updated = apply_setting(&DanmakuSettings::default(), "opacity", "0.5").unwrap();
        assert_eq!(updated.opacity, 0.5);

        let updated = apply_setting(&DanmakuSettings::default(), "block_level", "2").unwrap();
        assert_eq!(updated.block_level, BlockLevel::Medium);
    }

    #[test]
    fn test_apply_list() {
        let updated =
            apply_setting(&DanmakuSettings::default(), "block_keywords", r#"["剧透","spoiler"]"#)
                .unwrap();
        assert_eq!(updated.block_keywords, vec!["剧透", "spoiler"]);
    }

    #[test]
    fn test_unknown_key() {
        let err = apply_setting(&DanmakuSettings::default(), "volume", "1").unwrap_err();
        assert!(err.to_string().contains("unknown setting"));
    }

    #[test]
    fn test_type_mismatch() {
        assert!(apply_setting(&DanmakuSettings::default(), "show_top", "maybe").is_err());
    }

    #[test]
    fn test_keyword_lines() {
        assert_eq!(keyword_lines(&["a".into(), "b".into()]), "a\nb\n");
        assert_eq!(keyword_lines(&[]), "");
    }
}
