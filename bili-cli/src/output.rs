use std::io::Write;

use anyhow::Result;
use bili_catalog::{
    AtMessagePage, CommentPage, FavoriteFolders, FavoritePage, HistoryPage, HotSearchKeyword,
    LivePlayback, LiveRoomPage, NavInfo, Playback, PostDanmakuResult, RelationPage, SearchPage,
    SearchResult, UnreadCount, Video, VideoDetail, format_count, format_duration,
};
use chrono::{DateTime, Local};
#[cfg(feature = "colored-output")]
use colored::*;
use danmaku::{DanmakuSettings, FilterReport, StyledDanmaku};
use serde::Serialize;

use crate::cli::OutputFormat;

pub struct OutputManager {
    format: OutputFormat,
    colored: bool,
}

impl OutputManager {
    pub fn new(format: OutputFormat, colored: bool) -> Self {
        Self { format, colored }
    }

    /// Print `value` as JSON, or the pretty rendering produced by `pretty`.
    pub fn emit<T, F>(&self, value: &T, pretty: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&Self) -> String,
    {
        let content = match self.format {
            OutputFormat::Pretty => pretty(self),
            OutputFormat::Json => serde_json::to_string_pretty(value)? + "\n",
            OutputFormat::JsonCompact => serde_json::to_string(value)? + "\n",
        };
        write_output(&content)
    }

    pub fn videos(&self, heading: &str, videos: &[Video]) -> String {
        let mut output = self.heading(heading);
        if videos.is_empty() {
            output.push_str("  (none)\n");
        }
        for (i, video) in videos.iter().enumerate() {
            output.push_str(&format!(
                "{:>3}. {}\n",
                i + 1,
                self.colorize(&video.title, &Color::Cyan, true)
            ));
            output.push_str(&format!(
                "     {}  {}  ▶ {}  弹 {}  {}\n",
                self.colorize(video_ref(video).as_str(), &Color::Blue, false),
                video.author,
                video.formatted_play_count(),
                video.formatted_danmaku_count(),
                video.duration
            ));
        }
        output
    }

    pub fn video_detail(&self, detail: &VideoDetail) -> String {
        let video = &detail.video;
        let mut output = self.heading(&video.title);
        output.push_str(&self.field("Id", &video_ref(video)));
        output.push_str(&self.field("Author", &format!("{} ({})", video.author, video.author_mid)));
        output.push_str(&self.field("Published", &format_timestamp(video.publish_time)));
        output.push_str(&self.field("Duration", &video.duration));
        output.push_str(&self.field(
            "Stats",
            &format!(
                "▶ {}  弹 {}  赞 {}  币 {}  藏 {}  转 {}",
                format_count(video.play_count),
                format_count(video.danmaku_count),
                format_count(video.like_count),
                format_count(video.coin_count),
                format_count(video.favorite_count),
                format_count(video.share_count)
            ),
        ));
        if let Some(desc) = video.description.as_deref().filter(|d| !d.is_empty()) {
            output.push_str(&self.field("Description", desc));
        }
        if !detail.tags.is_empty() {
            let tags: Vec<&str> = detail.tags.iter().map(|t| t.tag_name.as_str()).collect();
            output.push_str(&self.field("Tags", &tags.join(", ")));
        }
        if !detail.pages.is_empty() {
            output.push_str(&format!("  {}:\n", self.colorize("Parts", &Color::Yellow, false)));
            for page in &detail.pages {
                output.push_str(&format!(
                    "    P{} {} [{}] cid={}\n",
                    page.page,
                    page.part,
                    format_duration(page.duration),
                    page.cid
                ));
            }
        }
        if !detail.subtitles.is_empty() {
            let langs: Vec<&str> = detail.subtitles.iter().map(|s| s.lan_doc.as_str()).collect();
            output.push_str(&self.field("Subtitles", &langs.join(", ")));
        }
        if !detail.related.is_empty() {
            output.push_str(&self.field("Related", &detail.related.len().to_string()));
        }
        output
    }

    pub fn playback(&self, playback: &Playback) -> String {
        let mut output = self.heading("Playback");
        output.push_str(&self.field(
            "Quality",
            &format!("{} ({})", playback.quality_name, playback.quality.qn()),
        ));
        output.push_str(&self.field("Format", &playback.format));
        output.push_str(&self.field("Duration", &format_duration(playback.duration_ms / 1000)));
        output.push_str(&self.field("Size", &format!("{} bytes", playback.total_size())));
        if !playback.qualities.is_empty() {
            output.push_str(&format!("  {}:\n", self.colorize("Qualities", &Color::Yellow, false)));
            for option in &playback.qualities {
                let marker = if option.available { "✓" } else { "✗" };
                output.push_str(&format!(
                    "    {} {:>3} {}\n",
                    marker,
                    option.quality.qn(),
                    option.description
                ));
            }
        }
        for segment in &playback.segments {
            output.push_str(&format!(
                "  {} #{} ({}):\n",
                self.colorize("Segment", &Color::Yellow, false),
                segment.order,
                format_duration(segment.length_ms / 1000)
            ));
            for url in &segment.urls {
                output.push_str(&format!("    {}\n", self.colorize(url, &Color::Blue, false)));
            }
        }
        if !playback.is_playable() {
            output.push_str("  (no playable segments)\n");
        }
        output
    }

    pub fn search_page(&self, page: &SearchPage) -> String {
        let mut output = self.heading(&format!(
            "Search results: page {}/{} ({} total)",
            page.page, page.total_pages, page.total_results
        ));
        for (i, result) in page.results.iter().enumerate() {
            let detail = match result {
                SearchResult::Video(v) => format!("{}  {}  ▶ {}", video_ref(v), v.author, v.formatted_play_count()),
                SearchResult::MediaBangumi(m) | SearchResult::MediaFt(m) => {
                    format!("media {}  {}", m.media_id, m.styles)
                }
                SearchResult::LiveRoom(r) => {
                    let state = if r.live_status == 1 { "live" } else { "offline" };
                    format!("room {}  {}  {}", r.roomid, r.uname, state)
                }
                SearchResult::Article(a) => format!("cv{}  {} views", a.id, format_count(a.view)),
                SearchResult::BiliUser(u) => {
                    format!("uid {}  {} fans  lv{}", u.mid, format_count(u.fans), u.level)
                }
                SearchResult::Unknown => String::new(),
            };
            let title = match result {
                SearchResult::BiliUser(u) => u.uname.as_str(),
                other => other.title(),
            };
            output.push_str(&format!(
                "{:>3}. {}\n     {}\n",
                i + 1,
                self.colorize(title, &Color::Cyan, true),
                detail
            ));
        }
        output
    }

    pub fn hot_keywords(&self, keywords: &[HotSearchKeyword]) -> String {
        let mut output = self.heading("Trending");
        for (i, keyword) in keywords.iter().enumerate() {
            let name = if keyword.show_name.is_empty() {
                &keyword.keyword
            } else {
                &keyword.show_name
            };
            output.push_str(&format!("{:>3}. {}\n", i + 1, self.colorize(name, &Color::Cyan, false)));
        }
        output
    }

    pub fn danmaku(&self, shown: &[StyledDanmaku<'_>], report: &FilterReport) -> String {
        let mut output = String::new();
        for styled in shown {
            let item = styled.item;
            output.push_str(&format!(
                "[{}] {} {}\n",
                format_progress(item.progress),
                item.mode.description(),
                self.paint(&item.content, item.color)
            ));
        }
        output.push_str(&self.report(report));
        output
    }

    pub fn report(&self, report: &FilterReport) -> String {
        let mut output = self.heading(&format!(
            "{} of {} danmaku shown",
            report.shown, report.total
        ));
        let mut counts: Vec<_> = report.suppressed.iter().collect();
        counts.sort_by_key(|(reason, _)| reason.label());
        for (reason, count) in counts {
            output.push_str(&self.field(reason.label(), &count.to_string()));
        }
        output
    }

    pub fn post_result(&self, result: &PostDanmakuResult) -> String {
        let mut output = self.heading("Danmaku sent");
        output.push_str(&self.field("Id", &result.id()));
        if result.is_masked() {
            output.push_str("  (held for moderation)\n");
        }
        output
    }

    pub fn profile(&self, nav: &NavInfo) -> String {
        if !nav.is_login {
            return self.heading("Not logged in");
        }
        let mut output = self.heading(&nav.uname);
        output.push_str(&self.field("Uid", &nav.mid.to_string()));
        output.push_str(&self.field("Level", &nav.level().to_string()));
        output.push_str(&self.field("Coins", &nav.money.to_string()));
        output.push_str(&self.field("Vip", if nav.is_vip() { "yes" } else { "no" }));
        if nav.official_verify.is_verified() {
            output.push_str(&self.field("Verified", &nav.official_verify.desc));
        }
        output
    }

    pub fn folders(&self, folders: &FavoriteFolders) -> String {
        let mut output = self.heading(&format!("{} favorite folders", folders.count));
        for folder in &folders.list {
            let private = if folder.is_private() { " (private)" } else { "" };
            output.push_str(&format!(
                "  {} {} [{} items]{}\n",
                self.colorize(&folder.id.to_string(), &Color::Blue, false),
                folder.title,
                folder.media_count,
                private
            ));
        }
        output
    }

    pub fn favorite_page(&self, page: &FavoritePage) -> String {
        let mut output = self.videos(&page.info.title, &page.medias);
        if page.has_more {
            output.push_str("  (more pages)\n");
        }
        output
    }

    pub fn history(&self, page: &HistoryPage) -> String {
        let mut output = self.heading("History");
        for item in &page.items {
            let progress = if item.is_finished() {
                "finished".to_string()
            } else {
                format_duration(u64::try_from(item.progress).unwrap_or(0))
            };
            output.push_str(&format!(
                "  {}  {}  {}  {}\n",
                format_timestamp(item.view_at),
                self.colorize(&item.title, &Color::Cyan, false),
                item.author_name,
                progress
            ));
        }
        if page.has_more() {
            output.push_str(&format!(
                "  next: --max {} --view-at {} --business {}\n",
                page.cursor.max, page.cursor.view_at, page.cursor.business
            ));
        }
        output
    }

    pub fn comments(&self, page: &CommentPage) -> String {
        let mut output = self.heading(&format!("{} comments", page.page.count));
        for comment in page.hot_replies.iter().chain(&page.replies) {
            let mut flags = String::new();
            if comment.attr.is_pinned() {
                flags.push_str("[pinned] ");
            }
            output.push_str(&format!(
                "  {}{}  ♥ {}  {}\n    {}\n",
                flags,
                self.colorize(&comment.member.uname, &Color::Green, true),
                comment.like,
                format_timestamp(comment.ctime),
                comment.message()
            ));
            for reply in &comment.replies {
                output.push_str(&format!(
                    "      ↳ {}: {}\n",
                    self.colorize(&reply.member.uname, &Color::Green, false),
                    reply.message()
                ));
            }
        }
        output
    }

    pub fn relations(&self, heading: &str, page: &RelationPage) -> String {
        let mut output = self.heading(&format!("{heading} ({})", page.total));
        for user in &page.list {
            let mutual = if user.is_mutual() { "  (mutual)" } else { "" };
            output.push_str(&format!(
                "  {} {}{}\n",
                self.colorize(&user.mid.to_string(), &Color::Blue, false),
                user.uname,
                mutual
            ));
        }
        output
    }

    pub fn unread(&self, unread: &UnreadCount) -> String {
        let mut output = self.heading(&format!("{} unread", unread.total()));
        output.push_str(&self.field("@", &unread.at.to_string()));
        output.push_str(&self.field("Replies", &unread.reply.to_string()));
        output.push_str(&self.field("Likes", &unread.like.to_string()));
        output.push_str(&self.field("Chat", &unread.chat.to_string()));
        output.push_str(&self.field("System", &unread.sys_msg.to_string()));
        output
    }

    pub fn at_messages(&self, page: &AtMessagePage) -> String {
        let mut output = self.heading("Mentions");
        for message in &page.items {
            output.push_str(&format!(
                "  {}  {} in {}\n    {}\n",
                format_timestamp(message.at_time),
                self.colorize(&message.user.uname, &Color::Green, true),
                message.item.title,
                message.item.source_content
            ));
        }
        if page.has_more() {
            output.push_str(&format!(
                "  next: --id {} --time {}\n",
                page.cursor.id, page.cursor.time
            ));
        }
        output
    }

    pub fn live_rooms(&self, page: &LiveRoomPage) -> String {
        let mut output = self.heading("Live rooms");
        for room in &page.list {
            let state = if room.is_live() { "●" } else { "○" };
            output.push_str(&format!(
                "  {} {} {}  {}  {}\n",
                state,
                self.colorize(&room.room_id.to_string(), &Color::Blue, false),
                self.colorize(&room.title, &Color::Cyan, false),
                room.uname,
                room.area_v2_name
            ));
        }
        output
    }

    pub fn live_playback(&self, playback: &LivePlayback) -> String {
        let state = if playback.is_live() { "live" } else { "offline" };
        let mut output = self.heading(&format!("Room {} ({state})", playback.room_id));
        if !playback.qualities.is_empty() {
            let ladder: Vec<String> = playback
                .qualities
                .iter()
                .map(|q| format!("{} {}", q.qn, q.desc))
                .collect();
            output.push_str(&self.field("Qualities", &ladder.join(", ")));
        }
        for stream in &playback.streams {
            output.push_str(&format!(
                "  {} {}/{}/{} [{}]\n    {}\n",
                stream.quality_name,
                stream.protocol,
                stream.format,
                stream.codec,
                stream.cdn,
                self.colorize(&stream.url, &Color::Blue, false)
            ));
        }
        output
    }

    pub fn settings(&self, settings: &DanmakuSettings) -> String {
        let mut output = self.heading("Danmaku settings");
        match toml::to_string_pretty(settings) {
            Ok(text) => {
                for line in text.lines() {
                    output.push_str(&format!("  {line}\n"));
                }
            }
            Err(e) => output.push_str(&format!("  (failed to render: {e})\n")),
        }
        output
    }

    fn heading(&self, text: &str) -> String {
        format!("{}\n", self.colorize(text, &Color::Green, true))
    }

    fn field(&self, label: &str, value: &str) -> String {
        format!("  {}: {}\n", self.colorize(label, &Color::Yellow, false), value)
    }

    /// Render in the danmaku's own colour, leaving white text alone.
    fn paint(&self, text: &str, rgb: u32) -> String {
        #[cfg(feature = "colored-output")]
        {
            if self.colored && rgb & 0xFF_FFFF != danmaku::color::WHITE {
                let [_, r, g, b] = rgb.to_be_bytes();
                return text.truecolor(r, g, b).to_string();
            }
        }
        let _ = rgb;
        text.to_string()
    }

    fn colorize(&self, text: &str, color: &Color, bold: bool) -> String {
        #[cfg(feature = "colored-output")]
        {
            if self.colored {
                let colored_text = match color {
                    Color::Green => text.green(),
                    Color::Yellow => text.yellow(),
                    Color::Blue => text.blue(),
                    Color::Cyan => text.cyan(),
                };
                if bold {
                    colored_text.bold().to_string()
                } else {
                    colored_text.to_string()
                }
            } else {
                text.to_string()
            }
        }

        #[cfg(not(feature = "colored-output"))]
        {
            let _ = (color, bold);
            text.to_string()
        }
    }
}

enum Color {
    Green,
    Yellow,
    Blue,
    Cyan,
}

fn video_ref(video: &Video) -> String {
    if video.bvid.is_empty() {
        format!("av{}", video.aid)
    } else {
        video.bvid.clone()
    }
}

/// `mm:ss.s` offset of a danmaku.
fn format_progress(progress_ms: u64) -> String {
    let minutes = progress_ms / 60_000;
    let seconds = (progress_ms % 60_000) as f64 / 1000.0;
    format!("{minutes:02}:{seconds:04.1}")
}

fn format_timestamp(ts: i64) -> String {
    if ts <= 0 {
        return "-".to_string();
    }
    DateTime::from_timestamp(ts, 0)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn write_output(content: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use danmaku::{DanmakuFilter, DanmakuItem};
    use rstest::rstest;

    fn plain() -> OutputManager {
        OutputManager::new(OutputFormat::Pretty, false)
    }

    #[rstest]
    #[case(0, "00:00.0")]
    #[case(1_500, "00:01.5")]
    #[case(61_300, "01:01.3")]
    #[case(600_000, "10:00.0")]
    fn test_format_progress(#[case] ms: u64, #[case] expected: &str) {
        assert_eq!(format_progress(ms), expected);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "-");
        assert_eq!(format_timestamp(-5), "-");
        assert_eq!(format_timestamp(1_700_000_000).len(), "2023-11-14 22:13".len());
    }

    #[test]
    fn test_videos_listing() {
        let video = Video {
            bvid: "BV1xx411c7mD".into(),
            title: "title".into(),
            author: "up".into(),
            play_count: 15_000,
            duration: "03:25".into(),
            ..Default::default()
        };
        let text = plain().videos("Feed", &[video]);
        assert!(text.starts_with("Feed\n"));
        assert!(text.contains("  1. title"));
        assert!(text.contains("BV1xx411c7mD  up  ▶ 1.5万"));
        assert!(text.contains("03:25"));

        assert!(plain().videos("Empty", &[]).contains("(none)"));
    }

    #[test]
    fn test_video_ref_falls_back_to_aid() {
        let video = Video {
            aid: 170001,
            ..Default::default()
        };
        assert_eq!(video_ref(&video), "av170001");
    }

    #[test]
    fn test_danmaku_rendering() {
        let items = vec![
            DanmakuItem::new(1, 1_500, "first"),
            DanmakuItem::new(2, 3_000, "second"),
        ];
        let settings = DanmakuSettings::default();
        let (shown, report) = DanmakuFilter::new(&settings).apply_with_report(&items);
        let text = plain().danmaku(&shown, &report);
        assert!(text.contains("[00:01.5] 滚动 first"));
        assert!(text.contains("2 of 2 danmaku shown"));
    }

    #[test]
    fn test_profile_logged_out() {
        assert_eq!(plain().profile(&NavInfo::default()), "Not logged in\n");
    }
}
