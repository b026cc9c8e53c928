use std::path::PathBuf;

use bili_catalog::{CommentSort, SearchKind, UploadOrder, VideoId};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use danmaku::DanmakuMode;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "bili")]
#[command(about = "Browse bilibili from the terminal: feeds, videos, search, danmaku and live rooms")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to <config dir>/bili/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Session cookies ("SESSDATA=...; bili_jct=..."), overriding the config file
    #[arg(long, global = true, env = "BILI_COOKIES", hide_env_values = true)]
    pub cookies: Option<String>,

    /// Output format, overriding the config file
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
    JsonCompact,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json | Self::JsonCompact)
    }
}

/// Page selection shared by the listing commands.
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Items per page
    #[arg(long, default_value_t = 20)]
    pub size: u32,
}

/// Selects one part of a video.
#[derive(clap::Args, Debug, Clone)]
pub struct PartArgs {
    /// Video id: BV id, "av123" or a bare aid
    pub id: VideoId,

    /// Part number of a multi-part video
    #[arg(long, default_value_t = 1)]
    pub part: u64,

    /// Content-stream id, skips the lookup of the part
    #[arg(long)]
    pub cid: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recommended videos
    Feed {
        #[arg(long, default_value_t = 20)]
        size: u32,
    },

    /// Video details: stats, parts, tags and subtitle tracks
    Video { id: VideoId },

    /// Videos related to a video
    Related { id: VideoId },

    /// Resolve playable URLs of a video part
    Play {
        #[command(flatten)]
        target: PartArgs,

        /// Quality code (qn), e.g. 80 for 1080P. Defaults to the best available
        #[arg(long)]
        quality: Option<u32>,
    },

    /// Search videos, bangumi, films, live rooms, articles or users
    Search {
        keyword: String,

        #[arg(long, value_enum, default_value_t = SearchKindArg::Video)]
        kind: SearchKindArg,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Trending search keywords
    Hot {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Danmaku of a video part, filtered with the saved settings
    Danmaku {
        #[command(flatten)]
        target: PartArgs,

        /// Show every item, ignoring the settings
        #[arg(long)]
        all: bool,

        /// Only print the per-reason filter counts
        #[arg(long)]
        report: bool,
    },

    /// Post a danmaku (requires session cookies with bili_jct)
    Send {
        #[command(flatten)]
        target: PartArgs,

        message: String,

        /// Offset into the video, in seconds
        #[arg(long, default_value_t = 0.0)]
        at: f64,

        /// Colour as hex ("#FF0000") or decimal
        #[arg(long, value_parser = parse_color)]
        color: Option<u32>,

        #[arg(long, value_enum, default_value_t = ModeArg::Scroll)]
        mode: ModeArg,

        #[arg(long)]
        font_size: Option<u32>,
    },

    /// Profile of the logged-in user
    Me,

    /// A user's uploaded videos
    Uploads {
        mid: u64,

        #[arg(long, value_enum, default_value_t = UploadOrderArg::Pubdate)]
        order: UploadOrderArg,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Favorite folders of a user, or the content of one folder
    Favorites {
        /// Owner of the folders
        mid: Option<u64>,

        /// List the videos of this folder instead
        #[arg(long)]
        folder: Option<u64>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Watch history
    History {
        /// Cursor `max` from the previous page
        #[arg(long, default_value_t = 0)]
        max: u64,

        /// Cursor `view_at` from the previous page
        #[arg(long, default_value_t = 0)]
        view_at: i64,

        /// Cursor `business` from the previous page
        #[arg(long, default_value = "")]
        business: String,

        #[arg(long, default_value_t = 20)]
        size: u32,
    },

    /// Comments of a video
    Comments {
        id: VideoId,

        #[arg(long, value_enum, default_value_t = CommentSortArg::Hot)]
        sort: CommentSortArg,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Followers of a user
    Followers {
        mid: u64,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Users a user follows
    Following {
        mid: u64,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Ranking board
    Ranking {
        /// Region id, 0 for the whole site
        #[arg(long, default_value_t = 0)]
        rid: u32,
    },

    /// Latest videos of a region
    Region {
        rid: u32,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Unread message counters
    Unread,

    /// @-mentions
    At {
        /// Cursor id from the previous page
        #[arg(long, requires = "time")]
        id: Option<u64>,

        /// Cursor time from the previous page
        #[arg(long)]
        time: Option<i64>,
    },

    /// Recommended live rooms
    Live {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Resolve stream URLs of a live room
    LivePlay {
        room_id: u64,

        /// Live quality code, 10000 for the original stream
        #[arg(long)]
        qn: Option<u32>,
    },

    /// Danmaku display settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Show or reset the configuration
    Config {
        #[arg(long)]
        show: bool,

        #[arg(long)]
        reset: bool,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    Show,

    /// Set one field, e.g. `set block_visitor true` or `set opacity 0.5`
    Set { key: String, value: String },

    /// Manage blocked keywords
    Keyword {
        #[command(subcommand)]
        action: KeywordAction,
    },

    Reset,
}

#[derive(Subcommand)]
pub enum KeywordAction {
    Add { keyword: String },
    Remove { keyword: String },
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchKindArg {
    Video,
    Bangumi,
    Film,
    Live,
    Article,
    User,
}

impl From<SearchKindArg> for SearchKind {
    fn from(arg: SearchKindArg) -> Self {
        match arg {
            SearchKindArg::Video => Self::Video,
            SearchKindArg::Bangumi => Self::MediaBangumi,
            SearchKindArg::Film => Self::MediaFt,
            SearchKindArg::Live => Self::LiveRoom,
            SearchKindArg::Article => Self::Article,
            SearchKindArg::User => Self::BiliUser,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UploadOrderArg {
    Pubdate,
    Click,
    Stow,
}

impl From<UploadOrderArg> for UploadOrder {
    fn from(arg: UploadOrderArg) -> Self {
        match arg {
            UploadOrderArg::Pubdate => Self::Pubdate,
            UploadOrderArg::Click => Self::Click,
            UploadOrderArg::Stow => Self::Stow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CommentSortArg {
    Time,
    Hot,
    Replies,
}

impl From<CommentSortArg> for CommentSort {
    fn from(arg: CommentSortArg) -> Self {
        match arg {
            CommentSortArg::Time => Self::Time,
            CommentSortArg::Hot => Self::Hot,
            CommentSortArg::Replies => Self::Replies,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Scroll,
    Top,
    Bottom,
}

impl From<ModeArg> for DanmakuMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Scroll => Self::Scroll,
            ModeArg::Top => Self::Top,
            ModeArg::Bottom => Self::Bottom,
        }
    }
}

/// Parse "#RRGGBB", "0xRRGGBB", "RRGGBB" (six hex digits) or a decimal value.
pub fn parse_color(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let hex = s
        .strip_prefix('#')
        .or_else(|| s.strip_prefix("0x"))
        .or_else(|| s.strip_prefix("0X"));
    let value = match hex {
        Some(hex) => u32::from_str_radix(hex, 16),
        None if s.len() == 6 && s.chars().any(|c| c.is_ascii_alphabetic()) => {
            u32::from_str_radix(s, 16)
        }
        None => s.parse(),
    }
    .map_err(|e| format!("invalid colour {s:?}: {e}"))?;

    if value > 0xFF_FFFF {
        return Err(format!("colour {s:?} is out of range"));
    }
    Ok(value)
}
