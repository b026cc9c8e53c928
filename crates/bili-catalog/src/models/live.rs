//! Live rooms and live stream resolution.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::de::{lenient_i64, lenient_u64, null_default};

/// Live quality code (`qn`) of the original stream.
pub const LIVE_QN_ORIGINAL: u32 = 10000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchedShow {
    pub switch: bool,
    #[serde(deserialize_with = "lenient_u64")]
    pub num: u64,
    pub text_small: String,
    pub text_large: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveRoom {
    #[serde(rename = "roomid", alias = "room_id", deserialize_with = "lenient_u64")]
    pub room_id: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub uid: u64,
    pub title: String,
    pub uname: String,
    pub face: String,
    pub cover: String,
    /// 0 offline, 1 live, 2 replaying.
    pub live_status: i32,
    #[serde(deserialize_with = "lenient_u64")]
    pub area_v2_id: u64,
    pub area_v2_name: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub area_v2_parent_id: u64,
    pub area_v2_parent_name: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub online: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub short_id: u64,
    pub link: String,
    pub live_time: String,
    pub watched_show: WatchedShow,
}

impl LiveRoom {
    pub fn is_live(&self) -> bool {
        self.live_status == 1
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveRoomPage {
    #[serde(deserialize_with = "null_default")]
    pub list: Vec<LiveRoom>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveQuality {
    pub qn: u32,
    pub desc: String,
}

/// A playable live stream URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStream {
    pub url: String,
    /// `http_stream` (FLV) or `http_hls`.
    pub protocol: String,
    /// `flv`, `ts` or `fmp4`.
    pub format: String,
    /// `avc` or `hevc`.
    pub codec: String,
    pub qn: u32,
    pub quality_name: String,
    pub cdn: String,
}

/// Resolved live room playback, best stream first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LivePlayback {
    pub room_id: u64,
    pub live_status: i32,
    pub qualities: Vec<LiveQuality>,
    pub streams: Vec<LiveStream>,
}

impl LivePlayback {
    pub fn is_live(&self) -> bool {
        self.live_status == 1
    }

    pub fn best(&self) -> Option<&LiveStream> {
        self.streams.first()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawUrlInfo {
    host: String,
    extra: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCodec {
    codec_name: String,
    current_qn: u32,
    base_url: String,
    #[serde(deserialize_with = "null_default")]
    url_info: Vec<RawUrlInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFormat {
    format_name: String,
    #[serde(deserialize_with = "null_default")]
    codec: Vec<RawCodec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStream {
    protocol_name: String,
    #[serde(deserialize_with = "null_default")]
    format: Vec<RawFormat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPlayurl {
    #[serde(deserialize_with = "null_default")]
    g_qn_desc: Vec<LiveQuality>,
    #[serde(deserialize_with = "null_default")]
    stream: Vec<RawStream>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPlayurlInfo {
    playurl: Option<RawPlayurl>,
}

/// `getRoomPlayInfo` payload.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RoomPlayInfo {
    #[serde(deserialize_with = "lenient_u64")]
    room_id: u64,
    live_status: i32,
    #[serde(deserialize_with = "lenient_i64")]
    live_time: i64,
    playurl_info: Option<RawPlayurlInfo>,
}

fn extract_cdn_from_host(host: &str) -> &str {
    let host = host.split_once("//").map_or(host, |(_, rest)| rest);
    host.split_once('.').map_or("", |(cdn, _)| cdn)
}

fn concat_url(host: &str, base_url: &str, extra: &str) -> String {
    let mut url = String::with_capacity(host.len() + base_url.len() + extra.len());
    url.push_str(host);
    url.push_str(base_url);
    url.push_str(extra);
    url
}

fn protocol_rank(protocol: &str) -> u8 {
    match protocol {
        "http_stream" => 0,
        _ => 1,
    }
}

fn codec_rank(codec: &str) -> u8 {
    match codec {
        "avc" => 0,
        _ => 1,
    }
}

impl RoomPlayInfo {
    /// Flatten the protocol / format / codec / host tree into ranked URLs.
    ///
    /// Only the codec's `current_qn` has real URLs; other accepted levels are
    /// reported in `qualities` and need another request with that `qn`.
    pub(crate) fn into_playback(self) -> LivePlayback {
        let playurl = self
            .playurl_info
            .and_then(|info| info.playurl)
            .unwrap_or_default();

        let quality_map: FxHashMap<u32, &str> = playurl
            .g_qn_desc
            .iter()
            .map(|q| (q.qn, q.desc.as_str()))
            .collect();

        let mut streams = Vec::new();
        for s in &playurl.stream {
            debug!(protocol = %s.protocol_name, "Processing live stream");
            for f in &s.format {
                for c in &f.codec {
                    let quality_name = quality_map
                        .get(&c.current_qn)
                        .copied()
                        .unwrap_or("Unknown")
                        .to_string();
                    for u in &c.url_info {
                        streams.push(LiveStream {
                            url: concat_url(&u.host, &c.base_url, &u.extra),
                            protocol: s.protocol_name.clone(),
                            format: f.format_name.clone(),
                            codec: c.codec_name.clone(),
                            qn: c.current_qn,
                            quality_name: quality_name.clone(),
                            cdn: extract_cdn_from_host(&u.host).to_string(),
                        });
                    }
                }
            }
        }

        // stable: the service's own host order is kept within a rank
        streams.sort_by(|a, b| {
            b.qn.cmp(&a.qn)
                .then_with(|| protocol_rank(&a.protocol).cmp(&protocol_rank(&b.protocol)))
                .then_with(|| codec_rank(&a.codec).cmp(&codec_rank(&b.codec)))
        });

        let mut qualities = playurl.g_qn_desc;
        qualities.sort_by(|a, b| b.qn.cmp(&a.qn));

        debug!(
            room_id = self.room_id,
            live_time = self.live_time,
            streams = streams.len(),
            "Resolved live playback"
        );

        LivePlayback {
            room_id: self.room_id,
            live_status: self.live_status,
            qualities,
            streams,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAY_INFO: &str = r#"{
        "room_id":21452505,"live_status":1,"live_time":1700000000,
        "playurl_info":{"conf_json":"{}","playurl":{
            "cid":21452505,
            "g_qn_desc":[{"qn":150,"desc":"高清"},{"qn":10000,"desc":"原画"},{"qn":400,"desc":"蓝光"}],
            "stream":[
                {"protocol_name":"http_hls","format":[
                    {"format_name":"fmp4","codec":[
                        {"codec_name":"hevc","current_qn":10000,"accept_qn":[10000,400,150],
                         "base_url":"/live-bvc/hevc/index.m3u8?","url_info":[
                            {"host":"https://cn-gddg-ct-01-01.bilivideo.com","extra":"h=1"}]},
                        {"codec_name":"avc","current_qn":10000,"accept_qn":[10000,400,150],
                         "base_url":"/live-bvc/avc/index.m3u8?","url_info":[
                            {"host":"https://cn-gddg-ct-01-02.bilivideo.com","extra":"h=2"}]}]}]},
                {"protocol_name":"http_stream","format":[
                    {"format_name":"flv","codec":[
                        {"codec_name":"avc","current_qn":10000,"accept_qn":[10000,400,150],
                         "base_url":"/live-bvc/avc.flv?","url_info":[
                            {"host":"https://d1--cn-gotcha03.bilivideo.com","extra":"f=1"},
                            {"host":"https://cn-hbwh-cm-01-01.bilivideo.com","extra":"f=2"}]}]}]}
            ]}}
    }"#;

    #[test]
    fn test_streams_ranked() {
        let info: RoomPlayInfo = serde_json::from_str(PLAY_INFO).unwrap();
        let playback = info.into_playback();
        assert!(playback.is_live());
        assert_eq!(playback.room_id, 21452505);
        assert_eq!(playback.streams.len(), 4);

        let best = playback.best().unwrap();
        assert_eq!(best.protocol, "http_stream");
        assert_eq!(best.url, "https://d1--cn-gotcha03.bilivideo.com/live-bvc/avc.flv?f=1");
        assert_eq!(best.cdn, "d1--cn-gotcha03");
        assert_eq!(best.quality_name, "原画");

        assert_eq!(playback.streams[1].cdn, "cn-hbwh-cm-01-01");
        assert_eq!(playback.streams[2].codec, "avc");
        assert_eq!(playback.streams[3].codec, "hevc");

        let ladder: Vec<u32> = playback.qualities.iter().map(|q| q.qn).collect();
        assert_eq!(ladder, vec![10000, 400, 150]);
    }

    #[test]
    fn test_offline_room_has_no_streams() {
        let info: RoomPlayInfo =
            serde_json::from_str(r#"{"room_id":1,"live_status":0,"playurl_info":null}"#).unwrap();
        let playback = info.into_playback();
        assert!(!playback.is_live());
        assert!(playback.best().is_none());
    }

    #[test]
    fn test_extract_cdn_from_host() {
        assert_eq!(extract_cdn_from_host("https://cn-a.bilivideo.com"), "cn-a");
        assert_eq!(extract_cdn_from_host("nohost"), "");
    }

    #[test]
    fn test_live_room_page() {
        let page: LiveRoomPage = serde_json::from_str(
            r#"{"list":[{"roomid":1,"uid":2,"title":"t","uname":"u","live_status":1,"online":"300",
                         "area_v2_name":"单机游戏","watched_show":{"switch":true,"num":1200,"text_small":"1200"}}],
                "has_more":true}"#,
        )
        .unwrap();
        assert!(page.has_more);
        assert!(page.list[0].is_live());
        assert_eq!(page.list[0].room_id, 1);
        assert_eq!(page.list[0].online, 300);
        assert_eq!(page.list[0].watched_show.num, 1200);
    }
}
