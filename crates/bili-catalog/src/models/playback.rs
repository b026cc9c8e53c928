//! Resolved playback for on-demand videos (`playurl`, progressive `durl` mode).

use serde::{Deserialize, Serialize};

use super::de::{lenient_u64, null_default};
use crate::format::VideoQuality;

/// One downloadable segment, with its mirrors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaySegment {
    pub order: u64,
    pub length_ms: u64,
    pub size: u64,
    /// Primary URL first, then backups.
    pub urls: Vec<String>,
}

impl PlaySegment {
    pub fn primary_url(&self) -> Option<&str> {
        self.urls.first().map(String::as_str)
    }
}

/// A quality the video is offered in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityOption {
    pub quality: VideoQuality,
    pub format: String,
    pub description: String,
    /// Whether the session may play it (VIP-only levels are listed but locked).
    pub available: bool,
}

/// Playable segments at the resolved quality plus the quality ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPlayback")]
pub struct Playback {
    pub quality: VideoQuality,
    pub quality_name: String,
    pub format: String,
    pub duration_ms: u64,
    pub segments: Vec<PlaySegment>,
    /// Highest quality first.
    pub qualities: Vec<QualityOption>,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            quality: VideoQuality::Other(0),
            quality_name: String::new(),
            format: String::new(),
            duration_ms: 0,
            segments: Vec::new(),
            qualities: Vec::new(),
        }
    }
}

impl Playback {
    /// Total size in bytes over all segments.
    pub fn total_size(&self) -> u64 {
        self.segments.iter().map(|s| s.size).sum()
    }

    pub fn is_playable(&self) -> bool {
        self.segments.iter().any(|s| !s.urls.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSegment {
    #[serde(deserialize_with = "lenient_u64")]
    order: u64,
    #[serde(deserialize_with = "lenient_u64")]
    length: u64,
    #[serde(deserialize_with = "lenient_u64")]
    size: u64,
    url: String,
    #[serde(deserialize_with = "null_default")]
    backup_url: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSupportFormat {
    #[serde(deserialize_with = "lenient_u64")]
    quality: u64,
    format: String,
    new_description: String,
    display_desc: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPlayback {
    #[serde(deserialize_with = "lenient_u64")]
    quality: u64,
    format: String,
    #[serde(deserialize_with = "lenient_u64")]
    timelength: u64,
    #[serde(deserialize_with = "null_default")]
    accept_quality: Vec<u32>,
    #[serde(deserialize_with = "null_default")]
    accept_description: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    durl: Vec<RawSegment>,
    #[serde(deserialize_with = "null_default")]
    support_formats: Vec<RawSupportFormat>,
}

impl From<RawPlayback> for Playback {
    fn from(raw: RawPlayback) -> Self {
        let quality = VideoQuality::from(u32::try_from(raw.quality).unwrap_or_default());

        let mut segments: Vec<PlaySegment> = raw
            .durl
            .into_iter()
            .map(|s| {
                let urls = std::iter::once(s.url)
                    .chain(s.backup_url)
                    .filter(|u| !u.is_empty())
                    .collect();
                PlaySegment {
                    order: s.order,
                    length_ms: s.length,
                    size: s.size,
                    urls,
                }
            })
            .collect();
        segments.sort_by_key(|s| s.order);

        let mut qualities: Vec<QualityOption> = if raw.support_formats.is_empty() {
            raw.accept_quality
                .iter()
                .enumerate()
                .map(|(i, &qn)| {
                    let quality = VideoQuality::from(qn);
                    QualityOption {
                        quality,
                        format: String::new(),
                        description: raw
                            .accept_description
                            .get(i)
                            .cloned()
                            .unwrap_or_else(|| quality.description().to_string()),
                        available: true,
                    }
                })
                .collect()
        } else {
            raw.support_formats
                .into_iter()
                .map(|f| {
                    let quality = VideoQuality::from(u32::try_from(f.quality).unwrap_or_default());
                    let description = [f.new_description, f.display_desc]
                        .into_iter()
                        .find(|d| !d.is_empty())
                        .unwrap_or_else(|| quality.description().to_string());
                    QualityOption {
                        available: raw.accept_quality.contains(&quality.qn()),
                        quality,
                        format: f.format,
                        description,
                    }
                })
                .collect()
        };
        qualities.sort_by(|a, b| b.quality.qn().cmp(&a.quality.qn()));

        let quality_name = qualities
            .iter()
            .find(|q| q.quality == quality)
            .map(|q| q.description.clone())
            .unwrap_or_else(|| quality.description().to_string());

        Self {
            quality,
            quality_name,
            format: raw.format,
            duration_ms: raw.timelength,
            segments,
            qualities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "from":"local","result":"suee","quality":80,"format":"flv","timelength":205000,
        "accept_format":"hdflv2,flv,flv720,flv480,mp4",
        "accept_description":["高清 1080P+","高清 1080P","高清 720P","清晰 480P","流畅 360P"],
        "accept_quality":[112,80,64,32,16],
        "durl":[
            {"order":2,"length":5000,"size":200,"url":"https://b/2","backup_url":null},
            {"order":1,"length":200000,"size":1000,"url":"https://a/1","backup_url":["https://m/1"]}
        ],
        "support_formats":[
            {"quality":64,"format":"flv720","new_description":"720P 高清","display_desc":"720P"},
            {"quality":120,"format":"hdflv2","new_description":"4K 超清","display_desc":"4K"},
            {"quality":80,"format":"flv","new_description":"1080P 高清","display_desc":"1080P"}
        ]
    }"#;

    #[test]
    fn test_segments_are_ordered_with_mirrors() {
        let playback: Playback = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(playback.quality, VideoQuality::P1080);
        assert_eq!(playback.duration_ms, 205000);
        assert_eq!(playback.segments[0].order, 1);
        assert_eq!(playback.segments[0].urls, vec!["https://a/1", "https://m/1"]);
        assert_eq!(playback.segments[1].primary_url(), Some("https://b/2"));
        assert_eq!(playback.total_size(), 1200);
        assert!(playback.is_playable());
    }

    #[test]
    fn test_qualities_ranked_highest_first() {
        let playback: Playback = serde_json::from_str(SAMPLE).unwrap();
        let ladder: Vec<u32> = playback.qualities.iter().map(|q| q.quality.qn()).collect();
        assert_eq!(ladder, vec![120, 80, 64]);
        // 4K is offered but not accepted for this session
        assert!(!playback.qualities[0].available);
        assert!(playback.qualities[1].available);
        assert_eq!(playback.quality_name, "1080P 高清");
    }

    #[test]
    fn test_accept_quality_fallback() {
        let playback: Playback = serde_json::from_str(
            r#"{"quality":32,"accept_quality":[32,64],"accept_description":["清晰 480P"],"durl":[]}"#,
        )
        .unwrap();
        assert_eq!(playback.qualities.len(), 2);
        assert_eq!(playback.qualities[0].description, "720P");
        assert_eq!(playback.qualities[1].description, "清晰 480P");
        assert!(!playback.is_playable());
    }
}
