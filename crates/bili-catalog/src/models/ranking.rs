//! Ranking board and per-region listings.

use serde::{Deserialize, Serialize};

use super::de::null_default;
use super::user::PageInfo;
use super::video::Video;

/// Region id of the site-wide ranking.
pub const ALL_REGIONS: u32 = 0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingPage {
    pub note: String,
    #[serde(rename = "list", deserialize_with = "null_default")]
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionPage {
    #[serde(rename = "archives", deserialize_with = "null_default")]
    pub videos: Vec<Video>,
    pub page: PageInfo,
}

impl RegionPage {
    pub fn has_more(&self) -> bool {
        self.page.has_more()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_page() {
        let page: RankingPage = serde_json::from_str(
            r#"{"note":"根据稿件内容质量计算","list":[
                {"aid":1,"bvid":"BV1","title":"top","owner":{"mid":2,"name":"up"},
                 "stat":{"view":100000,"danmaku":2000},"duration":300,"pic":"p","score":0}]}"#,
        )
        .unwrap();
        assert_eq!(page.videos.len(), 1);
        assert_eq!(page.videos[0].formatted_play_count(), "10.0万");
        assert_eq!(page.videos[0].duration, "05:00");
    }

    #[test]
    fn test_region_page() {
        let page: RegionPage = serde_json::from_str(
            r#"{"archives":[{"aid":1,"bvid":"BV1","title":"a"},{"aid":2,"bvid":"BV2","title":"b"}],
                "page":{"num":1,"size":2,"count":10}}"#,
        )
        .unwrap();
        assert_eq!(page.videos.len(), 2);
        assert!(page.has_more());
    }
}
