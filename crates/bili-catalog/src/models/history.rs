//! Watch history, paged by cursor.

use serde::{Deserialize, Serialize};

use super::de::{lenient_i64, lenient_u64, null_default};

/// Position in the history list. The default cursor starts at the newest entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryCursor {
    #[serde(deserialize_with = "lenient_u64")]
    pub max: u64,
    #[serde(deserialize_with = "lenient_i64")]
    pub view_at: i64,
    pub business: String,
}

impl HistoryCursor {
    pub fn is_start(&self) -> bool {
        self.max == 0 && self.view_at == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryTab {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

/// What the entry points at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryDetail {
    #[serde(deserialize_with = "lenient_u64")]
    pub oid: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub epid: u64,
    pub bvid: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub page: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub cid: u64,
    pub part: String,
    /// `archive`, `pgc`, `live`, `article`, ...
    pub business: String,
    pub dt: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryItem {
    pub title: String,
    pub long_title: String,
    pub cover: String,
    #[serde(deserialize_with = "null_default")]
    pub covers: Vec<String>,
    pub uri: String,
    pub history: HistoryDetail,
    #[serde(deserialize_with = "lenient_u64")]
    pub videos: u64,
    pub author_name: String,
    pub author_face: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub author_mid: u64,
    #[serde(deserialize_with = "lenient_i64")]
    pub view_at: i64,
    /// Seconds watched; -1 once finished.
    #[serde(deserialize_with = "lenient_i64")]
    pub progress: i64,
    pub badge: String,
    pub show_title: String,
    /// Seconds.
    #[serde(deserialize_with = "lenient_u64")]
    pub duration: u64,
    pub current: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub total: u64,
    pub new_desc: String,
    pub is_finish: i32,
    pub is_fav: i32,
    #[serde(deserialize_with = "lenient_u64")]
    pub kid: u64,
    pub tag_name: String,
    pub live_status: i32,
}

impl HistoryItem {
    pub fn is_finished(&self) -> bool {
        self.is_finish == 1 || self.progress < 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryPage {
    pub cursor: HistoryCursor,
    #[serde(rename = "tab", deserialize_with = "null_default")]
    pub tabs: Vec<HistoryTab>,
    #[serde(rename = "list", deserialize_with = "null_default")]
    pub items: Vec<HistoryItem>,
}

impl HistoryPage {
    /// A cursor that reached the end comes back zeroed, or the page is empty.
    pub fn has_more(&self) -> bool {
        !self.items.is_empty() && !self.cursor.is_start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_page() {
        let page: HistoryPage = serde_json::from_str(
            r#"{"cursor":{"max":123,"view_at":1700000000,"business":"archive","ps":20},
                "tab":[{"type":"archive","name":"视频"}],
                "list":[{"title":"t","history":{"oid":1,"bvid":"BV1","cid":2,"business":"archive"},
                         "author_name":"a","view_at":1700000000,"progress":-1,"duration":60,"is_finish":0},
                        {"title":"live","history":{"oid":3,"business":"live"},"progress":0,"live_status":1}]}"#,
        )
        .unwrap();
        assert_eq!(page.cursor.max, 123);
        assert_eq!(page.tabs[0].kind, "archive");
        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].is_finished());
        assert!(!page.items[1].is_finished());
        assert_eq!(page.items[1].history.business, "live");
        assert!(page.has_more());
    }

    #[test]
    fn test_end_of_history() {
        let page: HistoryPage =
            serde_json::from_str(r#"{"cursor":{"max":0,"view_at":0,"business":""},"list":[]}"#).unwrap();
        assert!(!page.has_more());
        assert!(HistoryCursor::default().is_start());
    }
}
