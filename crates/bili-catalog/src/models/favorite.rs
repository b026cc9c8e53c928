//! Favourite folders and their contents.

use serde::{Deserialize, Serialize};

use super::de::{lenient_i64, lenient_u64, null_default};
use super::video::Video;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FavoriteFolder {
    /// Media id, used to list the folder.
    #[serde(deserialize_with = "lenient_u64")]
    pub id: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub fid: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub mid: u64,
    pub attr: u32,
    pub title: String,
    pub cover: String,
    pub intro: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub ctime: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub mtime: i64,
    pub state: i32,
    pub fav_state: i32,
    #[serde(deserialize_with = "lenient_u64")]
    pub media_count: u64,
}

impl FavoriteFolder {
    /// Bit 0 of `attr` marks a private folder.
    pub fn is_private(&self) -> bool {
        self.attr & 1 != 0
    }

    /// Bit 1 clear marks the default folder.
    pub fn is_default(&self) -> bool {
        self.attr & 2 == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FavoriteFolders {
    #[serde(deserialize_with = "lenient_u64")]
    pub count: u64,
    #[serde(deserialize_with = "null_default")]
    pub list: Vec<FavoriteFolder>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FavoritePage {
    pub info: FavoriteFolder,
    #[serde(deserialize_with = "null_default")]
    pub medias: Vec<Video>,
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folders() {
        let folders: FavoriteFolders = serde_json::from_str(
            r#"{"count":2,"list":[
                {"id":100,"fid":1,"mid":9,"attr":0,"title":"默认收藏夹","media_count":12},
                {"id":200,"fid":2,"mid":9,"attr":3,"title":"secret","media_count":"4"}]}"#,
        )
        .unwrap();
        assert_eq!(folders.list.len(), 2);
        assert!(folders.list[0].is_default());
        assert!(!folders.list[0].is_private());
        assert!(folders.list[1].is_private());
        assert!(!folders.list[1].is_default());
        assert_eq!(folders.list[1].media_count, 4);
    }

    #[test]
    fn test_empty_folder_list() {
        let folders: FavoriteFolders = serde_json::from_str(r#"{"count":0,"list":null}"#).unwrap();
        assert!(folders.list.is_empty());
    }

    #[test]
    fn test_favorite_page() {
        let page: FavoritePage = serde_json::from_str(
            r#"{"info":{"id":100,"title":"f","media_count":1},
                "medias":[{"id":5,"bvid":"BV5","title":"m","upper":{"mid":1,"name":"u"},
                           "cnt_info":{"play":7},"duration":30}],
                "has_more":false}"#,
        )
        .unwrap();
        assert_eq!(page.info.id, 100);
        assert_eq!(page.medias[0].aid, 5);
        assert_eq!(page.medias[0].play_count, 7);
        assert_eq!(page.medias[0].duration, "00:30");
        assert!(!page.has_more);
    }
}
