//! Followers and followings.

use serde::{Deserialize, Serialize};

use super::comment::MemberVip;
use super::de::{lenient_i64, lenient_u64, null_default};
use super::user::OfficialVerify;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationUser {
    #[serde(deserialize_with = "lenient_u64")]
    pub mid: u64,
    /// 0 none, 2 following, 6 mutual, 128 blocked.
    pub attribute: i32,
    #[serde(deserialize_with = "lenient_i64")]
    pub mtime: i64,
    #[serde(deserialize_with = "null_default")]
    pub tag: Vec<i64>,
    pub special: i32,
    pub uname: String,
    pub face: String,
    pub sign: String,
    pub official_verify: OfficialVerify,
    pub vip: MemberVip,
}

impl RelationUser {
    pub fn is_mutual(&self) -> bool {
        self.attribute == 6
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationPage {
    #[serde(deserialize_with = "null_default")]
    pub list: Vec<RelationUser>,
    #[serde(deserialize_with = "lenient_u64")]
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_page() {
        let page: RelationPage = serde_json::from_str(
            r#"{"list":[{"mid":1,"attribute":6,"mtime":1700000000,"tag":null,"uname":"a",
                         "official_verify":{"type":0,"desc":"认证"},"vip":{"vipType":1}},
                        {"mid":2,"attribute":2,"uname":"b"}],
                "re_version":0,"total":2}"#,
        )
        .unwrap();
        assert_eq!(page.total, 2);
        assert!(page.list[0].is_mutual());
        assert!(page.list[0].official_verify.is_verified());
        assert!(page.list[0].tag.is_empty());
        assert!(!page.list[1].is_mutual());
    }
}
