//! WBI request signing for the web endpoints that require it.
//!
//! The signing keys are published (as image file names) in the `wbi_img` block
//! of the `nav` endpoint and rotate daily. Each client keeps its own copy for
//! two hours.

use std::future::Future;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use md5::Digest;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{CatalogError, Result};

const CACHE_EXPIRATION: Duration = Duration::from_secs(2 * 60 * 60);

const MIXIN_KEY_ENC_TAB: [usize; 64] = [
    46, 47, 18, 2, 53, 8, 23, 32, 15, 50, 10, 31, 58, 3, 45, 35, 27, 43, 5, 49, 33, 9, 42, 19, 29,
    28, 14, 39, 12, 38, 41, 13, 37, 48, 7, 16, 24, 55, 40, 61, 26, 17, 0, 1, 60, 51, 30, 4, 22, 25,
    54, 21, 56, 59, 6, 63, 57, 62, 11, 36, 20, 34, 44, 52,
];

/// `wbi_img` block of the `nav` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WbiImg {
    pub img_url: String,
    pub sub_url: String,
}

#[derive(Clone, Debug)]
pub struct WbiKeys {
    img_key: String,
    sub_key: String,
    fetched_at: Instant,
}

impl WbiKeys {
    pub fn new(img_key: impl Into<String>, sub_key: impl Into<String>) -> Self {
        Self {
            img_key: img_key.into(),
            sub_key: sub_key.into(),
            fetched_at: Instant::now(),
        }
    }

    /// Keys from the image URLs of a `wbi_img` block.
    pub fn from_img(img: &WbiImg) -> Option<Self> {
        let img_key = take_filename(&img.img_url)?;
        let sub_key = take_filename(&img.sub_url)?;
        Some(Self::new(img_key, sub_key))
    }

    fn is_stale(&self) -> bool {
        self.fetched_at.elapsed() > CACHE_EXPIRATION
    }

    pub fn mixin_key(&self) -> String {
        get_mixin_key((self.img_key.clone() + &self.sub_key).as_bytes())
    }
}

/// Per-client key cache. Concurrent callers wait for a single refresh.
#[derive(Debug, Default)]
pub(crate) struct WbiCache {
    keys: Mutex<Option<WbiKeys>>,
}

impl WbiCache {
    pub(crate) async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<WbiKeys>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<WbiKeys>>,
    {
        let mut guard = self.keys.lock().await;
        if let Some(keys) = guard.as_ref().filter(|k| !k.is_stale()) {
            return Ok(keys.clone());
        }

        debug!("Refreshing WBI keys");
        let keys = fetch().await?;
        *guard = Some(keys.clone());
        Ok(keys)
    }

    /// Drop the cached keys, e.g. after the service rejected a signature.
    pub(crate) async fn invalidate(&self) {
        self.keys.lock().await.take();
    }
}

// 对 imgKey 和 subKey 进行字符顺序打乱编码
fn get_mixin_key(orig: &[u8]) -> String {
    MIXIN_KEY_ENC_TAB
        .iter()
        .take(32)
        .filter_map(|&i| orig.get(i))
        .map(|&b| b as char)
        .collect::<String>()
}

fn get_url_encoded(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '~' => {
                encoded.push(c);
            }
            // stripped by the web client before signing
            '!' | '\'' | '(' | ')' | '*' => {}
            _ => {
                let mut buf = [0; 4];
                for b in c.encode_utf8(&mut buf).bytes() {
                    encoded.push_str(&format!("%{b:02X}"));
                }
            }
        }
    }
    encoded
}

/// Sign `params` with the current time, returning the full query string
/// (including `wts` and `w_rid`).
pub fn sign_query(params: Vec<(&str, String)>, keys: &WbiKeys) -> Result<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| CatalogError::configuration("system clock is before the unix epoch"))?;
    Ok(encode_wbi(
        params,
        (&keys.img_key, &keys.sub_key),
        now.as_secs(),
    ))
}

fn encode_wbi(
    mut params: Vec<(&str, String)>,
    (img_key, sub_key): (&str, &str),
    timestamp: u64,
) -> String {
    let mixin_key = get_mixin_key((img_key.to_owned() + sub_key).as_bytes());
    params.push(("wts", timestamp.to_string()));
    params.sort_by(|a, b| a.0.cmp(b.0));
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", get_url_encoded(k), get_url_encoded(v)))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = md5::Md5::new();
    hasher.update(query.clone() + &mixin_key);
    let web_sign = format!("{:x}", hasher.finalize());
    query + &format!("&w_rid={web_sign}")
}

fn take_filename(url: &str) -> Option<String> {
    url.rsplit_once('/')
        .and_then(|(_, s)| s.rsplit_once('.'))
        .map(|(s, _)| s.to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const IMG_KEY: &str = "7cd084941338484aae1ad9425b84077c";
    const SUB_KEY: &str = "4932caff0ff746eab6f01bf08b70ac45";

    #[test]
    fn test_take_filename() {
        assert_eq!(
            take_filename("https://i0.hdslb.com/bfs/wbi/7cd084941338484aae1ad9425b84077c.png"),
            Some(IMG_KEY.to_string())
        );
        assert_eq!(take_filename("no-slash"), None);
        assert_eq!(take_filename("https://i0.hdslb.com/bfs/wbi/.png"), None);
    }

    #[test]
    fn test_mixin_key() {
        let keys = WbiKeys::new(IMG_KEY, SUB_KEY);
        assert_eq!(keys.mixin_key(), "ea1db124af3c7062474693fa704f4ff8");
    }

    #[test]
    fn test_short_keys_do_not_panic() {
        assert!(get_mixin_key(b"short").len() < 32);
    }

    #[test]
    fn test_encode_wbi() {
        let params = vec![
            ("foo", String::from("114")),
            ("bar", String::from("514")),
            ("zab", String::from("1919810")),
        ];
        assert_eq!(
            encode_wbi(params, (IMG_KEY, SUB_KEY), 1702204169),
            "bar=514&foo=114&wts=1702204169&zab=1919810&w_rid=8f6f2b5b3d485fe1886cec6a0be8c5d4"
        );
    }

    #[test]
    fn test_url_encoding() {
        assert_eq!(get_url_encoded("a b!(c)*'"), "a%20bc");
        assert_eq!(get_url_encoded("中"), "%E4%B8%AD");
    }

    #[test]
    fn test_keys_from_img() {
        let img = WbiImg {
            img_url: format!("https://i0.hdslb.com/bfs/wbi/{IMG_KEY}.png"),
            sub_url: format!("https://i0.hdslb.com/bfs/wbi/{SUB_KEY}.png"),
        };
        let keys = WbiKeys::from_img(&img).unwrap();
        assert_eq!(keys.mixin_key(), "ea1db124af3c7062474693fa704f4ff8");
        assert!(WbiKeys::from_img(&WbiImg::default()).is_none());
    }

    #[tokio::test]
    async fn test_cache_fetches_once() {
        let cache = WbiCache::default();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            cache
                .get_or_fetch(|| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(WbiKeys::new(IMG_KEY, SUB_KEY))
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.invalidate().await;
        cache
            .get_or_fetch(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(WbiKeys::new(IMG_KEY, SUB_KEY))
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_does_not_store_failures() {
        let cache = WbiCache::default();
        let result = cache
            .get_or_fetch(|| async { Err(CatalogError::decode("nav", "missing wbi_img")) })
            .await;
        assert!(result.is_err());

        let keys = cache
            .get_or_fetch(|| async { Ok(WbiKeys::new(IMG_KEY, SUB_KEY)) })
            .await
            .unwrap();
        assert_eq!(keys.mixin_key(), "ea1db124af3c7062474693fa704f4ff8");
    }
}
