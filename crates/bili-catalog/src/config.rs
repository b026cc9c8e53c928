use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CatalogError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.bilibili.com";
pub const DEFAULT_LIVE_BASE: &str = "https://api.live.bilibili.com";
pub const DEFAULT_REFERER: &str = "https://www.bilibili.com";
pub const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Connection settings for [`CatalogClient`](crate::CatalogClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base: String,
    pub live_base: String,
    pub user_agent: String,
    pub referer: String,
    /// Per-request timeout, applied by the transport
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            live_base: DEFAULT_LIVE_BASE.to_string(),
            user_agent: DEFAULT_UA.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn api_base_url(&self) -> Result<Url> {
        parse_base(&self.api_base)
    }

    pub fn live_base_url(&self) -> Result<Url> {
        parse_base(&self.live_base)
    }

    /// Check that every field is usable.
    pub fn validate(&self) -> Result<()> {
        self.api_base_url()?;
        self.live_base_url()?;
        if self.timeout_secs == 0 {
            return Err(CatalogError::configuration("timeout_secs must be positive"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(CatalogError::configuration("user_agent must not be empty"));
        }
        Ok(())
    }
}

/// Parse a base URL so that relative endpoint paths join below it.
fn parse_base(base: &str) -> Result<Url> {
    let mut base = base.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let url = Url::parse(&base)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CatalogError::configuration(format!(
            "unsupported scheme in base url: {}",
            url.scheme()
        )));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClientConfig::default();
        config.validate().unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_base_keeps_path_prefix() {
        let config = ClientConfig {
            api_base: "http://127.0.0.1:8080/proxy".into(),
            ..Default::default()
        };
        let url = config.api_base_url().unwrap().join("x/web-interface/nav").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/proxy/x/web-interface/nav");
    }

    #[test]
    fn test_invalid_base() {
        let config = ClientConfig {
            live_base: "ftp://example.com".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CatalogError::Configuration(_))
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"timeout_secs": 5}"#).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }
}
