use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bili_catalog::ClientConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::OutputFormat;

const APP_DIR: &str = "bili";
const CONFIG_FILE: &str = "config.toml";
const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default output format
    pub output: OutputFormat,
    /// Colourise pretty output
    pub colored: bool,
    /// Session cookies, "SESSDATA=...; bili_jct=..."
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<String>,
    pub client: ClientConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output: OutputFormat::Pretty,
            colored: true,
            cookies: None,
            client: ClientConfig::default(),
        }
    }
}

impl AppConfig {
    /// The given path, or the default location under the user's config directory.
    pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
                .context("could not determine the user config directory"),
        }
    }

    /// Danmaku settings live next to the config file.
    pub fn settings_path(config_path: &Path) -> PathBuf {
        config_path.with_file_name(SETTINGS_FILE)
    }

    /// Load the config, using defaults when the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config
            .client
            .validate()
            .with_context(|| format!("invalid client section in {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let text = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn reset(path: &Path) -> Result<()> {
        Self::default().save(path)
    }

    /// Run `config --show/--reset` and return the message to print.
    ///
    /// Resetting never reads the existing file, so it also repairs a corrupt one.
    pub fn run_command(path: &Path, show: bool, reset: bool) -> Result<String> {
        if reset {
            Self::reset(path)?;
            Ok(format!("✓ Configuration reset to defaults ({})", path.display()))
        } else if show {
            Self::load(path)?.show()
        } else {
            Ok("Use --show to display current configuration or --reset to reset to defaults".to_string())
        }
    }

    /// TOML rendering for display, with the cookies masked.
    pub fn show(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.cookies.is_some() {
            shown.cookies = Some("<hidden>".to_string());
        }
        toml::to_string_pretty(&shown).context("failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = AppConfig::default();
        config.output = OutputFormat::Json;
        config.cookies = Some("SESSDATA=abc; bili_jct=t".into());
        config.client.timeout_secs = 5;
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "output = \"json-compact\"\n[client]\ntimeout_secs = 3\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.output, OutputFormat::JsonCompact);
        assert!(config.colored);
        assert_eq!(config.client.timeout_secs, 3);
        assert_eq!(config.client.api_base, ClientConfig::default().api_base);
    }

    #[test]
    fn test_invalid_client_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[client]\napi_base = \"ftp://nope\"\n").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn test_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "colored = false\n").unwrap();

        AppConfig::reset(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_reset_repairs_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "output = [not toml").unwrap();
        assert!(AppConfig::load(&path).is_err());
        assert!(AppConfig::run_command(&path, true, false).is_err());

        let message = AppConfig::run_command(&path, false, true).unwrap();
        assert!(message.contains("reset to defaults"));
        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_show_hides_cookies() {
        let config = AppConfig {
            cookies: Some("SESSDATA=secret".into()),
            ..Default::default()
        };
        let shown = config.show().unwrap();
        assert!(!shown.contains("secret"));
        assert!(shown.contains("<hidden>"));
    }

    #[test]
    fn test_settings_path_is_sibling() {
        let path = AppConfig::settings_path(Path::new("/tmp/bili/config.toml"));
        assert_eq!(path, Path::new("/tmp/bili/settings.toml"));
    }
}
