//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the server, channels, cache, refresh cadence, tools, and
//! transcode settings. Every section defaults sensibly so a completely empty
//! `{}` file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::ChannelConfig;
use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
    pub cache: CacheConfig,
    pub refresh: RefreshConfig,
    pub tools: ToolsConfig,
    pub transcode: TranscodeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            channels: Vec::new(),
            cache: CacheConfig::default(),
            refresh: RefreshConfig::default(),
            tools: ToolsConfig::default(),
            transcode: TranscodeConfig::default(),
        }
    }
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    ///
    /// This is intentionally string-based so the caller can read the file
    /// however it sees fit (async, embedded, etc.).
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist. Environment overrides are
    /// applied on top of whatever was loaded.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let mut config = match path {
            None => Self::default(),
            Some(path) => match std::fs::read_to_string(path) {
                Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                    tracing::warn!("Failed to parse config file {}: {e}", path.display());
                    Self::default()
                }),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::info!("No config file at {}; using defaults", path.display());
                    Self::default()
                }
                Err(e) => {
                    tracing::warn!("Failed to read config file {}: {e}", path.display());
                    Self::default()
                }
            },
        };
        config.apply_cookies_override(std::env::var("COOKIES_FILE").ok().as_deref());
        config
    }

    /// Apply the `COOKIES_FILE` environment override to the tools section.
    ///
    /// Split out from [`Config::load_or_default`] so the logic is testable
    /// without touching process environment.
    pub fn apply_cookies_override(&mut self, value: Option<&str>) {
        if let Some(path) = value {
            if !path.is_empty() {
                self.tools.cookies_file = Some(PathBuf::from(path));
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.channels.is_empty() {
            warnings.push("no channels configured; the stream index will be empty".into());
        }

        let mut seen = std::collections::HashSet::new();
        for (i, channel) in self.channels.iter().enumerate() {
            if !seen.insert(&channel.name) {
                warnings.push(format!("duplicate channel name: {}", channel.name));
            }
            if channel.url.is_empty() {
                warnings.push(format!("channels[{i}].url is empty"));
            }
        }

        if self.refresh.jitter_min_secs > self.refresh.jitter_max_secs {
            warnings.push(format!(
                "refresh.jitter_min_secs ({}) exceeds jitter_max_secs ({})",
                self.refresh.jitter_min_secs, self.refresh.jitter_max_secs
            ));
        }

        if let Some(ref cookies) = self.tools.cookies_file {
            if !cookies.exists() {
                warnings.push(format!(
                    "tools.cookies_file does not exist: {}",
                    cookies.display()
                ));
            }
        }

        if self.transcode.width == 0 || self.transcode.height == 0 {
            warnings.push("transcode output dimensions must be non-zero".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
        }
    }
}

/// On-disk cache settings for prepared renditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding one `<channel>.mp4` per prepared channel.
    pub dir: PathBuf,
    /// Age after which a cached rendition is deleted by the janitor.
    pub expire_age_secs: u64,
    /// How often the janitor sweeps the cache directory.
    pub cleanup_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir().join("tubecast"),
            expire_age_secs: 10_800,
            cleanup_interval_secs: 1_800,
        }
    }
}

impl CacheConfig {
    pub fn expire_age(&self) -> Duration {
        Duration::from_secs(self.expire_age_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

/// Background refresh cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Pause between refresh cycles over all channels.
    pub interval_secs: u64,
    /// A cached rendition older than this triggers a fresh upstream check;
    /// the rendition is rebuilt only when the newest upload changed.
    pub recheck_age_secs: u64,
    /// Lower bound of the random pause between per-channel refreshes.
    pub jitter_min_secs: u64,
    /// Upper bound of the random pause between per-channel refreshes.
    pub jitter_max_secs: u64,
    /// How long an HTTP request waits for an in-flight preparation before
    /// giving up.
    pub ready_wait_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 900,
            recheck_age_secs: 1_800,
            jitter_min_secs: 5,
            jitter_max_secs: 10,
            ready_wait_secs: 600,
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn recheck_age(&self) -> Duration {
        Duration::from_secs(self.recheck_age_secs)
    }

    pub fn ready_wait(&self) -> Duration {
        Duration::from_secs(self.ready_wait_secs)
    }
}

/// Paths and timeouts for external CLI tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub yt_dlp_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    /// Cookies file passed to yt-dlp for age-gated or member content.
    /// Overridden by the `COOKIES_FILE` environment variable.
    pub cookies_file: Option<PathBuf>,
    pub resolve_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub transcode_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: None,
            ffmpeg_path: None,
            cookies_file: None,
            resolve_timeout_secs: 120,
            download_timeout_secs: 1_800,
            transcode_timeout_secs: 1_800,
        }
    }
}

impl ToolsConfig {
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}

/// Output rendition settings.
///
/// The defaults target low-bandwidth playback devices: QVGA at 15 fps with
/// mono audio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub video_bitrate: String,
    pub audio_bitrate: String,
    pub audio_channels: u32,
    pub video_codec: String,
    pub audio_codec: String,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            fps: 15,
            video_bitrate: "384k".into(),
            audio_bitrate: "12k".into(),
            audio_channels: 1,
            video_codec: "libx264".into(),
            audio_codec: "aac".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sensible() {
        let cfg = Config::default();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8000);
        assert!(cfg.channels.is_empty());
        assert_eq!(cfg.cache.expire_age_secs, 10_800);
        assert_eq!(cfg.refresh.interval_secs, 900);
        assert_eq!(cfg.transcode.width, 320);
        assert_eq!(cfg.transcode.video_bitrate, "384k");
    }

    #[test]
    fn default_config_warns_about_empty_channels() {
        let cfg = Config::default();
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("no channels"));
    }

    #[test]
    fn parse_json_config() {
        let json = r#"{
            "server": {"port": 5000},
            "channels": [
                {"name": "qasimi", "url": "https://www.youtube.com/@qasimi/videos"}
            ]
        }"#;
        let cfg = Config::from_json(json).unwrap();
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.channels.len(), 1);
        assert_eq!(cfg.channels[0].name.as_str(), "qasimi");
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn parse_empty_json_uses_defaults() {
        let cfg = Config::from_json("{}").unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8000);
    }

    #[test]
    fn parse_rejects_invalid_channel_name() {
        let json = r#"{"channels": [{"name": "../evil", "url": "https://example.com"}]}"#;
        assert!(Config::from_json(json).is_err());
    }

    #[test]
    fn load_or_default_with_none() {
        let cfg = Config::load_or_default(None);
        assert_eq!(cfg.server.port, 8000);
    }

    #[test]
    fn load_or_default_with_missing_file() {
        let cfg = Config::load_or_default(Some(Path::new("/nonexistent/config.json")));
        assert_eq!(cfg.server.port, 8000);
    }

    #[test]
    fn cookies_override_applies_when_set() {
        let mut cfg = Config::default();
        cfg.apply_cookies_override(Some("/data/cookies.txt"));
        assert_eq!(cfg.tools.cookies_file, Some(PathBuf::from("/data/cookies.txt")));
    }

    #[test]
    fn cookies_override_ignores_empty_value() {
        let mut cfg = Config::default();
        cfg.tools.cookies_file = Some(PathBuf::from("/etc/cookies.txt"));
        cfg.apply_cookies_override(Some(""));
        assert_eq!(cfg.tools.cookies_file, Some(PathBuf::from("/etc/cookies.txt")));
        cfg.apply_cookies_override(None);
        assert_eq!(cfg.tools.cookies_file, Some(PathBuf::from("/etc/cookies.txt")));
    }

    #[test]
    fn duplicate_channel_names_warn() {
        let json = r#"{"channels": [
            {"name": "dup", "url": "https://example.com/a"},
            {"name": "dup", "url": "https://example.com/b"}
        ]}"#;
        let cfg = Config::from_json(json).unwrap();
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("duplicate channel name")));
    }

    #[test]
    fn inverted_jitter_warns() {
        let mut cfg = Config::default();
        cfg.refresh.jitter_min_secs = 30;
        cfg.refresh.jitter_max_secs = 10;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("jitter")));
    }

    #[test]
    fn missing_cookies_file_warns() {
        let mut cfg = Config::default();
        cfg.tools.cookies_file = Some(PathBuf::from("/nonexistent/cookies.txt"));
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("cookies_file")));
    }

    #[test]
    fn timeout_accessors() {
        let cfg = Config::default();
        assert_eq!(cfg.tools.resolve_timeout(), Duration::from_secs(120));
        assert_eq!(cfg.refresh.interval(), Duration::from_secs(900));
        assert_eq!(cfg.cache.expire_age(), Duration::from_secs(10_800));
    }
}
