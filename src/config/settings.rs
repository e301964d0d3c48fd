//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every field has a default, so a settings file only needs the keys it
//! wants to change.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{AppPaths, ConfigError};
use crate::classify::KeywordSet;

// ---------------------------------------------------------------------------
// DetectorConfig
// ---------------------------------------------------------------------------

/// Settings for the camera/image detection loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Camera device index used when neither `--camera` nor `--image` is given.
    pub camera_index: i64,
    /// Minimum seconds between two caption requests.
    pub interval_secs: f64,
    /// Seconds after an announcement during which further positives stay quiet.
    pub cooldown_secs: f64,
    /// Shop-indicating keywords, matched as case-insensitive substrings.
    pub keywords: KeywordSet,
    /// Phrase spoken on a positive detection.
    pub phrase: String,
    /// Open a preview window with the caption and status overlaid.
    pub show_window: bool,
    /// Accepted and logged, but not used by the classifier.
    pub threshold: Option<f32>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            interval_secs: 2.0,
            cooldown_secs: 10.0,
            keywords: KeywordSet::default(),
            phrase: "This is a shop".into(),
            show_window: true,
            threshold: None,
        }
    }
}

// ---------------------------------------------------------------------------
// CaptionConfig
// ---------------------------------------------------------------------------

/// Connection settings for the captioning model server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Base URL of an OpenAI-compatible server (`/v1/chat/completions` is appended).
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Bearer token, `None` for local servers.
    pub api_key: Option<String>,
    /// Instruction sent alongside the image.
    pub prompt: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Upper bound on caption length in tokens.
    pub max_tokens: u32,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            model: "Salesforce/blip-image-captioning-base".into(),
            api_key: None,
            prompt: "Describe this image in one short sentence.".into(),
            timeout_secs: 30,
            max_tokens: 40,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Text-to-speech command settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Program to run; `None` picks `say` (macOS) or `espeak-ng`.
    pub command: Option<String>,
    /// Extra arguments for an explicit `command`; the phrase is appended last.
    pub args: Vec<String>,
    /// Speaking rate in words per minute for the built-in commands.
    pub rate: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            rate: 175,
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// HTTP facade settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
    /// The single browser origin allowed by CORS.
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".into(),
            allowed_origin: "http://localhost:5173".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```toml
/// [detector]
/// cooldown_secs = 30.0
/// keywords = ["bakery", "deli"]
///
/// [caption]
/// base_url = "http://gpu-box:8080"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detector: DetectorConfig,
    pub caption: CaptionConfig,
    pub speech: SpeechConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load from an explicit path.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// so callers never need to special-case a missing file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file named on the command line, or the default location.
    ///
    /// An explicitly named file must exist; the default one may be absent.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigError::Settings {
                    path: path.to_path_buf(),
                    reason: "file not found".into(),
                })
            }
            Some(path) => path.to_path_buf(),
            None => AppPaths::new().settings_file,
        };

        let config = Self::load_from(&path).map_err(|e| ConfigError::Settings {
            path: path.clone(),
            reason: format!("{e:#}"),
        })?;
        if path.exists() {
            log::info!("config: loaded {}", path.display());
        }
        Ok(config)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let mut original = AppConfig::default();
        original.detector.keywords = KeywordSet::parse("bakery,deli");
        original.detector.threshold = Some(0.4);
        original.caption.api_key = Some("sk-test".into());
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.detector.keywords, original.detector.keywords);
        assert_eq!(loaded.detector.interval_secs, original.detector.interval_secs);
        assert_eq!(loaded.detector.cooldown_secs, original.detector.cooldown_secs);
        assert_eq!(loaded.detector.phrase, original.detector.phrase);
        assert_eq!(loaded.detector.threshold, Some(0.4));
        assert_eq!(loaded.caption.base_url, original.caption.base_url);
        assert_eq!(loaded.caption.api_key.as_deref(), Some("sk-test"));
        assert_eq!(loaded.speech.rate, original.speech.rate);
        assert_eq!(loaded.server.bind, original.server.bind);
        assert_eq!(loaded.server.allowed_origin, original.server.allowed_origin);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.detector.phrase, default.detector.phrase);
        assert_eq!(config.detector.keywords, default.detector.keywords);
        assert_eq!(config.caption.model, default.caption.model);
        assert_eq!(config.server.bind, default.server.bind);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "[detector]\ncooldown_secs = 30.0\nkeywords = [\"Bakery\", \" deli \"]\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.detector.cooldown_secs, 30.0);
        assert_eq!(config.detector.keywords.as_slice(), ["bakery", "deli"]);
        assert_eq!(config.detector.interval_secs, 2.0);
        assert_eq!(config.speech.rate, 175);
        assert_eq!(config.server.allowed_origin, "http://localhost:5173");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[detector\ncooldown_secs = ").unwrap();

        assert!(AppConfig::load_from(&path).is_err());
        let err = AppConfig::resolve(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Settings { .. }));
    }

    #[test]
    fn resolve_rejects_missing_explicit_file() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("absent.toml");
        let err = AppConfig::resolve(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn default_speech_and_server_values() {
        let config = AppConfig::default();
        assert_eq!(config.speech.command, None);
        assert_eq!(config.speech.rate, 175);
        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert_eq!(config.detector.threshold, None);
        assert!(config.detector.show_window);
    }
}
