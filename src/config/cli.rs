//! Command-line arguments for both binaries (`clap` derive).
//!
//! Every flag is optional: anything left unset falls back to the settings
//! file, and from there to the built-in defaults.

use std::path::PathBuf;

use clap::{Args, Parser};

use super::CaptionConfig;

/// Caption server flags shared by both binaries.
#[derive(Debug, Clone, Default, Args)]
pub struct CaptionArgs {
    /// Base URL of the OpenAI-compatible captioning server
    #[arg(long, env = "SHOP_DETECTOR_CAPTION_URL")]
    pub caption_url: Option<String>,

    /// Captioning model name
    #[arg(long, env = "SHOP_DETECTOR_CAPTION_MODEL")]
    pub caption_model: Option<String>,

    /// Bearer token for the captioning server
    #[arg(long, env = "SHOP_DETECTOR_CAPTION_API_KEY", hide_env_values = true)]
    pub caption_api_key: Option<String>,
}

impl CaptionArgs {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut CaptionConfig) {
        if let Some(url) = &self.caption_url {
            config.base_url = url.clone();
        }
        if let Some(model) = &self.caption_model {
            config.model = model.clone();
        }
        if let Some(key) = &self.caption_api_key {
            config.api_key = Some(key.clone());
        }
    }
}

/// Watch a camera (or inspect one image) and announce shops out loud.
#[derive(Debug, Parser)]
#[command(name = "shop-detector", version)]
pub struct DetectArgs {
    /// Camera device index [default: 0]
    #[arg(long, allow_negative_numbers = true, conflicts_with = "image")]
    pub camera: Option<i64>,

    /// Classify a single image file instead of a camera feed
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Seconds between announcements [default: 10]
    #[arg(long, allow_negative_numbers = true)]
    pub cooldown: Option<f64>,

    /// Minimum seconds between caption requests [default: 2]
    #[arg(long, allow_negative_numbers = true)]
    pub interval: Option<f64>,

    /// Comma-separated keywords that indicate a shop
    #[arg(long)]
    pub keywords: Option<String>,

    /// Phrase to speak on detection [default: "This is a shop"]
    #[arg(long)]
    pub say: Option<String>,

    /// Reserved; accepted but currently unused
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Do not open a preview window
    #[arg(long)]
    pub no_window: bool,

    /// Settings file to load instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub caption: CaptionArgs,
}

/// Serve shop detection over HTTP.
#[derive(Debug, Parser)]
#[command(name = "shop-detector-server", version)]
pub struct ServeArgs {
    /// Address to listen on [default: 127.0.0.1:8000]
    #[arg(long, env = "SHOP_DETECTOR_BIND")]
    pub bind: Option<String>,

    /// Browser origin allowed by CORS [default: http://localhost:5173]
    #[arg(long, env = "SHOP_DETECTOR_ALLOWED_ORIGIN")]
    pub allowed_origin: Option<String>,

    /// Comma-separated keywords that indicate a shop
    #[arg(long)]
    pub keywords: Option<String>,

    /// Settings file to load instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub caption: CaptionArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_and_image_conflict() {
        let err = DetectArgs::try_parse_from(["shop-detector", "--camera", "0", "--image", "a.jpg"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_all_detect_flags() {
        let args = DetectArgs::try_parse_from([
            "shop-detector",
            "--camera",
            "2",
            "--cooldown",
            "5",
            "--interval",
            "0.5",
            "--keywords",
            "bakery,deli",
            "--say",
            "Shop ahead",
            "--threshold",
            "0.3",
            "--no-window",
            "--caption-url",
            "http://gpu:8080",
        ])
        .unwrap();

        assert_eq!(args.camera, Some(2));
        assert_eq!(args.cooldown, Some(5.0));
        assert_eq!(args.interval, Some(0.5));
        assert_eq!(args.keywords.as_deref(), Some("bakery,deli"));
        assert_eq!(args.say.as_deref(), Some("Shop ahead"));
        assert_eq!(args.threshold, Some(0.3));
        assert!(args.no_window);
        assert_eq!(args.caption.caption_url.as_deref(), Some("http://gpu:8080"));
    }

    #[test]
    fn negative_camera_index_reaches_validation() {
        let args = DetectArgs::try_parse_from(["shop-detector", "--camera", "-1"]).unwrap();
        assert_eq!(args.camera, Some(-1));
    }

    #[test]
    fn caption_args_override_only_given_fields() {
        let mut config = CaptionConfig::default();
        let args = CaptionArgs {
            caption_model: Some("florence-2".into()),
            ..CaptionArgs::default()
        };
        args.apply(&mut config);
        assert_eq!(config.model, "florence-2");
        assert_eq!(config.base_url, CaptionConfig::default().base_url);
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn serve_args_parse() {
        let args = ServeArgs::try_parse_from([
            "shop-detector-server",
            "--bind",
            "0.0.0.0:9000",
            "--allowed-origin",
            "https://example.org",
        ])
        .unwrap();
        assert_eq!(args.bind.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(args.allowed_origin.as_deref(), Some("https://example.org"));
    }
}
