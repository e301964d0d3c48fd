//! Validated run configuration.
//!
//! The binaries merge CLI flags over the settings file exactly once and hand
//! the result to the core as a [`RunConfig`] or [`ServeConfig`].  Nothing past
//! this point reads CLI state.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use super::cli::{DetectArgs, ServeArgs};
use super::{AppConfig, CaptionConfig, ConfigError, SpeechConfig};
use crate::classify::KeywordSet;

/// Where frames come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Camera { index: i32 },
    Image { path: PathBuf },
}

/// Everything the camera loop needs, already validated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: Mode,
    pub interval: Duration,
    pub cooldown: Duration,
    pub keywords: KeywordSet,
    pub phrase: String,
    pub show_window: bool,
    /// Reserved.  Stored and logged, never consulted.
    pub threshold: Option<f32>,
    pub caption: CaptionConfig,
    pub speech: SpeechConfig,
}

impl RunConfig {
    /// Merge `args` over `file` and validate the result.
    pub fn from_args(args: &DetectArgs, file: AppConfig) -> Result<Self, ConfigError> {
        let AppConfig {
            detector,
            mut caption,
            speech,
            ..
        } = file;

        let mode = match &args.image {
            Some(path) => Mode::Image { path: path.clone() },
            None => Mode::Camera {
                index: camera_index(args.camera.unwrap_or(detector.camera_index))?,
            },
        };

        let interval_secs = args.interval.unwrap_or(detector.interval_secs);
        let interval = match Duration::try_from_secs_f64(interval_secs) {
            Ok(interval) if !interval.is_zero() => interval,
            _ => return Err(ConfigError::InvalidInterval(interval_secs)),
        };

        let cooldown_secs = args.cooldown.unwrap_or(detector.cooldown_secs);
        let cooldown = Duration::try_from_secs_f64(cooldown_secs)
            .map_err(|_| ConfigError::InvalidCooldown(cooldown_secs))?;

        let keywords = args
            .keywords
            .as_deref()
            .map(KeywordSet::parse)
            .unwrap_or(detector.keywords);

        args.caption.apply(&mut caption);

        Ok(Self {
            mode,
            interval,
            cooldown,
            keywords,
            phrase: args.say.clone().unwrap_or(detector.phrase),
            show_window: detector.show_window && !args.no_window,
            threshold: args.threshold.or(detector.threshold),
            caption,
            speech,
        })
    }

    /// One-time startup summary.
    pub fn log_summary(&self) {
        match &self.mode {
            Mode::Camera { index } => log::info!("config: camera {index}"),
            Mode::Image { path } => log::info!("config: image {}", path.display()),
        }
        log::info!(
            "config: interval={:.1}s cooldown={:.1}s phrase={:?} window={}",
            self.interval.as_secs_f64(),
            self.cooldown.as_secs_f64(),
            self.phrase,
            self.show_window
        );
        log_keywords(&self.keywords);
        if let Some(threshold) = self.threshold {
            log::info!("config: threshold={threshold} is reserved and has no effect");
        }
    }
}

/// Everything the HTTP facade needs, already validated.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub allowed_origin: String,
    pub keywords: KeywordSet,
    pub caption: CaptionConfig,
}

impl ServeConfig {
    /// Merge `args` over `file` and validate the result.
    pub fn from_args(args: &ServeArgs, file: AppConfig) -> Result<Self, ConfigError> {
        let AppConfig {
            detector,
            mut caption,
            server,
            ..
        } = file;

        let addr = args.bind.clone().unwrap_or(server.bind);
        let bind = addr.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidBind {
                addr: addr.clone(),
                reason: e.to_string(),
            }
        })?;

        let allowed_origin = args.allowed_origin.clone().unwrap_or(server.allowed_origin);
        if allowed_origin.trim().is_empty() {
            return Err(ConfigError::InvalidOrigin(allowed_origin));
        }

        args.caption.apply(&mut caption);

        let keywords = args
            .keywords
            .as_deref()
            .map(KeywordSet::parse)
            .unwrap_or(detector.keywords);
        log_keywords(&keywords);

        Ok(Self {
            bind,
            allowed_origin,
            keywords,
            caption,
        })
    }
}

fn camera_index(raw: i64) -> Result<i32, ConfigError> {
    i32::try_from(raw)
        .ok()
        .filter(|index| *index >= 0)
        .ok_or(ConfigError::InvalidCamera(raw))
}

fn log_keywords(keywords: &KeywordSet) {
    if keywords.is_empty() {
        log::warn!("config: keyword list is empty; nothing will ever be classified as a shop");
    } else {
        log::info!("config: {} keywords", keywords.len());
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn detect(argv: &[&str]) -> Result<RunConfig, ConfigError> {
        let mut full = vec!["shop-detector"];
        full.extend_from_slice(argv);
        RunConfig::from_args(&DetectArgs::try_parse_from(full).unwrap(), AppConfig::default())
    }

    #[test]
    fn defaults_select_camera_zero() {
        let config = detect(&[]).unwrap();
        assert_eq!(config.mode, Mode::Camera { index: 0 });
        assert_eq!(config.interval, Duration::from_secs(2));
        assert_eq!(config.cooldown, Duration::from_secs(10));
        assert_eq!(config.phrase, "This is a shop");
        assert_eq!(config.keywords, KeywordSet::default());
        assert!(config.show_window);
        assert_eq!(config.threshold, None);
    }

    #[test]
    fn image_mode_and_overrides() {
        let config = detect(&[
            "--image",
            "shop.jpg",
            "--keywords",
            "bakery,deli",
            "--say",
            "Shop!",
            "--no-window",
            "--threshold",
            "0.7",
        ])
        .unwrap();
        assert_eq!(config.mode, Mode::Image { path: "shop.jpg".into() });
        assert_eq!(config.keywords.as_slice(), ["bakery", "deli"]);
        assert_eq!(config.phrase, "Shop!");
        assert!(!config.show_window);
        assert_eq!(config.threshold, Some(0.7));
    }

    #[test]
    fn negative_camera_is_rejected() {
        assert!(matches!(detect(&["--camera", "-1"]), Err(ConfigError::InvalidCamera(-1))));
    }

    #[test]
    fn oversized_camera_is_rejected() {
        let huge = (i64::from(i32::MAX) + 1).to_string();
        assert!(matches!(detect(&["--camera", &huge]), Err(ConfigError::InvalidCamera(_))));
    }

    #[test]
    fn non_positive_interval_is_rejected() {
        assert!(matches!(detect(&["--interval", "0"]), Err(ConfigError::InvalidInterval(_))));
        assert!(matches!(detect(&["--interval", "-2"]), Err(ConfigError::InvalidInterval(_))));
    }

    #[test]
    fn negative_cooldown_is_rejected_but_zero_is_fine() {
        assert!(matches!(detect(&["--cooldown", "-1"]), Err(ConfigError::InvalidCooldown(_))));
        assert_eq!(detect(&["--cooldown", "0"]).unwrap().cooldown, Duration::ZERO);
    }

    #[test]
    fn out_of_range_durations_are_config_errors() {
        assert!(matches!(
            detect(&["--interval", "1e300"]),
            Err(ConfigError::InvalidInterval(_))
        ));
        assert!(matches!(
            detect(&["--interval", "1e-12"]),
            Err(ConfigError::InvalidInterval(_))
        ));
        assert!(matches!(
            detect(&["--cooldown", "1e300"]),
            Err(ConfigError::InvalidCooldown(_))
        ));
        assert!(matches!(detect(&["--cooldown", "inf"]), Err(ConfigError::InvalidCooldown(_))));
        assert!(detect(&["--cooldown", "1.5e19"]).is_ok());
    }

    #[test]
    fn empty_keyword_list_is_allowed() {
        let config = detect(&["--keywords", " , ,"]).unwrap();
        assert!(config.keywords.is_empty());
    }

    #[test]
    fn cli_wins_over_settings_file() {
        let mut file = AppConfig::default();
        file.detector.cooldown_secs = 30.0;
        file.detector.interval_secs = 4.0;
        file.caption.model = "from-file".into();

        let args = DetectArgs::try_parse_from([
            "shop-detector",
            "--cooldown",
            "3",
            "--caption-model",
            "from-cli",
        ])
        .unwrap();
        let config = RunConfig::from_args(&args, file).unwrap();

        assert_eq!(config.cooldown, Duration::from_secs(3));
        assert_eq!(config.interval, Duration::from_secs(4));
        assert_eq!(config.caption.model, "from-cli");
    }

    #[test]
    fn serve_defaults() {
        let args = ServeArgs::try_parse_from(["shop-detector-server"]).unwrap();
        let config = ServeConfig::from_args(&args, AppConfig::default()).unwrap();
        assert_eq!(config.bind, "127.0.0.1:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.allowed_origin, "http://localhost:5173");
        assert_eq!(config.keywords, KeywordSet::default());
    }

    #[test]
    fn serve_rejects_bad_bind() {
        let args = ServeArgs::try_parse_from(["shop-detector-server", "--bind", "nowhere"]).unwrap();
        let err = ServeConfig::from_args(&args, AppConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBind { .. }));
    }
}
