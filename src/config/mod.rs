//! Configuration module for the shop detector.
//!
//! Provides `AppConfig` (settings file, one sub-config per subsystem),
//! `AppPaths` for the cross-platform settings location, the `clap` argument
//! structs for both binaries, and the validated `RunConfig` / `ServeConfig`
//! records built from them at startup.

pub mod cli;
pub mod error;
pub mod paths;
pub mod run;
pub mod settings;

pub use cli::{CaptionArgs, DetectArgs, ServeArgs};
pub use error::ConfigError;
pub use paths::AppPaths;
pub use run::{Mode, RunConfig, ServeConfig};
pub use settings::{AppConfig, CaptionConfig, DetectorConfig, ServerConfig, SpeechConfig};
