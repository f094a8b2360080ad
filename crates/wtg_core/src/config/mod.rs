//! Configuration management.
//!
//! TOML-backed settings with atomic writes and section-level updates.

pub mod manager;
pub mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    AudioSettings, ConfigSection, DecodeSettings, DownloadSettings, EngineSettings,
    LoggingSettings, PathSettings, Settings, VadSettings,
};
