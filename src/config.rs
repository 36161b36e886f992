//! Persistent configuration handling for TextLens.
//!
//! Persists configuration in a JSON file:
//! `~/.config/textlens/config.json`.
//!
//! Every field is optional on disk; [`AppConfig::resolve`] fills in defaults. The API key falls
//! back to the `GEMINI_API_KEY` environment variable when the file has none.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dirs::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::camera::{CameraRequest, FacingMode};
use crate::crop::Size;
use crate::extraction::{DEFAULT_BASE_URL, DEFAULT_MODEL};

const APP_CONFIG_DIR_NAME: &str = "textlens";
const CONFIG_FILE_NAME: &str = "config.json";
const API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_JPEG_QUALITY: u8 = 90;
const DEFAULT_DISPLAY: Size = Size {
    width: 400.0,
    height: 800.0,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No config directory available on this platform")]
    NoConfigDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ERROR" => Some(Self::Error),
            "WARN" | "WARNING" => Some(Self::Warn),
            "INFO" => Some(Self::Info),
            "DEBUG" => Some(Self::Debug),
            "TRACE" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }

    /// Directive for `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct RawConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub facing_mode: Option<String>,
    #[serde(default)]
    pub ideal_width: Option<u32>,
    #[serde(default)]
    pub ideal_height: Option<u32>,
    #[serde(default)]
    pub display_width: Option<f64>,
    #[serde(default)]
    pub display_height: Option<f64>,
    #[serde(default)]
    pub jpeg_quality: Option<u8>,
    #[serde(default)]
    pub frame_source: Option<String>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub log_level: LogLevel,
    pub camera: CameraRequest,
    pub display: Size,
    pub jpeg_quality: u8,
    pub frame_source: Option<PathBuf>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl AppConfig {
    /// Applies defaults to `raw`. `env_api_key` is used only when the file has no key.
    pub fn resolve(raw: RawConfig, env_api_key: Option<String>) -> Self {
        let defaults = CameraRequest::default();

        let facing = match non_empty(raw.facing_mode) {
            Some(s) => FacingMode::from_str(&s).unwrap_or_else(|| {
                warn!(facing_mode = %s, "Unknown facing mode, using default");
                defaults.facing
            }),
            None => defaults.facing,
        };

        let display = match (raw.display_width, raw.display_height) {
            (Some(width), Some(height)) if !Size::new(width, height).is_empty() => {
                Size::new(width, height)
            }
            (None, None) => DEFAULT_DISPLAY,
            (width, height) => {
                warn!(?width, ?height, "Invalid display size, using default");
                DEFAULT_DISPLAY
            }
        };

        Self {
            api_key: non_empty(raw.api_key).or_else(|| non_empty(env_api_key)),
            model: non_empty(raw.model).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base_url: non_empty(raw.api_base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(
                raw.request_timeout_secs
                    .filter(|s| *s > 0)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            log_level: raw
                .log_level
                .as_deref()
                .and_then(LogLevel::from_str)
                .unwrap_or_default(),
            camera: CameraRequest {
                facing,
                ideal_width: raw.ideal_width.filter(|w| *w > 0).unwrap_or(defaults.ideal_width),
                ideal_height: raw
                    .ideal_height
                    .filter(|h| *h > 0)
                    .unwrap_or(defaults.ideal_height),
            },
            display,
            jpeg_quality: raw
                .jpeg_quality
                .map(|q| q.clamp(1, 100))
                .unwrap_or(DEFAULT_JPEG_QUALITY),
            frame_source: non_empty(raw.frame_source).map(PathBuf::from),
        }
    }
}

fn config_path() -> Option<PathBuf> {
    let path = config_dir()?
        .join(APP_CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME);
    Some(path)
}

fn ensure_config_dir_exists(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Reads the file without logging. `None` means there is no file yet.
fn read_raw_config(path: &Path) -> Result<Option<RawConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}

fn load_raw_config_from(path: &Path) -> Result<RawConfig, ConfigError> {
    read_raw_config(path).map(Option::unwrap_or_default)
}

/// Logs how the file was read and falls back to defaults on any error.
fn report_load(path: Option<&Path>, outcome: Result<Option<RawConfig>, ConfigError>) -> RawConfig {
    let Some(path) = path else {
        debug!("No config_dir available, using defaults only");
        return RawConfig::default();
    };
    match outcome {
        Ok(Some(cfg)) => {
            debug!(?path, "Config loaded");
            cfg
        }
        Ok(None) => {
            debug!(?path, "Config file does not exist, using defaults");
            RawConfig::default()
        }
        Err(err) => {
            warn!(?path, error = %err, "Failed to load existing config, starting fresh");
            RawConfig::default()
        }
    }
}

fn save_raw_config_to(path: &Path, mut cfg: RawConfig) -> Result<(), ConfigError> {
    ensure_config_dir_exists(path)?;
    cfg.api_key = non_empty(cfg.api_key);
    cfg.model = non_empty(cfg.model);
    cfg.api_base_url = non_empty(cfg.api_base_url);
    cfg.log_level = non_empty(cfg.log_level);
    cfg.facing_mode = non_empty(cfg.facing_mode);
    cfg.frame_source = non_empty(cfg.frame_source);

    let data = serde_json::to_string_pretty(&cfg)?;
    fs::write(path, data)?;
    debug!(?path, "Config saved");
    Ok(())
}

fn load_or_default_config_from(path: &Path) -> RawConfig {
    report_load(Some(path), read_raw_config(path))
}

/// The config file as read at start-up, held until logging is installed.
///
/// Reading happens before the subscriber exists because the file picks the log level; the
/// outcome is reported by [`ConfigLoad::finish`].
#[derive(Debug)]
pub struct ConfigLoad {
    path: Option<PathBuf>,
    outcome: Result<Option<RawConfig>, ConfigError>,
}

impl ConfigLoad {
    pub fn read() -> Self {
        Self::read_from(config_path())
    }

    fn read_from(path: Option<PathBuf>) -> Self {
        let outcome = match &path {
            Some(path) => read_raw_config(path),
            None => Ok(None),
        };
        Self { path, outcome }
    }

    /// Log level the file asks for. Unreadable files and unknown levels give the default.
    pub fn log_level(&self) -> LogLevel {
        match &self.outcome {
            Ok(Some(raw)) => raw
                .log_level
                .as_deref()
                .and_then(LogLevel::from_str)
                .unwrap_or_default(),
            _ => LogLevel::default(),
        }
    }

    /// Logs the load outcome and resolves the configuration. Never fails.
    pub fn finish(self) -> AppConfig {
        let env_api_key = std::env::var(API_KEY_ENV).ok();
        self.finish_with(env_api_key)
    }

    fn finish_with(self, env_api_key: Option<String>) -> AppConfig {
        let raw = report_load(self.path.as_deref(), self.outcome);
        AppConfig::resolve(raw, env_api_key)
    }
}

fn save_api_key_to(path: &Path, key: &str) -> Result<(), ConfigError> {
    let mut cfg = load_or_default_config_from(path);
    cfg.api_key = Some(key.to_string());
    save_raw_config_to(path, cfg)
}

/// Stores the API key, keeping every other field. An empty key removes it.
pub fn save_api_key(key: &str) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_api_key_to(&path, key)
}
