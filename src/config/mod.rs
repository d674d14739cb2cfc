//! Configuration for the chat client
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/zuse/config.toml)
//! 3. Built-in defaults (lowest priority)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::context::ClientSettings;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod observability;
mod serialization;
mod servers;


pub use observability::{FileLogging, LogRotation, LoggingConfig};
pub use servers::ServerPreset;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_NICK: &str = "zuse";
const DEFAULT_QUIT_MESSAGE: &str = "bye";
const DEFAULT_LEFT_PANE_WIDTH: u16 = 24;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Nick used when the form or a preset leaves it empty
    pub nick: String,

    /// Reason sent with QUIT (on /quit and when a session is deleted)
    pub quit_message: String,

    /// Width of the server list in columns
    pub left_pane_width: u16,

    /// Upper bound on connect + TLS handshake; `None` waits forever
    pub connect_timeout: Option<Duration>,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Sessions created at startup
    pub servers: Vec<ServerPreset>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nick: DEFAULT_NICK.to_string(),
            quit_message: DEFAULT_QUIT_MESSAGE.to_string(),
            left_pane_width: DEFAULT_LEFT_PANE_WIDTH,
            connect_timeout: Some(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
            logging: LoggingConfig::default(),
            servers: Vec::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub nick: Option<String>,
    pub quit_message: Option<String>,
    pub left_pane_width: Option<u16>,
    pub connect_timeout_secs: Option<u64>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,

    /// Optional [[servers]] entries
    #[serde(default)]
    pub servers: Vec<ServerPreset>,
}

/// Values taken from the environment, read once at startup
#[derive(Debug, Default)]
pub(crate) struct EnvOverrides {
    pub nick: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            nick: std::env::var("ZUSE_NICK").ok().filter(|v| !v.trim().is_empty()),
            connect_timeout_secs: std::env::var("ZUSE_CONNECT_TIMEOUT")
                .ok()
                .and_then(|v| v.trim().parse().ok()),
            log_level: std::env::var("ZUSE_LOG_LEVEL").ok(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/zuse/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("zuse").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    /// Called during startup to help users discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // config is optional
            }
        }

        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Read the config file; a missing file yields defaults
    ///
    /// A file that exists but cannot be read or parsed is an error. Falling
    /// back to defaults would hide the problem from the user.
    fn load_file_config(path: &Path) -> Result<FileConfig> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("failed to parse config file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(e) => {
                Err(e).with_context(|| format!("cannot read config file {}", path.display()))
            }
        }
    }

    /// Load configuration: env > file > defaults
    pub fn load() -> Result<Self> {
        let file = match Self::config_path() {
            Some(path) => Self::load_file_config(&path)?,
            None => FileConfig::default(),
        };
        Ok(Self::resolve(file, EnvOverrides::from_env()))
    }

    /// Merge the layers; pure so it can be tested without touching the env
    pub(crate) fn resolve(file: FileConfig, env: EnvOverrides) -> Self {
        let defaults = Self::default();

        let nick = env
            .nick
            .or(file.nick)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or(defaults.nick);

        let quit_message = file.quit_message.unwrap_or(defaults.quit_message);

        // Anything narrower than this can't show a row
        let left_pane_width = file
            .left_pane_width
            .map(|w| w.max(12))
            .unwrap_or(defaults.left_pane_width);

        // 0 disables the timeout
        let connect_timeout = match env.connect_timeout_secs.or(file.connect_timeout_secs) {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.connect_timeout,
        };

        let mut logging = LoggingConfig::from_file(file.logging);
        if let Some(level) = env.log_level {
            logging.level = level;
        }

        Self {
            nick,
            quit_message,
            left_pane_width,
            connect_timeout,
            logging,
            servers: file.servers,
        }
    }

    /// Session and connection defaults handed to the application context
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            default_nick: self.nick.clone(),
            quit_message: self.quit_message.clone(),
            connect_timeout: self.connect_timeout,
        }
    }
}
