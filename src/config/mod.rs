//! Configuration for the shell
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/pocket-shell/config.toml)
//! 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod display;
mod observability;
mod palette;
mod serialization;


pub use display::{DisplayConfig, FileDisplay};
pub use observability::{FileLogging, LogRotation, LoggingConfig};
pub use palette::{FileSchemeColors, PaletteConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const APP_DIR: &str = "pocket-shell";

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    /// Where application data stores and error reports live
    pub data_dir: PathBuf,

    /// Screen, frame rate and input timing
    pub display: DisplayConfig,

    pub logging: LoggingConfig,

    /// Per-scheme colour overrides
    pub palette: PaletteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            display: DisplayConfig::default(),
            logging: LoggingConfig::default(),
            palette: PaletteConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub data_dir: Option<String>,

    /// Optional [display] section
    pub display: Option<FileDisplay>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,

    /// Optional [palette.<scheme>] sections
    #[serde(default)]
    pub palette: HashMap<String, FileSchemeColors>,
}

/// The config file exists but cannot be used
#[derive(Debug, thiserror::Error)]
#[error("Failed to load config file {}: {message}", path.display())]
pub struct ConfigError {
    pub path: PathBuf,
    pub message: String,
}

impl ConfigError {
    /// Print the boxed diagnostic the binary shows before exiting
    pub fn report(&self) {
        eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
        eprintln!("║  CONFIG ERROR - Failed to load configuration file            ║");
        eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
        eprintln!("  File: {}\n", self.path.display());
        eprintln!("  Error: {}\n", self.message);
        eprintln!("  Tip: Check for:\n");
        eprintln!("    - Missing quotes around string values");
        eprintln!("    - Invalid boolean values (use true/false)");
        eprintln!("    - Typos in section names\n");
        eprintln!("  To reset, run `pocket-shell config --reset`.\n");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/pocket-shell/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join(APP_DIR).join("config.toml"))
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
                return; // Config is optional
            }
        }
        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Overwrite the config file with the defaults
    pub fn reset() -> anyhow::Result<PathBuf> {
        use anyhow::Context;
        let path = Self::config_path().context("Cannot determine home directory")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, Self::default().to_toml())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Load file config if it exists. A file that exists but does not parse
    /// is an error: a broken config must not silently fall back to defaults.
    fn load_file_config() -> Result<FileConfig, ConfigError> {
        let Some(path) = Self::config_path() else {
            return Ok(FileConfig::default());
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).map_err(|e| ConfigError {
                path,
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(e) => Err(ConfigError {
                path,
                message: e.to_string(),
            }),
        }
    }

    /// Load configuration: env vars > file > defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let file = Self::load_file_config()?;
        Ok(Self::resolve(file, &|key| std::env::var(key).ok()))
    }

    /// Merge a parsed file with environment lookups
    pub(crate) fn resolve(file: FileConfig, env: &dyn Fn(&str) -> Option<String>) -> Self {
        let data_dir = env("POCKET_SHELL_DATA_DIR")
            .or(file.data_dir)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let display = DisplayConfig::from_file(file.display, env);
        let logging = LoggingConfig::from_file(file.logging);
        let palette = PaletteConfig::from_file(file.palette);

        Self {
            data_dir,
            display,
            logging,
            palette,
        }
    }
}
