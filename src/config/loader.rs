//! Configuration loader for RTTI-Scanner
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use crate::core::types::{OutputStyle, PointerWidth};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name
pub const CONFIG_FILE: &str = "rtti-scanner.toml";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_scanner")]
    pub scanner: ScannerConfig,

    #[serde(default = "default_target")]
    pub target: TargetConfig,

    #[serde(default = "default_output")]
    pub output: OutputConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

/// Decoder limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,
    #[serde(default = "default_max_msvc_bases")]
    pub max_msvc_bases: u32,
    #[serde(default = "default_max_itanium_bases")]
    pub max_itanium_bases: u32,
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
}

/// Target process description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Pointer size in bytes, used for live processes
    #[serde(default = "default_pointer_width")]
    pub pointer_width: u64,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_style")]
    pub style: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_show_target")]
    pub show_target: bool,
}

impl TargetConfig {
    /// Pointer width of the target
    pub fn width(&self) -> Result<PointerWidth, ConfigError> {
        PointerWidth::from_bytes(self.pointer_width).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

impl OutputConfig {
    /// Parsed output style
    pub fn style(&self) -> Result<OutputStyle, ConfigError> {
        self.style.parse().map_err(ConfigError::Invalid)
    }
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Loads configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration or returns defaults if file doesn't exist
    pub fn load_or_default(&self) -> Config {
        self.load().unwrap_or_else(|_| Config::default())
    }

    /// Saves configuration to file
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Loads configuration from the default location.
///
/// A missing file yields defaults; a present but broken file is an error.
pub fn load_config() -> Result<Config, ConfigError> {
    match ConfigLoader::new(CONFIG_FILE).load() {
        Err(ConfigError::FileNotFound(_)) => Ok(Config::default()),
        other => other,
    }
}

// Default functions for serde
fn default_scanner() -> ScannerConfig {
    ScannerConfig::default()
}

fn default_target() -> TargetConfig {
    TargetConfig {
        pointer_width: default_pointer_width(),
    }
}

fn default_output() -> OutputConfig {
    OutputConfig {
        style: default_style(),
    }
}

fn default_logging() -> LoggingConfig {
    let defaults = default_config();
    LoggingConfig {
        level: defaults.logging.level,
        show_target: defaults.logging.show_target,
    }
}

// Individual field defaults
fn default_max_name_len() -> usize {
    default_config().scanner.max_name_len
}

fn default_max_msvc_bases() -> u32 {
    default_config().scanner.max_msvc_bases
}

fn default_max_itanium_bases() -> u32 {
    default_config().scanner.max_itanium_bases
}

fn default_max_nodes() -> usize {
    default_config().scanner.max_nodes
}

fn default_pointer_width() -> u64 {
    default_config().target.pointer_width
}

fn default_style() -> String {
    default_config().output.style
}

fn default_log_level() -> String {
    default_config().logging.level
}

fn default_show_target() -> bool {
    default_config().logging.show_target
}

impl Default for ScannerConfig {
    fn default() -> Self {
        let defaults = default_config();
        ScannerConfig {
            max_name_len: defaults.scanner.max_name_len,
            max_msvc_bases: defaults.scanner.max_msvc_bases,
            max_itanium_bases: defaults.scanner.max_itanium_bases,
            max_nodes: defaults.scanner.max_nodes,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scanner: default_scanner(),
            target: default_target(),
            output: default_output(),
            logging: default_logging(),
        }
    }
}
