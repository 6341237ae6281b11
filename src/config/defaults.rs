//! Default configuration values for RTTI-Scanner

use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub scanner: ScannerDefaults,
    pub target: TargetDefaults,
    pub output: OutputDefaults,
    pub logging: LoggingDefaults,
}

/// Default decoder limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDefaults {
    pub max_name_len: usize,
    pub max_msvc_bases: u32,
    pub max_itanium_bases: u32,
    pub max_nodes: usize,
}

/// Default target description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDefaults {
    pub pointer_width: u64,
}

/// Default output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputDefaults {
    pub style: String,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
    pub show_target: bool,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        scanner: ScannerDefaults {
            max_name_len: 60,
            max_msvc_bases: 24,
            max_itanium_bases: 64,
            max_nodes: 4096,
        },
        target: TargetDefaults { pointer_width: 8 },
        output: OutputDefaults {
            style: "auto".to_string(),
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
            show_target: false,
        },
    }
}
