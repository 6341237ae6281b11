//! Target platform and C++ ABI selection

use super::error::{RttiError, RttiResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// C++ ABI whose RTTI layout is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Abi {
    /// Microsoft C++ ABI (complete object locator, class hierarchy descriptor)
    Msvc,
    /// Itanium C++ ABI used by GCC and Clang (`type_info` graph)
    Itanium,
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Abi::Msvc => write!(f, "MSVC"),
            Abi::Itanium => write!(f, "Itanium"),
        }
    }
}

impl FromStr for Abi {
    type Err = RttiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "msvc" => Ok(Abi::Msvc),
            "itanium" | "gcc" | "clang" => Ok(Abi::Itanium),
            _ => Err(RttiError::UnsupportedPlatform(s.to_string())),
        }
    }
}

/// Operating system family of the debugged image, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetPlatform {
    Windows,
    Linux,
}

impl TargetPlatform {
    /// Derives the platform from the debugged image name.
    ///
    /// Windows executables, libraries and minidumps map to `Windows`; any
    /// other non-empty name is treated as a Linux/ELF target.
    pub fn from_image_name(name: &str) -> RttiResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RttiError::UnsupportedPlatform(
                "empty process image name".to_string(),
            ));
        }

        let lower = name.to_ascii_lowercase();
        if [".exe", ".dll", ".dmp", ".mdmp"].iter().any(|ext| lower.ends_with(ext)) {
            Ok(TargetPlatform::Windows)
        } else {
            Ok(TargetPlatform::Linux)
        }
    }

    /// ABI used by the platform's native C++ toolchain
    pub const fn abi(&self) -> Abi {
        match self {
            TargetPlatform::Windows => Abi::Msvc,
            TargetPlatform::Linux => Abi::Itanium,
        }
    }
}
