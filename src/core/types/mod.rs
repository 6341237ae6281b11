//! Core type definitions for RTTI-Scanner
//!
//! This module contains the fundamental types used throughout the crate,
//! including target addresses, ABI selection, decoded hierarchies and errors.

mod address;
mod error;
mod hierarchy;
mod platform;

// Re-export all public types
pub use address::{parse_address, Address, PointerWidth, WidthAddress};
pub use error::{RttiError, RttiResult};
pub use hierarchy::{ClassHierarchy, InheritanceMap, OutputStyle};
pub use platform::{Abi, TargetPlatform};

// Common type aliases
pub type ProcessId = u32;
