//! Core module containing fundamental types for RTTI-Scanner
//!
//! This module provides the foundational building blocks used throughout
//! the crate: target addresses and pointer widths, ABI and platform
//! selection, decoded class hierarchies and error types.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Abi,
    Address,
    ClassHierarchy,
    InheritanceMap,
    PointerWidth,
    RttiError,
    RttiResult,
    TargetPlatform,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
