//! RTTI-Scanner library for reconstructing C++ class hierarchies from process memory

pub mod config;
pub mod core;
pub mod logging;
pub mod memory;
pub mod rtti;
pub mod session;

// Re-export main types from core module
pub use crate::core::types::{
    parse_address, Abi, Address, ClassHierarchy, InheritanceMap, OutputStyle, PointerWidth,
    ProcessId, RttiError, RttiResult, TargetPlatform,
};

pub use memory::{LiveProcess, MemorySource, MinidumpSource, SnapshotBuilder, SnapshotSource};
pub use rtti::{DecodeOptions, MsvcUndecorator, RttiParser, SymbolUndecorator};
pub use session::{DebugSession, ScanOutcome, ScanTicket};

// Re-export core directly for full access
pub use crate::core::*;
