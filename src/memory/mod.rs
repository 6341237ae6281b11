//! Memory access for RTTI decoding
//!
//! This module provides the remote memory source abstraction and everything
//! layered on top of it:
//! - The [`MemorySource`] trait and its snapshot, minidump and live-process
//!   backends
//! - Byte pattern search used for string termination
//! - Typed reads of integers, pointers and strings

pub mod live;
pub mod minidump;
pub mod reader;
pub mod scanner;
pub mod snapshot;
pub mod source;

pub use live::LiveProcess;
pub use minidump::MinidumpSource;
pub use reader::{MemoryReader, StringEncoding};
pub use scanner::{find, find_aligned, BytePattern};
pub use snapshot::{SnapshotBuilder, SnapshotSource};
pub use source::MemorySource;
