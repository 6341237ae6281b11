//! Windows user-mode minidump backend
//!
//! The memory blocks of a `.dmp` file are copied into a [`SnapshotSource`],
//! merging blocks that follow each other so reads may cross block edges.
//! Parsing is done by `udmp-parser`, which needs the system info, memory
//! info list and memory64 list streams (a full-memory dump).

use super::snapshot::SnapshotSource;
use super::source::MemorySource;
use crate::core::types::{Address, PointerWidth, RttiResult};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use udmp_parser::UserDumpParser;

/// Post-mortem memory source over a minidump file
#[derive(Debug, Clone)]
pub struct MinidumpSource {
    snapshot: SnapshotSource,
    modules: Vec<String>,
}

impl MinidumpSource {
    /// Loads the dump at `path`.
    ///
    /// Without a module list the dump's own file name stands in as the
    /// image name, so platform detection still sees a Windows target.
    pub fn open<P: AsRef<Path>>(path: P) -> RttiResult<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let fallback = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string);
        Self::from_bytes(&data, fallback)
    }

    /// Parses an in-memory dump; `fallback_name` is used when the dump
    /// records no executable module
    pub fn from_bytes(data: &[u8], fallback_name: Option<String>) -> RttiResult<Self> {
        let parser = UserDumpParser::with_slice(&data)?;
        let width = if parser.is_arch_x86() {
            PointerWidth::Bits32
        } else {
            PointerWidth::Bits64
        };

        let blocks = parser
            .mem_blocks()
            .values()
            .filter(|block| !block.data.is_empty())
            .map(|block| (block.range.start, block.data));
        let regions = coalesce(blocks);

        // Modules are keyed by base address, so the executable is found by name
        let modules: Vec<String> = parser
            .modules()
            .values()
            .filter_map(|module| module.path.file_name()?.to_str().map(str::to_string))
            .collect();
        let image_name = modules
            .iter()
            .find(|name| name.to_ascii_lowercase().ends_with(".exe"))
            .or_else(|| modules.first())
            .cloned()
            .or(fallback_name);

        let mut snapshot = SnapshotSource::new(width);
        if let Some(name) = image_name {
            snapshot = snapshot.with_image_name(name);
        }
        for (base, bytes) in regions {
            snapshot.add_region(Address::new(base), bytes);
        }

        info!(
            regions = snapshot.region_count(),
            modules = modules.len(),
            width = width.bytes(),
            "Loaded minidump"
        );
        Ok(MinidumpSource { snapshot, modules })
    }

    /// Number of captured regions after merging
    pub fn region_count(&self) -> usize {
        self.snapshot.region_count()
    }

    /// File names of the modules listed in the dump
    pub fn modules(&self) -> &[String] {
        &self.modules
    }
}

impl MemorySource for MinidumpSource {
    fn read(&self, address: Address, size: usize) -> RttiResult<Vec<u8>> {
        self.snapshot.read(address, size)
    }

    fn pointer_width(&self) -> PointerWidth {
        self.snapshot.pointer_width()
    }

    fn image_name(&self) -> Option<String> {
        self.snapshot.image_name()
    }
}

/// Merges blocks, given in address order, that end where the next begins
fn coalesce<'a>(blocks: impl Iterator<Item = (u64, &'a [u8])>) -> Vec<(u64, Vec<u8>)> {
    let mut merged: Vec<(u64, Vec<u8>)> = Vec::new();
    for (base, data) in blocks {
        match merged.last_mut() {
            Some((start, bytes)) if *start + bytes.len() as u64 == base => {
                bytes.extend_from_slice(data)
            }
            _ => merged.push((base, data.to_vec())),
        }
    }
    debug!(regions = merged.len(), "Merged minidump memory blocks");
    merged
}
