//! Post-mortem memory source backed by captured regions
//!
//! A snapshot is a set of non-overlapping byte regions copied out of a
//! process. It can be stored as JSON with hex-encoded region contents.

use super::source::MemorySource;
use crate::core::types::{Address, PointerWidth, RttiError, RttiResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// One captured region as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionRecord {
    /// Hex base address, `0x` prefix optional
    pub base: String,
    /// Hex-encoded region contents
    pub bytes: String,
}

/// On-disk snapshot layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub image_name: String,
    #[serde(default = "default_pointer_width")]
    pub pointer_width: u64,
    #[serde(default)]
    pub regions: Vec<RegionRecord>,
}

fn default_pointer_width() -> u64 {
    8
}

/// In-memory snapshot of a process image
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    width: PointerWidth,
    image_name: Option<String>,
    regions: BTreeMap<u64, Vec<u8>>,
}

impl SnapshotSource {
    /// Creates an empty snapshot for a target of the given width
    pub fn new(width: PointerWidth) -> Self {
        SnapshotSource {
            width,
            image_name: None,
            regions: BTreeMap::new(),
        }
    }

    /// Sets the image name reported to platform detection
    pub fn with_image_name(mut self, name: impl Into<String>) -> Self {
        self.image_name = Some(name.into());
        self
    }

    /// Adds a region; a region with the same base is replaced
    pub fn add_region(&mut self, base: Address, bytes: Vec<u8>) {
        self.regions.insert(base.as_u64(), bytes);
    }

    /// Number of captured regions
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Captured regions in address order
    pub fn regions(&self) -> impl Iterator<Item = (Address, &[u8])> + '_ {
        self.regions
            .iter()
            .map(|(base, bytes)| (Address::new(*base), bytes.as_slice()))
    }

    /// Parses a JSON snapshot
    pub fn from_json(json: &str) -> RttiResult<Self> {
        let file: SnapshotFile = serde_json::from_str(json)?;
        let width = PointerWidth::from_bytes(file.pointer_width)?;

        let mut snapshot = SnapshotSource::new(width).with_image_name(file.image_name);
        for region in &file.regions {
            let base = Address::parse(&region.base, width)?;
            snapshot.add_region(base, hex::decode(&region.bytes)?);
        }

        debug!(
            regions = snapshot.region_count(),
            "Loaded snapshot for {:?}",
            snapshot.image_name
        );
        Ok(snapshot)
    }

    /// Loads a JSON snapshot from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> RttiResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Serializes the snapshot to JSON
    pub fn to_json(&self) -> RttiResult<String> {
        let file = SnapshotFile {
            image_name: self.image_name.clone().unwrap_or_default(),
            pointer_width: self.width.bytes(),
            regions: self
                .regions
                .iter()
                .map(|(base, bytes)| RegionRecord {
                    base: format!("0x{:X}", base),
                    bytes: hex::encode(bytes),
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Writes the snapshot to disk as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> RttiResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl MemorySource for SnapshotSource {
    fn read(&self, address: Address, size: usize) -> RttiResult<Vec<u8>> {
        let shown = address.display(self.width);
        let start = address.as_u64();
        let (base, bytes) = self
            .regions
            .range(..=start)
            .next_back()
            .ok_or_else(|| RttiError::read_fault(shown, size, "address not captured"))?;

        let offset = (start - base) as usize;
        let end = offset
            .checked_add(size)
            .ok_or_else(|| RttiError::read_fault(shown, size, "size overflows"))?;

        if end > bytes.len() {
            return Err(RttiError::read_fault(shown, size, "range not captured"));
        }

        Ok(bytes[offset..end].to_vec())
    }

    fn pointer_width(&self) -> PointerWidth {
        self.width
    }

    fn image_name(&self) -> Option<String> {
        self.image_name.clone()
    }
}

/// Zero bytes kept past the last write so fixed-size name reads stay captured
const BUILDER_TAIL: usize = 0x1000;

/// Assembles a single-region snapshot from typed writes.
///
/// The region grows in both directions to cover every written address.
/// Useful for hand-built images and for converting other capture formats.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    width: PointerWidth,
    image_name: Option<String>,
    base: Option<u64>,
    bytes: Vec<u8>,
}

impl SnapshotBuilder {
    pub fn new(width: PointerWidth) -> Self {
        SnapshotBuilder {
            width,
            image_name: None,
            base: None,
            bytes: Vec::new(),
        }
    }

    pub fn image_name(mut self, name: impl Into<String>) -> Self {
        self.image_name = Some(name.into());
        self
    }

    pub fn pointer_width(&self) -> PointerWidth {
        self.width
    }

    /// Copies `data` to `address`
    pub fn put_bytes(&mut self, address: Address, data: &[u8]) -> &mut Self {
        let start = address.as_u64();
        let mut base = *self.base.get_or_insert(start);
        if start < base {
            let grow = (base - start) as usize;
            self.bytes.splice(0..0, std::iter::repeat(0u8).take(grow));
            base = start;
            self.base = Some(start);
        }

        let offset = (start - base) as usize;
        let end = offset + data.len();
        if self.bytes.len() < end {
            self.bytes.resize(end, 0);
        }
        self.bytes[offset..end].copy_from_slice(data);
        self
    }

    pub fn put_u32(&mut self, address: Address, value: u32) -> &mut Self {
        self.put_bytes(address, &value.to_le_bytes())
    }

    pub fn put_u64(&mut self, address: Address, value: u64) -> &mut Self {
        self.put_bytes(address, &value.to_le_bytes())
    }

    /// Writes a pointer of the target's width
    pub fn put_pointer(&mut self, address: Address, value: Address) -> &mut Self {
        match self.width {
            PointerWidth::Bits32 => self.put_u32(address, value.as_u64() as u32),
            PointerWidth::Bits64 => self.put_u64(address, value.as_u64()),
        }
    }

    /// Writes a signed word of pointer width
    pub fn put_long(&mut self, address: Address, value: i64) -> &mut Self {
        match self.width {
            PointerWidth::Bits32 => self.put_bytes(address, &(value as i32).to_le_bytes()),
            PointerWidth::Bits64 => self.put_bytes(address, &value.to_le_bytes()),
        }
    }

    /// Writes `text` followed by a NUL terminator
    pub fn put_str(&mut self, address: Address, text: &str) -> &mut Self {
        let mut data = Vec::with_capacity(text.len() + 1);
        data.extend_from_slice(text.as_bytes());
        data.push(0);
        self.put_bytes(address, &data)
    }

    /// Produces the snapshot; an empty builder yields an empty snapshot
    pub fn build(&self) -> SnapshotSource {
        let mut snapshot = SnapshotSource::new(self.width);
        snapshot.image_name = self.image_name.clone();
        if let Some(base) = self.base {
            let mut bytes = self.bytes.clone();
            bytes.resize(bytes.len() + BUILDER_TAIL, 0);
            snapshot.add_region(Address::new(base), bytes);
        }
        snapshot
    }
}
