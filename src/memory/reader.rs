//! Typed reads through a [`MemorySource`]

use super::scanner::{find_aligned, BytePattern};
use super::source::MemorySource;
use crate::core::types::{Address, PointerWidth, RttiError, RttiResult};
use tracing::trace;

/// Encoding of strings read from the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringEncoding {
    /// Single-byte code units (UTF-8 / ASCII)
    Utf8,
    /// Double-byte code units, little endian
    Utf16,
}

impl StringEncoding {
    /// Maps a code-unit width in bytes to an encoding
    pub fn from_code_unit_width(width: usize) -> RttiResult<Self> {
        match width {
            1 => Ok(StringEncoding::Utf8),
            2 => Ok(StringEncoding::Utf16),
            other => Err(RttiError::UnsupportedPlatform(format!(
                "{}-byte string code units",
                other
            ))),
        }
    }

    /// Bytes per code unit
    pub const fn code_unit_width(&self) -> usize {
        match self {
            StringEncoding::Utf8 => 1,
            StringEncoding::Utf16 => 2,
        }
    }

    /// Decodes `bytes`, returning an empty string on invalid input
    fn decode(&self, bytes: &[u8]) -> String {
        match self {
            StringEncoding::Utf8 => String::from_utf8(bytes.to_vec()).unwrap_or_default(),
            StringEncoding::Utf16 => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units).unwrap_or_default()
            }
        }
    }
}

/// Reader for fixed-width values, pointers and strings in the target
pub struct MemoryReader<'a> {
    source: &'a dyn MemorySource,
    width: PointerWidth,
}

impl<'a> MemoryReader<'a> {
    /// Create a reader using the source's own pointer width
    pub fn new(source: &'a dyn MemorySource) -> Self {
        MemoryReader {
            width: source.pointer_width(),
            source,
        }
    }

    /// Pointer width of the target
    pub fn pointer_width(&self) -> PointerWidth {
        self.width
    }

    /// Size of a target pointer in bytes
    pub fn pointer_size(&self) -> u64 {
        self.width.bytes()
    }

    /// Read exactly `size` raw bytes
    pub fn read_bytes(&self, address: Address, size: usize) -> RttiResult<Vec<u8>> {
        trace!(%address, size, "remote read");
        let bytes = self.source.read(address, size)?;
        if bytes.len() != size {
            return Err(RttiError::read_fault(
                address.display(self.pointer_width()),
                size,
                format!("backend returned {} bytes", bytes.len()),
            ));
        }
        Ok(bytes)
    }

    fn read_array<const N: usize>(&self, address: Address) -> RttiResult<[u8; N]> {
        let bytes = self.read_bytes(address, N)?;
        let mut array = [0u8; N];
        array.copy_from_slice(&bytes);
        Ok(array)
    }

    /// Read a little-endian u32
    pub fn read_u32(&self, address: Address) -> RttiResult<u32> {
        Ok(u32::from_le_bytes(self.read_array(address)?))
    }

    /// Read a little-endian u64
    pub fn read_u64(&self, address: Address) -> RttiResult<u64> {
        Ok(u64::from_le_bytes(self.read_array(address)?))
    }

    /// Read a little-endian i64
    pub fn read_i64(&self, address: Address) -> RttiResult<i64> {
        Ok(i64::from_le_bytes(self.read_array(address)?))
    }

    /// Read a signed word of pointer width (C `long` on LP64/ILP32)
    pub fn read_long(&self, address: Address) -> RttiResult<i64> {
        match self.width {
            PointerWidth::Bits32 => Ok(self.read_u32(address)? as i32 as i64),
            PointerWidth::Bits64 => self.read_i64(address),
        }
    }

    /// Read a pointer of the target's width
    pub fn read_pointer(&self, address: Address) -> RttiResult<Address> {
        match self.width {
            PointerWidth::Bits32 => self.read_u32(address).map(Address::from),
            PointerWidth::Bits64 => self.read_u64(address).map(Address::from),
        }
    }

    /// Read a null-terminated string of at most `max_len` code units.
    ///
    /// A missing terminator truncates to the full buffer. Undecodable
    /// bytes yield an empty string; only the read itself can fail.
    pub fn read_c_string(
        &self,
        address: Address,
        max_len: usize,
        encoding: StringEncoding,
    ) -> RttiResult<String> {
        let unit = encoding.code_unit_width();
        let data = self.read_bytes(address, max_len * unit)?;

        let end = find_aligned(&BytePattern::zeros(unit), &data, unit).unwrap_or(data.len());
        Ok(encoding.decode(&data[..end]))
    }
}
