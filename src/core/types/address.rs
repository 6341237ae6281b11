//! Target address wrapper with hex parsing and plausibility checks

use super::error::{RttiError, RttiResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pointer width of the inspected process, independent of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerWidth {
    Bits32,
    Bits64,
}

impl PointerWidth {
    /// Size of a pointer in bytes
    pub const fn bytes(&self) -> u64 {
        match self {
            PointerWidth::Bits32 => 4,
            PointerWidth::Bits64 => 8,
        }
    }

    /// Builds a width from a byte count (4 or 8)
    pub fn from_bytes(bytes: u64) -> RttiResult<Self> {
        match bytes {
            4 => Ok(PointerWidth::Bits32),
            8 => Ok(PointerWidth::Bits64),
            other => Err(RttiError::UnsupportedPlatform(format!(
                "pointer width of {} bytes",
                other
            ))),
        }
    }

    /// Largest value a pointer of this width can hold
    pub const fn max_value(&self) -> u64 {
        match self {
            PointerWidth::Bits32 => u32::MAX as u64,
            PointerWidth::Bits64 => u64::MAX,
        }
    }

    /// Inclusive range of user-space addresses considered plausible
    pub const fn user_space(&self) -> (u64, u64) {
        match self {
            PointerWidth::Bits32 => (0x10000, 0xFFF0_0000),
            PointerWidth::Bits64 => (0x10000, 0x000F_FFFF_FFFF_FFFF),
        }
    }
}

impl Default for PointerWidth {
    fn default() -> Self {
        PointerWidth::Bits64
    }
}

/// Address in the target process's memory space
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub u64);

impl Address {
    /// Creates a new address from a raw value
    pub const fn new(value: u64) -> Self {
        Address(value)
    }

    /// Creates a null address (0x0)
    pub const fn null() -> Self {
        Address(0)
    }

    /// Checks if the address is null
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns the raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Parses a hexadecimal address, optionally prefixed with `0x`/`0X`.
    ///
    /// Fails with [`RttiError::MalformedAddress`] on non-hex characters,
    /// an empty digit string, or a value wider than `width`.
    pub fn parse(text: &str, width: PointerWidth) -> RttiResult<Self> {
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(RttiError::MalformedAddress(text.to_string()));
        }

        let value = u64::from_str_radix(digits, 16)
            .map_err(|_| RttiError::MalformedAddress(text.to_string()))?;

        if value > width.max_value() {
            return Err(RttiError::MalformedAddress(format!(
                "{} does not fit in {} bytes",
                text,
                width.bytes()
            )));
        }

        Ok(Address(value))
    }

    /// Cheap sanity filter: non-null and inside the user-space range.
    ///
    /// Passing this check does not prove the address is mapped.
    pub fn is_plausible(&self, width: PointerWidth) -> bool {
        let (low, high) = width.user_space();
        !self.is_null() && self.0 >= low && self.0 <= high
    }

    /// Adds a byte offset, returning `None` on overflow
    pub fn checked_add(&self, offset: u64) -> Option<Self> {
        self.0.checked_add(offset).map(Address)
    }

    /// Subtracts a byte offset, returning `None` on underflow
    pub fn checked_sub(&self, offset: u64) -> Option<Self> {
        self.0.checked_sub(offset).map(Address)
    }

    /// Adds a byte offset, failing with `UnknownStructure` on overflow
    pub fn add(&self, offset: u64) -> RttiResult<Self> {
        self.checked_add(offset).ok_or_else(|| {
            RttiError::unknown(format!("{} + 0x{:X} overflows", self, offset))
        })
    }

    /// Subtracts a byte offset, failing with `UnknownStructure` on underflow
    pub fn sub(&self, offset: u64) -> RttiResult<Self> {
        self.checked_sub(offset).ok_or_else(|| {
            RttiError::unknown(format!("{} - 0x{:X} underflows", self, offset))
        })
    }
}

/// Display adapter padding an address to the target's pointer width
#[derive(Debug, Clone, Copy)]
pub struct WidthAddress {
    value: u64,
    width: PointerWidth,
}

impl fmt::Display for WidthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.width {
            PointerWidth::Bits32 => write!(f, "0x{:08X}", self.value),
            PointerWidth::Bits64 => write!(f, "0x{:016X}", self.value),
        }
    }
}

impl Address {
    /// Formats the address with as many digits as a `width` pointer holds
    pub fn display(&self, width: PointerWidth) -> WidthAddress {
        WidthAddress {
            value: self.0,
            width,
        }
    }
}

/// Parses a textual address for a target of the given pointer width
pub fn parse_address(text: &str, width: PointerWidth) -> RttiResult<Address> {
    Address::parse(text, width)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address::new(value)
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Address::new(value as u64)
    }
}
