//! Remote memory source abstraction
//!
//! The decoders only ever see this trait: "read N bytes at A, or fail".
//! Backends live in [`super::snapshot`] and [`super::live`].

use crate::core::types::{Address, PointerWidth, RttiResult};

/// One exclusive channel into the debugged process's address space
pub trait MemorySource: Send {
    /// Reads exactly `size` bytes starting at `address`.
    ///
    /// Fails with `ReadFault` when the range is unmapped, access is denied
    /// or the backing process is gone.
    fn read(&self, address: Address, size: usize) -> RttiResult<Vec<u8>>;

    /// Pointer width of the target process
    fn pointer_width(&self) -> PointerWidth;

    /// Name of the debugged image (executable or dump file), if known
    fn image_name(&self) -> Option<String> {
        None
    }
}

impl<T: MemorySource + ?Sized> MemorySource for Box<T> {
    fn read(&self, address: Address, size: usize) -> RttiResult<Vec<u8>> {
        (**self).read(address, size)
    }

    fn pointer_width(&self) -> PointerWidth {
        (**self).pointer_width()
    }

    fn image_name(&self) -> Option<String> {
        (**self).image_name()
    }
}

impl<T: MemorySource + Sync + ?Sized> MemorySource for &T {
    fn read(&self, address: Address, size: usize) -> RttiResult<Vec<u8>> {
        (**self).read(address, size)
    }

    fn pointer_width(&self) -> PointerWidth {
        (**self).pointer_width()
    }

    fn image_name(&self) -> Option<String> {
        (**self).image_name()
    }
}
