//! RTTI decoding
//!
//! [`RttiParser`] is bound once per debug session to the ABI of the target
//! and exposes a single [`RttiParser::decode`] entry point taking the vtable
//! address of an object. It reads the slot just before the vtable (the MSVC
//! complete object locator or the Itanium `type_info` pointer) and hands it
//! to the matching decoder.

pub mod itanium;
pub mod msvc;
pub mod render;
pub mod undecorate;

pub use itanium::{BaseClassTypeInfo, ClassKind, ClassNode};
pub use msvc::TypeDescriptor;
pub use render::render_tree;
pub use undecorate::{MsvcUndecorator, SymbolUndecorator};

use crate::config::ScannerConfig;
use crate::core::types::{Abi, Address, ClassHierarchy, RttiError, RttiResult};
use crate::memory::{MemoryReader, MemorySource, StringEncoding};
use tracing::{debug, info};

/// Limits applied while decoding untrusted memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum code units read for one class name
    pub max_name_len: usize,
    pub encoding: StringEncoding,
    /// Largest accepted MSVC `numBaseClasses`
    pub max_msvc_bases: u32,
    /// Largest accepted `__vmi_class_type_info::__base_count`
    pub max_itanium_bases: u32,
    /// Largest number of Itanium nodes expanded in one scan
    pub max_nodes: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_name_len: 60,
            encoding: StringEncoding::Utf8,
            max_msvc_bases: 24,
            max_itanium_bases: 64,
            max_nodes: 4096,
        }
    }
}

impl From<&ScannerConfig> for DecodeOptions {
    fn from(config: &ScannerConfig) -> Self {
        DecodeOptions {
            max_name_len: config.max_name_len,
            encoding: StringEncoding::Utf8,
            max_msvc_bases: config.max_msvc_bases,
            max_itanium_bases: config.max_itanium_bases,
            max_nodes: config.max_nodes,
        }
    }
}

/// Binding state of the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Uninitialized,
    Bound(Abi),
}

/// ABI dispatcher for RTTI decoding
#[derive(Debug, Clone)]
pub struct RttiParser {
    state: ParserState,
    options: DecodeOptions,
}

impl RttiParser {
    /// Create an unbound parser
    pub fn new(options: DecodeOptions) -> Self {
        RttiParser {
            state: ParserState::Uninitialized,
            options,
        }
    }

    /// Create a parser already bound to `abi`
    pub fn bound(abi: Abi, options: DecodeOptions) -> Self {
        RttiParser {
            state: ParserState::Bound(abi),
            options,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Binds the parser to `abi`.
    ///
    /// Binding again to the same ABI is a no-op; switching ABIs requires a
    /// [`release`](Self::release) first.
    pub fn bind(&mut self, abi: Abi) -> RttiResult<()> {
        match self.state {
            ParserState::Bound(bound) if bound == abi => Ok(()),
            ParserState::Bound(bound) => Err(RttiError::AlreadyBound {
                bound: bound.to_string(),
                requested: abi.to_string(),
            }),
            ParserState::Uninitialized => {
                info!("RTTI parser bound to {}", abi);
                self.state = ParserState::Bound(abi);
                Ok(())
            }
        }
    }

    /// Returns the parser to `Uninitialized` when its session ends
    pub fn release(&mut self) {
        if let ParserState::Bound(abi) = self.state {
            info!("RTTI parser released from {}", abi);
        }
        self.state = ParserState::Uninitialized;
    }

    /// Decodes the class hierarchy of the object whose vtable is at `vtable`
    pub fn decode(
        &self,
        source: &dyn MemorySource,
        undecorator: &dyn SymbolUndecorator,
        vtable: Address,
    ) -> RttiResult<ClassHierarchy> {
        let abi = match self.state {
            ParserState::Bound(abi) => abi,
            ParserState::Uninitialized => return Err(RttiError::ParserUnbound),
        };

        let reader = MemoryReader::new(source);
        let width = reader.pointer_width();
        if !vtable.is_plausible(width) {
            return Err(RttiError::InvalidAddress(vtable.display(width).to_string()));
        }

        let slot = vtable.sub(reader.pointer_size())?;
        let meta = reader.read_pointer(slot)?;
        if !meta.is_plausible(width) {
            return Err(RttiError::unknown(format!(
                "vtable {} is not preceded by type information",
                vtable
            )));
        }

        debug!(%vtable, %meta, %abi, "Decoding RTTI");
        match abi {
            Abi::Msvc => msvc::decode(&reader, undecorator, meta, &self.options),
            Abi::Itanium => itanium::decode(&reader, meta, &self.options),
        }
    }
}
