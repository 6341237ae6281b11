//! Microsoft C++ ABI decoder
//!
//! Walks complete object locator → class hierarchy descriptor → base class
//! array → type descriptor names. On x64 every link is a 32-bit RVA from the
//! image base, which the locator encodes as its own RVA at `+0x14`. On x86
//! the links are absolute pointers.

use super::undecorate::SymbolUndecorator;
use super::DecodeOptions;
use crate::core::types::{Abi, Address, ClassHierarchy, PointerWidth, RttiError, RttiResult};
use crate::memory::MemoryReader;
use tracing::{debug, warn};

// _RTTICompleteObjectLocator
const COL_CLASS_DESCRIPTOR: u64 = 0x10;
const COL_SELF_RVA: u64 = 0x14;

// _RTTIClassHierarchyDescriptor
const CHD_NUM_BASE_CLASSES: u64 = 0x08;
const CHD_BASE_CLASS_ARRAY: u64 = 0x0C;

// _RTTIBaseClassDescriptor
const BCD_TYPE_DESCRIPTOR: u64 = 0x00;
const BCD_NUM_CONTAINED_BASES: u64 = 0x04;

// TypeDescriptor name, past the ".?AV" / ".?AU" tag
const TD_NAME_X64: u64 = 0x14;
const TD_NAME_X86: u64 = 0x0C;

/// How 32-bit fields in the RTTI records turn into addresses
#[derive(Debug, Clone, Copy)]
enum Links {
    /// x64: fields are RVAs from this image base
    Relative(Address),
    /// x86: fields are absolute pointers
    Absolute,
}

impl Links {
    fn resolve(&self, field: u32) -> RttiResult<Address> {
        match self {
            Links::Relative(image_base) => image_base.add(field as u64),
            Links::Absolute => Ok(Address::from(field)),
        }
    }
}

/// One entry of the base class array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Undecorated class name
    pub name: String,
    /// Position in the base class array
    pub index: usize,
    /// Number of bases nested under this one in the array
    pub contained_bases: u32,
}

/// Decodes the hierarchy behind the complete object locator at `locator`
pub fn decode(
    reader: &MemoryReader<'_>,
    undecorator: &dyn SymbolUndecorator,
    locator: Address,
    options: &DecodeOptions,
) -> RttiResult<ClassHierarchy> {
    let (links, name_offset) = match reader.pointer_width() {
        PointerWidth::Bits64 => {
            let self_rva = reader.read_u32(locator.add(COL_SELF_RVA)?)?;
            if self_rva == 0 {
                return Err(RttiError::unknown("object locator has no image base offset"));
            }
            (Links::Relative(locator.sub(self_rva as u64)?), TD_NAME_X64)
        }
        PointerWidth::Bits32 => (Links::Absolute, TD_NAME_X86),
    };

    let hierarchy_field = reader.read_u32(locator.add(COL_CLASS_DESCRIPTOR)?)?;
    if hierarchy_field == 0 {
        return Err(RttiError::unknown("object locator has no class hierarchy descriptor"));
    }
    let hierarchy_desc = links.resolve(hierarchy_field)?;

    let base_count = reader.read_u32(hierarchy_desc.add(CHD_NUM_BASE_CLASSES)?)?;
    if base_count == 0 || base_count > options.max_msvc_bases {
        return Err(RttiError::corrupt("base_count", base_count as u64));
    }

    let array_field = reader.read_u32(hierarchy_desc.add(CHD_BASE_CLASS_ARRAY)?)?;
    if array_field == 0 {
        return Err(RttiError::unknown("class hierarchy descriptor has no base class array"));
    }
    let base_array = links.resolve(array_field)?;

    debug!(%locator, %hierarchy_desc, base_count, "Walking MSVC base class array");

    let mut descriptors = Vec::with_capacity(base_count as usize);
    for index in 0..base_count as usize {
        match read_descriptor(reader, undecorator, links, base_array, index, name_offset, options)? {
            Some(descriptor) => descriptors.push(descriptor),
            None => {
                warn!(index, base_count, "Base class array ended early, keeping partial result");
                break;
            }
        }
    }

    build_hierarchy(&descriptors)
}

/// Reads entry `index`; `None` marks the early-stop conditions
fn read_descriptor(
    reader: &MemoryReader<'_>,
    undecorator: &dyn SymbolUndecorator,
    links: Links,
    base_array: Address,
    index: usize,
    name_offset: u64,
    options: &DecodeOptions,
) -> RttiResult<Option<TypeDescriptor>> {
    let desc_field = reader.read_u32(base_array.add(4 * index as u64)?)?;
    if desc_field == 0 {
        return Ok(None);
    }
    let base_class_desc = links.resolve(desc_field)?;

    let type_field = reader.read_u32(base_class_desc.add(BCD_TYPE_DESCRIPTOR)?)?;
    if type_field == 0 {
        return Ok(None);
    }
    let type_desc = links.resolve(type_field)?;

    let mut name = reader.read_c_string(
        type_desc.add(name_offset)?,
        options.max_name_len,
        options.encoding,
    )?;
    if name.is_empty() {
        return Ok(None);
    }

    if name.ends_with("@@") {
        name = undecorator.undecorate(&format!("?{}", name));
    }

    // Only the tree shape depends on this field; the name stands without it
    let contained_bases = match reader.read_u32(base_class_desc.add(BCD_NUM_CONTAINED_BASES)?) {
        Ok(count) => count,
        Err(e) => {
            warn!(index, "No contained base count for {}: {}", name, e);
            0
        }
    };

    debug!(index, %type_desc, contained_bases, "MSVC base {}", name);
    Ok(Some(TypeDescriptor {
        name,
        index,
        contained_bases,
    }))
}

/// Rebuilds the tree from the pre-order array and its subtree sizes.
///
/// Entries whose counts do not fit any open subtree attach to the root.
fn build_hierarchy(descriptors: &[TypeDescriptor]) -> RttiResult<ClassHierarchy> {
    let (root, rest) = descriptors
        .split_first()
        .ok_or_else(|| RttiError::unknown("base class array holds no named class"))?;

    let mut hierarchy = ClassHierarchy::new(Abi::Msvc, root.name.clone());
    // (name, descendants still expected)
    let mut open: Vec<(&str, u32)> = vec![(root.name.as_str(), root.contained_bases)];

    for descriptor in rest {
        while open.len() > 1 && open.last().map_or(false, |(_, remaining)| *remaining == 0) {
            open.pop();
        }

        let parent = open.last().map_or(root.name.as_str(), |(name, _)| *name);
        hierarchy.map.add_edge(parent, &descriptor.name);
        hierarchy.names.push(descriptor.name.clone());

        for (_, remaining) in open.iter_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        open.push((descriptor.name.as_str(), descriptor.contained_bases));
    }

    Ok(hierarchy)
}
