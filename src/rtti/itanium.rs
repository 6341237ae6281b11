//! Itanium C++ ABI decoder (GCC, Clang)
//!
//! Every `type_info` object starts with its own vtable pointer followed by a
//! pointer to the mangled class name. The vtable tells which `abi::` struct
//! the object is: `__class_type_info` (no bases), `__si_class_type_info`
//! (one public non-virtual base) or `__vmi_class_type_info` (anything else).
//! Offsets below are in pointer-size units so both ILP32 and LP64 decode.

use super::DecodeOptions;
use crate::core::types::{Abi, Address, ClassHierarchy, RttiError, RttiResult};
use crate::memory::MemoryReader;
use std::collections::{HashMap, HashSet};
use tracing::debug;

const CLASS_TYPE_INFO: &str = "N10__cxxabiv117__class_type_infoE";
const SI_CLASS_TYPE_INFO: &str = "N10__cxxabiv120__si_class_type_infoE";
const VMI_CLASS_TYPE_INFO: &str = "N10__cxxabiv121__vmi_class_type_infoE";

/// Read cap for meta-type names, independent of the class-name cap
const META_NAME_LEN: usize = 64;

/// Shape of a `type_info` node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    /// `__class_type_info`: no bases
    Leaf,
    /// `__si_class_type_info`: one direct non-virtual base
    SingleBase,
    /// `__vmi_class_type_info`: several and/or virtual bases
    MultiOrVirtualBase,
}

impl ClassKind {
    /// Maps a demangled meta-type name to its kind
    pub fn from_meta_name(name: &str) -> Option<Self> {
        match name {
            CLASS_TYPE_INFO => Some(ClassKind::Leaf),
            SI_CLASS_TYPE_INFO => Some(ClassKind::SingleBase),
            VMI_CLASS_TYPE_INFO => Some(ClassKind::MultiOrVirtualBase),
            _ => None,
        }
    }
}

/// `__base_class_type_info` record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseClassTypeInfo {
    /// Address of the base's `type_info`
    pub type_info: Address,
    /// Offset in the high bits, `__virtual_mask`/`__public_mask` in the low byte
    pub offset_flags: i64,
}

impl BaseClassTypeInfo {
    pub fn is_virtual(&self) -> bool {
        self.offset_flags & 0x1 != 0
    }

    pub fn is_public(&self) -> bool {
        self.offset_flags & 0x2 != 0
    }

    /// Base subobject offset, or vtable offset of it for virtual bases
    pub fn offset(&self) -> i64 {
        self.offset_flags >> 8
    }
}

/// One expanded `type_info` node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNode {
    pub name: String,
    pub kind: ClassKind,
    /// `__flags` of a `__vmi_class_type_info`, zero otherwise
    pub flags: u32,
    pub bases: Vec<BaseClassTypeInfo>,
}

/// Strips the decimal length prefix of a mangled source name (`7Derived`)
pub fn demangle(name: &str) -> &str {
    name.trim_start_matches(|c: char| c.is_ascii_digit())
}

/// Classifies the `type_info` at `type_info` via its own vtable
pub fn identify(
    reader: &MemoryReader<'_>,
    type_info: Address,
    options: &DecodeOptions,
) -> RttiResult<ClassKind> {
    let ptr = reader.pointer_size();
    let vtable = reader.read_pointer(type_info)?;
    if !vtable.is_plausible(reader.pointer_width()) {
        return Err(RttiError::unknown(format!(
            "type_info at {} has no vtable",
            type_info.display(reader.pointer_width())
        )));
    }

    let meta_name_ptr = reader.read_pointer(vtable.sub(4 * ptr)?)?;
    let meta_name = reader.read_c_string(meta_name_ptr, META_NAME_LEN, options.encoding)?;
    let meta_name = demangle(&meta_name);

    ClassKind::from_meta_name(meta_name).ok_or_else(|| {
        RttiError::unknown(format!("unrecognized type_info kind '{}'", meta_name))
    })
}

/// Reads and demangles the class name of the `type_info` at `type_info`
pub fn name_of(
    reader: &MemoryReader<'_>,
    type_info: Address,
    options: &DecodeOptions,
) -> RttiResult<String> {
    let name_ptr = reader.read_pointer(type_info.add(reader.pointer_size())?)?;
    let name = reader.read_c_string(name_ptr, options.max_name_len, options.encoding)?;
    Ok(demangle(&name).to_string())
}

/// Reads the node at `type_info` together with its direct bases
pub fn expand(
    reader: &MemoryReader<'_>,
    type_info: Address,
    options: &DecodeOptions,
) -> RttiResult<ClassNode> {
    let ptr = reader.pointer_size();
    let kind = identify(reader, type_info, options)?;
    let name = name_of(reader, type_info, options)?;
    let body = type_info.add(2 * ptr)?;

    let (flags, bases) = match kind {
        ClassKind::Leaf => (0, Vec::new()),
        ClassKind::SingleBase => {
            let base = BaseClassTypeInfo {
                type_info: reader.read_pointer(body)?,
                // Implicitly public, non-virtual, at offset zero
                offset_flags: 0x2,
            };
            (0, vec![base])
        }
        ClassKind::MultiOrVirtualBase => {
            let flags = reader.read_u32(body)?;
            let base_count = reader.read_u32(body.add(4)?)?;
            if base_count > options.max_itanium_bases {
                return Err(RttiError::corrupt("base_count", base_count as u64));
            }

            let records = body.add(8)?;
            let mut bases = Vec::with_capacity(base_count as usize);
            for i in 0..base_count as u64 {
                let record = records.add(2 * ptr * i)?;
                bases.push(BaseClassTypeInfo {
                    type_info: reader.read_pointer(record)?,
                    offset_flags: reader.read_long(record.add(ptr)?)?,
                });
            }
            (flags, bases)
        }
    };

    debug!(%type_info, ?kind, bases = bases.len(), "Itanium node {}", name);
    Ok(ClassNode {
        name,
        kind,
        flags,
        bases,
    })
}

/// Decodes the inheritance graph rooted at the `type_info` at `root`.
///
/// The walk is iterative with an explicit stack; each class name is
/// expanded at most once, so shared or cyclic bases terminate.
pub fn decode(
    reader: &MemoryReader<'_>,
    root: Address,
    options: &DecodeOptions,
) -> RttiResult<ClassHierarchy> {
    let root_name = name_of(reader, root, options)?;
    if root_name.is_empty() {
        return Err(RttiError::unknown(format!(
            "type_info at {} has no name",
            root.display(reader.pointer_width())
        )));
    }

    let mut hierarchy = ClassHierarchy::new(Abi::Itanium, root_name.clone());
    let mut addresses: HashMap<String, Address> = HashMap::from([(root_name.clone(), root)]);
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack = vec![root_name];

    while let Some(name) = stack.pop() {
        if visited.contains(&name) {
            continue;
        }
        if visited.len() >= options.max_nodes {
            return Err(RttiError::corrupt("node_count", visited.len() as u64 + 1));
        }
        visited.insert(name.clone());
        if name != hierarchy.root {
            hierarchy.names.push(name.clone());
        }

        let address = addresses
            .get(&name)
            .copied()
            .ok_or_else(|| RttiError::unknown(format!("no type_info recorded for {}", name)))?;
        let node = expand(reader, address, options)?;

        let mut children = Vec::with_capacity(node.bases.len());
        for base in &node.bases {
            let child = name_of(reader, base.type_info, options)?;
            hierarchy.map.add_edge(&name, &child);
            addresses.insert(child.clone(), base.type_info);
            children.push(child);
        }

        // Reverse push so the first declared base is expanded next
        stack.extend(children.into_iter().rev());
    }

    Ok(hierarchy)
}
