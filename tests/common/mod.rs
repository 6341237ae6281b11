//! Synthetic process images for integration tests
#![allow(dead_code)]

use rtti_scanner::core::types::{Address, PointerWidth};
use rtti_scanner::memory::{MemorySource, SnapshotBuilder, SnapshotSource};
use rtti_scanner::RttiResult;
use std::sync::atomic::{AtomicUsize, Ordering};

/// MSVC image with one object whose vtable leads to a complete object locator.
///
/// Record offsets are relative to the image base; x64 stores them as RVAs,
/// x86 as absolute pointers.
pub struct MsvcImage {
    pub builder: SnapshotBuilder,
    base: u64,
}

impl MsvcImage {
    pub const X64_BASE: u64 = 0x1_4000_0000;
    pub const X86_BASE: u64 = 0x0040_0000;

    const OBJECT: u64 = 0x9000;
    const VTABLE: u64 = 0x2010;
    const LOCATOR: u64 = 0x3000;
    const HIERARCHY: u64 = 0x3100;
    const ARRAY: u64 = 0x3200;
    const BASE_DESCRIPTORS: u64 = 0x3300;
    const TYPE_DESCRIPTORS: u64 = 0x4000;

    /// `classes` holds (name, numContainedBases) in base class array order
    pub fn x64(classes: &[(&str, u32)]) -> Self {
        Self::new(PointerWidth::Bits64, Self::X64_BASE, classes)
    }

    pub fn x86(classes: &[(&str, u32)]) -> Self {
        Self::new(PointerWidth::Bits32, Self::X86_BASE, classes)
    }

    fn new(width: PointerWidth, base: u64, classes: &[(&str, u32)]) -> Self {
        let mut image = MsvcImage {
            builder: SnapshotBuilder::new(width).image_name("app.exe"),
            base,
        };
        let ptr = width.bytes();

        let object = image.at(Self::OBJECT);
        let vtable = image.vtable();
        let locator = image.at(Self::LOCATOR);
        let hierarchy = image.at(Self::HIERARCHY);
        let locator_field = image.field(Self::HIERARCHY);
        let array_field = image.field(Self::ARRAY);

        image
            .builder
            .put_pointer(object, vtable)
            .put_pointer(Address::new(vtable.as_u64() - ptr), locator)
            .put_u32(locator, 1)
            .put_u32(Address::new(locator.as_u64() + 0x10), locator_field)
            .put_u32(Address::new(locator.as_u64() + 0x14), Self::LOCATOR as u32)
            .put_u32(Address::new(hierarchy.as_u64() + 0x08), classes.len() as u32)
            .put_u32(Address::new(hierarchy.as_u64() + 0x0C), array_field);

        let name_offset = match width {
            PointerWidth::Bits64 => 0x10,
            PointerWidth::Bits32 => 0x08,
        };
        for (index, (name, contained)) in classes.iter().enumerate() {
            let index = index as u64;
            let entry = image.at(Self::ARRAY + 4 * index);
            let descriptor_offset = Self::BASE_DESCRIPTORS + 0x20 * index;
            let type_offset = Self::TYPE_DESCRIPTORS + 0x40 * index;

            let descriptor_field = image.field(descriptor_offset);
            let type_field = image.field(type_offset);
            let descriptor = image.at(descriptor_offset);
            let type_desc = image.at(type_offset);

            image
                .builder
                .put_u32(entry, descriptor_field)
                .put_u32(descriptor, type_field)
                .put_u32(Address::new(descriptor.as_u64() + 4), *contained)
                .put_str(
                    Address::new(type_desc.as_u64() + name_offset),
                    &format!(".?AV{}", name),
                );
        }
        image
    }

    fn at(&self, offset: u64) -> Address {
        Address::new(self.base + offset)
    }

    fn field(&self, offset: u64) -> u32 {
        match self.builder.pointer_width() {
            PointerWidth::Bits64 => offset as u32,
            PointerWidth::Bits32 => (self.base + offset) as u32,
        }
    }

    pub fn object(&self) -> Address {
        self.at(Self::OBJECT)
    }

    pub fn vtable(&self) -> Address {
        self.at(Self::VTABLE)
    }

    /// Address of base class descriptor `index`
    pub fn base_descriptor(&self, index: u64) -> Address {
        self.at(Self::BASE_DESCRIPTORS + 0x20 * index)
    }

    pub fn set_base_count(&mut self, count: u32) -> &mut Self {
        let address = self.at(Self::HIERARCHY + 0x08);
        self.builder.put_u32(address, count);
        self
    }

    pub fn clear_hierarchy_link(&mut self) -> &mut Self {
        let address = self.at(Self::LOCATOR + 0x10);
        self.builder.put_u32(address, 0);
        self
    }

    /// Zeroes the base class array entry at `index`
    pub fn clear_descriptor(&mut self, index: u64) -> &mut Self {
        let address = self.at(Self::ARRAY + 4 * index);
        self.builder.put_u32(address, 0);
        self
    }

    /// Zeroes the type descriptor link of base class descriptor `index`
    pub fn clear_type_descriptor(&mut self, index: u64) -> &mut Self {
        let address = self.at(Self::BASE_DESCRIPTORS + 0x20 * index);
        self.builder.put_u32(address, 0);
        self
    }

    pub fn build(&self) -> SnapshotSource {
        self.builder.build()
    }
}

/// Kind of an Itanium `type_info` object
#[derive(Debug, Clone, Copy)]
pub enum Meta {
    Class,
    SiClass,
    VmiClass,
    /// A `type_info` kind the decoder does not handle
    Pointer,
}

impl Meta {
    fn index(self) -> u64 {
        match self {
            Meta::Class => 0,
            Meta::SiClass => 1,
            Meta::VmiClass => 2,
            Meta::Pointer => 3,
        }
    }

    fn mangled(self) -> &'static str {
        match self {
            Meta::Class => "N10__cxxabiv117__class_type_infoE",
            Meta::SiClass => "N10__cxxabiv120__si_class_type_infoE",
            Meta::VmiClass => "N10__cxxabiv121__vmi_class_type_infoE",
            Meta::Pointer => "N10__cxxabiv119__pointer_type_infoE",
        }
    }
}

/// Itanium image whose `type_info` objects are numbered slots
pub struct ItaniumImage {
    pub builder: SnapshotBuilder,
    ptr: u64,
}

impl ItaniumImage {
    const OBJECT: u64 = 0x10000;
    const VTABLE: u64 = 0x11010;
    const META_VTABLES: u64 = 0x12040;
    const META_NAMES: u64 = 0x12800;
    const TYPE_INFOS: u64 = 0x13000;
    const CLASS_NAMES: u64 = 0x18000;

    pub fn new(width: PointerWidth) -> Self {
        let mut image = ItaniumImage {
            builder: SnapshotBuilder::new(width).image_name("server"),
            ptr: width.bytes(),
        };
        for meta in [Meta::Class, Meta::SiClass, Meta::VmiClass, Meta::Pointer] {
            let vtable = Self::meta_vtable(meta);
            let name = Address::new(Self::META_NAMES + 0x40 * meta.index());
            let slot = Address::new(vtable.as_u64() - 4 * image.ptr);
            image.builder.put_pointer(slot, name).put_str(name, meta.mangled());
        }
        image
    }

    pub fn x64() -> Self {
        Self::new(PointerWidth::Bits64)
    }

    fn meta_vtable(meta: Meta) -> Address {
        Address::new(Self::META_VTABLES + 0x100 * meta.index())
    }

    /// Address of `type_info` slot `index`
    pub fn type_info(index: usize) -> Address {
        Address::new(Self::TYPE_INFOS + 0x100 * index as u64)
    }

    pub fn object() -> Address {
        Address::new(Self::OBJECT)
    }

    pub fn vtable() -> Address {
        Address::new(Self::VTABLE)
    }

    fn header(&mut self, index: usize, name: &str, meta: Meta) -> Address {
        let type_info = Self::type_info(index);
        let name_at = Address::new(Self::CLASS_NAMES + 0x40 * index as u64);
        self.builder
            .put_pointer(type_info, Self::meta_vtable(meta))
            .put_pointer(Address::new(type_info.as_u64() + self.ptr), name_at)
            .put_str(name_at, &format!("{}{}", name.len(), name));
        Address::new(type_info.as_u64() + 2 * self.ptr)
    }

    pub fn leaf(&mut self, index: usize, name: &str) -> &mut Self {
        self.header(index, name, Meta::Class);
        self
    }

    pub fn single(&mut self, index: usize, name: &str, base: usize) -> &mut Self {
        let body = self.header(index, name, Meta::SiClass);
        self.builder.put_pointer(body, Self::type_info(base));
        self
    }

    /// Public non-virtual bases laid out one pointer apart
    pub fn multi(&mut self, index: usize, name: &str, bases: &[usize]) -> &mut Self {
        let body = self.header(index, name, Meta::VmiClass);
        self.builder
            .put_u32(body, 0)
            .put_u32(Address::new(body.as_u64() + 4), bases.len() as u32);

        for (i, base) in bases.iter().enumerate() {
            let record = Address::new(body.as_u64() + 8 + 2 * self.ptr * i as u64);
            let offset_flags = ((self.ptr * i as u64) << 8) as i64 | 0x2;
            self.builder
                .put_pointer(record, Self::type_info(*base))
                .put_long(Address::new(record.as_u64() + self.ptr), offset_flags);
        }
        self
    }

    /// A `type_info` of a kind the decoder does not recognize
    pub fn unsupported(&mut self, index: usize, name: &str) -> &mut Self {
        self.header(index, name, Meta::Pointer);
        self
    }

    /// Overrides the base count of a `__vmi_class_type_info` in slot `index`
    pub fn set_base_count(&mut self, index: usize, count: u32) -> &mut Self {
        let body = Self::type_info(index).as_u64() + 2 * self.ptr;
        self.builder.put_u32(Address::new(body + 4), count);
        self
    }

    /// Places an object whose dynamic type is slot `root`
    pub fn object_of(&mut self, root: usize) -> &mut Self {
        let vtable = Self::vtable();
        self.builder
            .put_pointer(Self::object(), vtable)
            .put_pointer(Address::new(vtable.as_u64() - self.ptr), Self::type_info(root));
        self
    }

    pub fn build(&self) -> SnapshotSource {
        self.builder.build()
    }
}

/// Counts reads that start at one address
pub struct CountingSource<S> {
    pub inner: S,
    watched: Address,
    hits: AtomicUsize,
}

impl<S: MemorySource> CountingSource<S> {
    pub fn new(inner: S, watched: Address) -> Self {
        CountingSource {
            inner,
            watched,
            hits: AtomicUsize::new(0),
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl<S: MemorySource> MemorySource for CountingSource<S> {
    fn read(&self, address: Address, size: usize) -> RttiResult<Vec<u8>> {
        if address == self.watched {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.read(address, size)
    }

    fn pointer_width(&self) -> PointerWidth {
        self.inner.pointer_width()
    }

    fn image_name(&self) -> Option<String> {
        self.inner.image_name()
    }
}

/// Serializes memory blocks as a minimal full-memory minidump.
///
/// Writes the three streams a memory-only reader needs: system info, memory
/// info list and memory64 list. Blocks must be sorted and non-overlapping.
pub fn minidump(width: PointerWidth, blocks: &[(u64, Vec<u8>)]) -> Vec<u8> {
    const SIGNATURE: u32 = 0x504D_444D;
    const VERSION: u32 = 0xA793;
    const SYSTEM_INFO: u32 = 7;
    const MEMORY64_LIST: u32 = 9;
    const MEMORY_INFO_LIST: u32 = 16;
    const HEADER_LEN: u32 = 32;
    const DIRECTORY_LEN: u32 = 3 * 12;
    const SYSTEM_INFO_LEN: u32 = 64;
    const MEMORY_INFO_LEN: u32 = 48;

    let count = blocks.len() as u32;
    let system_rva = HEADER_LEN + DIRECTORY_LEN;
    let info_rva = system_rva + SYSTEM_INFO_LEN;
    let info_len = 16 + MEMORY_INFO_LEN * count;
    let list_rva = info_rva + info_len;
    let list_len = 16 + 16 * count;
    let data_rva = list_rva + list_len;

    let mut out = Vec::new();
    let u32s = |out: &mut Vec<u8>, values: &[u32]| {
        for value in values {
            out.extend_from_slice(&value.to_le_bytes());
        }
    };

    // Header, then the stream directory right after it
    u32s(&mut out, &[SIGNATURE, VERSION, 3, HEADER_LEN, 0, 0]);
    out.extend_from_slice(&0u64.to_le_bytes());
    u32s(&mut out, &[SYSTEM_INFO, SYSTEM_INFO_LEN, system_rva]);
    u32s(&mut out, &[MEMORY_INFO_LIST, info_len, info_rva]);
    u32s(&mut out, &[MEMORY64_LIST, list_len, list_rva]);

    // PROCESSOR_ARCHITECTURE_AMD64 or _INTEL
    let arch: u16 = match width {
        PointerWidth::Bits64 => 9,
        PointerWidth::Bits32 => 0,
    };
    let mut system = vec![0u8; SYSTEM_INFO_LEN as usize];
    system[..2].copy_from_slice(&arch.to_le_bytes());
    out.extend_from_slice(&system);

    u32s(&mut out, &[16, MEMORY_INFO_LEN]);
    out.extend_from_slice(&(count as u64).to_le_bytes());
    for (base, bytes) in blocks {
        out.extend_from_slice(&base.to_le_bytes());
        out.extend_from_slice(&base.to_le_bytes());
        // PAGE_READWRITE, padding
        u32s(&mut out, &[4, 0]);
        out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
        // MEM_COMMIT, PAGE_READWRITE, MEM_PRIVATE, padding
        u32s(&mut out, &[0x1000, 4, 0x20000, 0]);
    }

    out.extend_from_slice(&(count as u64).to_le_bytes());
    out.extend_from_slice(&(data_rva as u64).to_le_bytes());
    for (base, bytes) in blocks {
        out.extend_from_slice(&base.to_le_bytes());
        out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    }

    for (_, bytes) in blocks {
        out.extend_from_slice(bytes);
    }
    out
}

/// Cuts every region of `snapshot` into blocks of at most `block` bytes
pub fn dump_blocks(snapshot: &SnapshotSource, block: usize) -> Vec<(u64, Vec<u8>)> {
    let mut blocks = Vec::new();
    for (base, bytes) in snapshot.regions() {
        for (i, chunk) in bytes.chunks(block).enumerate() {
            blocks.push((base.as_u64() + (i * block) as u64, chunk.to_vec()));
        }
    }
    blocks
}
