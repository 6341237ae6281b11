use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rtti_scanner::core::types::{Abi, Address, PointerWidth};
use rtti_scanner::memory::{SnapshotBuilder, SnapshotSource};
use rtti_scanner::rtti::{DecodeOptions, MsvcUndecorator, RttiParser};

const VTABLE: u64 = 0x11010;
const META: u64 = 0x12040;
const TYPE_INFOS: u64 = 0x20000;

fn type_info(index: u64) -> Address {
    Address::new(TYPE_INFOS + 0x100 * index)
}

/// A chain of `depth` classes where every class also derives from the root
/// of the previous level, giving each shared base many incoming edges.
fn lattice(depth: u64) -> SnapshotSource {
    let mut builder = SnapshotBuilder::new(PointerWidth::Bits64);
    let class_meta = Address::new(META);
    let vmi_meta = Address::new(META + 0x100);
    builder
        .put_pointer(Address::new(META - 0x20), Address::new(0x12800))
        .put_str(Address::new(0x12800), "N10__cxxabiv117__class_type_infoE")
        .put_pointer(Address::new(META + 0x100 - 0x20), Address::new(0x12840))
        .put_str(Address::new(0x12840), "N10__cxxabiv121__vmi_class_type_infoE")
        .put_pointer(Address::new(0x10000), Address::new(VTABLE))
        .put_pointer(Address::new(VTABLE - 8), type_info(0));

    for index in 0..depth {
        let at = type_info(index);
        let name = format!("7Class{:02}", index % 100);
        let name_at = Address::new(at.as_u64() + 0x80);
        builder
            .put_pointer(Address::new(at.as_u64() + 8), name_at)
            .put_str(name_at, &name);

        if index + 1 == depth {
            builder.put_pointer(at, class_meta);
            continue;
        }

        let bases: Vec<u64> = (index + 1..depth.min(index + 3)).collect();
        let body = at.as_u64() + 16;
        builder
            .put_pointer(at, vmi_meta)
            .put_u32(Address::new(body), 0)
            .put_u32(Address::new(body + 4), bases.len() as u32);
        for (i, base) in bases.iter().enumerate() {
            let record = body + 8 + 16 * i as u64;
            builder
                .put_pointer(Address::new(record), type_info(*base))
                .put_long(Address::new(record + 8), 0x2);
        }
    }
    builder.build()
}

fn benchmark_itanium_traversal(c: &mut Criterion) {
    let parser = RttiParser::bound(Abi::Itanium, DecodeOptions::default());
    let mut group = c.benchmark_group("itanium_traversal");
    for depth in [4u64, 16, 64] {
        let snapshot = lattice(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &snapshot, |b, snapshot| {
            b.iter(|| parser.decode(black_box(snapshot), &MsvcUndecorator, Address::new(VTABLE)))
        });
    }
    group.finish();
}

fn benchmark_render(c: &mut Criterion) {
    let parser = RttiParser::bound(Abi::Itanium, DecodeOptions::default());
    let snapshot = lattice(64);
    let hierarchy = match parser.decode(&snapshot, &MsvcUndecorator, Address::new(VTABLE)) {
        Ok(hierarchy) => hierarchy,
        Err(e) => panic!("benchmark image failed to decode: {}", e),
    };

    c.bench_function("render_tree", |b| b.iter(|| black_box(&hierarchy).render_tree()));
}

criterion_group!(benches, benchmark_itanium_traversal, benchmark_render);
criterion_main!(benches);
