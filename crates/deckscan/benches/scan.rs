use criterion::{criterion_group, criterion_main, Criterion};

use deckscan::format::{CodeKind, FormatSpec, MarkSpec, MarkSpecKind};
use deckscan::search::{SearchLines, SearchParams};
use deckscan::DeckFormat;

fn format_spec(bits: usize, codes: Vec<u16>) -> FormatSpec {
    let mut marks = vec![MarkSpec {
        kind: MarkSpecKind::Landmark,
        width_mm: 4.0,
    }];
    for i in 0..bits {
        marks.push(MarkSpec {
            kind: MarkSpecKind::Space,
            width_mm: if i == 0 { 3.0 } else { 2.0 },
        });
        marks.push(MarkSpec {
            kind: MarkSpecKind::Bit,
            width_mm: 2.0,
        });
    }
    marks.push(MarkSpec {
        kind: MarkSpecKind::Space,
        width_mm: 2.0,
    });
    marks.push(MarkSpec {
        kind: MarkSpecKind::Landmark,
        width_mm: 4.0,
    });

    FormatSpec {
        id: 1,
        name: "bench".into(),
        description: String::new(),
        kind: CodeKind::Normal,
        invert_luma: false,
        ignored: false,
        physical_length_mm: 88.0,
        physical_width_mm: 27.0,
        printable_max_width_mm: 27.0,
        stack_height_52_mm: 15.6,
        compressed_stack_height_52_mm: 14.0,
        min_card_count: 2,
        face_codes_ndo: (1..=codes.len()).map(|i| format!("C{i}")).collect(),
        card_codes_ndo: codes,
        face_codes_test_deck_order: Vec::new(),
        marks,
    }
}

fn bench_search_lines(c: &mut Criterion) {
    let params = SearchParams::default();
    c.bench_function("search_lines_1080p", |b| {
        b.iter(|| SearchLines::generate(&params, 1920, 1080, false))
    });
}

fn bench_format_build(c: &mut Criterion) {
    // 52 distinct 10-bit codes: ECC table construction dominates.
    let codes: Vec<u16> = (0..52u16).map(|i| (i * 19 + 3) & 0x3ff).collect();
    c.bench_function("format_build_10bit_52cards", |b| {
        b.iter(|| DeckFormat::new(format_spec(10, codes.clone())).expect("format"))
    });
}

criterion_group!(benches, bench_search_lines, bench_format_build);
criterion_main!(benches);
