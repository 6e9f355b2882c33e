//! Render a synthetic deck frame and run the full pipeline over it.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example scan_demo
//! ```

use deckscan::format::{CodeKind, FormatSpec, MarkKind, MarkSpec, MarkSpecKind};
use deckscan::{AnalysisResult, DeckFormat, LumaImage, ScanManager, ScanParams};

fn demo_format() -> DeckFormat {
    let mut marks = vec![MarkSpec {
        kind: MarkSpecKind::Landmark,
        width_mm: 4.0,
    }];
    for i in 0..4 {
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

    DeckFormat::new(FormatSpec {
        id: 1,
        name: "demo-4bit".into(),
        description: "demo edge code".into(),
        kind: CodeKind::Normal,
        invert_luma: false,
        ignored: false,
        physical_length_mm: 88.0,
        physical_width_mm: 27.0,
        printable_max_width_mm: 27.0,
        stack_height_52_mm: 78.0,
        compressed_stack_height_52_mm: 70.0,
        min_card_count: 5,
        card_codes_ndo: vec![0b0001, 0b0010, 0b0100, 0b1000, 0b0111, 0b1011, 0b1101, 0b1110],
        face_codes_ndo: (1..=8).map(|i| format!("C{i}")).collect(),
        face_codes_test_deck_order: Vec::new(),
        marks,
    })
    .expect("demo format")
}

fn render(format: &DeckFormat, order: &[usize]) -> LumaImage {
    let px_per_mm = 4.0;
    let card_px = 6;
    let mut img = LumaImage::new_filled(320, 200, 235);
    let code = format.code();
    let deck_w = (code.width_mm() * px_per_mm).round() as usize;
    let x0 = (320 - deck_w) / 2;
    let y0 = (200 - order.len() * card_px) / 2;

    for (slot, &card) in order.iter().enumerate() {
        let word = format.card_codes()[card];
        for mark in code.marks() {
            let draw = match mark.kind {
                MarkKind::Landmark => true,
                MarkKind::Bit { index } => (word >> index) & 1 == 1,
                MarkKind::Space => false,
            };
            if !draw {
                continue;
            }
            let mx0 = x0 + (mark.start_mm * px_per_mm).round() as usize;
            let mx1 = x0 + (mark.end_mm() * px_per_mm).round() as usize;
            for y in y0 + slot * card_px..y0 + (slot + 1) * card_px {
                for x in mx0..mx1 {
                    img.set(x, y, 20);
                }
            }
        }
    }
    img
}

fn main() {
    env_logger::init();

    let format = demo_format();
    let order: Vec<usize> = (0..8).collect();
    let frame = render(&format, &order);
    let manager = ScanManager::new(ScanParams::default());

    for i in 1..=5 {
        let result = manager.process_frame(&frame.view(), &format);
        match &result {
            AnalysisResult::SuccessHighConfidence { deck, confidence } => {
                let faces: Vec<String> = deck
                    .resolved_indices()
                    .iter()
                    .map(|&ix| format.face_code(ix))
                    .collect();
                println!("frame {i}: high confidence {confidence:.2}: {}", faces.join(" "));
            }
            AnalysisResult::SuccessLowConfidence { confidence, .. } => {
                println!("frame {i}: low confidence {confidence:.2}");
            }
            other => println!("frame {i}: {other:?}"),
        }
    }

    println!("{:#?}", manager.stats());
}
