//! End-to-end pipeline tests over synthetically rendered deck frames.

use deckscan::format::{CodeKind, FormatSpec, MarkKind, MarkSpec, MarkSpecKind};
use deckscan::{AnalysisResult, DeckFormat, FrameFailure, LumaImage, ScanManager, ScanParams};

const LIGHT: u8 = 235;
const DARK: u8 = 20;

fn mark_spec(kind: MarkSpecKind, width_mm: f32) -> MarkSpec {
    MarkSpec { kind, width_mm }
}

/// A 4-bit, 8-card format whose per-card edge is 1.5 mm tall.
fn test_format() -> DeckFormat {
    let mut marks = vec![mark_spec(MarkSpecKind::Landmark, 4.0)];
    for i in 0..4 {
        marks.push(mark_spec(MarkSpecKind::Space, if i == 0 { 3.0 } else { 2.0 }));
        marks.push(mark_spec(MarkSpecKind::Bit, 2.0));
    }
    marks.push(mark_spec(MarkSpecKind::Space, 2.0));
    marks.push(mark_spec(MarkSpecKind::Landmark, 4.0));

    DeckFormat::new(FormatSpec {
        id: 11,
        name: "pipeline-4bit".into(),
        description: "synthetic end-to-end format".into(),
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
        face_codes_test_deck_order: (1..=8).map(|i| format!("C{i}")).collect(),
        marks,
    })
    .expect("test format")
}

/// Render `order` as a stacked deck centered in a `width x height` frame.
fn render_deck(
    format: &DeckFormat,
    order: &[usize],
    px_per_mm: f32,
    card_px: usize,
    width: usize,
    height: usize,
) -> LumaImage {
    let mut img = LumaImage::new_filled(width, height, LIGHT);
    let code = format.code();
    let deck_w = (code.width_mm() * px_per_mm).round() as usize;
    let deck_h = order.len() * card_px;
    let x0 = (width - deck_w) / 2;
    let y0 = (height - deck_h) / 2;

    for (slot, &card) in order.iter().enumerate() {
        let word = format.card_codes()[card];
        let y_top = y0 + slot * card_px;
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
            for y in y_top..y_top + card_px {
                for x in mx0..mx1 {
                    img.set(x, y, DARK);
                }
            }
        }
    }
    img
}

#[test]
fn repeated_frames_build_to_high_confidence() {
    let format = test_format();
    let order: Vec<usize> = (0..8).collect();
    let frame = render_deck(&format, &order, 4.0, 6, 320, 200);
    let manager = ScanManager::new(ScanParams::default());

    for i in 0..2 {
        let result = manager.process_frame(&frame.view(), &format);
        let AnalysisResult::InsufficientHistory { deck } = result else {
            panic!("frame {i}: expected InsufficientHistory, got {result:?}");
        };
        assert_eq!(deck.resolved_indices(), order.as_slice());
    }

    for i in 2..5 {
        let result = manager.process_frame(&frame.view(), &format);
        let AnalysisResult::SuccessHighConfidence { deck, confidence } = result else {
            panic!("frame {i}: expected SuccessHighConfidence, got {result:?}");
        };
        assert_eq!(deck.resolved_indices(), order.as_slice());
        assert!((confidence - 1.0).abs() < 1e-6);
        assert!(deck.resolved_robustness().iter().all(|&r| r == 255));
    }

    let stats = manager.stats();
    assert_eq!(stats.frames, 5);
    assert_eq!(stats.search.found, 5);
    assert_eq!(stats.decode.decoded, 5);
    assert_eq!(stats.analyzer.insufficient_history, 2);
    assert_eq!(stats.analyzer.report_high_confidence, 3);
    assert_eq!(stats.validation.correct, 5);
    assert_eq!(stats.validation.report_correct_high, 3);
}

#[test]
fn competing_orderings_lower_the_confidence() {
    let format = test_format();
    let order_a: Vec<usize> = (0..8).collect();
    let order_b: Vec<usize> = (0..8).rev().collect();
    let frame_a = render_deck(&format, &order_a, 4.0, 6, 320, 200);
    let frame_b = render_deck(&format, &order_b, 4.0, 6, 320, 200);
    let manager = ScanManager::new(ScanParams::default());

    for _ in 0..2 {
        manager.process_frame(&frame_b.view(), &format);
    }
    let mut last = None;
    for _ in 0..8 {
        last = Some(manager.process_frame(&frame_a.view(), &format));
    }

    // 8 votes against 2: confidence 0.8 clears the high threshold.
    let AnalysisResult::SuccessHighConfidence { deck, confidence } = last.unwrap() else {
        panic!("expected SuccessHighConfidence");
    };
    assert_eq!(deck.resolved_indices(), order_a.as_slice());
    assert!((confidence - 0.8).abs() < 1e-6);

    // One more minority frame: the consensus ordering replaces the frame's
    // own deck, but support drops into the low-confidence band.
    let result = manager.process_frame(&frame_b.view(), &format);
    let AnalysisResult::SuccessLowConfidence { deck, confidence } = result else {
        panic!("expected SuccessLowConfidence, got {result:?}");
    };
    assert_eq!(deck.resolved_indices(), order_a.as_slice());
    assert!((confidence - 8.0 / 11.0).abs() < 1e-6);

    // Minority frames decode fine but disagree with the known deck order.
    let stats = manager.stats();
    assert_eq!(stats.decode.decoded, 11);
    assert!(stats.validation.out_of_order >= 2);
}

#[test]
fn blank_frames_report_not_found() {
    let format = test_format();
    let frame = LumaImage::new_filled(320, 200, 128);
    let manager = ScanManager::new(ScanParams::default());

    let result = manager.process_frame(&frame.view(), &format);
    assert!(matches!(
        result,
        AnalysisResult::Fail(FrameFailure::SearchNotFound)
    ));
    let stats = manager.stats();
    assert_eq!(stats.search.not_found, 1);
    assert_eq!(stats.search.found, 0);
}

#[test]
fn short_stacks_decode_but_fail_the_card_minimum() {
    let format = test_format();
    let order = vec![0usize, 1, 2];
    let frame = render_deck(&format, &order, 4.0, 6, 320, 200);
    let manager = ScanManager::new(ScanParams::default());

    let result = manager.process_frame(&frame.view(), &format);
    let AnalysisResult::Fail(FrameFailure::DecodeTooFewCards(deck)) = result else {
        panic!("expected DecodeTooFewCards, got {result:?}");
    };
    assert_eq!(deck.resolved_indices(), &[0, 1, 2]);

    let stats = manager.stats();
    assert_eq!(stats.search.found, 1);
    assert_eq!(stats.decode.too_few_cards, 1);
    // A clean prefix of the test deck counts as missing cards, not garbage.
    assert_eq!(stats.validation.missing_cards, 1);
}

#[test]
fn reset_clears_history_and_counters() {
    let format = test_format();
    let order: Vec<usize> = (0..8).collect();
    let frame = render_deck(&format, &order, 4.0, 6, 320, 200);
    let manager = ScanManager::new(ScanParams::default());

    for _ in 0..4 {
        manager.process_frame(&frame.view(), &format);
    }
    assert!(manager.stats().frames > 0);

    manager.reset();
    assert_eq!(manager.stats(), Default::default());

    // History restarts: the next frame is back to insufficient history.
    let result = manager.process_frame(&frame.view(), &format);
    assert!(matches!(result, AnalysisResult::InsufficientHistory { .. }));
}

#[test]
fn parameters_can_change_between_frames() {
    let format = test_format();
    let order: Vec<usize> = (0..8).collect();
    let frame = render_deck(&format, &order, 4.0, 6, 320, 200);
    let manager = ScanManager::new(ScanParams::default());

    // Demand more history before reporting than we will provide.
    manager.execute_when_not_processing(|params| {
        params.analysis.min_history_entries = 100;
    });
    for _ in 0..5 {
        let result = manager.process_frame(&frame.view(), &format);
        assert!(matches!(result, AnalysisResult::InsufficientHistory { .. }));
    }
    assert_eq!(manager.params().analysis.min_history_entries, 100);
}
