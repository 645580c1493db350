// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the spurwerk-detect crate. Measures edge
// extraction, Hough segment detection and the full per-frame pipeline on a
// synthetic 1280x720 road frame.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgb, RgbImage};

use spurwerk_core::types::Segment;
use spurwerk_detect::render::draw_thick_segment_mut;
use spurwerk_detect::{EdgeExtractor, LanePipeline, RegionMasker, SegmentDetector};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Dark asphalt with two painted lane markings converging towards the
/// horizon, matching the reference camera geometry.
fn synthetic_road() -> RgbImage {
    let mut frame = RgbImage::from_pixel(1280, 720, Rgb([40u8, 40, 45]));
    let paint = Rgb([235u8, 235, 235]);
    for marking in [
        Segment::new(200, 720, 550, 250),
        Segment::new(1100, 720, 550, 250),
    ] {
        draw_thick_segment_mut(&mut frame, &marking, 4, paint);
    }
    frame
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_edge_extraction(c: &mut Criterion) {
    let frame = synthetic_road();
    let extractor = EdgeExtractor::default();

    c.bench_function("edge_extraction (1280x720)", |b| {
        b.iter(|| black_box(extractor.extract(black_box(&frame))));
    });
}

/// Hough on an already masked edge map, so only the voting loop is timed.
fn bench_segment_detection(c: &mut Criterion) {
    let frame = synthetic_road();
    let Ok(edges) = EdgeExtractor::default().extract(&frame) else {
        return;
    };
    let Ok(masked) = RegionMasker::default().apply(&edges) else {
        return;
    };
    let detector = SegmentDetector::default();

    c.bench_function("segment_detection (1280x720)", |b| {
        b.iter(|| black_box(detector.detect(black_box(&masked))));
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let frame = synthetic_road();
    let pipeline = LanePipeline::default();

    c.bench_function("lane_pipeline (1280x720)", |b| {
        b.iter(|| black_box(pipeline.process(black_box(&frame))));
    });
}

criterion_group!(
    benches,
    bench_edge_extraction,
    bench_segment_detection,
    bench_full_pipeline
);
criterion_main!(benches);
