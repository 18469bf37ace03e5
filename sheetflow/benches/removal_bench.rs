//! Benchmarks for handwriting removal and OCR preparation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, GrayImage, Luma};
use sheetflow::imaging::{preprocess_for_ocr, OcrPrepParams};
use sheetflow::removal::{HandwritingRemover, ThresholdRemover};

fn worksheet(width: u32, height: u32) -> DynamicImage {
    let page = GrayImage::from_fn(width, height, |x, y| {
        if y % 40 < 3 && x > 20 && x < width - 20 {
            Luma([25])
        } else {
            Luma([(235 + (x + y) % 15) as u8])
        }
    });
    DynamicImage::ImageLuma8(page)
}

fn removal_benchmark(c: &mut Criterion) {
    let page = worksheet(640, 480);
    let remover = ThresholdRemover::default();

    c.bench_function("threshold_remove_640x480", |b| {
        b.iter(|| black_box(remover.remove(black_box(&page))))
    });

    let params = OcrPrepParams::default();
    c.bench_function("ocr_prep_640x480", |b| {
        b.iter(|| black_box(preprocess_for_ocr(black_box(&page), &params)))
    });
}

criterion_group!(benches, removal_benchmark);
criterion_main!(benches);
