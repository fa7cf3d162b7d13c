//! Integration test: load images from disk, process them, and present the comparison.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::path::Path;

use edgecraft_io::{
    ComparisonPresenter, FilePipeline, ProcessError, SelectionOutcome, handle_selection, process,
};
use edgecraft_pipeline::{GrayImage, PipelineConfig};
use image::{GenericImageView, Luma};

fn count_dark(image: &GrayImage) -> usize {
    image.pixels().filter(|p| p.0[0] == 0).count()
}

/// A single straight black/white edge at x = 24, with a faint 20-level
/// step at x = 48 inside the white field.
fn write_edge_with_faint_step(path: &Path) {
    GrayImage::from_fn(64, 64, |x, _y| {
        Luma([match x {
            0..24 => 0,
            24..48 => 255,
            _ => 235,
        }])
    })
    .save(path)
    .unwrap();
}

/// A 0/255 vertical step at x = 8.
fn write_sharp_step(path: &Path) {
    GrayImage::from_fn(16, 16, |x, _y| Luma([if x < 8 { 0 } else { 255 }]))
        .save(path)
        .unwrap();
}

#[test]
fn black_image_yields_white_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("black.png");
    GrayImage::new(100, 100).save(&path).unwrap();

    let result = process(&path, &PipelineConfig::default()).unwrap();
    assert_eq!(result.original.dimensions(), (100, 100));
    assert!(result.original.to_luma8().pixels().all(|p| p.0[0] == 0));
    assert_eq!(result.processed, GrayImage::from_pixel(100, 100, Luma([255])));
}

#[test]
fn missing_file_fails_before_any_stage() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.png");

    let err = process(&missing, &PipelineConfig::default()).unwrap_err();
    match err {
        ProcessError::NotFound { path, .. } => assert_eq!(path, missing),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn processing_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("step.png");
    write_edge_with_faint_step(&path);

    let config = PipelineConfig::interactive();
    let first = process(&path, &config).unwrap();
    let second = process(&path, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn lower_thresholds_mark_more_edges() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edge.png");
    write_edge_with_faint_step(&path);

    let loose = PipelineConfig {
        canny_low: 0.0,
        canny_high: 0.0,
        ..PipelineConfig::default()
    };
    let strict = PipelineConfig {
        canny_low: 200.0,
        canny_high: 255.0,
        ..PipelineConfig::default()
    };

    let loose_dark = count_dark(&process(&path, &loose).unwrap().processed);
    let strict_dark = count_dark(&process(&path, &strict).unwrap().processed);
    assert_eq!(strict_dark, 64, "the strong edge survives strict thresholds");
    assert!(
        loose_dark > strict_dark,
        "expected more edges with (0,0): {loose_dark} vs {strict_dark}"
    );
}

#[test]
fn sharp_step_gives_one_pixel_line_to_the_border() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("step.png");
    write_sharp_step(&path);

    let bytes = std::fs::read(&path).unwrap();
    let staged = edgecraft_pipeline::process_staged(&bytes, &PipelineConfig::default()).unwrap();
    for y in 0..16 {
        let row: Vec<u32> = (0..16)
            .filter(|&x| staged.edges.get_pixel(x, y).0[0] == 255)
            .collect();
        assert_eq!(row, vec![7], "row {y}");
    }
}

#[test]
fn selection_writes_comparison() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("edge.png");
    let output = dir.path().join("comparison.png");
    write_edge_with_faint_step(&input);

    let runner = FilePipeline::interactive();
    let mut presenter = ComparisonPresenter::new(&output).with_gutter(8);
    let outcome = handle_selection(Some(&input), &runner, &mut presenter).unwrap();

    assert_eq!(outcome, SelectionOutcome::Presented);
    let written = image::open(&output).unwrap();
    assert_eq!(written.dimensions(), (64 + 8 + 64, 64));
}

#[test]
fn cancelled_selection_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("comparison.png");

    let mut presenter = ComparisonPresenter::new(&output);
    let outcome = handle_selection(None, &FilePipeline::default(), &mut presenter).unwrap();

    assert_eq!(outcome, SelectionOutcome::Cancelled);
    assert!(!output.exists());
}
