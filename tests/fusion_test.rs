//! Exposure Fusion Testing
//!
//! Verifies the fusion contract on synthetic stacks:
//! - Input validation (count, shape, layout)
//! - Duplicate stacks blend back to the source image
//! - Output shape and value range
//! - Fused output is better exposed than any single source

use bracketfuse::config::FusionConfig;
use bracketfuse::exposure::{classify, extract_histogram};
use bracketfuse::fusion::{fuse, fuse_with_report};
use bracketfuse::testing::{synthetic_exposure, synthetic_exposure_stack};
use bracketfuse::{BracketError, PixelLayout, Raster};

fn max_abs_diff(a: &Raster, b: &Raster) -> i16 {
    a.data
        .iter()
        .zip(&b.data)
        .map(|(x, y)| (*x as i16 - *y as i16).abs())
        .max()
        .unwrap_or(0)
}

#[test]
fn test_fuse_requires_two_images() {
    let image = synthetic_exposure(16, 16, 3000.0);
    assert_eq!(
        fuse(&[image], &FusionConfig::default()),
        Err(BracketError::InsufficientInputs {
            required: 2,
            provided: 1
        })
    );
    assert_eq!(
        fuse(&[], &FusionConfig::default()),
        Err(BracketError::InsufficientInputs {
            required: 2,
            provided: 0
        })
    );
}

#[test]
fn test_fuse_rejects_empty_images() {
    let empty = Raster::filled(0, 0, PixelLayout::Rgb, 0);
    let result = fuse(&[empty.clone(), empty], &FusionConfig::default());
    assert_eq!(
        result,
        Err(BracketError::EmptyImage {
            width: 0,
            height: 0
        })
    );
}

#[test]
fn test_fuse_rejects_corrupted_buffer() {
    let good = synthetic_exposure(8, 8, 3000.0);
    let mut bad = good.clone();
    bad.data.truncate(10);
    let result = fuse(&[good, bad], &FusionConfig::default());
    assert!(matches!(result, Err(BracketError::DataCorruption { .. })));
}

#[test]
fn test_duplicate_stack_is_identity() {
    let image = synthetic_exposure(40, 24, 3000.0);
    for copies in [2, 3, 5] {
        let stack = vec![image.clone(); copies];
        let fused = fuse(&stack, &FusionConfig::default()).unwrap();
        assert_eq!(fused.shape(), image.shape());
        assert!(
            max_abs_diff(&fused, &image) <= 1,
            "{} copies drifted by {}",
            copies,
            max_abs_diff(&fused, &image)
        );
    }
}

#[test]
fn test_duplicate_flat_gray_is_identity() {
    // zero contrast and saturation everywhere: every weight falls back to uniform
    let image = Raster::filled(9, 7, PixelLayout::Rgb, 90);
    let fused = fuse(&[image.clone(), image.clone()], &FusionConfig::default()).unwrap();
    assert_eq!(fused, image);
}

#[test]
fn test_grayscale_stack() {
    let stack: Vec<Raster> = synthetic_exposure_stack(32, 20, &[750.0, 3000.0, 12000.0])
        .into_iter()
        .map(|(_, raster)| raster.to_luma())
        .collect();
    let fused = fuse(&stack, &FusionConfig::default()).unwrap();
    assert_eq!(fused.layout, PixelLayout::Gray);
    assert_eq!(fused.data.len(), 32 * 20);
}

#[test]
fn test_output_shape_matches_inputs() {
    for (width, height) in [(1, 1), (2, 5), (17, 3), (33, 31)] {
        let stack: Vec<Raster> = synthetic_exposure_stack(width, height, &[1500.0, 6000.0])
            .into_iter()
            .map(|(_, raster)| raster)
            .collect();
        let (fused, report) = fuse_with_report(&stack, &FusionConfig::default()).unwrap();
        assert_eq!(fused.shape(), (width, height, 3));
        assert_eq!(report.sources, 2);
        assert!(report.levels >= 1);
    }
}

#[test]
fn test_fused_bracket_is_well_exposed() {
    let times = [375.0, 3000.0, 24000.0];
    let stack: Vec<Raster> = synthetic_exposure_stack(64, 32, &times)
        .into_iter()
        .map(|(_, raster)| raster)
        .collect();
    let fused = fuse(&stack, &FusionConfig::default()).unwrap();

    let clipped_share = |raster: &Raster| {
        let hist = extract_histogram(&raster.to_luma()).unwrap();
        let result = classify(&hist).unwrap();
        result.dark_fraction + result.bright_fraction
    };

    let fused_clipping = clipped_share(&fused);
    for source in &stack {
        assert!(
            fused_clipping <= clipped_share(source) + 1e-9,
            "fused {} vs source {}",
            fused_clipping,
            clipped_share(source)
        );
    }
}

#[test]
fn test_exposedness_only_prefers_mid_gray_source() {
    // with contrast and saturation switched off, a flat mid-gray source dominates
    let config = FusionConfig {
        contrast_weight: 0.0,
        saturation_weight: 0.0,
        ..Default::default()
    };
    let dark = Raster::filled(16, 16, PixelLayout::Rgb, 10);
    let mid = Raster::filled(16, 16, PixelLayout::Rgb, 128);
    let fused = fuse(&[dark, mid], &config).unwrap();
    assert!(fused.data.iter().all(|&v| v > 120 && v <= 128));
}
