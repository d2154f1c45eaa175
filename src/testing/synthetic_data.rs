//! Synthetic exposure stacks
//!
//! Renders a fixed high-dynamic-range scene at arbitrary exposure times so
//! histogram, bracket and fusion code can be exercised without captures.
//! The scene spans four decades of radiance left to right, with a
//! vertical stripe texture and a warm tint.

use crate::exposure::{Histogram, HISTOGRAM_BINS};
use crate::types::{PixelLayout, Raster};
use std::path::{Path, PathBuf};

/// Exposure time at which the scene's unit radiance maps to full scale
pub const REFERENCE_EXPOSURE: f64 = 3000.0;

const TINT: [f64; 3] = [1.0, 0.85, 0.7];

fn scene_radiance(x: u32, y: u32, width: u32) -> f64 {
    let t = if width > 1 {
        x as f64 / (width - 1) as f64
    } else {
        0.5
    };
    let stripes = 1.0 + 0.3 * ((y as f64) * 0.7).sin();
    10f64.powf(-3.0 + 4.0 * t) * stripes
}

/// Render the scene at `exposure_time` as an RGB raster
pub fn synthetic_exposure(width: u32, height: u32, exposure_time: f64) -> Raster {
    let gain = exposure_time / REFERENCE_EXPOSURE;
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let radiance = scene_radiance(x, y, width) * gain;
            for tint in TINT {
                let linear = (radiance * tint).clamp(0.0, 1.0);
                data.push((linear.powf(1.0 / 2.2) * 255.0).round() as u8);
            }
        }
    }
    Raster {
        width,
        height,
        layout: PixelLayout::Rgb,
        data,
    }
}

/// Render the scene once per exposure time, keeping the given order
pub fn synthetic_exposure_stack(
    width: u32,
    height: u32,
    exposure_times: &[f64],
) -> Vec<(f64, Raster)> {
    exposure_times
        .iter()
        .map(|&time| (time, synthetic_exposure(width, height, time)))
        .collect()
}

/// Histogram with the given `(level, mass)` entries and zero elsewhere
///
/// # Panics
/// Panics if a mass is negative or not finite.
pub fn histogram_from_levels(levels: &[(usize, f64)]) -> Histogram {
    let mut bins = vec![0.0; HISTOGRAM_BINS];
    for &(level, mass) in levels {
        bins[level.min(HISTOGRAM_BINS - 1)] += mass;
    }
    Histogram::from_bins(bins).expect("histogram masses must be finite and non-negative")
}

/// Write a scene directory of `<exposure_time>.<extension>` images
pub fn write_synthetic_scene<P: AsRef<Path>>(
    scene_dir: P,
    width: u32,
    height: u32,
    exposure_times: &[f64],
    extension: &str,
) -> Result<Vec<PathBuf>, crate::errors::BracketError> {
    let scene_dir = scene_dir.as_ref();
    std::fs::create_dir_all(scene_dir)?;
    let mut paths = Vec::with_capacity(exposure_times.len());
    for (time, raster) in synthetic_exposure_stack(width, height, exposure_times) {
        let path = scene_dir.join(crate::config::CaptureConfig::image_file_name(time, extension));
        raster.save(&path)?;
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_exposure_correct_size() {
        let frame = synthetic_exposure(64, 32, 3000.0);
        assert_eq!(frame.width, 64);
        assert_eq!(frame.height, 32);
        assert_eq!(frame.data.len(), 64 * 32 * 3);
    }

    #[test]
    fn test_longer_exposure_is_brighter() {
        let short = synthetic_exposure(32, 8, 750.0);
        let long = synthetic_exposure(32, 8, 12000.0);
        let mean = |r: &Raster| r.data.iter().map(|&v| v as f64).sum::<f64>() / r.data.len() as f64;
        assert!(mean(&long) > mean(&short));
    }

    #[test]
    fn test_histogram_from_levels() {
        let histogram = histogram_from_levels(&[(10, 0.5), (300, 0.5)]);
        assert_eq!(histogram.bins()[10], 0.5);
        assert_eq!(histogram.bins()[255], 0.5);
    }
}
