/// Normalized intensity histograms of grayscale rasters
use crate::errors::BracketError;
use crate::types::{PixelLayout, Raster};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One bin per 8-bit intensity level
pub const HISTOGRAM_BINS: usize = 256;

/// Intensity distribution over levels 0-255
///
/// Bins hold probability mass when produced by [`extract_histogram`];
/// histograms loaded from records may carry raw counts, which the
/// classifier normalizes by [`Histogram::total`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Histogram {
    bins: Vec<f64>,
}

impl Histogram {
    /// Wrap 256 finite, non-negative bins
    pub fn from_bins(bins: Vec<f64>) -> Result<Self, BracketError> {
        if bins.len() != HISTOGRAM_BINS {
            return Err(BracketError::InvalidHistogram(format!(
                "expected {} bins, got {}",
                HISTOGRAM_BINS,
                bins.len()
            )));
        }
        if let Some((level, value)) = bins
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(BracketError::InvalidHistogram(format!(
                "bin {} holds {}",
                level, value
            )));
        }
        Ok(Self { bins })
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    /// Sum over all bins
    pub fn total(&self) -> f64 {
        self.bins.iter().sum()
    }

    /// Sum over the bins in `levels`, clamped to the histogram range
    pub fn mass(&self, levels: Range<usize>) -> f64 {
        let end = levels.end.min(HISTOGRAM_BINS);
        let start = levels.start.min(end);
        self.bins[start..end].iter().sum()
    }
}

impl TryFrom<Vec<f64>> for Histogram {
    type Error = BracketError;

    fn try_from(bins: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_bins(bins)
    }
}

impl From<Histogram> for Vec<f64> {
    fn from(histogram: Histogram) -> Self {
        histogram.bins
    }
}

/// Count pixels per level and normalize by the pixel count
pub fn extract_histogram(image: &Raster) -> Result<Histogram, BracketError> {
    if image.layout != PixelLayout::Gray {
        return Err(BracketError::UnsupportedChannels(image.channels()));
    }
    if image.is_empty() {
        return Err(BracketError::EmptyImage {
            width: image.width,
            height: image.height,
        });
    }

    let mut counts = [0u64; HISTOGRAM_BINS];
    for &level in &image.data {
        counts[level as usize] += 1;
    }

    let total = image.data.len() as f64;
    let bins = counts.iter().map(|&count| count as f64 / total).collect();

    Ok(Histogram { bins })
}
