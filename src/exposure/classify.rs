/// Histogram-based exposure classification
use super::histogram::{Histogram, HISTOGRAM_BINS};
use crate::config::ExposureConfig;
use crate::errors::BracketError;
use serde::{Deserialize, Serialize};

/// Verdict for a single exposure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Neither the dark nor the bright band dominates
    pub is_valid: bool,
    /// Intensity-weighted mean level, 0-255
    pub brightness_mean: f64,
    /// Share of mass below the dark level
    pub dark_fraction: f64,
    /// Share of mass at or above the bright level
    pub bright_fraction: f64,
}

/// Applies [`ExposureConfig`] thresholds to histograms
///
/// The bright band threshold is tighter than the dark one: clipped
/// highlights lose more than crushed shadows once the bracket is fused.
#[derive(Debug, Clone, Default)]
pub struct ExposureClassifier {
    config: ExposureConfig,
}

impl ExposureClassifier {
    pub fn new(config: ExposureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExposureConfig {
        &self.config
    }

    pub fn classify(&self, histogram: &Histogram) -> Result<Classification, BracketError> {
        let total = histogram.total();
        if !(total.is_finite() && total > 0.0) {
            return Err(BracketError::InvalidHistogram(format!(
                "histogram mass must be positive, got {}",
                total
            )));
        }

        let dark_fraction = histogram.mass(0..self.config.dark_level as usize) / total;
        let bright_fraction =
            histogram.mass(self.config.bright_level as usize..HISTOGRAM_BINS) / total;

        let weighted: f64 = histogram
            .bins()
            .iter()
            .enumerate()
            .map(|(level, &mass)| mass * level as f64)
            .sum();
        let brightness_mean = weighted / total;

        let is_valid = dark_fraction < self.config.max_dark_fraction
            && bright_fraction < self.config.max_bright_fraction;

        Ok(Classification {
            is_valid,
            brightness_mean,
            dark_fraction,
            bright_fraction,
        })
    }
}

/// Classify with the default thresholds
pub fn classify(histogram: &Histogram) -> Result<Classification, BracketError> {
    ExposureClassifier::default().classify(histogram)
}
