//! Configuration management for bracketfuse
//!
//! Provides loading, saving and validation of the exposure thresholds,
//! fusion weights, default capture sweep and dataset layout.

use crate::errors::BracketError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BracketFuseConfig {
    #[serde(default)]
    pub exposure: ExposureConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Histogram thresholds deciding whether an exposure is usable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureConfig {
    /// Bins below this level count as near-black
    pub dark_level: u8,
    /// Bins at or above this level count as near-white
    pub bright_level: u8,
    /// Exposures with at least this share of near-black pixels are rejected
    pub max_dark_fraction: f64,
    /// Exposures with at least this share of near-white pixels are rejected
    pub max_bright_fraction: f64,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            dark_level: 25,
            bright_level: 230,
            max_dark_fraction: 0.90,
            max_bright_fraction: 0.70,
        }
    }
}

/// Per-pixel quality weighting and pyramid depth for exposure fusion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Exponent on the Laplacian contrast measure
    pub contrast_weight: f32,
    /// Exponent on the channel standard deviation measure
    pub saturation_weight: f32,
    /// Exponent on the well-exposedness measure
    pub exposedness_weight: f32,
    /// Spread of the well-exposedness Gaussian around mid-gray, in [0,1] units
    pub exposedness_sigma: f32,
    /// Cap on extra pyramid levels; `None` derives it from the image size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_levels: Option<u32>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            contrast_weight: 1.0,
            saturation_weight: 1.0,
            exposedness_weight: 1.0,
            exposedness_sigma: 0.2,
            max_levels: None,
        }
    }
}

/// Exposure sweep a capture layer falls back to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Exposure times in microseconds, increasing
    pub exposure_times: Vec<f64>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            exposure_times: default_exposure_times(),
        }
    }
}

impl CaptureConfig {
    /// Directory name for the `n`th captured scene (1-based)
    pub fn scene_dir_name(n: usize) -> String {
        format!("scene_{:04}", n)
    }

    /// File name for an image captured at `exposure_time`
    pub fn image_file_name(exposure_time: f64, extension: &str) -> String {
        format!("{}.{}", exposure_time, extension)
    }
}

/// 14 stops doubling from 187.5µs, centred on 3ms
pub fn default_exposure_times() -> Vec<f64> {
    (0..14).map(|i| 3000.0 * 2f64.powi(i - 4)).collect()
}

/// Dataset layout on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding one subdirectory per scene
    pub dataset_path: String,
    /// Histogram records file, relative to the dataset root
    pub histograms_file: String,
    /// Bracket label records file, relative to the dataset root
    pub labels_file: String,
    /// Extension of captured images
    pub image_extension: String,
    /// File name of the fused output written into a scene directory
    pub fused_file_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dataset_path: "./hdr_data".to_string(),
            histograms_file: "histograms.json".to_string(),
            labels_file: "labels.json".to_string(),
            image_extension: "png".to_string(),
            fused_file_name: "fused.png".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn histograms_path(&self) -> PathBuf {
        Path::new(&self.dataset_path).join(&self.histograms_file)
    }

    pub fn labels_path(&self) -> PathBuf {
        Path::new(&self.dataset_path).join(&self.labels_file)
    }

    pub fn scene_path(&self, scene: &str) -> PathBuf {
        Path::new(&self.dataset_path).join(scene)
    }
}

impl BracketFuseConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, BracketError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            BracketError::Config(format!("Failed to read config file: {}", e))
        })?;

        let config: BracketFuseConfig = toml::from_str(&contents).map_err(|e| {
            BracketError::Config(format!("Failed to parse config file: {}", e))
        })?;

        config.validate().map_err(BracketError::Config)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), BracketError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BracketError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            BracketError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            BracketError::Config(format!("Failed to write config file: {}", e))
        })?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("bracketfuse.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        let exposure = &self.exposure;
        if exposure.dark_level >= exposure.bright_level {
            return Err("Dark level must be below bright level".to_string());
        }
        if !(exposure.max_dark_fraction > 0.0 && exposure.max_dark_fraction <= 1.0) {
            return Err("Max dark fraction must be in (0.0, 1.0]".to_string());
        }
        if !(exposure.max_bright_fraction > 0.0 && exposure.max_bright_fraction <= 1.0) {
            return Err("Max bright fraction must be in (0.0, 1.0]".to_string());
        }

        let fusion = &self.fusion;
        for (name, weight) in [
            ("contrast", fusion.contrast_weight),
            ("saturation", fusion.saturation_weight),
            ("exposedness", fusion.exposedness_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("Fusion {} weight must be non-negative", name));
            }
        }
        if !fusion.exposedness_sigma.is_finite() || fusion.exposedness_sigma <= 0.0 {
            return Err("Exposedness sigma must be positive".to_string());
        }

        let times = &self.capture.exposure_times;
        if times.is_empty() {
            return Err("Exposure sweep must not be empty".to_string());
        }
        if times.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            return Err("Exposure times must be positive".to_string());
        }
        if times.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err("Exposure times must be strictly increasing".to_string());
        }

        let storage = &self.storage;
        if storage.histograms_file.is_empty()
            || storage.labels_file.is_empty()
            || storage.fused_file_name.is_empty()
        {
            return Err("Storage file names must not be empty".to_string());
        }
        if storage.image_extension.is_empty() {
            return Err("Image extension must not be empty".to_string());
        }

        Ok(())
    }
}
