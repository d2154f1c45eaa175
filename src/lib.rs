//! bracketfuse: exposure bracket selection and exposure fusion
//!
//! This crate picks a well-exposed low/mid/high bracket out of a scene
//! captured at many exposure times, and fuses the chosen bracket into a
//! single well-exposed 8-bit image.
//!
//! # Features
//! - Normalized 256-bin intensity histograms
//! - Threshold-based exposure classification with tunable bands
//! - Brightness-ordered low/mid/high bracket selection
//! - Multiresolution (Laplacian pyramid) exposure fusion
//! - JSON histogram and label records for capture datasets
//!
//! # Usage
//! ```rust,no_run
//! use bracketfuse::config::FusionConfig;
//! use bracketfuse::exposure::{extract_histogram, select_bracket, ExposureRecord};
//! use bracketfuse::fusion::fuse;
//! use bracketfuse::Raster;
//!
//! # fn main() -> Result<(), bracketfuse::BracketError> {
//! let times = [750.0, 3000.0, 12000.0];
//! let mut records = Vec::new();
//! let mut images = Vec::new();
//! for time in times {
//!     let image = Raster::open_rgb(format!("scene_0001/{}.png", time))?;
//!     records.push(ExposureRecord::new(time.to_string(), extract_histogram(&image.to_luma())?));
//!     images.push(image);
//! }
//!
//! let bracket = select_bracket(&records);
//! println!("bracket: {:?}", bracket.to_triple());
//!
//! let fused = fuse(&images, &FusionConfig::default())?;
//! fused.save("fused.png")?;
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod dataset;
pub mod errors;
pub mod exposure;
pub mod fusion;
pub mod types;

// Testing utilities - synthetic exposure stacks for offline testing
pub mod testing;

// Re-exports for convenience
pub use config::BracketFuseConfig;
pub use errors::BracketError;
pub use exposure::{Classification, ExposureRecord, Histogram, SceneBracket};
pub use fusion::FusionReport;
pub use types::{PixelLayout, Raster};

/// Initialize logging for the pipeline
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "bracketfuse=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
