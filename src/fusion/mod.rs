/// Exposure Fusion Module
///
/// Blends a bracket of differently exposed images into one well-exposed
/// 8-bit image without recovering radiance:
/// 1. Score every pixel of every source for contrast, saturation and
///    well-exposedness
/// 2. Normalize the scores across the stack into per-pixel weights
/// 3. Decompose sources into Laplacian pyramids and weights into
///    Gaussian pyramids
/// 4. Blend each level as a weighted sum and collapse the result
pub mod merge;
pub mod pyramid;
pub mod weights;

pub use merge::{fuse, fuse_with_report};

use serde::{Deserialize, Serialize};

/// Minimum number of sources a fusion call accepts
pub const MIN_FUSION_INPUTS: usize = 2;

/// Summary of a fusion run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionReport {
    /// Number of source images blended
    pub sources: usize,
    /// Pyramid levels used, including the base level
    pub levels: usize,
}
