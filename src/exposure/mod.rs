/// Exposure bracket selection
///
/// Turns each captured image of a scene into a usable/unusable verdict
/// and picks a low/mid/high bracket from the usable ones:
/// 1. Build a normalized 256-bin intensity histogram per image
/// 2. Classify each histogram by its near-black and near-white mass
/// 3. Order the usable exposures by mean brightness
/// 4. Take the darkest, the brightest and the middle of the rest
pub mod bracket;
pub mod classify;
pub mod histogram;

pub use bracket::{
    bracket_from_candidates, parse_exposure_time, select_bracket, BracketSelector, Candidate,
};
pub use classify::{classify, Classification, ExposureClassifier};
pub use histogram::{extract_histogram, Histogram, HISTOGRAM_BINS};

use serde::{Deserialize, Serialize};

/// One captured image of a scene, keyed by its exposure time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureRecord {
    /// Exposure time as written by the capture layer, e.g. `"187.5"`
    pub identifier: String,
    pub histogram: Histogram,
}

impl ExposureRecord {
    pub fn new(identifier: impl Into<String>, histogram: Histogram) -> Self {
        Self {
            identifier: identifier.into(),
            histogram,
        }
    }

    /// Numeric exposure time parsed from the identifier
    pub fn exposure_time(&self) -> Result<f64, crate::errors::BracketError> {
        parse_exposure_time(&self.identifier)
    }
}

/// Selected low/mid/high exposure times for one scene
///
/// Slots are ordered by brightness, not by exposure time. Serializes as
/// the `[low, mid, high]` triple with `null` for empty slots.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[Option<f64>; 3]", into = "[Option<f64>; 3]")]
pub struct SceneBracket {
    pub low: Option<f64>,
    pub mid: Option<f64>,
    pub high: Option<f64>,
}

impl SceneBracket {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.low.is_none() && self.mid.is_none() && self.high.is_none()
    }

    /// Number of filled slots
    pub fn len(&self) -> usize {
        self.to_triple().iter().flatten().count()
    }

    pub fn to_triple(&self) -> [Option<f64>; 3] {
        [self.low, self.mid, self.high]
    }

    /// Filled exposure times, sorted by increasing exposure
    pub fn exposure_times(&self) -> Vec<f64> {
        let mut times: Vec<f64> = self.to_triple().into_iter().flatten().collect();
        times.sort_by(f64::total_cmp);
        times
    }
}

impl From<[Option<f64>; 3]> for SceneBracket {
    fn from(triple: [Option<f64>; 3]) -> Self {
        let [low, mid, high] = triple;
        Self { low, mid, high }
    }
}

impl From<SceneBracket> for [Option<f64>; 3] {
    fn from(bracket: SceneBracket) -> Self {
        bracket.to_triple()
    }
}
