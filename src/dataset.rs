//! Scene dataset storage
//!
//! A dataset is a directory with one subdirectory per scene; each scene
//! holds images named by exposure time (`187.5.png`, `3000.png`, ...).
//! Histogram and bracket label records live as JSON files at the root.

use crate::config::{FusionConfig, StorageConfig};
use crate::errors::BracketError;
use crate::exposure::{extract_histogram, BracketSelector, ExposureRecord, Histogram, SceneBracket};
use crate::fusion::{fuse_with_report, FusionReport, MIN_FUSION_INPUTS};
use crate::types::Raster;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Histogram of one image within a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramRecord {
    pub scene: String,
    /// Image file name, e.g. `1500.png`
    pub image: String,
    #[serde(deserialize_with = "deserialize_histogram")]
    pub histogram: Histogram,
}

impl HistogramRecord {
    /// Exposure record keyed by the image name less its `extension`
    pub fn to_exposure_record(&self, extension: &str) -> ExposureRecord {
        ExposureRecord::new(strip_extension(&self.image, extension), self.histogram.clone())
    }
}

/// Selected bracket for one scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub scene: String,
    /// `[low, mid, high]` exposure times, `null` where no candidate exists
    pub best_exposure_times: SceneBracket,
}

/// Fused output of one scene
#[derive(Debug, Clone)]
pub struct FusedScene {
    pub image: Raster,
    /// Exposure times blended, increasing
    pub exposure_times: Vec<f64>,
    pub report: FusionReport,
    pub processing_time_ms: u64,
}

/// Histograms are stored either flat (`[0.1, ...]`) or as one
/// single-element row per bin (`[[0.1], ...]`)
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredBins {
    Flat(Vec<f64>),
    Column(Vec<[f64; 1]>),
}

fn deserialize_histogram<'de, D>(deserializer: D) -> Result<Histogram, D::Error>
where
    D: Deserializer<'de>,
{
    let bins = match StoredBins::deserialize(deserializer)? {
        StoredBins::Flat(bins) => bins,
        StoredBins::Column(rows) => rows.into_iter().map(|[v]| v).collect(),
    };
    Histogram::from_bins(bins).map_err(serde::de::Error::custom)
}

/// `name` without a trailing `.<extension>` (case-insensitive); other
/// dots belong to the exposure time and are kept
fn strip_extension<'a>(name: &'a str, extension: &str) -> &'a str {
    let suffix_len = extension.len() + 1;
    if name.len() > suffix_len && name.is_char_boundary(name.len() - suffix_len) {
        let (stem, suffix) = name.split_at(name.len() - suffix_len);
        if suffix.starts_with('.') && suffix[1..].eq_ignore_ascii_case(extension) {
            return stem;
        }
    }
    name
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Scene directories under `root`, sorted by name
pub fn list_scenes<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>, BracketError> {
    let root = root.as_ref();
    if !root.exists() {
        log::warn!("Dataset directory {:?} does not exist", root);
        return Ok(Vec::new());
    }

    let mut scenes: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    scenes.sort();
    Ok(scenes)
}

/// Image files with `extension` in a scene directory, sorted by name
pub fn list_scene_images<P: AsRef<Path>>(
    scene: P,
    extension: &str,
) -> Result<Vec<PathBuf>, BracketError> {
    let mut images: Vec<PathBuf> = fs::read_dir(scene.as_ref())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        })
        .collect();
    images.sort();
    Ok(images)
}

/// Histogram every image of every scene under `root`
///
/// Previously fused outputs are ignored. Images that fail to decode or have
/// no pixels are logged and skipped.
pub fn compute_histograms<P: AsRef<Path>>(
    root: P,
    storage: &StorageConfig,
) -> Result<Vec<HistogramRecord>, BracketError> {
    let mut records = Vec::new();

    for scene_path in list_scenes(root)? {
        let scene = name_of(&scene_path);
        for image_path in list_scene_images(&scene_path, &storage.image_extension)? {
            if image_path.file_name().is_some_and(|n| n == storage.fused_file_name.as_str()) {
                continue;
            }
            log::info!("Processing {:?}", image_path);

            let histogram = match Raster::open_gray(&image_path)
                .and_then(|raster| extract_histogram(&raster))
            {
                Ok(histogram) => histogram,
                Err(e) => {
                    log::warn!("Failed to histogram {:?}: {}", image_path, e);
                    continue;
                }
            };

            records.push(HistogramRecord {
                scene: scene.clone(),
                image: name_of(&image_path),
                histogram,
            });
        }
    }

    log::info!("Computed {} histograms", records.len());
    Ok(records)
}

fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<(), BracketError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    log::info!("Saved {:?}", path);
    Ok(())
}

pub fn save_histograms<P: AsRef<Path>>(
    path: P,
    records: &[HistogramRecord],
) -> Result<(), BracketError> {
    write_json(path, &records)
}

pub fn load_histograms<P: AsRef<Path>>(path: P) -> Result<Vec<HistogramRecord>, BracketError> {
    let contents = fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&contents)?)
}

/// Names of the scene directories under `root`, sorted
pub fn scene_names<P: AsRef<Path>>(root: P) -> Result<Vec<String>, BracketError> {
    Ok(list_scenes(root)?.iter().map(|p| name_of(p)).collect())
}

/// Select a bracket for every scene in `scenes` and every scene in `records`
///
/// Scenes are emitted in name order; a scene with no usable exposure,
/// including one with no histogram at all, still gets a label with every
/// slot empty. `extension` is stripped from image names to recover the
/// exposure time.
pub fn label_scenes(
    scenes: &[String],
    records: &[HistogramRecord],
    extension: &str,
    selector: &BracketSelector,
) -> Vec<LabelRecord> {
    let mut by_scene: BTreeMap<&str, Vec<ExposureRecord>> =
        scenes.iter().map(|s| (s.as_str(), Vec::new())).collect();
    for record in records {
        by_scene
            .entry(record.scene.as_str())
            .or_default()
            .push(record.to_exposure_record(extension));
    }

    by_scene
        .into_iter()
        .map(|(scene, exposures)| {
            let bracket = selector.select(&exposures);
            if bracket.is_empty() {
                log::warn!("Scene {} has no usable exposure", scene);
            }
            LabelRecord {
                scene: scene.to_string(),
                best_exposure_times: bracket,
            }
        })
        .collect()
}

pub fn save_labels<P: AsRef<Path>>(path: P, labels: &[LabelRecord]) -> Result<(), BracketError> {
    write_json(path, &labels)
}

pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<Vec<LabelRecord>, BracketError> {
    let contents = fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&contents)?)
}

/// Load a scene's bracketed images in increasing exposure order
///
/// Slots whose image is missing from the scene directory or fails to
/// decode are logged and skipped.
pub fn load_bracket<P: AsRef<Path>>(
    scene_dir: P,
    label: &LabelRecord,
    extension: &str,
) -> Result<Vec<(f64, Raster)>, BracketError> {
    let scene_dir = scene_dir.as_ref();
    let available: Vec<(f64, PathBuf)> = list_scene_images(scene_dir, extension)?
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;
            crate::exposure::parse_exposure_time(strip_extension(name, extension))
                .ok()
                .map(|time| (time, path))
        })
        .collect();

    let mut images = Vec::new();
    for time in label.best_exposure_times.exposure_times() {
        match available.iter().find(|(t, _)| *t == time) {
            Some((_, path)) => match Raster::open_rgb(path) {
                Ok(raster) => images.push((time, raster)),
                Err(e) => log::warn!("Scene {}: failed to load {:?}: {}", label.scene, path, e),
            },
            None => log::warn!(
                "Scene {}: no image for exposure time {}",
                label.scene,
                time
            ),
        }
    }
    Ok(images)
}

/// Load a labelled scene's bracket and fuse it
pub fn fuse_scene<P: AsRef<Path>>(
    scene_dir: P,
    label: &LabelRecord,
    extension: &str,
    config: &FusionConfig,
) -> Result<FusedScene, BracketError> {
    let start_time = Instant::now();
    let loaded = load_bracket(scene_dir, label, extension)?;
    if loaded.len() < MIN_FUSION_INPUTS {
        return Err(BracketError::InsufficientInputs {
            required: MIN_FUSION_INPUTS,
            provided: loaded.len(),
        });
    }

    let (exposure_times, images): (Vec<f64>, Vec<Raster>) = loaded.into_iter().unzip();
    let (image, report) = fuse_with_report(&images, config)?;
    let processing_time_ms = start_time.elapsed().as_millis() as u64;

    log::info!(
        "Fused scene {} from {:?} in {}ms",
        label.scene,
        exposure_times,
        processing_time_ms
    );

    Ok(FusedScene {
        image,
        exposure_times,
        report,
        processing_time_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("187.5.png", "png"), "187.5");
        assert_eq!(strip_extension("3000.PNG", "png"), "3000");
        assert_eq!(strip_extension("3000", "png"), "3000");
        assert_eq!(strip_extension("187.5", "png"), "187.5");
        assert_eq!(strip_extension(".png", "png"), ".png");
    }

    fn record(image: &str) -> HistogramRecord {
        HistogramRecord {
            scene: "scene_0001".to_string(),
            image: image.to_string(),
            histogram: crate::testing::histogram_from_levels(&[(128, 1.0)]),
        }
    }

    #[test]
    fn test_exposure_record_keeps_decimal_times() {
        assert_eq!(record("187.5").to_exposure_record("png").identifier, "187.5");
        assert_eq!(record("187.5.png").to_exposure_record("png").identifier, "187.5");
        assert_eq!(
            record("187.5.png").to_exposure_record("png").exposure_time().unwrap(),
            187.5
        );
    }

    #[test]
    fn test_label_scenes_keeps_decimal_times_without_extension() {
        let records = vec![record("187.5"), record("750"), record("3000.png")];
        let labels = label_scenes(&[], &records, "png", &BracketSelector::default());
        assert_eq!(labels.len(), 1);
        assert_eq!(
            labels[0].best_exposure_times.exposure_times(),
            vec![187.5, 750.0, 3000.0]
        );
    }

    #[test]
    fn test_label_scenes_labels_scenes_without_histograms() {
        let scenes = vec!["scene_0001".to_string(), "scene_0002".to_string()];
        let labels = label_scenes(&scenes, &[record("3000.png")], "png", &BracketSelector::default());
        let names: Vec<&str> = labels.iter().map(|l| l.scene.as_str()).collect();
        assert_eq!(names, vec!["scene_0001", "scene_0002"]);
        assert_eq!(labels[0].best_exposure_times.mid, Some(3000.0));
        assert_eq!(labels[1].best_exposure_times, SceneBracket::empty());
    }

    #[test]
    fn test_histogram_record_accepts_column_bins() {
        let column: Vec<[f64; 1]> = (0..256).map(|i| [if i == 7 { 1.0 } else { 0.0 }]).collect();
        let json = serde_json::json!({
            "scene": "scene_0001",
            "image": "1500.png",
            "histogram": column,
        });
        let record: HistogramRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.histogram.bins()[7], 1.0);
        assert_eq!(record.to_exposure_record("png").identifier, "1500");
    }

    #[test]
    fn test_histogram_record_rejects_short_bins() {
        let json = serde_json::json!({
            "scene": "scene_0001",
            "image": "1500.png",
            "histogram": [0.5, 0.5],
        });
        assert!(serde_json::from_value::<HistogramRecord>(json).is_err());
    }

    #[test]
    fn test_label_record_format() {
        let label = LabelRecord {
            scene: "scene_0002".to_string(),
            best_exposure_times: SceneBracket {
                low: Some(375.0),
                mid: None,
                high: Some(6000.0),
            },
        };
        let value = serde_json::to_value(&label).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "scene": "scene_0002",
                "best_exposure_times": [375.0, null, 6000.0],
            })
        );
    }
}
