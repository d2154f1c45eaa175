//! Bracket Selection Testing
//!
//! Covers histogram extraction, exposure classification and the
//! low/mid/high selection policy, including tie-breaks and skipped records.

use bracketfuse::config::ExposureConfig;
use bracketfuse::exposure::{
    classify, extract_histogram, select_bracket, BracketSelector, ExposureClassifier,
    ExposureRecord,
};
use bracketfuse::testing::{histogram_from_levels, synthetic_exposure_stack};
use bracketfuse::{BracketError, PixelLayout, Raster, SceneBracket};

/// Record whose whole histogram sits on `level`, so its brightness is `level`
fn record_at(identifier: &str, level: usize) -> ExposureRecord {
    ExposureRecord::new(identifier, histogram_from_levels(&[(level, 1.0)]))
}

#[test]
fn test_no_records_gives_empty_bracket() {
    let bracket = select_bracket(&[]);
    assert_eq!(bracket.to_triple(), [None, None, None]);
}

#[test]
fn test_all_invalid_gives_empty_bracket() {
    let records = vec![record_at("100", 0), record_at("200", 5), record_at("400", 250)];
    assert!(select_bracket(&records).is_empty());
}

#[test]
fn test_single_candidate_fills_mid() {
    let bracket = select_bracket(&[record_at("100", 100)]);
    assert_eq!(bracket.to_triple(), [None, Some(100.0), None]);
}

#[test]
fn test_two_candidates_leave_mid_empty() {
    let records = vec![record_at("500", 200), record_at("10", 40)];
    let bracket = select_bracket(&records);
    assert_eq!(
        bracket,
        SceneBracket {
            low: Some(10.0),
            mid: None,
            high: Some(500.0)
        }
    );
}

#[test]
fn test_five_candidates_take_interior_middle() {
    let records = vec![
        record_at("4", 160),
        record_at("1", 40),
        record_at("5", 200),
        record_at("3", 120),
        record_at("2", 80),
    ];
    let bracket = select_bracket(&records);
    assert_eq!(bracket.to_triple(), [Some(1.0), Some(3.0), Some(5.0)]);
}

#[test]
fn test_order_follows_brightness_not_exposure_time() {
    // a longer exposure that came out darker still lands in the low slot
    let records = vec![
        record_at("100", 180),
        record_at("200", 60),
        record_at("300", 120),
    ];
    let bracket = select_bracket(&records);
    assert_eq!(bracket.to_triple(), [Some(200.0), Some(300.0), Some(100.0)]);
}

#[test]
fn test_decimal_identifiers() {
    let records = vec![
        record_at("187.5", 60),
        record_at("375", 110),
        record_at("750", 170),
    ];
    let bracket = select_bracket(&records);
    assert_eq!(bracket.low, Some(187.5));
    assert_eq!(bracket.mid, Some(375.0));
    assert_eq!(bracket.high, Some(750.0));
}

#[test]
fn test_malformed_identifier_only_drops_that_record() {
    let records = vec![
        record_at("n/a", 120),
        record_at("1500", 60),
        record_at("3000", 180),
    ];
    assert_eq!(
        ExposureRecord::new("n/a", histogram_from_levels(&[(1, 1.0)])).exposure_time(),
        Err(BracketError::IdentifierParse {
            identifier: "n/a".to_string()
        })
    );
    let bracket = select_bracket(&records);
    assert_eq!(bracket.to_triple(), [Some(1500.0), None, Some(3000.0)]);
}

#[test]
fn test_zero_mass_histogram_excluded() {
    let records = vec![
        ExposureRecord::new("50", histogram_from_levels(&[])),
        record_at("100", 100),
    ];
    let bracket = select_bracket(&records);
    assert_eq!(bracket.to_triple(), [None, Some(100.0), None]);
}

#[test]
fn test_custom_thresholds_change_candidates() {
    // 60% near-white passes the default bright limit of 0.70 ...
    let histogram = histogram_from_levels(&[(240, 0.6), (128, 0.4)]);
    assert!(classify(&histogram).unwrap().is_valid);

    // ... but not a stricter sensor profile
    let strict = BracketSelector::new(ExposureClassifier::new(ExposureConfig {
        max_bright_fraction: 0.5,
        ..Default::default()
    }));
    let records = vec![ExposureRecord::new("800", histogram)];
    assert!(strict.select(&records).is_empty());
    assert_eq!(select_bracket(&records).mid, Some(800.0));
}

#[test]
fn test_constant_image_round_trip() {
    let image = Raster::filled(16, 9, PixelLayout::Gray, 173);
    let histogram = extract_histogram(&image).unwrap();

    for (level, &mass) in histogram.bins().iter().enumerate() {
        assert_eq!(mass, if level == 173 { 1.0 } else { 0.0 });
    }
    assert_eq!(classify(&histogram).unwrap().brightness_mean, 173.0);
}

#[test]
fn test_synthetic_sweep_brackets_by_exposure() {
    let times = bracketfuse::config::default_exposure_times();
    let records: Vec<ExposureRecord> = synthetic_exposure_stack(48, 16, &times)
        .into_iter()
        .map(|(time, raster)| {
            let histogram = extract_histogram(&raster.to_luma()).unwrap();
            ExposureRecord::new(time.to_string(), histogram)
        })
        .collect();

    let selector = BracketSelector::default();
    let candidates = selector.candidates(&records);
    assert!(candidates.len() >= 3, "got {} candidates", candidates.len());
    assert!(candidates.len() < times.len());
    assert!(candidates
        .windows(2)
        .all(|pair| pair[0].brightness_mean <= pair[1].brightness_mean));

    let bracket = selector.select(&records);
    let (low, mid, high) = (
        bracket.low.unwrap(),
        bracket.mid.unwrap(),
        bracket.high.unwrap(),
    );
    // the synthetic scene brightens monotonically with exposure time
    assert!(low < mid && mid < high);
}
