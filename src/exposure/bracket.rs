/// Low/mid/high bracket selection over a scene's exposures
use super::classify::ExposureClassifier;
use super::{ExposureRecord, SceneBracket};
use crate::errors::BracketError;

/// A usable exposure with its brightness
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub exposure_time: f64,
    pub brightness_mean: f64,
}

/// Parse an exposure-time identifier such as `"1500"` or `"187.5"`
pub fn parse_exposure_time(identifier: &str) -> Result<f64, BracketError> {
    let parse_error = || BracketError::IdentifierParse {
        identifier: identifier.to_string(),
    };
    let value: f64 = identifier.trim().parse().map_err(|_| parse_error())?;
    if !value.is_finite() {
        return Err(parse_error());
    }
    Ok(value)
}

/// Chooses a scene's bracket from its classified exposures
#[derive(Debug, Clone, Default)]
pub struct BracketSelector {
    classifier: ExposureClassifier,
}

impl BracketSelector {
    pub fn new(classifier: ExposureClassifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &ExposureClassifier {
        &self.classifier
    }

    /// Usable exposures ordered by brightness
    ///
    /// Records are first ordered by exposure time, so equal brightness
    /// keeps the shorter exposure first. Records with unparsable
    /// identifiers or massless histograms are logged and dropped.
    pub fn candidates(&self, records: &[ExposureRecord]) -> Vec<Candidate> {
        let mut timed: Vec<(f64, &ExposureRecord)> = records
            .iter()
            .filter_map(|record| match record.exposure_time() {
                Ok(time) => Some((time, record)),
                Err(e) => {
                    log::warn!("Skipping exposure record: {}", e);
                    None
                }
            })
            .collect();
        timed.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut candidates: Vec<Candidate> = timed
            .into_iter()
            .filter_map(|(exposure_time, record)| {
                match self.classifier.classify(&record.histogram) {
                    Ok(result) if result.is_valid => Some(Candidate {
                        exposure_time,
                        brightness_mean: result.brightness_mean,
                    }),
                    Ok(result) => {
                        log::debug!(
                            "Rejected exposure {}: dark {:.3}, bright {:.3}",
                            record.identifier,
                            result.dark_fraction,
                            result.bright_fraction
                        );
                        None
                    }
                    Err(e) => {
                        log::warn!("Rejected exposure {}: {}", record.identifier, e);
                        None
                    }
                }
            })
            .collect();

        candidates.sort_by(|a, b| a.brightness_mean.total_cmp(&b.brightness_mean));
        candidates
    }

    /// Pick the darkest, brightest and interior-middle candidates
    pub fn select(&self, records: &[ExposureRecord]) -> SceneBracket {
        let candidates = self.candidates(records);
        let bracket = bracket_from_candidates(&candidates);
        log::debug!(
            "Selected bracket {:?} from {} of {} exposures",
            bracket.to_triple(),
            candidates.len(),
            records.len()
        );
        bracket
    }
}

/// Fill the bracket slots from brightness-ordered candidates
///
/// A lone candidate goes to the mid slot. With two or more, the ends
/// take low and high and the mid slot gets index `len / 2` of the
/// interior, which is the upper of the two middles for even interiors.
pub fn bracket_from_candidates(candidates: &[Candidate]) -> SceneBracket {
    match candidates {
        [] => SceneBracket::empty(),
        [only] => SceneBracket {
            low: None,
            mid: Some(only.exposure_time),
            high: None,
        },
        [first, interior @ .., last] => SceneBracket {
            low: Some(first.exposure_time),
            mid: interior
                .get(interior.len() / 2)
                .map(|candidate| candidate.exposure_time),
            high: Some(last.exposure_time),
        },
    }
}

/// Select with the default thresholds
pub fn select_bracket(records: &[ExposureRecord]) -> SceneBracket {
    BracketSelector::default().select(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::histogram::{Histogram, HISTOGRAM_BINS};

    fn record_at(identifier: &str, level: usize) -> ExposureRecord {
        let mut bins = vec![0.0; HISTOGRAM_BINS];
        bins[level] = 1.0;
        ExposureRecord::new(identifier, Histogram::from_bins(bins).unwrap())
    }

    fn candidate(exposure_time: f64, brightness_mean: f64) -> Candidate {
        Candidate {
            exposure_time,
            brightness_mean,
        }
    }

    #[test]
    fn test_parse_exposure_time() {
        assert_eq!(parse_exposure_time("1500").unwrap(), 1500.0);
        assert_eq!(parse_exposure_time(" 187.5 ").unwrap(), 187.5);
        assert!(parse_exposure_time("1500.png").is_err());
        assert!(parse_exposure_time("inf").is_err());
        let err = parse_exposure_time("NaN").unwrap_err();
        assert!(err.to_string().contains("not a finite decimal"));
        assert!(parse_exposure_time("").is_err());
    }

    #[test]
    fn test_even_interior_takes_index_half_len() {
        let candidates: Vec<Candidate> = (1..=4).map(|i| candidate(i as f64, i as f64)).collect();
        let bracket = bracket_from_candidates(&candidates);
        assert_eq!(bracket.to_triple(), [Some(1.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_equal_brightness_keeps_exposure_order() {
        let records = vec![
            record_at("3000", 100),
            record_at("750", 100),
            record_at("1500", 100),
        ];
        let candidates = BracketSelector::default().candidates(&records);
        let times: Vec<f64> = candidates.iter().map(|c| c.exposure_time).collect();
        assert_eq!(times, vec![750.0, 1500.0, 3000.0]);
    }

    #[test]
    fn test_invalid_exposures_excluded() {
        let records = vec![
            record_at("100", 0),
            record_at("200", 90),
            record_at("400", 160),
            record_at("800", 255),
        ];
        let bracket = select_bracket(&records);
        assert_eq!(bracket.to_triple(), [Some(200.0), None, Some(400.0)]);
    }

    #[test]
    fn test_unparsable_identifier_skipped() {
        let records = vec![
            record_at("abc", 120),
            record_at("200", 90),
            record_at("400", 160),
        ];
        let bracket = select_bracket(&records);
        assert_eq!(bracket.to_triple(), [Some(200.0), None, Some(400.0)]);
    }
}
