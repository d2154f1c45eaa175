use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum BracketError {
    /// Image has no pixels to build a histogram from
    EmptyImage { width: u32, height: u32 },
    /// Histogram has the wrong shape or carries no mass
    InvalidHistogram(String),
    /// Exposure-time identifier is not a decimal number
    IdentifierParse { identifier: String },
    /// Fusion needs more source images than were given
    InsufficientInputs { required: usize, provided: usize },
    /// Source images disagree on width, height or channel count
    DimensionMismatch {
        expected: (u32, u32, usize),
        got: (u32, u32, usize),
    },
    /// Pixel buffer does not match the declared dimensions
    DataCorruption { data_len: usize, expected_len: usize },
    UnsupportedChannels(usize),
    Io(String),
    Serialization(String),
    Config(String),
}

impl fmt::Display for BracketError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BracketError::EmptyImage { width, height } => {
                write!(f, "Empty image error: {}x{} image has no pixels", width, height)
            }
            BracketError::InvalidHistogram(msg) => write!(f, "Invalid histogram: {}", msg),
            BracketError::IdentifierParse { identifier } => {
                write!(
                    f,
                    "Identifier parse error: '{}' is not a finite decimal exposure time",
                    identifier
                )
            }
            BracketError::InsufficientInputs { required, provided } => {
                write!(f, "Insufficient inputs: need {}, got {}", required, provided)
            }
            BracketError::DimensionMismatch { expected, got } => write!(
                f,
                "Image dimension mismatch: expected {}x{}x{}, got {}x{}x{}",
                expected.0, expected.1, expected.2, got.0, got.1, got.2
            ),
            BracketError::DataCorruption {
                data_len,
                expected_len,
            } => write!(
                f,
                "Pixel data corruption: got {} bytes, expected {}",
                data_len, expected_len
            ),
            BracketError::UnsupportedChannels(channels) => {
                write!(f, "Unsupported channel count: {}", channels)
            }
            BracketError::Io(msg) => write!(f, "IO error: {}", msg),
            BracketError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            BracketError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for BracketError {}

impl From<std::io::Error> for BracketError {
    fn from(err: std::io::Error) -> Self {
        BracketError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BracketError {
    fn from(err: serde_json::Error) -> Self {
        BracketError::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for BracketError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io) => BracketError::Io(io.to_string()),
            other => BracketError::Io(format!("image codec: {}", other)),
        }
    }
}
