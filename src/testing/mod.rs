//! Testing utilities for bracketfuse
//!
//! Provides a synthetic high-dynamic-range scene rendered at any
//! exposure time, for offline tests and benchmarks.

pub mod synthetic_data;

pub use synthetic_data::{
    histogram_from_levels,
    synthetic_exposure,
    synthetic_exposure_stack,
    write_synthetic_scene,
    REFERENCE_EXPOSURE,
};
