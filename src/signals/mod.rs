//! Signal detection.

pub mod detector;

pub use detector::{BreakdownDetector, DetectorState};
