//! Quality and artifact scoring engine.
//!
//! Turns a decoded pixel grid into comparable numbers:
//! 1. `pixel_stats::compute` derives `PixelMetrics` once per image
//! 2. `quality::score` folds them into a weighted 0-100 quality score
//! 3. `artifact::score` applies the additive artifact rules
//!
//! Every step is a pure function of its input. Thresholds are fixed constants
//! so that scores for the same pixels are reproducible across runs.

pub mod artifact;
pub mod lines;
pub mod pixel_stats;
pub mod quality;

pub use artifact::{ArtifactFlag, ArtifactScore};
pub use pixel_stats::{decode_image, PixelMetrics};
pub use quality::{
    BrightnessRating, ColorRating, ContrastRating, QualityScore, SharpnessRating, SubScores,
    WhiteRegionRating,
};

use thiserror::Error;

/// The only error the engine produces: the pixel grid cannot be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Image is empty ({width}x{height})")]
    Empty { width: u32, height: u32 },

    #[error("Failed to decode image: {0}")]
    Unreadable(String),
}
