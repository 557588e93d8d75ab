//! Rule-based artifact score (0-100, higher = more non-subject clutter).
//!
//! Each rule adds points independently; only the two white-region tiers are
//! exclusive. Every rule that fires leaves a flag carrying the value that
//! triggered it, in rule order.

use std::fmt;

use serde::Serialize;

use super::PixelMetrics;

/// Artifact rule thresholds and point values.
pub mod thresholds {
    pub const HIGH_WHITE_RATIO: f64 = 0.25;
    pub const HIGH_WHITE_POINTS: u32 = 30;

    pub const MODERATE_WHITE_RATIO: f64 = 0.15;
    pub const MODERATE_WHITE_POINTS: u32 = 15;

    pub const EXTREME_WHITE_RATIO: f64 = 0.10;
    pub const EXTREME_WHITE_POINTS: u32 = 20;

    pub const LOW_SATURATION_RATIO: f64 = 0.40;
    pub const LOW_SATURATION_POINTS: u32 = 20;

    pub const MANY_LINES: u32 = 20;
    pub const MANY_LINES_POINTS: u32 = 15;

    pub const UNIFORM_RATIO: f64 = 0.50;
    pub const UNIFORM_POINTS: u32 = 10;

    pub const LIMITED_COLOR_VARIANCE: f64 = 500.0;
    pub const LIMITED_COLOR_POINTS: u32 = 10;

    /// Score ceiling.
    pub const MAX_SCORE: u32 = 100;
}

use thresholds::*;

/// Which rule fired, with the measurement that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ArtifactFlag {
    HighWhiteRegions { ratio: f64 },
    ModerateWhiteRegions { ratio: f64 },
    ExtremeBrightness { ratio: f64 },
    LowSaturation { ratio: f64 },
    ManyStraightLines { count: u32 },
    UniformBackground { ratio: f64 },
    LimitedColors { variance: f64 },
}

impl ArtifactFlag {
    /// Points this rule contributes before capping.
    pub fn points(&self) -> u32 {
        match self {
            Self::HighWhiteRegions { .. } => HIGH_WHITE_POINTS,
            Self::ModerateWhiteRegions { .. } => MODERATE_WHITE_POINTS,
            Self::ExtremeBrightness { .. } => EXTREME_WHITE_POINTS,
            Self::LowSaturation { .. } => LOW_SATURATION_POINTS,
            Self::ManyStraightLines { .. } => MANY_LINES_POINTS,
            Self::UniformBackground { .. } => UNIFORM_POINTS,
            Self::LimitedColors { .. } => LIMITED_COLOR_POINTS,
        }
    }
}

/// Report text. Every message carries the value that triggered its rule, so
/// the line flag reads `Many straight lines (N, ruler/paper?)` rather than
/// the bare `Many straight lines (ruler/paper?)`.
impl fmt::Display for ArtifactFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighWhiteRegions { ratio } => {
                write!(f, "HIGH white regions ({:.1}%)", ratio * 100.0)
            }
            Self::ModerateWhiteRegions { ratio } => {
                write!(f, "MODERATE white regions ({:.1}%)", ratio * 100.0)
            }
            Self::ExtremeBrightness { ratio } => {
                write!(f, "Extreme brightness ({:.1}%)", ratio * 100.0)
            }
            Self::LowSaturation { ratio } => write!(f, "Low saturation ({:.1}%)", ratio * 100.0),
            Self::ManyStraightLines { count } => {
                write!(f, "Many straight lines ({count}, ruler/paper?)")
            }
            Self::UniformBackground { ratio } => {
                write!(f, "Uniform background ({:.1}%)", ratio * 100.0)
            }
            Self::LimitedColors { variance } => write!(f, "Limited colors ({variance:.0})"),
        }
    }
}

/// Capped artifact score plus the rules that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactScore {
    pub overall: u8,
    pub flags: Vec<ArtifactFlag>,
}

impl ArtifactScore {
    /// Operator-facing flag text, in rule order.
    pub fn flag_messages(&self) -> Vec<String> {
        self.flags.iter().map(ToString::to_string).collect()
    }
}

/// Apply every artifact rule to the pixel statistics. Never fails.
pub fn score(metrics: &PixelMetrics) -> ArtifactScore {
    let mut flags = Vec::new();

    let white = metrics.white_ratio();
    if white > HIGH_WHITE_RATIO {
        flags.push(ArtifactFlag::HighWhiteRegions { ratio: white });
    } else if white > MODERATE_WHITE_RATIO {
        flags.push(ArtifactFlag::ModerateWhiteRegions { ratio: white });
    }

    if metrics.extreme_white_ratio() > EXTREME_WHITE_RATIO {
        flags.push(ArtifactFlag::ExtremeBrightness {
            ratio: metrics.extreme_white_ratio(),
        });
    }

    if metrics.low_saturation_ratio() > LOW_SATURATION_RATIO {
        flags.push(ArtifactFlag::LowSaturation {
            ratio: metrics.low_saturation_ratio(),
        });
    }

    if metrics.line_count() > MANY_LINES {
        flags.push(ArtifactFlag::ManyStraightLines {
            count: metrics.line_count(),
        });
    }

    if metrics.uniform_ratio() > UNIFORM_RATIO {
        flags.push(ArtifactFlag::UniformBackground {
            ratio: metrics.uniform_ratio(),
        });
    }

    if metrics.color_variance() < LIMITED_COLOR_VARIANCE {
        flags.push(ArtifactFlag::LimitedColors {
            variance: metrics.color_variance(),
        });
    }

    let total: u32 = flags.iter().map(ArtifactFlag::points).sum();
    ArtifactScore {
        overall: total.min(MAX_SCORE) as u8,
        flags,
    }
}
