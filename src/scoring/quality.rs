//! Weighted image quality score (0-100, higher is better).
//!
//! Four sub-scores, each normalized to 0-100 before weighting:
//! - sharpness (35%): Laplacian variance / 1000
//! - light (25%): brightness window penalty averaged with contrast / 70
//! - color (25%): channel variance / 3000
//! - white regions (15%): inverse of the white-pixel ratio
//!
//! Qualitative ratings are reported next to the number so operators can see
//! why an image scored low.

use serde::{Deserialize, Serialize};

use super::PixelMetrics;

/// Quality thresholds and weights.
pub mod thresholds {
    /// Brightness window considered well exposed (inclusive).
    pub const MIN_BRIGHTNESS: f64 = 40.0;
    pub const MAX_BRIGHTNESS: f64 = 215.0;

    /// Width of the linear falloff above `MAX_BRIGHTNESS`.
    pub const OVEREXPOSURE_FALLOFF: f64 = 40.0;

    /// Normalization divisors: value at which a sub-score saturates at 100.
    pub const SHARPNESS_FULL_SCALE: f64 = 1000.0;
    pub const CONTRAST_FULL_SCALE: f64 = 70.0;
    pub const COLOR_FULL_SCALE: f64 = 3000.0;

    /// Points lost per unit of white ratio.
    pub const WHITE_PENALTY_SLOPE: f64 = 200.0;

    pub const SHARPNESS_WEIGHT: f64 = 0.35;
    pub const LIGHT_WEIGHT: f64 = 0.25;
    pub const COLOR_WEIGHT: f64 = 0.25;
    pub const WHITE_WEIGHT: f64 = 0.15;

    /// Sharpness rating cut-offs (Laplacian variance, exclusive).
    pub const SHARPNESS_EXCELLENT: f64 = 500.0;
    pub const SHARPNESS_GOOD: f64 = 200.0;
    pub const SHARPNESS_FAIR: f64 = 100.0;

    /// Contrast rating cut-offs (std-dev, exclusive).
    pub const CONTRAST_EXCELLENT: f64 = 50.0;
    pub const CONTRAST_GOOD: f64 = 30.0;

    /// Color variance rating cut-offs (exclusive).
    pub const COLOR_EXCELLENT: f64 = 2000.0;
    pub const COLOR_GOOD: f64 = 1000.0;
    pub const COLOR_FAIR: f64 = 500.0;

    /// White ratio rating cut-offs (exclusive upper bounds).
    pub const WHITE_GOOD: f64 = 0.10;
    pub const WHITE_FAIR: f64 = 0.25;
}

use thresholds::*;

// ═══════════════════════════════════════════════════════════
// Ratings
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharpnessRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SharpnessRating {
    pub fn from_variance(variance: f64) -> Self {
        if variance > SHARPNESS_EXCELLENT {
            Self::Excellent
        } else if variance > SHARPNESS_GOOD {
            Self::Good
        } else if variance > SHARPNESS_FAIR {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrightnessRating {
    TooDark,
    Good,
    TooBright,
}

impl BrightnessRating {
    pub fn from_mean(mean: f64) -> Self {
        if mean < MIN_BRIGHTNESS {
            Self::TooDark
        } else if mean > MAX_BRIGHTNESS {
            Self::TooBright
        } else {
            Self::Good
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContrastRating {
    Excellent,
    Good,
    Poor,
}

impl ContrastRating {
    pub fn from_std_dev(contrast: f64) -> Self {
        if contrast > CONTRAST_EXCELLENT {
            Self::Excellent
        } else if contrast > CONTRAST_GOOD {
            Self::Good
        } else {
            Self::Poor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ColorRating {
    pub fn from_variance(variance: f64) -> Self {
        if variance > COLOR_EXCELLENT {
            Self::Excellent
        } else if variance > COLOR_GOOD {
            Self::Good
        } else if variance > COLOR_FAIR {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhiteRegionRating {
    Good,
    Fair,
    Poor,
}

impl WhiteRegionRating {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < WHITE_GOOD {
            Self::Good
        } else if ratio < WHITE_FAIR {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Score
// ═══════════════════════════════════════════════════════════

/// Normalized sub-scores (each 0-100) before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubScores {
    pub sharpness: f64,
    /// Brightness and contrast, averaged 50/50.
    pub light: f64,
    pub color: f64,
    pub white: f64,
}

/// Overall quality plus the ratings that explain it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityScore {
    /// Weighted sum of the sub-scores, rounded (0-100).
    pub overall: u8,
    pub sub_scores: SubScores,
    pub sharpness: SharpnessRating,
    pub brightness: BrightnessRating,
    pub contrast: ContrastRating,
    pub color: ColorRating,
    pub white_regions: WhiteRegionRating,
}

/// Score image quality from its pixel statistics. Never fails.
pub fn score(metrics: &PixelMetrics) -> QualityScore {
    let sub_scores = SubScores {
        sharpness: sharpness_score(metrics.sharpness_variance()),
        light: light_score(metrics.mean_brightness(), metrics.contrast()),
        color: color_score(metrics.color_variance()),
        white: white_score(metrics.white_ratio()),
    };

    let weighted = sub_scores.sharpness * SHARPNESS_WEIGHT
        + sub_scores.light * LIGHT_WEIGHT
        + sub_scores.color * COLOR_WEIGHT
        + sub_scores.white * WHITE_WEIGHT;

    QualityScore {
        overall: weighted.round_ties_even().clamp(0.0, 100.0) as u8,
        sub_scores,
        sharpness: SharpnessRating::from_variance(metrics.sharpness_variance()),
        brightness: BrightnessRating::from_mean(metrics.mean_brightness()),
        contrast: ContrastRating::from_std_dev(metrics.contrast()),
        color: ColorRating::from_variance(metrics.color_variance()),
        white_regions: WhiteRegionRating::from_ratio(metrics.white_ratio()),
    }
}

/// `min(100, variance / 1000 * 100)`
pub fn sharpness_score(variance: f64) -> f64 {
    (variance / SHARPNESS_FULL_SCALE * 100.0).clamp(0.0, 100.0)
}

/// Exposure (100 inside the window, linear falloff outside) averaged with
/// contrast normalized against 70.
pub fn light_score(mean_brightness: f64, contrast: f64) -> f64 {
    let exposure = if mean_brightness < MIN_BRIGHTNESS {
        (mean_brightness / MIN_BRIGHTNESS * 100.0).max(0.0)
    } else if mean_brightness > MAX_BRIGHTNESS {
        (100.0 - (mean_brightness - MAX_BRIGHTNESS) / OVEREXPOSURE_FALLOFF * 100.0).max(0.0)
    } else {
        100.0
    };
    let contrast = (contrast / CONTRAST_FULL_SCALE * 100.0).clamp(0.0, 100.0);
    exposure * 0.5 + contrast * 0.5
}

/// `min(100, variance / 3000 * 100)`
pub fn color_score(variance: f64) -> f64 {
    (variance / COLOR_FULL_SCALE * 100.0).clamp(0.0, 100.0)
}

/// `max(0, 100 - ratio * 200)`: more white, lower score.
pub fn white_score(ratio: f64) -> f64 {
    (100.0 - ratio * WHITE_PENALTY_SLOPE).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_metrics_score_high() {
        let q = score(&PixelMetrics::sample());
        // sharp 60*.35=21, light 92.86*.25=23.21, color 83.33*.25=20.83, white 90*.15=13.5
        assert_eq!(q.overall, 79);
        assert_eq!(q.sharpness, SharpnessRating::Excellent);
        assert_eq!(q.brightness, BrightnessRating::Good);
        assert_eq!(q.contrast, ContrastRating::Excellent);
        assert_eq!(q.color, ColorRating::Excellent);
        assert_eq!(q.white_regions, WhiteRegionRating::Good);
    }

    #[test]
    fn perfect_metrics_cap_at_100() {
        let m = PixelMetrics::sample()
            .with_sharpness(50_000.0)
            .with_brightness(128.0, 200.0)
            .with_color_variance(20_000.0)
            .with_white(0.0, 0.0);
        assert_eq!(score(&m).overall, 100);
    }

    #[test]
    fn worst_metrics_floor_at_0() {
        let m = PixelMetrics::sample()
            .with_sharpness(0.0)
            .with_brightness(0.0, 0.0)
            .with_color_variance(0.0)
            .with_white(1.0, 1.0);
        assert_eq!(score(&m).overall, 0);
    }

    #[test]
    fn score_is_deterministic() {
        let m = PixelMetrics::sample().with_white(0.3, 0.2);
        assert_eq!(score(&m), score(&m));
    }

    #[test]
    fn more_white_never_raises_quality() {
        let mut previous = u8::MAX;
        for step in 0..=20 {
            let ratio = step as f64 * 0.05;
            let q = score(&PixelMetrics::sample().with_white(ratio, 0.0)).overall;
            assert!(q <= previous, "quality rose at white ratio {ratio}");
            previous = q;
        }
    }

    #[test]
    fn white_sub_score_saturates_at_half_coverage() {
        assert_eq!(white_score(0.0), 100.0);
        assert_eq!(white_score(0.25), 50.0);
        assert_eq!(white_score(0.5), 0.0);
        assert_eq!(white_score(1.0), 0.0);
    }

    #[test]
    fn brightness_falloff_both_sides() {
        // Dark side: 20/40 -> 50 exposure, zero contrast
        assert!((light_score(20.0, 0.0) - 25.0).abs() < 1e-9);
        // Bright side: 235 is halfway through the 40-point falloff
        assert!((light_score(235.0, 0.0) - 25.0).abs() < 1e-9);
        // Fully blown out
        assert!((light_score(255.0, 0.0) - 0.0).abs() < 1e-9);
        // Window edges are inclusive
        assert!((light_score(40.0, 70.0) - 100.0).abs() < 1e-9);
        assert!((light_score(215.0, 70.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn sharpness_and_color_saturate() {
        assert_eq!(sharpness_score(500.0), 50.0);
        assert_eq!(sharpness_score(5000.0), 100.0);
        assert_eq!(color_score(1500.0), 50.0);
        assert_eq!(color_score(9000.0), 100.0);
    }

    #[test]
    fn rating_boundaries_are_exclusive() {
        assert_eq!(SharpnessRating::from_variance(500.0), SharpnessRating::Good);
        assert_eq!(SharpnessRating::from_variance(200.0), SharpnessRating::Fair);
        assert_eq!(SharpnessRating::from_variance(100.0), SharpnessRating::Poor);
        assert_eq!(ContrastRating::from_std_dev(50.0), ContrastRating::Good);
        assert_eq!(ContrastRating::from_std_dev(30.0), ContrastRating::Poor);
        assert_eq!(ColorRating::from_variance(2000.0), ColorRating::Good);
        assert_eq!(ColorRating::from_variance(1000.0), ColorRating::Fair);
        assert_eq!(ColorRating::from_variance(500.0), ColorRating::Poor);
        assert_eq!(WhiteRegionRating::from_ratio(0.1), WhiteRegionRating::Fair);
        assert_eq!(WhiteRegionRating::from_ratio(0.25), WhiteRegionRating::Poor);
    }

    #[test]
    fn brightness_rating_window() {
        assert_eq!(BrightnessRating::from_mean(39.9), BrightnessRating::TooDark);
        assert_eq!(BrightnessRating::from_mean(40.0), BrightnessRating::Good);
        assert_eq!(BrightnessRating::from_mean(215.0), BrightnessRating::Good);
        assert_eq!(BrightnessRating::from_mean(215.1), BrightnessRating::TooBright);
    }

    #[test]
    fn ratings_serialize_snake_case() {
        let json = serde_json::to_string(&BrightnessRating::TooDark).unwrap();
        assert_eq!(json, "\"too_dark\"");
    }
}
