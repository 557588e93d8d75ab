//! Scored images: the values ranking and decisions operate on.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::scoring::{
    artifact, pixel_stats, quality, ArtifactScore, DecodeError, PixelMetrics, QualityScore,
};

/// Position of an image within one subject's catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSlot {
    Thumbnail,
    Reference(usize),
}

impl ImageSlot {
    pub fn is_thumbnail(&self) -> bool {
        matches!(self, Self::Thumbnail)
    }
}

impl fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thumbnail => write!(f, "thumb"),
            Self::Reference(index) => write!(f, "image_{index}"),
        }
    }
}

impl FromStr for ImageSlot {
    type Err = String;

    /// Accepts catalog stems (`thumb`, `image_0`) with or without an extension.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stem = s.split('.').next().unwrap_or(s);
        if stem == "thumb" {
            return Ok(Self::Thumbnail);
        }
        stem.strip_prefix("image_")
            .and_then(|index| index.parse().ok())
            .map(Self::Reference)
            .ok_or_else(|| format!("Unrecognized image slot: {s}"))
    }
}

/// Attribution carried alongside a candidate. Opaque to scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub source_url: Option<String>,
    pub photographer: Option<String>,
    pub license_url: Option<String>,
    pub observation_date: Option<String>,
}

/// Pixel metrics with both scores derived from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredImage {
    pub metrics: PixelMetrics,
    pub quality: QualityScore,
    pub artifact: ArtifactScore,
}

impl ScoredImage {
    /// Run the full scoring chain on one decoded image.
    pub fn evaluate(image: &RgbImage) -> Result<Self, DecodeError> {
        let metrics = pixel_stats::compute(image)?;
        Ok(Self::from_metrics(metrics))
    }

    pub fn from_metrics(metrics: PixelMetrics) -> Self {
        let quality = quality::score(&metrics);
        let artifact = artifact::score(&metrics);
        Self {
            metrics,
            quality,
            artifact,
        }
    }

    pub fn summary(&self) -> ScoreSummary {
        ScoreSummary {
            quality: self.quality.overall,
            artifact: self.artifact.overall,
        }
    }
}

/// The two headline numbers decisions compare.
///
/// Drivers that only kept scores from an earlier report (no pixels) can build
/// this directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub quality: u8,
    pub artifact: u8,
}

/// One evaluated image considered as a replacement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub source_id: String,
    pub scores: ScoredImage,
    /// When the source photo was taken or published. Newer wins ties.
    pub recency: Option<DateTime<Utc>>,
    pub attribution: Attribution,
}

impl Candidate {
    /// Score a decoded image and wrap it as a candidate.
    pub fn evaluate(
        source_id: impl Into<String>,
        image: &RgbImage,
        recency: Option<DateTime<Utc>>,
        attribution: Attribution,
    ) -> Result<Self, DecodeError> {
        Ok(Self {
            source_id: source_id.into(),
            scores: ScoredImage::evaluate(image)?,
            recency,
            attribution,
        })
    }

    pub fn quality(&self) -> u8 {
        self.scores.quality.overall
    }

    pub fn artifact(&self) -> u8 {
        self.scores.artifact.overall
    }

    pub fn summary(&self) -> ScoreSummary {
        self.scores.summary()
    }
}

#[cfg(test)]
impl Candidate {
    /// Candidate with fixed headline scores; metrics are placeholders.
    pub(crate) fn with_scores(source_id: &str, quality: u8, artifact: u8) -> Self {
        let mut scores = ScoredImage::from_metrics(PixelMetrics::sample());
        scores.quality.overall = quality;
        scores.artifact.overall = artifact;
        Self {
            source_id: source_id.to_string(),
            scores,
            recency: None,
            attribution: Attribution::default(),
        }
    }

    pub(crate) fn at(mut self, recency: DateTime<Utc>) -> Self {
        self.recency = Some(recency);
        self
    }
}
