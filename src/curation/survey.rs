//! Catalog-wide survey: which cataloged images need attention, and how the
//! collection scores overall.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ImageSlot, ScoredImage};
use crate::curation_config::CurationConfig;

/// Artifact score at or above which an image is a severe case.
pub const SEVERE_ARTIFACT_SCORE: u8 = 50;

/// Artifact score at or above which an image is a moderate case.
pub const MODERATE_ARTIFACT_SCORE: u8 = 30;

/// One scored image in the existing catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyEntry {
    pub subject_id: String,
    pub slot: ImageSlot,
    pub quality: u8,
    pub artifact: u8,
    pub flags: Vec<String>,
}

impl SurveyEntry {
    pub fn from_scores(
        subject_id: impl Into<String>,
        slot: ImageSlot,
        scores: &ScoredImage,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            slot,
            quality: scores.quality.overall,
            artifact: scores.artifact.overall,
            flags: scores.artifact.flag_messages(),
        }
    }

    pub fn severity(&self) -> ArtifactSeverity {
        ArtifactSeverity::classify(self.artifact)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactSeverity {
    Mild,
    Moderate,
    Severe,
}

impl ArtifactSeverity {
    pub fn classify(artifact: u8) -> Self {
        if artifact >= SEVERE_ARTIFACT_SCORE {
            Self::Severe
        } else if artifact >= MODERATE_ARTIFACT_SCORE {
            Self::Moderate
        } else {
            Self::Mild
        }
    }
}

/// High artifacts alone, or moderate artifacts on an already weak image.
pub fn is_problematic(entry: &SurveyEntry, config: &CurationConfig) -> bool {
    entry.artifact >= config.flag_min_artifact_score
        || (entry.artifact >= config.moderate_artifact_score
            && entry.quality < config.moderate_artifact_quality_ceiling)
}

/// Problematic entries, worst artifact score first.
pub fn flag_problematic<'a>(
    entries: &'a [SurveyEntry],
    config: &CurationConfig,
) -> Vec<&'a SurveyEntry> {
    let mut flagged: Vec<_> = entries
        .iter()
        .filter(|e| is_problematic(e, config))
        .collect();
    flagged.sort_by(|a, b| b.artifact.cmp(&a.artifact));
    flagged
}

/// Reference images severe enough for artifact replacement, worst first.
/// Thumbnails are regenerated separately and never targeted.
pub fn artifact_replacement_targets<'a>(
    entries: &'a [SurveyEntry],
    config: &CurationConfig,
) -> Vec<&'a SurveyEntry> {
    let mut targets: Vec<_> = entries
        .iter()
        .filter(|e| !e.slot.is_thumbnail() && e.artifact >= config.artifact_replacement_min_score)
        .collect();
    targets.sort_by(|a, b| b.artifact.cmp(&a.artifact));
    targets
}

/// Reference images scoring below the poor-quality threshold, catalog order.
pub fn poor_quality_targets<'a>(
    entries: &'a [SurveyEntry],
    config: &CurationConfig,
) -> Vec<&'a SurveyEntry> {
    entries
        .iter()
        .filter(|e| !e.slot.is_thumbnail() && e.quality < config.poor_quality_threshold)
        .collect()
}

/// The `config.worst_image_listing` lowest-quality entries, lowest first.
pub fn worst_images<'a>(
    entries: &'a [SurveyEntry],
    config: &CurationConfig,
) -> Vec<&'a SurveyEntry> {
    let mut sorted: Vec<_> = entries.iter().collect();
    sorted.sort_by_key(|e| e.quality);
    sorted.truncate(config.worst_image_listing);
    sorted
}

/// Subjects with two or more problematic images, most issues first.
pub fn subjects_with_multiple_issues<'a>(
    entries: &'a [SurveyEntry],
    config: &CurationConfig,
) -> Vec<(&'a str, Vec<&'a SurveyEntry>)> {
    let mut by_subject: BTreeMap<&str, Vec<&SurveyEntry>> = BTreeMap::new();
    for entry in flag_problematic(entries, config) {
        by_subject.entry(entry.subject_id.as_str()).or_default().push(entry);
    }

    let mut grouped: Vec<_> = by_subject
        .into_iter()
        .filter(|(_, v)| v.len() >= 2)
        .collect();
    grouped.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    grouped
}

// ═══════════════════════════════════════════════════════════
// Score statistics
// ═══════════════════════════════════════════════════════════

/// Quality tiers used in catalog summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    /// 80-100
    pub excellent: usize,
    /// 60-79
    pub good: usize,
    /// 40-59
    pub fair: usize,
    /// 0-39
    pub poor: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreStatistics {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: u8,
    pub max: u8,
    pub tiers: TierCounts,
}

impl ScoreStatistics {
    /// `None` for an empty catalog.
    pub fn from_scores(scores: &[u8]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }

        let mut sorted = scores.to_vec();
        sorted.sort_unstable();
        let count = sorted.len();
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
        } else {
            sorted[mid] as f64
        };

        let mut tiers = TierCounts::default();
        for &s in &sorted {
            match s {
                80..=100 => tiers.excellent += 1,
                60..=79 => tiers.good += 1,
                40..=59 => tiers.fair += 1,
                _ => tiers.poor += 1,
            }
        }

        Some(Self {
            count,
            mean: sorted.iter().map(|&s| s as f64).sum::<f64>() / count as f64,
            median,
            min: sorted[0],
            max: sorted[count - 1],
            tiers,
        })
    }
}
