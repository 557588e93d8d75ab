//! Replacement decisions: should the best candidate replace the current image?
//!
//! One policy enum covers the three curation workflows. Each variant gates on
//! a single score with an explicit threshold. A rejection is a normal outcome,
//! never an error.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Candidate, ImageSlot, ScoreSummary};

/// Minimum quality gain before an existing image replaces the thumbnail.
pub const DEFAULT_THUMBNAIL_MIN_IMPROVEMENT: i32 = 10;

/// Minimum artifact-score drop before an artifact-heavy image is replaced.
pub const DEFAULT_ARTIFACT_MIN_REDUCTION: i32 = 10;

/// Which score a policy gates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatedMetric {
    Quality,
    Artifact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ReplacementPolicy {
    /// Accept when quality rises by at least `min_improvement`.
    ThumbnailUpgrade { min_improvement: i32 },
    /// Accept on any strict quality gain.
    QualityReplacement,
    /// Accept when the artifact score drops by at least `min_reduction`.
    /// Quality is reported but does not gate.
    ArtifactReplacement { min_reduction: i32 },
}

impl ReplacementPolicy {
    pub fn thumbnail_upgrade() -> Self {
        Self::ThumbnailUpgrade {
            min_improvement: DEFAULT_THUMBNAIL_MIN_IMPROVEMENT,
        }
    }

    pub fn artifact_replacement() -> Self {
        Self::ArtifactReplacement {
            min_reduction: DEFAULT_ARTIFACT_MIN_REDUCTION,
        }
    }

    pub fn gated_metric(&self) -> GatedMetric {
        match self {
            Self::ThumbnailUpgrade { .. } | Self::QualityReplacement => GatedMetric::Quality,
            Self::ArtifactReplacement { .. } => GatedMetric::Artifact,
        }
    }

    /// `best - current` on the gated metric. For the artifact policy a
    /// negative value means fewer artifacts.
    pub fn improvement(&self, current: ScoreSummary, best: ScoreSummary) -> i32 {
        match self.gated_metric() {
            GatedMetric::Quality => best.quality as i32 - current.quality as i32,
            GatedMetric::Artifact => best.artifact as i32 - current.artifact as i32,
        }
    }

    pub fn accepts(&self, current: ScoreSummary, best: ScoreSummary) -> bool {
        match *self {
            Self::ThumbnailUpgrade { min_improvement } => {
                best.quality as i32 - current.quality as i32 >= min_improvement
            }
            Self::QualityReplacement => best.quality > current.quality,
            Self::ArtifactReplacement { min_reduction } => {
                best.artifact as i32 <= current.artifact as i32 - min_reduction
            }
        }
    }
}

/// Outcome of comparing the current image with the best candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub policy: ReplacementPolicy,
    pub accept: bool,
    /// `best - current` on the gated metric; 0 when there was no candidate.
    pub improvement: i32,
    /// `best - current` quality, reported for every policy.
    pub quality_delta: i32,
    /// The accepted candidate. `None` whenever `accept` is false.
    pub chosen: Option<Candidate>,
}

impl Decision {
    fn no_candidate(policy: ReplacementPolicy) -> Self {
        Self {
            policy,
            accept: false,
            improvement: 0,
            quality_delta: 0,
            chosen: None,
        }
    }
}

/// Decide whether `best` replaces the image scored as `current`.
pub fn decide(
    current: ScoreSummary,
    best: Option<&Candidate>,
    policy: ReplacementPolicy,
) -> Decision {
    let Some(best) = best else {
        debug!(?policy, "No candidate to compare against");
        return Decision::no_candidate(policy);
    };

    let summary = best.summary();
    let accept = policy.accepts(current, summary);
    let improvement = policy.improvement(current, summary);
    let quality_delta = summary.quality as i32 - current.quality as i32;

    info!(
        ?policy,
        source = %best.source_id,
        current_quality = current.quality,
        current_artifact = current.artifact,
        best_quality = summary.quality,
        best_artifact = summary.artifact,
        improvement,
        accept,
        "Replacement decided"
    );

    Decision {
        policy,
        accept,
        improvement,
        quality_delta,
        chosen: accept.then(|| best.clone()),
    }
}

// ═══════════════════════════════════════════════════════════
// Thumbnail selection
// ═══════════════════════════════════════════════════════════

/// One already-cataloged image of a subject with its quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogImage {
    pub slot: ImageSlot,
    pub quality: u8,
}

/// Best existing image to derive a new thumbnail from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThumbnailChoice {
    pub source: ImageSlot,
    /// Current thumbnail score; 0 when the subject has no thumbnail.
    pub current_score: u8,
    pub best_score: u8,
    pub improvement: i32,
    /// Whether the improvement clears the upgrade policy.
    pub accept: bool,
}

/// Pick the highest-quality non-thumbnail image of one subject.
///
/// Returns `None` when no reference image strictly beats the current
/// thumbnail. Ties between reference images go to the earlier one.
pub fn select_thumbnail_source(
    images: &[CatalogImage],
    policy: ReplacementPolicy,
) -> Option<ThumbnailChoice> {
    let current_score = images
        .iter()
        .find(|img| img.slot.is_thumbnail())
        .map_or(0, |img| img.quality);

    let best = images
        .iter()
        .filter(|img| !img.slot.is_thumbnail())
        .fold(None::<&CatalogImage>, |best, img| match best {
            Some(b) if b.quality >= img.quality => Some(b),
            _ => Some(img),
        })?;

    if best.quality <= current_score {
        debug!(current_score, best_score = best.quality, "Thumbnail already best");
        return None;
    }

    let current = ScoreSummary {
        quality: current_score,
        artifact: 0,
    };
    let candidate = ScoreSummary {
        quality: best.quality,
        artifact: 0,
    };

    Some(ThumbnailChoice {
        source: best.slot,
        current_score,
        best_score: best.quality,
        improvement: policy.improvement(current, candidate),
        accept: policy.accepts(current, candidate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(quality: u8, artifact: u8) -> ScoreSummary {
        ScoreSummary { quality, artifact }
    }

    // ── thumbnail upgrade ──

    #[test]
    fn thumbnail_upgrade_needs_ten_points() {
        let policy = ReplacementPolicy::thumbnail_upgrade();

        let nine = Candidate::with_scores("c", 59, 0);
        let d = decide(scores(50, 0), Some(&nine), policy);
        assert_eq!(d.improvement, 9);
        assert!(!d.accept);
        assert!(d.chosen.is_none());

        let ten = Candidate::with_scores("c", 60, 0);
        let d = decide(scores(50, 0), Some(&ten), policy);
        assert_eq!(d.improvement, 10);
        assert!(d.accept);
        assert_eq!(d.chosen.unwrap().source_id, "c");
    }

    // ── quality replacement ──

    #[test]
    fn quality_replacement_accepts_any_gain() {
        let policy = ReplacementPolicy::QualityReplacement;

        let d = decide(scores(39, 0), Some(&Candidate::with_scores("c", 40, 0)), policy);
        assert!(d.accept);
        assert_eq!(d.improvement, 1);

        let d = decide(scores(40, 0), Some(&Candidate::with_scores("c", 40, 0)), policy);
        assert!(!d.accept);
        assert_eq!(d.improvement, 0);

        let d = decide(scores(40, 0), Some(&Candidate::with_scores("c", 31, 0)), policy);
        assert!(!d.accept);
        assert_eq!(d.improvement, -9);
    }

    // ── artifact replacement ──

    #[test]
    fn artifact_replacement_needs_ten_point_drop() {
        let policy = ReplacementPolicy::artifact_replacement();

        let d = decide(scores(50, 55), Some(&Candidate::with_scores("c", 50, 46)), policy);
        assert_eq!(d.improvement, -9);
        assert!(!d.accept);

        let d = decide(scores(50, 55), Some(&Candidate::with_scores("c", 50, 45)), policy);
        assert_eq!(d.improvement, -10);
        assert!(d.accept);
    }

    #[test]
    fn artifact_replacement_ignores_quality_drop() {
        let policy = ReplacementPolicy::artifact_replacement();
        let d = decide(scores(80, 60), Some(&Candidate::with_scores("c", 35, 10)), policy);
        assert!(d.accept);
        assert_eq!(d.quality_delta, -45);
    }

    #[test]
    fn artifact_replacement_rejects_equal_scores() {
        let policy = ReplacementPolicy::artifact_replacement();
        let d = decide(scores(50, 40), Some(&Candidate::with_scores("c", 90, 40)), policy);
        assert!(!d.accept);
    }

    #[test]
    fn missing_candidate_is_a_rejection() {
        for policy in [
            ReplacementPolicy::thumbnail_upgrade(),
            ReplacementPolicy::QualityReplacement,
            ReplacementPolicy::artifact_replacement(),
        ] {
            let d = decide(scores(10, 90), None, policy);
            assert!(!d.accept);
            assert_eq!(d.improvement, 0);
            assert!(d.chosen.is_none());
        }
    }

    #[test]
    fn policy_serializes_with_threshold() {
        let json = serde_json::to_value(ReplacementPolicy::thumbnail_upgrade()).unwrap();
        assert_eq!(json["policy"], "thumbnail_upgrade");
        assert_eq!(json["min_improvement"], 10);
    }

    // ── thumbnail selection ──

    fn catalog(thumb: Option<u8>, refs: &[u8]) -> Vec<CatalogImage> {
        let mut images: Vec<CatalogImage> = thumb
            .map(|q| CatalogImage {
                slot: ImageSlot::Thumbnail,
                quality: q,
            })
            .into_iter()
            .collect();
        images.extend(refs.iter().enumerate().map(|(i, &q)| CatalogImage {
            slot: ImageSlot::Reference(i),
            quality: q,
        }));
        images
    }

    #[test]
    fn selects_best_reference_image() {
        let policy = ReplacementPolicy::thumbnail_upgrade();
        let choice = select_thumbnail_source(&catalog(Some(42), &[55, 71]), policy).unwrap();
        assert_eq!(choice.source, ImageSlot::Reference(1));
        assert_eq!(choice.current_score, 42);
        assert_eq!(choice.best_score, 71);
        assert_eq!(choice.improvement, 29);
        assert!(choice.accept);
    }

    #[test]
    fn small_gain_is_reported_but_not_accepted() {
        let policy = ReplacementPolicy::thumbnail_upgrade();
        let choice = select_thumbnail_source(&catalog(Some(60), &[65]), policy).unwrap();
        assert_eq!(choice.improvement, 5);
        assert!(!choice.accept);
    }

    #[test]
    fn no_choice_when_thumbnail_is_best() {
        let policy = ReplacementPolicy::thumbnail_upgrade();
        assert!(select_thumbnail_source(&catalog(Some(80), &[70, 80]), policy).is_none());
        assert!(select_thumbnail_source(&catalog(Some(80), &[]), policy).is_none());
    }

    #[test]
    fn missing_thumbnail_counts_as_zero() {
        let policy = ReplacementPolicy::thumbnail_upgrade();
        let choice = select_thumbnail_source(&catalog(None, &[30]), policy).unwrap();
        assert_eq!(choice.current_score, 0);
        assert_eq!(choice.improvement, 30);
    }

    #[test]
    fn earlier_reference_wins_ties() {
        let policy = ReplacementPolicy::thumbnail_upgrade();
        let choice = select_thumbnail_source(&catalog(Some(10), &[66, 66]), policy).unwrap();
        assert_eq!(choice.source, ImageSlot::Reference(0));
    }
}
