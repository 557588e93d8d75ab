//! Curation rules: rank scored candidates and decide replacements.
//!
//! The three catalog workflows differ only in ranking key and policy:
//!
//! | Workflow | Ranking | Policy |
//! |---|---|---|
//! | thumbnail fix | quality only | thumbnail upgrade (+10) |
//! | quality replacement | quality only | strict quality gain |
//! | artifact replacement | combined | artifact drop (-10) |

pub mod batch;
pub mod candidate;
pub mod decision;
pub mod ranking;
pub mod survey;

pub use batch::{evaluate_batch, BatchOutcome, CandidateInput};
pub use candidate::{Attribution, Candidate, ImageSlot, ScoreSummary, ScoredImage};
pub use decision::{
    decide, select_thumbnail_source, CatalogImage, Decision, GatedMetric, ReplacementPolicy,
    ThumbnailChoice,
};
pub use ranking::{best, rank, RankedCandidate, RankingMode};
pub use survey::{ArtifactSeverity, ScoreStatistics, SurveyEntry, TierCounts};

use serde::{Deserialize, Serialize};

use crate::curation_config::CurationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    ThumbnailFix,
    QualityReplacement,
    ArtifactReplacement,
}

impl Workflow {
    pub fn ranking_mode(&self) -> RankingMode {
        match self {
            Self::ThumbnailFix | Self::QualityReplacement => RankingMode::QualityOnly,
            Self::ArtifactReplacement => RankingMode::Combined,
        }
    }
}

/// Rank `candidates` for `workflow` and decide whether the best one replaces
/// the image scored as `current`.
pub fn curate(
    current: ScoreSummary,
    candidates: &[Candidate],
    workflow: Workflow,
    config: &CurationConfig,
) -> Decision {
    let top = best(candidates, workflow.ranking_mode());
    decide(current, top.map(|r| r.candidate), config.policy_for(workflow))
}
