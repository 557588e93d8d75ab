//! Candidate ordering for the replacement workflows.
//!
//! Two keys, chosen by the caller:
//! - quality only: `quality`
//! - combined: `(100 - artifact) + quality`, 0-200, rewards clean and sharp
//!   images equally
//!
//! Ties go to the most recent photo, then to input order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::Candidate;

/// Upper bound of the artifact scale, used to invert it in the combined key.
const ARTIFACT_SCALE: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
    QualityOnly,
    Combined,
}

impl RankingMode {
    /// Ranking key for one candidate. Higher is better.
    pub fn key(&self, candidate: &Candidate) -> i32 {
        match self {
            Self::QualityOnly => candidate.quality() as i32,
            Self::Combined => combined_score(candidate.quality(), candidate.artifact()),
        }
    }
}

/// `(100 - artifact) + quality`
pub fn combined_score(quality: u8, artifact: u8) -> i32 {
    (ARTIFACT_SCALE - artifact as i32) + quality as i32
}

/// A candidate with its position-determining key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedCandidate<'a> {
    pub candidate: &'a Candidate,
    pub rank_score: i32,
    /// Index in the input slice.
    pub input_index: usize,
}

/// Order candidates best first.
pub fn rank(candidates: &[Candidate], mode: RankingMode) -> Vec<RankedCandidate<'_>> {
    let mut ranked: Vec<RankedCandidate<'_>> = candidates
        .iter()
        .enumerate()
        .map(|(input_index, candidate)| RankedCandidate {
            candidate,
            rank_score: mode.key(candidate),
            input_index,
        })
        .collect();

    // Stable sort: equal keys and equal recency keep input order
    ranked.sort_by(|a, b| {
        b.rank_score
            .cmp(&a.rank_score)
            .then_with(|| compare_recency(a.candidate, b.candidate))
    });
    ranked
}

/// Head of the ranking, if any.
pub fn best(candidates: &[Candidate], mode: RankingMode) -> Option<RankedCandidate<'_>> {
    rank(candidates, mode).into_iter().next()
}

/// Newer first; an unknown date ranks after any known one.
fn compare_recency(a: &Candidate, b: &Candidate) -> Ordering {
    match (a.recency, b.recency) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ids<'a>(ranked: &[RankedCandidate<'a>]) -> Vec<&'a str> {
        ranked.iter().map(|r| r.candidate.source_id.as_str()).collect()
    }

    #[test]
    fn combined_prefers_clean_and_sharp() {
        let a = Candidate::with_scores("a", 80, 10);
        let b = Candidate::with_scores("b", 60, 50);
        assert_eq!(RankingMode::Combined.key(&a), 170);
        assert_eq!(RankingMode::Combined.key(&b), 110);

        let candidates = vec![b, a];
        let ranked = rank(&candidates, RankingMode::Combined);
        assert_eq!(ids(&ranked), vec!["a", "b"]);
        assert_eq!(ranked[0].input_index, 1);
    }

    #[test]
    fn quality_only_ignores_artifacts() {
        let candidates = vec![
            Candidate::with_scores("clean", 60, 0),
            Candidate::with_scores("cluttered", 75, 90),
        ];
        let ranked = rank(&candidates, RankingMode::QualityOnly);
        assert_eq!(ids(&ranked), vec!["cluttered", "clean"]);
        assert_eq!(ranked[0].rank_score, 75);

        let ranked = rank(&candidates, RankingMode::Combined);
        assert_eq!(ids(&ranked), vec!["clean", "cluttered"]);
    }

    #[test]
    fn ties_go_to_most_recent() {
        let older = Utc.with_ymd_and_hms(2019, 5, 1, 0, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2023, 9, 14, 0, 0, 0).unwrap();
        let candidates = vec![
            Candidate::with_scores("undated", 70, 0),
            Candidate::with_scores("old", 70, 0).at(older),
            Candidate::with_scores("new", 70, 0).at(newer),
        ];
        let ranked = rank(&candidates, RankingMode::QualityOnly);
        assert_eq!(ids(&ranked), vec!["new", "old", "undated"]);
    }

    #[test]
    fn full_ties_keep_input_order() {
        let candidates = vec![
            Candidate::with_scores("first", 50, 20),
            Candidate::with_scores("second", 50, 20),
            Candidate::with_scores("third", 50, 20),
        ];
        let ranked = rank(&candidates, RankingMode::Combined);
        assert_eq!(ids(&ranked), vec!["first", "second", "third"]);
    }

    #[test]
    fn best_of_empty_is_none() {
        assert!(best(&[], RankingMode::QualityOnly).is_none());
    }

    #[test]
    fn combined_score_range() {
        assert_eq!(combined_score(0, 100), 0);
        assert_eq!(combined_score(100, 0), 200);
    }
}
