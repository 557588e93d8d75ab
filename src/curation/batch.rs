//! Parallel candidate evaluation.
//!
//! Scoring is pure, so candidates are scored on the rayon pool. Results come
//! back in input order, one slot per input: a decode failure stays in its own
//! slot and never stops the rest of the batch.

use chrono::{DateTime, Utc};
use image::RgbImage;
use rayon::prelude::*;
use tracing::{debug, warn};

use super::{Attribution, Candidate};
use crate::curation_config::CurationConfig;
use crate::scoring::DecodeError;

/// A decoded source image waiting to be scored.
#[derive(Debug, Clone)]
pub struct CandidateInput {
    pub source_id: String,
    pub image: RgbImage,
    pub recency: Option<DateTime<Utc>>,
    pub attribution: Attribution,
}

/// Score at most `config.max_candidates` inputs, preserving input order.
pub fn evaluate_batch(
    inputs: &[CandidateInput],
    config: &CurationConfig,
) -> Vec<Result<Candidate, DecodeError>> {
    let take = inputs.len().min(config.max_candidates);
    if take < inputs.len() {
        debug!(total = inputs.len(), evaluated = take, "Candidate batch truncated");
    }

    inputs[..take]
        .par_iter()
        .map(|input| {
            Candidate::evaluate(
                input.source_id.clone(),
                &input.image,
                input.recency,
                input.attribution.clone(),
            )
            .map_err(|e| {
                warn!(source = %input.source_id, error = %e, "Candidate could not be scored");
                e
            })
        })
        .collect()
}

/// Batch results split into scored candidates and per-source failures.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub candidates: Vec<Candidate>,
    pub failures: Vec<(String, DecodeError)>,
}

impl BatchOutcome {
    /// Pair each result with its input's source id. Order is kept on both sides.
    pub fn collect(
        inputs: &[CandidateInput],
        results: Vec<Result<Candidate, DecodeError>>,
    ) -> Self {
        let mut outcome = Self::default();
        for (input, result) in inputs.iter().zip(results) {
            match result {
                Ok(candidate) => outcome.candidates.push(candidate),
                Err(e) => outcome.failures.push((input.source_id.clone(), e)),
            }
        }
        outcome
    }
}
