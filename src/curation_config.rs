//! Curation workflow configuration.
//!
//! Thresholds that decide *which* images a workflow touches and *when* a
//! replacement is accepted. Scoring thresholds are fixed constants in
//! `scoring`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::curation::decision::{
    DEFAULT_ARTIFACT_MIN_REDUCTION, DEFAULT_THUMBNAIL_MIN_IMPROVEMENT,
};
use crate::curation::{ReplacementPolicy, Workflow};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Workflow thresholds. Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    /// Quality gain an existing image needs to become the thumbnail.
    pub thumbnail_min_improvement: i32,
    /// Artifact-score drop a candidate needs to replace an artifact-heavy image.
    pub artifact_min_reduction: i32,
    /// Reference images scoring below this are queued for quality replacement.
    pub poor_quality_threshold: u8,
    /// Artifact score that alone flags an image in a survey.
    pub flag_min_artifact_score: u8,
    /// Moderate artifact score that flags an image when quality is also weak.
    pub moderate_artifact_score: u8,
    /// Quality below which moderate artifacts count as a problem.
    pub moderate_artifact_quality_ceiling: u8,
    /// Reference images at or above this artifact score are replaced.
    pub artifact_replacement_min_score: u8,
    /// Candidates scored per replacement attempt.
    pub max_candidates: usize,
    /// Length of the lowest-quality listing in survey reports.
    pub worst_image_listing: usize,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            thumbnail_min_improvement: DEFAULT_THUMBNAIL_MIN_IMPROVEMENT,
            artifact_min_reduction: DEFAULT_ARTIFACT_MIN_REDUCTION,
            poor_quality_threshold: 40,
            flag_min_artifact_score: 30,
            moderate_artifact_score: 20,
            moderate_artifact_quality_ceiling: 70,
            artifact_replacement_min_score: 50,
            max_candidates: 15,
            worst_image_listing: 20,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════

impl CurationConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json(&raw)?;
        debug!(path = %path.display(), ?config, "Curation config loaded");
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnail_min_improvement < 0 {
            return Err(ConfigError::Invalid(
                "thumbnail_min_improvement must not be negative".into(),
            ));
        }
        if self.artifact_min_reduction < 0 {
            return Err(ConfigError::Invalid(
                "artifact_min_reduction must not be negative".into(),
            ));
        }
        for (name, value) in [
            ("poor_quality_threshold", self.poor_quality_threshold),
            ("flag_min_artifact_score", self.flag_min_artifact_score),
            ("moderate_artifact_score", self.moderate_artifact_score),
            (
                "moderate_artifact_quality_ceiling",
                self.moderate_artifact_quality_ceiling,
            ),
            (
                "artifact_replacement_min_score",
                self.artifact_replacement_min_score,
            ),
        ] {
            if value > 100 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within 0-100, got {value}"
                )));
            }
        }
        if self.max_candidates == 0 {
            return Err(ConfigError::Invalid("max_candidates must be at least 1".into()));
        }
        Ok(())
    }

    /// Policy each workflow decides with.
    pub fn policy_for(&self, workflow: Workflow) -> ReplacementPolicy {
        match workflow {
            Workflow::ThumbnailFix => ReplacementPolicy::ThumbnailUpgrade {
                min_improvement: self.thumbnail_min_improvement,
            },
            Workflow::QualityReplacement => ReplacementPolicy::QualityReplacement,
            Workflow::ArtifactReplacement => ReplacementPolicy::ArtifactReplacement {
                min_reduction: self.artifact_min_reduction,
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_catalog_thresholds() {
        let config = CurationConfig::default();
        assert_eq!(config.thumbnail_min_improvement, 10);
        assert_eq!(config.artifact_min_reduction, 10);
        assert_eq!(config.poor_quality_threshold, 40);
        assert_eq!(config.flag_min_artifact_score, 30);
        assert_eq!(config.artifact_replacement_min_score, 50);
        assert_eq!(config.max_candidates, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn policies_per_workflow() {
        let config = CurationConfig::default();
        assert_eq!(
            config.policy_for(Workflow::ThumbnailFix),
            ReplacementPolicy::thumbnail_upgrade()
        );
        assert_eq!(
            config.policy_for(Workflow::QualityReplacement),
            ReplacementPolicy::QualityReplacement
        );
        assert_eq!(
            config.policy_for(Workflow::ArtifactReplacement),
            ReplacementPolicy::artifact_replacement()
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = CurationConfig::from_json(r#"{ "max_candidates": 5 }"#).unwrap();
        assert_eq!(config.max_candidates, 5);
        assert_eq!(config.thumbnail_min_improvement, 10);
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let err = CurationConfig::from_json(r#"{ "poor_quality_threshold": 140 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_candidates_rejected() {
        let err = CurationConfig::from_json(r#"{ "max_candidates": 0 }"#).unwrap_err();
        assert!(err.to_string().contains("max_candidates"));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = CurationConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curation.json");
        std::fs::write(&path, r#"{ "artifact_min_reduction": 15 }"#).unwrap();

        let config = CurationConfig::load(&path).unwrap();
        assert_eq!(
            config.policy_for(Workflow::ArtifactReplacement),
            ReplacementPolicy::ArtifactReplacement { min_reduction: 15 }
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CurationConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
