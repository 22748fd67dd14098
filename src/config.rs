use crate::candidates::CandidateStrategy;
use crate::normalize::NormalizerConfig;
use crate::score::{ScoreWeights, MAX_SCORE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("unable to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("unable to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Everything the matching core needs; nothing in the core has its own defaults.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchConfig {
    /// Pairs must score strictly above this (0-100).
    pub threshold: f64,
    pub num_weight: f64,
    pub text_weight: f64,
    pub normalizer: NormalizerConfig,
    pub candidates: CandidateStrategy,
    /// Merge chains of matches into one cluster instead of anchoring on the
    /// first record of each pair.
    pub transitive: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        let weights = ScoreWeights::default();
        Self {
            threshold: 92.0,
            num_weight: weights.num_weight,
            text_weight: weights.text_weight,
            normalizer: NormalizerConfig::default(),
            candidates: CandidateStrategy::default(),
            transitive: false,
        }
    }
}

impl MatchConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn weights(&self) -> ScoreWeights {
        ScoreWeights {
            num_weight: self.num_weight,
            text_weight: self.text_weight,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=MAX_SCORE).contains(&self.threshold) {
            return Err(ConfigError::InvalidValue {
                field: "threshold",
                reason: format!("{} is outside 0-100", self.threshold),
            });
        }
        for (field, weight) in [("numWeight", self.num_weight), ("textWeight", self.text_weight)] {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("{weight} must be a positive number"),
                });
            }
        }
        self.candidates.validate()
    }
}
