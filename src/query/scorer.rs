//! Scoring of full-text matches
//!
//! A score is derived from two inputs:
//! - the match magnitude returned by the matcher
//! - the number of sub-tokens in the focus text
//!
//! The function is injectable through [`Scoring`]; [`Scorer`] is the default.

use serde::{Deserialize, Serialize};

/// Maps a match magnitude and a token count to a score
pub trait Scoring {
    fn word(&self, count: usize, tokens: usize) -> f64;
}

impl<F> Scoring for F
where
    F: Fn(usize, usize) -> f64,
{
    fn word(&self, count: usize, tokens: usize) -> f64 {
        self(count, tokens)
    }
}

/// Configurable weights for the default scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Multiplier applied to the logarithmic match score
    pub match_weight: f64,
    /// Upper bound of a single score
    pub max_score: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            match_weight: 1.0,
            max_score: 1.0,
        }
    }
}

/// Default scorer: more matches in shorter texts score higher
#[derive(Debug, Clone)]
pub struct Scorer {
    weights: ScoringWeights,
}

impl Scorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Create a scorer with default weights
    pub fn with_defaults() -> Self {
        Self::new(ScoringWeights::default())
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }
}

impl Scoring for Scorer {
    fn word(&self, count: usize, tokens: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        // log2(count + 1) gives diminishing returns for more matches,
        // log2(tokens + 2) dampens long texts
        let score = (count as f64 + 1.0).log2() / (tokens as f64 + 2.0).log2();
        (score * self.weights.match_weight).min(self.weights.max_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = ScoringWeights::default();
        assert!(weights.match_weight > 0.0);
        assert_eq!(weights.max_score, 1.0);
    }

    #[test]
    fn test_no_match_scores_zero() {
        assert_eq!(Scorer::with_defaults().word(0, 10), 0.0);
    }

    #[test]
    fn test_more_matches_score_higher() {
        let scorer = Scorer::with_defaults();
        assert!(scorer.word(3, 20) > scorer.word(1, 20));
    }

    #[test]
    fn test_shorter_texts_score_higher() {
        let scorer = Scorer::with_defaults();
        let short = scorer.word(1, 1);
        let long = scorer.word(1, 50);
        assert!(short > long);
        assert!(short <= 1.0);
        assert!(long > 0.0);
    }

    #[test]
    fn test_weights_from_json() {
        let weights: ScoringWeights = serde_json::from_str(r#"{"match_weight": 2.0}"#).unwrap();
        assert_eq!(weights.max_score, 1.0);
        let scorer = Scorer::new(weights);
        assert_eq!(scorer.word(1, 1), 1.0);
    }
}
