//! Weighted fusion of lexical and semantic scores

use crate::error::{Result, ScreenerError};
use crate::processing::lexical::round2;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LEXICAL_WEIGHT: f64 = 0.4;
pub const DEFAULT_SEMANTIC_WEIGHT: f64 = 0.6;
/// Inclusive cut-off on the final score
pub const SHORTLIST_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    lexical: f64,
    semantic: f64,
    threshold: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            lexical: DEFAULT_LEXICAL_WEIGHT,
            semantic: DEFAULT_SEMANTIC_WEIGHT,
            threshold: SHORTLIST_THRESHOLD,
        }
    }
}

impl FusionWeights {
    /// Weights must lie in [0, 1] and sum to 1 so the fused score stays in 0-100
    pub fn new(lexical: f64, semantic: f64, threshold: f64) -> Result<Self> {
        let in_unit = |w: f64| (0.0..=1.0).contains(&w);
        if !in_unit(lexical) || !in_unit(semantic) || ((lexical + semantic) - 1.0).abs() > 1e-6 {
            return Err(ScreenerError::Configuration(format!(
                "fusion weights must be in [0, 1] and sum to 1 (lexical {}, semantic {})",
                lexical, semantic
            )));
        }
        if !(0.0..=100.0).contains(&threshold) {
            return Err(ScreenerError::Configuration(format!(
                "shortlist threshold must be within 0-100, got {}",
                threshold
            )));
        }
        Ok(Self {
            lexical,
            semantic,
            threshold,
        })
    }

    pub fn lexical(&self) -> f64 {
        self.lexical
    }

    pub fn semantic(&self) -> f64 {
        self.semantic
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Final score rounded to two decimals, and whether it clears the threshold
    pub fn fuse(&self, lexical: f64, semantic: f64) -> (f64, bool) {
        let final_score = round2(self.lexical * lexical + self.semantic * semantic);
        (final_score, final_score >= self.threshold)
    }
}

/// Fusion with the default 0.4 / 0.6 weights and threshold 50
pub fn fuse(lexical: f64, semantic: f64) -> (f64, bool) {
    FusionWeights::default().fuse(lexical, semantic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let (score, shortlisted) = fuse(80.0, 30.0);
        assert_eq!(score, 50.0);
        assert!(shortlisted);

        let (score, shortlisted) = fuse(10.0, 20.0);
        assert_eq!(score, 16.0);
        assert!(!shortlisted);
    }

    #[test]
    fn test_threshold_inclusive() {
        let (score, shortlisted) = fuse(50.0, 50.0);
        assert_eq!(score, 50.0);
        assert!(shortlisted);
        assert!(!fuse(49.99, 49.99).1);
    }

    #[test]
    fn test_monotonic_in_both_inputs() {
        let steps: Vec<f64> = (0..=20).map(|i| i as f64 * 5.0).collect();
        for &l in &steps {
            for pair in steps.windows(2) {
                assert!(fuse(l, pair[0]).0 <= fuse(l, pair[1]).0);
                assert!(fuse(pair[0], l).0 <= fuse(pair[1], l).0);
            }
        }
    }

    #[test]
    fn test_bounds() {
        assert_eq!(fuse(0.0, 0.0).0, 0.0);
        assert_eq!(fuse(100.0, 100.0).0, 100.0);
    }

    #[test]
    fn test_custom_weights_validated() {
        assert!(FusionWeights::new(0.5, 0.5, 60.0).is_ok());
        assert!(FusionWeights::new(0.6, 0.6, 50.0).is_err());
        assert!(FusionWeights::new(-0.2, 1.2, 50.0).is_err());
        assert!(FusionWeights::new(0.4, 0.6, 150.0).is_err());

        let weights = FusionWeights::new(0.6, 0.4, 50.0).unwrap();
        assert_eq!(weights.fuse(100.0, 0.0), (60.0, true));
    }
}
