use serde::{Deserialize, Serialize};

/// Accuracy/latency trade-off for one nearest-neighbor search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTuning {
    /// Approximate-search breadth (candidate pool explored by the index).
    /// Larger values improve recall at the cost of latency.
    #[serde(default = "default_breadth")]
    pub breadth: usize,

    /// Bypass the approximate index entirely
    #[serde(default)]
    pub exact: bool,

    /// Oversampling factor for compressed indexes; fetches
    /// `limit * oversample` candidates before rescoring
    #[serde(default)]
    pub oversample: Option<f32>,

    /// Rescore oversampled candidates against full-precision vectors
    #[serde(default)]
    pub rescore: bool,
}

fn default_breadth() -> usize {
    128
}

impl Default for SearchTuning {
    fn default() -> Self {
        Self::balanced()
    }
}

impl SearchTuning {
    /// Balanced preset; the default for callers with no latency budget
    pub fn balanced() -> Self {
        Self {
            breadth: 128,
            exact: false,
            oversample: None,
            rescore: false,
        }
    }

    /// Lower breadth, no rescore
    pub fn fast() -> Self {
        Self {
            breadth: 64,
            exact: false,
            oversample: None,
            rescore: false,
        }
    }

    /// Higher breadth, oversampling and rescore on
    pub fn accurate() -> Self {
        Self {
            breadth: 256,
            exact: false,
            oversample: Some(2.0),
            rescore: true,
        }
    }
}

/// Policy for deriving per-search tuning inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningPolicy {
    /// Tuning applied when adaptive breadth is off
    #[serde(default)]
    pub base: SearchTuning,

    /// Scale breadth with filter complexity and requested limit
    #[serde(default)]
    pub adaptive_breadth: bool,

    /// Hard cap on breadth to bound worst-case latency
    #[serde(default = "default_max_breadth")]
    pub max_breadth: usize,
}

fn default_max_breadth() -> usize {
    512
}

impl Default for TuningPolicy {
    fn default() -> Self {
        Self {
            base: SearchTuning::balanced(),
            adaptive_breadth: false,
            max_breadth: default_max_breadth(),
        }
    }
}

impl TuningPolicy {
    /// Tuning for one search within a batch. More filter clauses and
    /// larger limits justify a wider search; the cap always wins.
    pub fn tuning_for(&self, filter_clauses: usize, limit: usize) -> SearchTuning {
        if !self.adaptive_breadth {
            return self.base.clone();
        }

        let widened = self.base.breadth + filter_clauses * 32 + limit * 4;
        SearchTuning {
            breadth: widened.min(self.max_breadth),
            ..self.base.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_presets_ordering() {
        assert!(SearchTuning::fast().breadth < SearchTuning::balanced().breadth);
        assert!(SearchTuning::balanced().breadth < SearchTuning::accurate().breadth);
        assert!(SearchTuning::accurate().rescore);
        assert!(!SearchTuning::fast().rescore);
    }

    #[test]
    fn test_non_adaptive_policy_returns_base() {
        let policy = TuningPolicy::default();
        assert_eq!(policy.tuning_for(5, 100), policy.base);
    }

    #[test]
    fn test_adaptive_breadth_scales_and_caps() {
        let policy = TuningPolicy {
            adaptive_breadth: true,
            ..TuningPolicy::default()
        };

        let simple = policy.tuning_for(0, 10);
        let complex = policy.tuning_for(4, 50);
        assert!(complex.breadth > simple.breadth);

        let capped = policy.tuning_for(100, 1000);
        assert_eq!(capped.breadth, policy.max_breadth);
    }
}
