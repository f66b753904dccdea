use serde::{Deserialize, Serialize};
use tabula_vector_index::VectorQuerySpec;

/// Top-level routing decision produced by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Structured-filter search only
    SqlOnly,
    /// Semantic vector search only
    VectorOnly,
    /// Both modalities, fused
    Hybrid,
    /// The query is infeasible or unclear
    Rejected,
}

/// Relational half of an intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlPlan {
    pub tables: Vec<String>,

    #[serde(default)]
    pub allows_fuzzy_match: bool,

    #[serde(default)]
    pub fuzzy_patterns: Vec<String>,
}

impl SqlPlan {
    /// Number of distinct tables named by the plan
    pub fn distinct_table_count(&self) -> usize {
        let mut tables: Vec<&str> = self.tables.iter().map(String::as_str).collect();
        tables.sort_unstable();
        tables.dedup();
        tables.len()
    }
}

/// Semantic half of an intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPlan {
    pub queries: Vec<VectorQuerySpec>,

    #[serde(default)]
    pub requires_rerank: bool,
}

/// How the two broad modalities are blended in `Hybrid` mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionMethod {
    Rrf,
    Weighted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridWeights {
    #[serde(default = "default_fusion_method")]
    pub fusion_method: FusionMethod,

    #[serde(default = "default_weight")]
    pub vector_weight: f64,

    #[serde(default = "default_weight")]
    pub sql_weight: f64,
}

fn default_fusion_method() -> FusionMethod {
    FusionMethod::Rrf
}

fn default_weight() -> f64 {
    0.5
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            fusion_method: default_fusion_method(),
            vector_weight: default_weight(),
            sql_weight: default_weight(),
        }
    }
}

/// Output of the external classifier; immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
    pub strategy: Strategy,

    /// Classifier confidence in [0, 1]
    pub confidence: f64,

    #[serde(default)]
    pub sql_plan: Option<SqlPlan>,

    #[serde(default)]
    pub vector_plan: Option<VectorPlan>,

    #[serde(default)]
    pub hybrid_weights: Option<HybridWeights>,

    /// Human-readable reason, required when `Rejected`
    #[serde(default)]
    pub reason: Option<String>,

    /// Alternative phrasings or missing fields suggested to the user
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl QueryIntent {
    pub fn sql_only(confidence: f64, sql_plan: SqlPlan) -> Self {
        Self {
            strategy: Strategy::SqlOnly,
            confidence,
            sql_plan: Some(sql_plan),
            vector_plan: None,
            hybrid_weights: None,
            reason: None,
            suggestions: Vec::new(),
        }
    }

    pub fn vector_only(confidence: f64, vector_plan: VectorPlan) -> Self {
        Self {
            strategy: Strategy::VectorOnly,
            confidence,
            sql_plan: None,
            vector_plan: Some(vector_plan),
            hybrid_weights: None,
            reason: None,
            suggestions: Vec::new(),
        }
    }

    pub fn hybrid(confidence: f64, sql_plan: SqlPlan, vector_plan: VectorPlan) -> Self {
        Self {
            strategy: Strategy::Hybrid,
            confidence,
            sql_plan: Some(sql_plan),
            vector_plan: Some(vector_plan),
            hybrid_weights: Some(HybridWeights::default()),
            reason: None,
            suggestions: Vec::new(),
        }
    }

    pub fn rejected(reason: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            strategy: Strategy::Rejected,
            confidence: 1.0,
            sql_plan: None,
            vector_plan: None,
            hybrid_weights: None,
            reason: Some(reason.into()),
            suggestions,
        }
    }

    /// Shape invariant: exactly the plans implied by the strategy are
    /// present.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "confidence must be in [0.0, 1.0], got {}",
                self.confidence
            ));
        }

        let (sql, vector) = (self.sql_plan.is_some(), self.vector_plan.is_some());
        match self.strategy {
            Strategy::SqlOnly if !sql || vector => {
                Err("SqlOnly intent requires a sql_plan and no vector_plan".to_string())
            }
            Strategy::VectorOnly if sql || !vector => {
                Err("VectorOnly intent requires a vector_plan and no sql_plan".to_string())
            }
            Strategy::Hybrid if !sql || !vector => {
                Err("Hybrid intent requires both sql_plan and vector_plan".to_string())
            }
            Strategy::Rejected if sql || vector => {
                Err("Rejected intent must carry no plans".to_string())
            }
            Strategy::Rejected if self.reason.is_none() => {
                Err("Rejected intent must carry a reason".to_string())
            }
            _ => {
                if let Some(weights) = &self.hybrid_weights {
                    if weights.vector_weight < 0.0 || weights.sql_weight < 0.0 {
                        return Err("hybrid weights must be non-negative".to_string());
                    }
                    if weights.vector_weight + weights.sql_weight <= 0.0 {
                        return Err("hybrid weights must not both be zero".to_string());
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sql_plan() -> SqlPlan {
        SqlPlan {
            tables: vec!["orders".to_string()],
            allows_fuzzy_match: false,
            fuzzy_patterns: Vec::new(),
        }
    }

    fn vector_plan() -> VectorPlan {
        VectorPlan {
            queries: vec![VectorQuerySpec {
                collection: "orders".to_string(),
                named_vector_fields: vec!["description".to_string()],
                search_text: "late deliveries".to_string(),
                result_limit: 10,
                filter: None,
            }],
            requires_rerank: false,
        }
    }

    #[test]
    fn test_constructors_validate() {
        assert!(QueryIntent::sql_only(0.9, sql_plan()).validate().is_ok());
        assert!(
            QueryIntent::vector_only(0.9, vector_plan())
                .validate()
                .is_ok()
        );
        assert!(
            QueryIntent::hybrid(0.9, sql_plan(), vector_plan())
                .validate()
                .is_ok()
        );
        assert!(
            QueryIntent::rejected("not answerable", Vec::new())
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_mismatched_plans_rejected() {
        let mut intent = QueryIntent::sql_only(0.9, sql_plan());
        intent.vector_plan = Some(vector_plan());
        assert!(intent.validate().is_err());

        let mut intent = QueryIntent::hybrid(0.9, sql_plan(), vector_plan());
        intent.vector_plan = None;
        assert!(intent.validate().is_err());

        let mut intent = QueryIntent::rejected("nope", Vec::new());
        intent.sql_plan = Some(sql_plan());
        assert!(intent.validate().is_err());
    }

    #[test]
    fn test_confidence_bounds() {
        let mut intent = QueryIntent::sql_only(1.5, sql_plan());
        assert!(intent.validate().is_err());
        intent.confidence = 0.0;
        assert!(intent.validate().is_ok());
    }

    #[test]
    fn test_distinct_table_count() {
        let plan = SqlPlan {
            tables: vec![
                "orders".to_string(),
                "users".to_string(),
                "orders".to_string(),
            ],
            allows_fuzzy_match: false,
            fuzzy_patterns: Vec::new(),
        };
        assert_eq!(plan.distinct_table_count(), 2);
    }

    #[test]
    fn test_hybrid_weights_defaults() {
        let weights = HybridWeights::default();
        assert_eq!(weights.fusion_method, FusionMethod::Rrf);
        assert_eq!(weights.vector_weight, 0.5);
        assert_eq!(weights.sql_weight, 0.5);
    }
}
