use crate::error::Result;
use crate::point::{CandidateId, Payload, PayloadValue, PointHit};
use crate::tuning::SearchTuning;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One condition on a payload field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    pub field: String,
    pub condition: FilterCondition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterCondition {
    /// Field equals the given value
    Equals(PayloadValue),
    /// Field equals any of the given values (the `IN (...)` shape used to
    /// narrow a search to candidate ids from another modality)
    AnyOf(Vec<PayloadValue>),
    /// Numeric range, inclusive on both ends
    Range {
        gte: Option<f64>,
        lte: Option<f64>,
    },
}

/// Conjunction of payload conditions applied during search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointFilter {
    pub clauses: Vec<FilterClause>,
}

impl PointFilter {
    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// Evaluate the filter against a payload. A missing field fails its
    /// clause.
    pub fn matches(&self, payload: &Payload) -> bool {
        self.clauses.iter().all(|clause| {
            let Some(value) = payload.get(&clause.field) else {
                return false;
            };
            match &clause.condition {
                FilterCondition::Equals(expected) => value == expected,
                FilterCondition::AnyOf(options) => options.contains(value),
                FilterCondition::Range { gte, lte } => match value.as_f64() {
                    Some(n) => {
                        gte.is_none_or(|lo| n >= lo) && lte.is_none_or(|hi| n <= hi)
                    }
                    None => false,
                },
            }
        })
    }
}

/// One nearest-neighbor search against a named vector space
#[derive(Debug, Clone)]
pub struct PointSearchRequest {
    pub collection: String,
    pub vector_name: String,
    pub vector: Vec<f32>,
    pub limit: usize,
    pub filter: Option<PointFilter>,
    pub tuning: SearchTuning,
}

/// External service boundary for the backing nearest-neighbor store.
///
/// Collections hold one or more independently-addressable named vector
/// spaces. A missing collection or missing named vector yields an empty
/// result list, never an error; only transport/backend failures are
/// `Err`, and those are retried by the caller's policy, not here.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    async fn search_points(&self, request: PointSearchRequest) -> Result<Vec<PointHit>>;

    async fn collection_exists(&self, collection: &str) -> Result<bool>;
}

/// Convenience for building id-restriction filters
pub fn id_filter(field: &str, ids: &[CandidateId]) -> PointFilter {
    let options = ids
        .iter()
        .map(|id| match id {
            CandidateId::Int(n) => PayloadValue::Number(*n as f64),
            CandidateId::Str(s) => PayloadValue::String(s.clone()),
        })
        .collect();
    PointFilter {
        clauses: vec![FilterClause {
            field: field.to_string(),
            condition: FilterCondition::AnyOf(options),
        }],
    }
}
