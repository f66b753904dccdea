use crate::intent::Strategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tabula_vector_index::{CandidateId, Payload};

/// Which retrieval modality produced a candidate
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SourceKind {
    Vector,
    Keyword,
    Sql,
}

/// One candidate within an independently-ranked source list, before
/// fusion.
///
/// `source_rank` is the candidate's 0-based position in its list, a
/// positional index rather than a score; it is strictly increasing with
/// no gaps within one list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHit {
    pub candidate_id: CandidateId,

    pub source_rank: usize,

    pub source_kind: SourceKind,

    /// Which field/list produced the hit; the same id may arrive from
    /// several named vector fields
    pub source_tag: String,

    /// Carried through unchanged
    pub payload: Payload,
}

/// Output of fusion; derived per request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedHit {
    pub candidate_id: CandidateId,

    pub fused_score: f64,

    pub contributing_sources: BTreeSet<SourceKind>,

    pub payload: Payload,
}

/// One unit of orchestrator execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Success,
    Skipped,
    Failed,
}

/// Append-only record of one executed step. Steps that never ran are not
/// recorded at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub status: StepStatus,
    pub duration_ms: u64,

    #[serde(default)]
    pub error: Option<String>,

    pub cache_hit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStatus {
    Success,
    /// The request completed but one modality was degraded (e.g. hybrid
    /// proceeded with empty vector results after a vector-path timeout)
    Partial,
    Failed,
}

/// Terminal artifact of one orchestrator run. Sealed once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    /// Generated once, stable for the run
    pub query_id: String,

    pub status: WorkflowStatus,

    pub strategy: Strategy,

    pub rows: Vec<Payload>,

    pub row_count: usize,

    /// Every step that actually ran, in execution order
    pub steps: Vec<StepRecord>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub suggestions: Vec<String>,

    /// Wall-clock duration of the whole run
    pub total_time_ms: u64,
}

impl WorkflowResult {
    pub fn is_success(&self) -> bool {
        matches!(self.status, WorkflowStatus::Success | WorkflowStatus::Partial)
    }

    /// Duration of one named step, if it ran
    pub fn step_duration_ms(&self, name: &str) -> Option<u64> {
        self.steps
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.duration_ms)
    }

    /// How many recorded steps carry the given name (the SQL execution
    /// step can legitimately appear twice: original and corrected)
    pub fn step_count(&self, name: &str) -> usize {
        self.steps.iter().filter(|s| s.name == name).count()
    }
}
