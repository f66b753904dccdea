use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The classifier declared the query unanswerable against this schema
    #[error("Query infeasible: {0}")]
    Infeasible(String),

    /// The classifier needs more input from the user
    #[error("Clarification needed: {0}")]
    ClarificationNeeded(String),

    /// The query touches more distinct tables than the configured ceiling
    #[error("Query too complex: {got} tables requested, limit is {max}")]
    TooComplex { got: usize, max: usize },

    /// An external collaborator exceeded its deadline
    #[error("Timeout during {step}")]
    UpstreamTimeout { step: String },

    /// An external collaborator is unreachable
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Generated SQL failed at the executor
    #[error("SQL execution failed: {0}")]
    Execution(String),

    /// Malformed caller input to the orchestrator itself
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Vector index error
    #[error("Vector index error: {0}")]
    VectorIndex(#[from] tabula_vector_index::VectorIndexError),
}

impl OrchestratorError {
    /// Expected outcomes of classification rather than system faults.
    /// These are returned to the user but not logged as errors.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            OrchestratorError::Infeasible(_)
                | OrchestratorError::ClarificationNeeded(_)
                | OrchestratorError::TooComplex { .. }
        )
    }

    /// Errors the hybrid path may absorb by proceeding with empty vector
    /// results instead of aborting the whole request.
    pub fn is_degradable_upstream(&self) -> bool {
        matches!(
            self,
            OrchestratorError::UpstreamTimeout { .. }
                | OrchestratorError::UpstreamUnavailable(_)
                | OrchestratorError::VectorIndex(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
