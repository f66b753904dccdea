//! Step names and timing for the orchestrator's append-only trace.

use crate::error::OrchestratorError;
use crate::result::{StepRecord, StepStatus};
use std::time::Instant;

pub const CLASSIFICATION: &str = "classification";
pub const FIELD_SELECTION: &str = "field_selection";
pub const SQL_GENERATION: &str = "sql_generation";
pub const SQL_EXECUTION: &str = "sql_execution";
pub const VECTOR_SEARCH: &str = "vector_search";
pub const ERROR_CORRECTION: &str = "error_correction";
pub const FUSION: &str = "fusion";

/// Wall-clock timer for one step, consumed into a [`StepRecord`].
pub(crate) struct StepTimer {
    name: &'static str,
    start: Instant,
}

impl StepTimer {
    pub fn start(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    pub fn success(self, cache_hit: bool) -> StepRecord {
        StepRecord {
            name: self.name.to_string(),
            status: StepStatus::Success,
            duration_ms: self.start.elapsed().as_millis() as u64,
            error: None,
            cache_hit,
        }
    }

    pub fn failure(self, error: &OrchestratorError) -> StepRecord {
        StepRecord {
            name: self.name.to_string(),
            status: StepStatus::Failed,
            duration_ms: self.start.elapsed().as_millis() as u64,
            error: Some(error.to_string()),
            cache_hit: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_success_record() {
        let record = StepTimer::start(CLASSIFICATION).success(true);
        assert_eq!(record.name, "classification");
        assert_eq!(record.status, StepStatus::Success);
        assert!(record.cache_hit);
        assert_eq!(record.error, None);
    }

    #[test]
    fn test_failure_record_carries_message() {
        let err = OrchestratorError::Execution("no such column".to_string());
        let record = StepTimer::start(SQL_EXECUTION).failure(&err);
        assert_eq!(record.status, StepStatus::Failed);
        assert_eq!(
            record.error.as_deref(),
            Some("SQL execution failed: no such column")
        );
    }
}
