use crate::fusion::ScoreNormalization;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tabula_vector_index::{SearchTuning, TuningPolicy};

/// Configuration for the retrieval strategy orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Weight of the vector modality when the intent carries no weights
    #[serde(default = "default_modality_weight")]
    pub vector_weight: f64,

    /// Weight of the SQL modality when the intent carries no weights
    #[serde(default = "default_modality_weight")]
    pub sql_weight: f64,

    /// RRF constant for fusing per-field lists within one request
    /// (tighter, favors precision among near-duplicate fields)
    #[serde(default = "default_per_field_rrf_k")]
    pub per_field_rrf_k: f64,

    /// RRF constant for fusing the vector modality against the SQL row
    /// set (more conservative blending)
    #[serde(default = "default_cross_modality_rrf_k")]
    pub cross_modality_rrf_k: f64,

    /// Display-time score normalization
    #[serde(default)]
    pub normalization: ScoreNormalization,

    /// Maximum distinct tables a SQL plan may touch before the request
    /// is rejected as too complex
    #[serde(default = "default_max_tables")]
    pub max_tables: usize,

    /// Row cap for SQL execution and for the final fused result
    #[serde(default = "default_row_limit")]
    pub row_limit: usize,

    /// Column used to extract candidate ids from SQL rows
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Memoize classification, field selection and generated SQL
    #[serde(default = "default_true")]
    pub enable_cache: bool,

    /// Tuning policy handed to the vector index for batch searches
    #[serde(default)]
    pub tuning: TuningPolicy,

    #[serde(default = "default_classification_timeout_ms")]
    pub classification_timeout_ms: u64,

    #[serde(default = "default_selection_timeout_ms")]
    pub field_selection_timeout_ms: u64,

    #[serde(default = "default_generation_timeout_ms")]
    pub sql_generation_timeout_ms: u64,

    #[serde(default = "default_execution_timeout_ms")]
    pub sql_execution_timeout_ms: u64,

    #[serde(default = "default_vector_timeout_ms")]
    pub vector_search_timeout_ms: u64,

    #[serde(default = "default_correction_timeout_ms")]
    pub correction_timeout_ms: u64,
}

fn default_modality_weight() -> f64 {
    0.5
}

fn default_per_field_rrf_k() -> f64 {
    20.0
}

fn default_cross_modality_rrf_k() -> f64 {
    60.0
}

fn default_max_tables() -> usize {
    8
}

fn default_row_limit() -> usize {
    100
}

fn default_id_column() -> String {
    "id".to_string()
}

fn default_true() -> bool {
    true
}

fn default_classification_timeout_ms() -> u64 {
    20_000
}

fn default_selection_timeout_ms() -> u64 {
    20_000
}

fn default_generation_timeout_ms() -> u64 {
    30_000
}

fn default_execution_timeout_ms() -> u64 {
    30_000
}

fn default_vector_timeout_ms() -> u64 {
    10_000
}

fn default_correction_timeout_ms() -> u64 {
    20_000
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            vector_weight: default_modality_weight(),
            sql_weight: default_modality_weight(),
            per_field_rrf_k: default_per_field_rrf_k(),
            cross_modality_rrf_k: default_cross_modality_rrf_k(),
            normalization: ScoreNormalization::default(),
            max_tables: default_max_tables(),
            row_limit: default_row_limit(),
            id_column: default_id_column(),
            enable_cache: true,
            tuning: TuningPolicy::default(),
            classification_timeout_ms: default_classification_timeout_ms(),
            field_selection_timeout_ms: default_selection_timeout_ms(),
            sql_generation_timeout_ms: default_generation_timeout_ms(),
            sql_execution_timeout_ms: default_execution_timeout_ms(),
            vector_search_timeout_ms: default_vector_timeout_ms(),
            correction_timeout_ms: default_correction_timeout_ms(),
        }
    }
}

impl OrchestratorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.vector_weight < 0.0 || self.vector_weight > 1.0 {
            return Err(format!(
                "vector_weight must be in [0.0, 1.0], got {}",
                self.vector_weight
            ));
        }

        if self.sql_weight < 0.0 || self.sql_weight > 1.0 {
            return Err(format!(
                "sql_weight must be in [0.0, 1.0], got {}",
                self.sql_weight
            ));
        }

        let total = self.vector_weight + self.sql_weight;
        if (total - 1.0).abs() > 0.01 {
            return Err(format!(
                "vector_weight + sql_weight must sum to 1.0, got {total}"
            ));
        }

        if self.per_field_rrf_k <= 0.0 || self.cross_modality_rrf_k <= 0.0 {
            return Err("RRF constants must be > 0".to_string());
        }

        if self.max_tables == 0 {
            return Err("max_tables must be > 0".to_string());
        }

        if self.row_limit == 0 {
            return Err("row_limit must be > 0".to_string());
        }

        if self.id_column.is_empty() {
            return Err("id_column must not be empty".to_string());
        }

        let timeouts = [
            self.classification_timeout_ms,
            self.field_selection_timeout_ms,
            self.sql_generation_timeout_ms,
            self.sql_execution_timeout_ms,
            self.vector_search_timeout_ms,
            self.correction_timeout_ms,
        ];
        if timeouts.contains(&0) {
            return Err("step timeouts must be > 0".to_string());
        }

        Ok(())
    }

    /// Create config optimized for latency
    pub fn fast() -> Self {
        Self {
            tuning: TuningPolicy {
                base: SearchTuning::fast(),
                ..TuningPolicy::default()
            },
            vector_search_timeout_ms: 5_000,
            row_limit: 50,
            ..Default::default()
        }
    }

    /// Create config optimized for recall
    pub fn accurate() -> Self {
        Self {
            tuning: TuningPolicy {
                base: SearchTuning::accurate(),
                adaptive_breadth: true,
                ..TuningPolicy::default()
            },
            vector_search_timeout_ms: 30_000,
            ..Default::default()
        }
    }

    pub fn classification_timeout(&self) -> Duration {
        Duration::from_millis(self.classification_timeout_ms)
    }

    pub fn field_selection_timeout(&self) -> Duration {
        Duration::from_millis(self.field_selection_timeout_ms)
    }

    pub fn sql_generation_timeout(&self) -> Duration {
        Duration::from_millis(self.sql_generation_timeout_ms)
    }

    pub fn sql_execution_timeout(&self) -> Duration {
        Duration::from_millis(self.sql_execution_timeout_ms)
    }

    pub fn vector_search_timeout(&self) -> Duration {
        Duration::from_millis(self.vector_search_timeout_ms)
    }

    pub fn correction_timeout(&self) -> Duration {
        Duration::from_millis(self.correction_timeout_ms)
    }
}
