//! Contracts for the external collaborators the orchestrator drives.
//!
//! Natural-language interpretation, SQL text synthesis and SQL execution
//! are opaque services with typed inputs and outputs; everything here is
//! a boundary, not an implementation.

use crate::error::Result;
use crate::intent::{QueryIntent, SqlPlan};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tabula_vector_index::{CandidateId, Payload};

/// Input to the intent classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub query_text: String,

    /// Condensed description of the full relational schema
    pub schema_summary: String,

    /// Table name -> vectorized field names, so the classifier knows
    /// which tables can take the semantic path at all
    pub vectorized_field_map: IndexMap<String, Vec<String>>,
}

/// Turns free text into a routing strategy plus per-path plans.
/// Must always return exactly one strategy; a `Rejected` intent carries
/// a human-readable reason.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, request: ClassifyRequest) -> Result<QueryIntent>;
}

/// Input to the field selector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSelectionRequest {
    pub query_text: String,

    pub sql_plan: SqlPlan,

    /// Schema already narrowed to the tables the classifier named
    pub filtered_schema: String,

    /// Candidate ids from an already-completed vector search, letting the
    /// selector bias toward an `IN (...)` filter
    #[serde(default)]
    pub vector_context: Option<Vec<CandidateId>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedTable {
    pub table: String,
    pub fields: Vec<String>,

    #[serde(default)]
    pub is_join_table: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSelection {
    pub selected_tables: Vec<SelectedTable>,

    /// Schema slimmed down to the selected tables and fields
    pub slim_schema: String,

    #[serde(default)]
    pub sql_hints: Vec<String>,
}

/// Reduces the full schema to only what the generated SQL will need.
#[async_trait]
pub trait FieldSelector: Send + Sync {
    async fn select_fields(&self, request: FieldSelectionRequest) -> Result<FieldSelection>;
}

/// Input to the SQL generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlGenerationRequest {
    pub query_text: String,
    pub slim_schema: String,
    pub selected_tables: Vec<SelectedTable>,
    pub sql_hints: Vec<String>,

    #[serde(default)]
    pub time_context: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryKind {
    Select,
    Aggregate,
    Complex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSql {
    pub sql_text: String,
    pub query_kind: QueryKind,

    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Synthesizes SQL text from the slim schema.
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    async fn generate_sql(&self, request: SqlGenerationRequest) -> Result<GeneratedSql>;
}

/// Input to the SQL executor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlExecutionRequest {
    pub sql_text: String,

    /// Reject anything but a read-only statement
    pub read_only: bool,

    pub row_limit: usize,

    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SqlResultSet {
    pub rows: Vec<Payload>,
    pub row_count: usize,

    /// Set when the executor capped the row set; it returns at most
    /// `row_limit + 1` rows so truncation is detectable without a
    /// separate count query
    pub truncated: bool,

    pub columns: Vec<String>,
}

/// Runs generated SQL against the relational engine.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, request: SqlExecutionRequest) -> Result<SqlResultSet>;

    /// Parse/plan the statement without executing it
    async fn validate(&self, sql_text: &str) -> Result<()>;
}

/// Input to the error corrector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionRequest {
    pub failed_sql: String,
    pub error_message: String,
    pub query_text: String,
    pub selected_schema: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedSql {
    pub corrected_sql: String,
    pub error_kind: String,
    pub root_cause: String,
}

/// Repairs a failed SQL statement given the executor's error message.
#[async_trait]
pub trait ErrorCorrector: Send + Sync {
    async fn correct(&self, request: CorrectionRequest) -> Result<CorrectedSql>;
}

/// The full set of external collaborators, injected at construction.
/// The corrector is optional; without it a failed execution is terminal
/// on the first attempt.
#[derive(Clone)]
pub struct Collaborators {
    pub classifier: Arc<dyn IntentClassifier>,
    pub field_selector: Arc<dyn FieldSelector>,
    pub sql_generator: Arc<dyn SqlGenerator>,
    pub sql_executor: Arc<dyn SqlExecutor>,
    pub error_corrector: Option<Arc<dyn ErrorCorrector>>,
}
