/*!
# Tabula Retrieval

Retrieval strategy orchestration for natural-language queries over a
relational + vector corpus:
- **Strategy routing**: an external classifier picks SQL-only,
  vector-only, hybrid, or rejects the query outright
- **Parallel hybrid execution**: vector search and schema field
  selection run as a fork/join before SQL generation
- **Reciprocal Rank Fusion (RRF)** across named vector fields, then
  across modalities
- **Bounded error recovery**: exactly one corrected re-execution when
  generated SQL fails

## Architecture

```text
Query text
  └─> Classification (external, cached)
        ├─> Rejected ──────────────────────────> result + suggestions
        ├─> SqlOnly:  field selection -> SQL gen -> execute
        ├─> VectorOnly: batch vector search -> per-field fusion
        └─> Hybrid:   ┌ vector search ┐
                      │               ├─ join -> SQL gen -> execute
                      └ field select ─┘            └─> cross-modality fusion
```

Every sub-call appends one `StepRecord` with wall-clock duration and a
cache-hit flag, and every run terminates in exactly one
`WorkflowResult`.

## Example

```rust,no_run
use std::sync::Arc;
use tabula_retrieval::{
    Collaborators, OrchestratorConfig, QueryOrchestrator, QueryRequest,
};
use tabula_utils_cache::ResultCache;
use tabula_vector_index::{InMemoryBackend, VectorIndexClient};

# async fn example(collaborators: Collaborators, client: Arc<VectorIndexClient>) -> anyhow::Result<()> {
let orchestrator = QueryOrchestrator::new(
    OrchestratorConfig::default(),
    collaborators,
    client,
    Arc::new(ResultCache::new()),
)?;

let result = orchestrator
    .run(QueryRequest {
        query_text: "orders delayed last week".to_string(),
        schema_summary: "orders(id, status, shipped_at, notes)".to_string(),
        vectorized_field_map: Default::default(),
        time_context: None,
    })
    .await;

println!("{:?}: {} rows", result.status, result.row_count);
# Ok(())
# }
```
*/

mod collaborators;
mod config;
mod embedding;
mod error;
mod fusion;
mod intent;
mod orchestrator;
mod result;
pub mod steps;

pub use collaborators::{
    ClassifyRequest, Collaborators, CorrectedSql, CorrectionRequest, ErrorCorrector,
    FieldSelection, FieldSelectionRequest, FieldSelector, GeneratedSql, IntentClassifier,
    QueryKind, SelectedTable, SqlExecutionRequest, SqlExecutor, SqlGenerationRequest,
    SqlGenerator, SqlResultSet,
};
pub use config::OrchestratorConfig;
pub use embedding::CachingEmbeddingProvider;
pub use error::{OrchestratorError, Result};
pub use fusion::{normalize_scores, FusionEngine, ScoreNormalization};
pub use intent::{FusionMethod, HybridWeights, QueryIntent, SqlPlan, Strategy, VectorPlan};
pub use orchestrator::{QueryOrchestrator, QueryRequest};
pub use result::{
    FusedHit, RankedHit, SourceKind, StepRecord, StepStatus, WorkflowResult, WorkflowStatus,
};
