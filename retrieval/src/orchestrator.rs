use crate::collaborators::{
    ClassifyRequest, Collaborators, CorrectedSql, CorrectionRequest, ErrorCorrector,
    FieldSelection, FieldSelectionRequest, GeneratedSql, SqlExecutionRequest,
    SqlGenerationRequest, SqlResultSet,
};
use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, Result};
use crate::fusion::{normalize_scores, FusionEngine};
use crate::intent::{FusionMethod, HybridWeights, QueryIntent, SqlPlan, Strategy, VectorPlan};
use crate::result::{
    FusedHit, RankedHit, SourceKind, StepRecord, WorkflowResult, WorkflowStatus,
};
use crate::steps::{self, StepTimer};
use futures::FutureExt;
use indexmap::IndexMap;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tabula_utils_cache::{namespaces, ResultCache};
use tabula_vector_index::{CandidateId, Payload, PayloadValue, VectorIndexClient};
use uuid::Uuid;

/// One incoming query to orchestrate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query_text: String,

    /// Condensed description of the full relational schema
    pub schema_summary: String,

    /// Table name -> vectorized field names
    #[serde(default)]
    pub vectorized_field_map: IndexMap<String, Vec<String>>,

    /// Current-time context forwarded to SQL generation
    #[serde(default)]
    pub time_context: Option<String>,
}

struct RunOutput {
    status: WorkflowStatus,
    rows: Vec<Payload>,
    error: Option<String>,
    suggestions: Vec<String>,
}

/// Retrieval strategy orchestrator.
///
/// Routes a classified intent to the SQL path, the vector path, or both
/// in parallel, fuses the two modalities when both ran, retries once
/// through the error-correction path on SQL failure, and assembles a
/// uniform result envelope with per-step timing and cache-hit
/// accounting. Every run terminates in exactly one [`WorkflowResult`];
/// no failure escapes the top level.
pub struct QueryOrchestrator {
    config: OrchestratorConfig,
    collaborators: Collaborators,
    vector_client: Arc<VectorIndexClient>,
    fusion: FusionEngine,
    cache: Arc<ResultCache>,
}

impl QueryOrchestrator {
    /// Create a new orchestrator. All service handles are injected and
    /// shared by reference; the orchestrator holds no global state.
    pub fn new(
        config: OrchestratorConfig,
        collaborators: Collaborators,
        vector_client: Arc<VectorIndexClient>,
        cache: Arc<ResultCache>,
    ) -> Result<Self> {
        config.validate().map_err(OrchestratorError::Validation)?;

        info!("initializing query orchestrator");
        let fusion = FusionEngine::new(config.clone());

        Ok(Self {
            config,
            collaborators,
            vector_client,
            fusion,
            cache,
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run one query to a terminal result. Never returns an error and
    /// never panics past this boundary: any unexpected failure is
    /// converted into a `Failed` result carrying the steps collected so
    /// far.
    pub async fn run(&self, request: QueryRequest) -> WorkflowResult {
        let query_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        debug!("workflow {query_id}: '{}'", request.query_text);

        let mut step_records = Vec::new();
        let mut strategy = Strategy::Rejected;

        let outcome =
            AssertUnwindSafe(self.run_inner(&request, &mut step_records, &mut strategy))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(OrchestratorError::UpstreamUnavailable(
                        "unexpected internal failure".to_string(),
                    ))
                });

        let (status, rows, error_text, suggestions) = match outcome {
            Ok(output) => (output.status, output.rows, output.error, output.suggestions),
            Err(err) => {
                if err.is_user_facing() {
                    info!("workflow {query_id} not executable: {err}");
                } else {
                    error!("workflow {query_id} failed: {err}");
                }
                (
                    WorkflowStatus::Failed,
                    Vec::new(),
                    Some(err.to_string()),
                    Vec::new(),
                )
            }
        };

        let total_time_ms = started.elapsed().as_millis() as u64;
        info!(
            "workflow {query_id} finished: {status:?} via {strategy:?} in {total_time_ms}ms"
        );

        let row_count = rows.len();
        WorkflowResult {
            query_id,
            status,
            strategy,
            rows,
            row_count,
            steps: step_records,
            error: error_text,
            suggestions,
            total_time_ms,
        }
    }

    async fn run_inner(
        &self,
        request: &QueryRequest,
        step_records: &mut Vec<StepRecord>,
        strategy: &mut Strategy,
    ) -> Result<RunOutput> {
        if request.query_text.trim().is_empty() {
            return Err(OrchestratorError::Validation(
                "query text is empty".to_string(),
            ));
        }

        let (record, classified) = self.classification_step(request).await;
        step_records.push(record);
        let intent = classified?;
        *strategy = intent.strategy;

        match intent.strategy {
            Strategy::Rejected => {
                let QueryIntent {
                    reason, suggestions, ..
                } = intent;
                let reason =
                    reason.unwrap_or_else(|| "query rejected by classifier".to_string());
                info!("query rejected: {reason}");
                Ok(RunOutput {
                    status: WorkflowStatus::Failed,
                    rows: Vec::new(),
                    error: Some(reason),
                    suggestions,
                })
            }
            Strategy::SqlOnly => {
                let sql_plan = require_plan(intent.sql_plan.as_ref(), "sql_plan")?;
                self.run_sql_only(request, sql_plan, step_records).await
            }
            Strategy::VectorOnly => {
                let vector_plan = require_plan(intent.vector_plan.as_ref(), "vector_plan")?;
                self.run_vector_only(vector_plan, step_records).await
            }
            Strategy::Hybrid => self.run_hybrid(request, &intent, step_records).await,
        }
    }

    /// Field selection, SQL generation and execution, strictly
    /// sequentially; each consumes the previous step's output.
    async fn run_sql_only(
        &self,
        request: &QueryRequest,
        sql_plan: &SqlPlan,
        step_records: &mut Vec<StepRecord>,
    ) -> Result<RunOutput> {
        self.check_complexity(sql_plan)?;

        let (record, selection) = self.field_selection_step(request, sql_plan, None).await;
        step_records.push(record);
        let selection = selection?;

        let (record, generated) = self.sql_generation_step(request, &selection).await;
        step_records.push(record);
        let generated = generated?;

        let result_set = self
            .execute_with_correction(request, &selection, &generated, step_records)
            .await?;

        Ok(RunOutput {
            status: WorkflowStatus::Success,
            rows: result_set.rows,
            error: None,
            suggestions: Vec::new(),
        })
    }

    /// The vector path has no downstream dependency; results are
    /// returned as soon as they are fused across fields. No schema work
    /// and no cross-modality fusion step runs here.
    async fn run_vector_only(
        &self,
        vector_plan: &VectorPlan,
        step_records: &mut Vec<StepRecord>,
    ) -> Result<RunOutput> {
        let (record, lists) = self.vector_search_step(vector_plan).await;
        step_records.push(record);
        let lists = lists?;

        let mut fused = self.fusion.fuse_fields(lists);
        normalize_scores(&mut fused, self.config.normalization);

        Ok(RunOutput {
            status: WorkflowStatus::Success,
            rows: fused_rows(fused, self.config.row_limit),
            error: None,
            suggestions: Vec::new(),
        })
    }

    /// Vector search and field selection are mutually independent, so
    /// they run as a fork/join; the joined vector candidates then bias
    /// SQL generation before execution and cross-modality fusion.
    async fn run_hybrid(
        &self,
        request: &QueryRequest,
        intent: &QueryIntent,
        step_records: &mut Vec<StepRecord>,
    ) -> Result<RunOutput> {
        let sql_plan = require_plan(intent.sql_plan.as_ref(), "sql_plan")?;
        let vector_plan = require_plan(intent.vector_plan.as_ref(), "vector_plan")?;
        self.check_complexity(sql_plan)?;

        let (vector_outcome, selection_outcome) = tokio::join!(
            self.vector_search_step(vector_plan),
            self.field_selection_step(request, sql_plan, None),
        );

        let (record, vector_lists) = vector_outcome;
        step_records.push(record);
        let (record, selection) = selection_outcome;
        step_records.push(record);

        // A vector-path timeout or outage must not discard the SQL work
        // already in flight; proceed with whatever arrived.
        let mut degraded = false;
        let vector_lists = match vector_lists {
            Ok(lists) => lists,
            Err(err) if err.is_degradable_upstream() => {
                warn!("vector path degraded, fusing with empty vector results: {err}");
                degraded = true;
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        let mut selection = selection?;

        let vector_modality = self.fusion.fuse_fields(vector_lists);
        if !vector_modality.is_empty() {
            selection
                .sql_hints
                .push(candidate_hint(&self.config.id_column, &vector_modality));
        }

        let (record, generated) = self.sql_generation_step(request, &selection).await;
        step_records.push(record);
        let generated = generated?;

        let result_set = self
            .execute_with_correction(request, &selection, &generated, step_records)
            .await?;

        let timer = StepTimer::start(steps::FUSION);
        let sql_list = sql_rows_to_ranked(&result_set, &self.config.id_column);
        let vector_list =
            FusionEngine::to_ranked(&vector_modality, SourceKind::Vector, "vector");
        let weights = intent.hybrid_weights.clone().unwrap_or(HybridWeights {
            fusion_method: FusionMethod::Rrf,
            vector_weight: self.config.vector_weight,
            sql_weight: self.config.sql_weight,
        });
        let mut fused = self.fusion.fuse_modalities(sql_list, vector_list, &weights);
        normalize_scores(&mut fused, self.config.normalization);
        step_records.push(timer.success(false));

        Ok(RunOutput {
            status: if degraded {
                WorkflowStatus::Partial
            } else {
                WorkflowStatus::Success
            },
            rows: fused_rows(fused, self.config.row_limit),
            error: None,
            suggestions: Vec::new(),
        })
    }

    fn check_complexity(&self, plan: &SqlPlan) -> Result<()> {
        let got = plan.distinct_table_count();
        if got > self.config.max_tables {
            return Err(OrchestratorError::TooComplex {
                got,
                max: self.config.max_tables,
            });
        }
        Ok(())
    }

    async fn classification_step(
        &self,
        request: &QueryRequest,
    ) -> (StepRecord, Result<QueryIntent>) {
        let timer = StepTimer::start(steps::CLASSIFICATION);

        let cache_key = self.cache_key(
            namespaces::CLASSIFICATION,
            &(
                &request.query_text,
                &request.schema_summary,
                &request.vectorized_field_map,
            ),
        );
        if let Some(key) = &cache_key {
            if let Some(intent) = self
                .cache_get::<QueryIntent>(namespaces::CLASSIFICATION, key)
                .await
            {
                return (timer.success(true), Ok(intent));
            }
        }

        let call = self.collaborators.classifier.classify(ClassifyRequest {
            query_text: request.query_text.clone(),
            schema_summary: request.schema_summary.clone(),
            vectorized_field_map: request.vectorized_field_map.clone(),
        });
        let outcome = match tokio::time::timeout(self.config.classification_timeout(), call)
            .await
        {
            Ok(Ok(intent)) => intent.validate().map(|()| intent).map_err(|msg| {
                OrchestratorError::Validation(format!(
                    "classifier returned malformed intent: {msg}"
                ))
            }),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(OrchestratorError::UpstreamTimeout {
                step: steps::CLASSIFICATION.to_string(),
            }),
        };

        match outcome {
            Ok(intent) => {
                if let Some(key) = &cache_key {
                    self.cache_put(namespaces::CLASSIFICATION, key, &intent).await;
                }
                (timer.success(false), Ok(intent))
            }
            Err(err) => (timer.failure(&err), Err(err)),
        }
    }

    async fn field_selection_step(
        &self,
        request: &QueryRequest,
        sql_plan: &SqlPlan,
        vector_context: Option<Vec<CandidateId>>,
    ) -> (StepRecord, Result<FieldSelection>) {
        let timer = StepTimer::start(steps::FIELD_SELECTION);

        let cache_key = self.cache_key(
            namespaces::FIELD_SELECTION,
            &(
                &request.query_text,
                sql_plan,
                &vector_context,
                &request.schema_summary,
            ),
        );
        if let Some(key) = &cache_key {
            if let Some(selection) = self
                .cache_get::<FieldSelection>(namespaces::FIELD_SELECTION, key)
                .await
            {
                return (timer.success(true), Ok(selection));
            }
        }

        let call = self
            .collaborators
            .field_selector
            .select_fields(FieldSelectionRequest {
                query_text: request.query_text.clone(),
                sql_plan: sql_plan.clone(),
                filtered_schema: request.schema_summary.clone(),
                vector_context,
            });
        let outcome = match tokio::time::timeout(self.config.field_selection_timeout(), call)
            .await
        {
            Ok(result) => result,
            Err(_) => Err(OrchestratorError::UpstreamTimeout {
                step: steps::FIELD_SELECTION.to_string(),
            }),
        };

        match outcome {
            Ok(selection) => {
                if let Some(key) = &cache_key {
                    self.cache_put(namespaces::FIELD_SELECTION, key, &selection)
                        .await;
                }
                (timer.success(false), Ok(selection))
            }
            Err(err) => (timer.failure(&err), Err(err)),
        }
    }

    async fn sql_generation_step(
        &self,
        request: &QueryRequest,
        selection: &FieldSelection,
    ) -> (StepRecord, Result<GeneratedSql>) {
        let timer = StepTimer::start(steps::SQL_GENERATION);

        let cache_key = self.cache_key(
            namespaces::SQL_TEXT,
            &(
                &request.query_text,
                &selection.slim_schema,
                &selection.selected_tables,
                &selection.sql_hints,
                &request.time_context,
            ),
        );
        if let Some(key) = &cache_key {
            if let Some(generated) = self
                .cache_get::<GeneratedSql>(namespaces::SQL_TEXT, key)
                .await
            {
                return (timer.success(true), Ok(generated));
            }
        }

        let call = self
            .collaborators
            .sql_generator
            .generate_sql(SqlGenerationRequest {
                query_text: request.query_text.clone(),
                slim_schema: selection.slim_schema.clone(),
                selected_tables: selection.selected_tables.clone(),
                sql_hints: selection.sql_hints.clone(),
                time_context: request.time_context.clone(),
            });
        let outcome = match tokio::time::timeout(self.config.sql_generation_timeout(), call)
            .await
        {
            Ok(result) => result,
            Err(_) => Err(OrchestratorError::UpstreamTimeout {
                step: steps::SQL_GENERATION.to_string(),
            }),
        };

        match outcome {
            Ok(generated) => {
                for warning in &generated.warnings {
                    warn!("sql generation warning: {warning}");
                }
                if let Some(key) = &cache_key {
                    self.cache_put(namespaces::SQL_TEXT, key, &generated).await;
                }
                (timer.success(false), Ok(generated))
            }
            Err(err) => (timer.failure(&err), Err(err)),
        }
    }

    async fn sql_execution_step(&self, sql_text: &str) -> (StepRecord, Result<SqlResultSet>) {
        let timer = StepTimer::start(steps::SQL_EXECUTION);

        let call = self.collaborators.sql_executor.execute(SqlExecutionRequest {
            sql_text: sql_text.to_string(),
            read_only: true,
            row_limit: self.config.row_limit,
            timeout_ms: self.config.sql_execution_timeout_ms,
        });
        let outcome = match tokio::time::timeout(self.config.sql_execution_timeout(), call)
            .await
        {
            Ok(result) => result,
            Err(_) => Err(OrchestratorError::UpstreamTimeout {
                step: steps::SQL_EXECUTION.to_string(),
            }),
        };

        match outcome {
            Ok(mut result_set) => {
                // The executor returns up to row_limit + 1 rows so
                // truncation is detectable without a count query.
                if result_set.rows.len() > self.config.row_limit {
                    result_set.truncated = true;
                    result_set.rows.truncate(self.config.row_limit);
                }
                result_set.row_count = result_set.rows.len();
                (timer.success(false), Ok(result_set))
            }
            Err(err) => (timer.failure(&err), Err(err)),
        }
    }

    async fn correction_step(
        &self,
        corrector: &Arc<dyn ErrorCorrector>,
        request: &QueryRequest,
        selection: &FieldSelection,
        failed_sql: &str,
        error_message: &str,
    ) -> (StepRecord, Result<CorrectedSql>) {
        let timer = StepTimer::start(steps::ERROR_CORRECTION);

        let call = corrector.correct(CorrectionRequest {
            failed_sql: failed_sql.to_string(),
            error_message: error_message.to_string(),
            query_text: request.query_text.clone(),
            selected_schema: selection.slim_schema.clone(),
        });
        let outcome = match tokio::time::timeout(self.config.correction_timeout(), call).await
        {
            Ok(result) => result,
            Err(_) => Err(OrchestratorError::UpstreamTimeout {
                step: steps::ERROR_CORRECTION.to_string(),
            }),
        };

        match outcome {
            Ok(corrected) => (timer.success(false), Ok(corrected)),
            Err(err) => (timer.failure(&err), Err(err)),
        }
    }

    /// Execute generated SQL with at most one error-corrected retry.
    /// Both the original failed attempt and the corrected attempt are
    /// recorded as separate steps so the failure history is auditable.
    async fn execute_with_correction(
        &self,
        request: &QueryRequest,
        selection: &FieldSelection,
        generated: &GeneratedSql,
        step_records: &mut Vec<StepRecord>,
    ) -> Result<SqlResultSet> {
        let (record, outcome) = self.sql_execution_step(&generated.sql_text).await;
        step_records.push(record);
        let execution_error = match outcome {
            Ok(result_set) => return Ok(result_set),
            // Only executor-reported SQL failures are correctable;
            // timeouts and outages are terminal as-is.
            Err(err @ OrchestratorError::Execution(_)) => err,
            Err(err) => return Err(err),
        };

        let Some(corrector) = self.collaborators.error_corrector.as_ref() else {
            return Err(execution_error);
        };

        info!("sql execution failed, attempting one correction: {execution_error}");
        let (record, corrected) = self
            .correction_step(
                corrector,
                request,
                selection,
                &generated.sql_text,
                &execution_error.to_string(),
            )
            .await;
        step_records.push(record);
        let corrected = corrected?;

        let (record, outcome) = self.sql_execution_step(&corrected.corrected_sql).await;
        step_records.push(record);
        // A second failure is terminal; never a third attempt.
        outcome
    }

    async fn vector_search_step(
        &self,
        vector_plan: &VectorPlan,
    ) -> (StepRecord, Result<Vec<Vec<RankedHit>>>) {
        let timer = StepTimer::start(steps::VECTOR_SEARCH);

        let search = self
            .vector_client
            .batch_search(&vector_plan.queries, &self.config.tuning);
        let outcome = match tokio::time::timeout(self.config.vector_search_timeout(), search)
            .await
        {
            Ok(Ok(field_results)) => Ok(field_results
                .into_iter()
                .map(|field| {
                    let tag = format!("{}/{}", field.collection, field.vector_name);
                    field
                        .hits
                        .into_iter()
                        .enumerate()
                        .map(|(rank, hit)| RankedHit {
                            candidate_id: hit.id,
                            source_rank: rank,
                            source_kind: SourceKind::Vector,
                            source_tag: tag.clone(),
                            payload: hit.payload,
                        })
                        .collect()
                })
                .collect()),
            Ok(Err(err)) => Err(OrchestratorError::from(err)),
            Err(_) => Err(OrchestratorError::UpstreamTimeout {
                step: steps::VECTOR_SEARCH.to_string(),
            }),
        };

        match outcome {
            Ok(lists) => (timer.success(false), Ok(lists)),
            Err(err) => (timer.failure(&err), Err(err)),
        }
    }

    fn cache_key<T: Serialize + ?Sized>(&self, namespace: &str, input: &T) -> Option<String> {
        if !self.config.enable_cache {
            return None;
        }
        match ResultCache::key(namespace, input) {
            Ok(key) => Some(key),
            Err(err) => {
                warn!("cache key derivation failed for '{namespace}': {err}");
                None
            }
        }
    }

    async fn cache_get<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
        let bytes = self.cache.get(namespace, key).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("discarding undecodable cache entry in '{namespace}': {err}");
                None
            }
        }
    }

    async fn cache_put<T: Serialize>(&self, namespace: &str, key: &str, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.cache
                    .set(namespace, key, bytes, namespaces::default_ttl(namespace))
                    .await;
            }
            Err(err) => warn!("cache write skipped for '{namespace}': {err}"),
        }
    }
}

fn require_plan<'a, T>(plan: Option<&'a T>, name: &str) -> Result<&'a T> {
    plan.ok_or_else(|| {
        OrchestratorError::Validation(format!("intent is missing its {name}"))
    })
}

fn fused_rows(fused: Vec<FusedHit>, limit: usize) -> Vec<Payload> {
    fused.into_iter().take(limit).map(|hit| hit.payload).collect()
}

/// Convert SQL rows into a ranked list keyed by the id column. Rows
/// without a usable id get a synthetic positional id so they still fuse
/// deterministically (they just cannot merge with vector hits).
fn sql_rows_to_ranked(result_set: &SqlResultSet, id_column: &str) -> Vec<RankedHit> {
    result_set
        .rows
        .iter()
        .enumerate()
        .map(|(rank, row)| {
            let candidate_id = match row.get(id_column) {
                Some(PayloadValue::Number(n)) => CandidateId::Int(*n as i64),
                Some(PayloadValue::String(s)) => CandidateId::Str(s.clone()),
                _ => CandidateId::Str(format!("row-{rank}")),
            };
            RankedHit {
                candidate_id,
                source_rank: rank,
                source_kind: SourceKind::Sql,
                source_tag: "sql".to_string(),
                payload: row.clone(),
            }
        })
        .collect()
}

fn candidate_hint(id_column: &str, vector_modality: &[FusedHit]) -> String {
    let ids: Vec<String> = vector_modality
        .iter()
        .map(|hit| hit.candidate_id.to_string())
        .collect();
    format!(
        "Semantic search already surfaced likely candidates; consider restricting {id_column} IN ({})",
        ids.join(", ")
    )
}
