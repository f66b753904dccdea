//! End-to-end orchestrator scenarios with stubbed collaborators.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tabula_retrieval::{
    steps, ClassifyRequest, Collaborators, CorrectedSql, CorrectionRequest, ErrorCorrector,
    FieldSelection, FieldSelectionRequest, FieldSelector, GeneratedSql, IntentClassifier,
    OrchestratorConfig, OrchestratorError, QueryIntent, QueryKind, QueryOrchestrator,
    QueryRequest, SelectedTable, SqlExecutionRequest, SqlExecutor, SqlGenerationRequest,
    SqlGenerator, SqlPlan, SqlResultSet, StepStatus, Strategy, VectorPlan, WorkflowStatus,
};
use tabula_utils_cache::ResultCache;
use tabula_vector_index::{
    CandidateId, EmbeddingProvider, Payload, PayloadValue, PointHit, PointSearchRequest,
    VectorBackend, VectorIndexClient, VectorIndexError, VectorQuerySpec,
};

// ---------------------------------------------------------------------------
// Stub collaborators

struct ScriptedClassifier(QueryIntent);

#[async_trait]
impl IntentClassifier for ScriptedClassifier {
    async fn classify(
        &self,
        _request: ClassifyRequest,
    ) -> tabula_retrieval::Result<QueryIntent> {
        Ok(self.0.clone())
    }
}

struct UnavailableClassifier;

#[async_trait]
impl IntentClassifier for UnavailableClassifier {
    async fn classify(
        &self,
        _request: ClassifyRequest,
    ) -> tabula_retrieval::Result<QueryIntent> {
        Err(OrchestratorError::UpstreamUnavailable(
            "classifier offline".to_string(),
        ))
    }
}

struct PanickingClassifier;

#[async_trait]
impl IntentClassifier for PanickingClassifier {
    async fn classify(
        &self,
        _request: ClassifyRequest,
    ) -> tabula_retrieval::Result<QueryIntent> {
        panic!("classifier bug")
    }
}

struct SlowClassifier(QueryIntent);

#[async_trait]
impl IntentClassifier for SlowClassifier {
    async fn classify(
        &self,
        _request: ClassifyRequest,
    ) -> tabula_retrieval::Result<QueryIntent> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(self.0.clone())
    }
}

struct StubSelector {
    delay: Duration,
}

impl StubSelector {
    fn instant() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl FieldSelector for StubSelector {
    async fn select_fields(
        &self,
        request: FieldSelectionRequest,
    ) -> tabula_retrieval::Result<FieldSelection> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(FieldSelection {
            selected_tables: request
                .sql_plan
                .tables
                .iter()
                .map(|table| SelectedTable {
                    table: table.clone(),
                    fields: vec!["id".to_string(), "status".to_string()],
                    is_join_table: false,
                })
                .collect(),
            slim_schema: "orders(id, status)".to_string(),
            sql_hints: Vec::new(),
        })
    }
}

struct StubGenerator {
    sql: String,
}

#[async_trait]
impl SqlGenerator for StubGenerator {
    async fn generate_sql(
        &self,
        _request: SqlGenerationRequest,
    ) -> tabula_retrieval::Result<GeneratedSql> {
        Ok(GeneratedSql {
            sql_text: self.sql.clone(),
            query_kind: QueryKind::Select,
            warnings: Vec::new(),
        })
    }
}

enum ExecBehavior {
    Rows(Vec<Payload>),
    FailAlways,
    /// Fails unless the statement matches, then returns the rows
    SucceedOn(String, Vec<Payload>),
    Sleep(Duration),
}

struct ScriptedExecutor {
    behavior: ExecBehavior,
}

#[async_trait]
impl SqlExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        request: SqlExecutionRequest,
    ) -> tabula_retrieval::Result<SqlResultSet> {
        match &self.behavior {
            ExecBehavior::Rows(rows) => Ok(result_set(rows.clone())),
            ExecBehavior::FailAlways => Err(OrchestratorError::Execution(
                "no such column: shipped".to_string(),
            )),
            ExecBehavior::SucceedOn(sql, rows) => {
                if request.sql_text == *sql {
                    Ok(result_set(rows.clone()))
                } else {
                    Err(OrchestratorError::Execution(
                        "syntax error near SELECT".to_string(),
                    ))
                }
            }
            ExecBehavior::Sleep(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(result_set(Vec::new()))
            }
        }
    }

    async fn validate(&self, _sql_text: &str) -> tabula_retrieval::Result<()> {
        Ok(())
    }
}

struct StubCorrector {
    corrected: String,
}

#[async_trait]
impl ErrorCorrector for StubCorrector {
    async fn correct(
        &self,
        request: CorrectionRequest,
    ) -> tabula_retrieval::Result<CorrectedSql> {
        assert!(!request.error_message.is_empty());
        Ok(CorrectedSql {
            corrected_sql: self.corrected.clone(),
            error_kind: "unknown_column".to_string(),
            root_cause: "generated column name did not exist".to_string(),
        })
    }
}

/// Vector backend scripted per named vector field, with optional delay
/// or hard failure.
struct ScriptedBackend {
    lists: HashMap<String, Vec<i64>>,
    delay: Duration,
    fail: bool,
}

impl ScriptedBackend {
    fn with_lists(lists: HashMap<String, Vec<i64>>) -> Self {
        Self {
            lists,
            delay: Duration::ZERO,
            fail: false,
        }
    }
}

#[async_trait]
impl VectorBackend for ScriptedBackend {
    async fn search_points(
        &self,
        request: PointSearchRequest,
    ) -> tabula_vector_index::Result<Vec<PointHit>> {
        if self.fail {
            return Err(VectorIndexError::Backend("index offline".to_string()));
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let ids = self.lists.get(&request.vector_name).cloned().unwrap_or_default();
        Ok(ids
            .iter()
            .enumerate()
            .map(|(rank, id)| PointHit {
                id: CandidateId::Int(*id),
                score: 1.0 - rank as f32 * 0.1,
                payload: id_row(*id),
            })
            .collect())
    }

    async fn collection_exists(&self, _collection: &str) -> tabula_vector_index::Result<bool> {
        if self.fail {
            return Err(VectorIndexError::Backend("index offline".to_string()));
        }
        Ok(true)
    }
}

struct UnitEmbedder;

#[async_trait]
impl EmbeddingProvider for UnitEmbedder {
    async fn embed(&self, _text: &str) -> tabula_vector_index::Result<Vec<f32>> {
        Ok(vec![1.0])
    }
}

// ---------------------------------------------------------------------------
// Harness

struct Harness {
    classifier: Arc<dyn IntentClassifier>,
    selector: Arc<dyn FieldSelector>,
    generator: Arc<dyn SqlGenerator>,
    executor: Arc<dyn SqlExecutor>,
    corrector: Option<Arc<dyn ErrorCorrector>>,
    backend: Arc<dyn VectorBackend>,
    config: OrchestratorConfig,
}

impl Harness {
    fn new(intent: QueryIntent) -> Self {
        Self {
            classifier: Arc::new(ScriptedClassifier(intent)),
            selector: Arc::new(StubSelector::instant()),
            generator: Arc::new(StubGenerator {
                sql: "SELECT id, status FROM orders".to_string(),
            }),
            executor: Arc::new(ScriptedExecutor {
                behavior: ExecBehavior::Rows(vec![id_row(1)]),
            }),
            corrector: None,
            backend: Arc::new(ScriptedBackend::with_lists(HashMap::new())),
            config: OrchestratorConfig::default(),
        }
    }

    fn build(self) -> QueryOrchestrator {
        let client = Arc::new(VectorIndexClient::new(self.backend, Arc::new(UnitEmbedder)));
        QueryOrchestrator::new(
            self.config,
            Collaborators {
                classifier: self.classifier,
                field_selector: self.selector,
                sql_generator: self.generator,
                sql_executor: self.executor,
                error_corrector: self.corrector,
            },
            client,
            Arc::new(ResultCache::new()),
        )
        .expect("valid harness config")
    }
}

fn id_row(id: i64) -> Payload {
    Payload::from([("id".to_string(), PayloadValue::Number(id as f64))])
}

fn result_set(rows: Vec<Payload>) -> SqlResultSet {
    let row_count = rows.len();
    SqlResultSet {
        rows,
        row_count,
        truncated: false,
        columns: vec!["id".to_string(), "status".to_string()],
    }
}

fn request() -> QueryRequest {
    QueryRequest {
        query_text: "orders that mention late delivery".to_string(),
        schema_summary: "orders(id, status, notes)".to_string(),
        vectorized_field_map: Default::default(),
        time_context: None,
    }
}

fn sql_plan() -> SqlPlan {
    SqlPlan {
        tables: vec!["orders".to_string()],
        allows_fuzzy_match: false,
        fuzzy_patterns: Vec::new(),
    }
}

fn vector_plan(fields: &[&str]) -> VectorPlan {
    VectorPlan {
        queries: vec![VectorQuerySpec {
            collection: "orders".to_string(),
            named_vector_fields: fields.iter().map(|f| (*f).to_string()).collect(),
            search_text: "late delivery".to_string(),
            result_limit: 10,
            filter: None,
        }],
        requires_rerank: false,
    }
}

fn row_ids(result: &tabula_retrieval::WorkflowResult) -> Vec<i64> {
    result
        .rows
        .iter()
        .map(|row| match &row["id"] {
            PayloadValue::Number(n) => *n as i64,
            other => panic!("unexpected id value {other:?}"),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Scenarios

#[tokio::test]
async fn rejected_query_short_circuits() {
    let intent = QueryIntent::rejected(
        "the schema has no revenue data",
        vec!["try asking about order counts".to_string()],
    );
    let orchestrator = Harness::new(intent).build();

    let result = orchestrator.run(request()).await;

    assert_eq!(result.status, WorkflowStatus::Failed);
    assert_eq!(result.strategy, Strategy::Rejected);
    assert_eq!(result.error.as_deref(), Some("the schema has no revenue data"));
    assert_eq!(result.suggestions.len(), 1);
    // Only classification ran; nothing else may be recorded.
    assert_eq!(result.steps.len(), 1);
    assert_eq!(result.steps[0].name, steps::CLASSIFICATION);
}

#[tokio::test]
async fn sql_only_happy_path() {
    let intent = QueryIntent::sql_only(0.9, sql_plan());
    let mut harness = Harness::new(intent);
    harness.executor = Arc::new(ScriptedExecutor {
        behavior: ExecBehavior::Rows(vec![id_row(4), id_row(7)]),
    });
    let orchestrator = harness.build();

    let result = orchestrator.run(request()).await;

    assert_eq!(result.status, WorkflowStatus::Success);
    assert_eq!(result.strategy, Strategy::SqlOnly);
    assert_eq!(row_ids(&result), vec![4, 7]);
    assert_eq!(result.row_count, 2);

    let names: Vec<&str> = result.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            steps::CLASSIFICATION,
            steps::FIELD_SELECTION,
            steps::SQL_GENERATION,
            steps::SQL_EXECUTION,
        ]
    );
    // Fusion never ran, so it is never recorded.
    assert_eq!(result.step_count(steps::FUSION), 0);
}

#[tokio::test]
async fn vector_only_skips_schema_work() {
    let intent = QueryIntent::vector_only(0.9, vector_plan(&["notes"]));
    let mut harness = Harness::new(intent);
    harness.backend = Arc::new(ScriptedBackend::with_lists(HashMap::from([(
        "notes".to_string(),
        vec![11, 5],
    )])));
    let orchestrator = harness.build();

    let result = orchestrator.run(request()).await;

    assert_eq!(result.status, WorkflowStatus::Success);
    assert_eq!(row_ids(&result), vec![11, 5]);
    assert_eq!(result.step_count(steps::FIELD_SELECTION), 0);
    assert_eq!(result.step_count(steps::SQL_GENERATION), 0);
    assert_eq!(result.step_count(steps::FUSION), 0);
}

#[tokio::test]
async fn hybrid_end_to_end_boosts_cross_modality_candidates() {
    let intent = QueryIntent::hybrid(0.8, sql_plan(), vector_plan(&["description", "notes"]));
    let mut harness = Harness::new(intent);
    harness.backend = Arc::new(ScriptedBackend::with_lists(HashMap::from([
        ("description".to_string(), vec![10, 20, 30]),
        ("notes".to_string(), vec![20, 40]),
    ])));
    harness.executor = Arc::new(ScriptedExecutor {
        behavior: ExecBehavior::Rows(vec![id_row(10), id_row(99)]),
    });
    let orchestrator = harness.build();

    let result = orchestrator.run(request()).await;

    assert_eq!(result.status, WorkflowStatus::Success);
    assert_eq!(result.strategy, Strategy::Hybrid);

    // Field-level fusion ranks 20 above 10 (20 appears in both field
    // lists); cross-modality fusion then boosts 10 to the top because
    // it appears in both the vector ranking and the SQL rows.
    assert_eq!(row_ids(&result), vec![10, 20, 99, 40, 30]);

    assert_eq!(result.step_count(steps::FUSION), 1);
    assert_eq!(result.step_count(steps::VECTOR_SEARCH), 1);
    assert_eq!(result.step_count(steps::SQL_EXECUTION), 1);
}

#[tokio::test]
async fn hybrid_fork_join_overlaps_vector_and_selection() {
    let intent = QueryIntent::hybrid(0.8, sql_plan(), vector_plan(&["description"]));
    let mut harness = Harness::new(intent);
    harness.backend = Arc::new(ScriptedBackend {
        lists: HashMap::from([("description".to_string(), vec![1])]),
        delay: Duration::from_millis(50),
        fail: false,
    });
    harness.selector = Arc::new(StubSelector {
        delay: Duration::from_millis(30),
    });
    let orchestrator = harness.build();

    let started = Instant::now();
    let result = orchestrator.run(request()).await;
    let elapsed = started.elapsed();

    assert_eq!(result.status, WorkflowStatus::Success);
    // Pre-fusion latency is ~max(50, 30), not the 80ms sum.
    assert!(elapsed >= Duration::from_millis(50), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(75), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn hybrid_vector_timeout_degrades_to_sql_results() {
    let intent = QueryIntent::hybrid(0.8, sql_plan(), vector_plan(&["description"]));
    let mut harness = Harness::new(intent);
    harness.backend = Arc::new(ScriptedBackend {
        lists: HashMap::from([("description".to_string(), vec![1])]),
        delay: Duration::from_millis(500),
        fail: false,
    });
    harness.executor = Arc::new(ScriptedExecutor {
        behavior: ExecBehavior::Rows(vec![id_row(3)]),
    });
    harness.config.vector_search_timeout_ms = 40;
    let orchestrator = harness.build();

    let result = orchestrator.run(request()).await;

    // The completed SQL work is not discarded.
    assert_eq!(result.status, WorkflowStatus::Partial);
    assert_eq!(row_ids(&result), vec![3]);

    let vector_step = result
        .steps
        .iter()
        .find(|s| s.name == steps::VECTOR_SEARCH)
        .expect("vector step recorded");
    assert_eq!(vector_step.status, StepStatus::Failed);
    assert!(vector_step.error.as_deref().unwrap_or_default().contains("Timeout"));
}

#[tokio::test]
async fn hybrid_vector_outage_degrades_too() {
    let intent = QueryIntent::hybrid(0.8, sql_plan(), vector_plan(&["description"]));
    let mut harness = Harness::new(intent);
    harness.backend = Arc::new(ScriptedBackend {
        lists: HashMap::new(),
        delay: Duration::ZERO,
        fail: true,
    });
    harness.executor = Arc::new(ScriptedExecutor {
        behavior: ExecBehavior::Rows(vec![id_row(8)]),
    });
    let orchestrator = harness.build();

    let result = orchestrator.run(request()).await;

    assert_eq!(result.status, WorkflowStatus::Partial);
    assert_eq!(row_ids(&result), vec![8]);
}

#[tokio::test]
async fn failed_sql_is_corrected_exactly_once_and_succeeds() {
    let intent = QueryIntent::sql_only(0.9, sql_plan());
    let mut harness = Harness::new(intent);
    harness.generator = Arc::new(StubGenerator {
        sql: "SELECT shipped FROM orders".to_string(),
    });
    harness.executor = Arc::new(ScriptedExecutor {
        behavior: ExecBehavior::SucceedOn(
            "SELECT status FROM orders".to_string(),
            vec![id_row(2)],
        ),
    });
    harness.corrector = Some(Arc::new(StubCorrector {
        corrected: "SELECT status FROM orders".to_string(),
    }));
    let orchestrator = harness.build();

    let result = orchestrator.run(request()).await;

    assert_eq!(result.status, WorkflowStatus::Success);
    assert_eq!(row_ids(&result), vec![2]);

    // Both attempts are auditable: failed original, then corrected.
    assert_eq!(result.step_count(steps::SQL_EXECUTION), 2);
    assert_eq!(result.step_count(steps::ERROR_CORRECTION), 1);
    let executions: Vec<&tabula_retrieval::StepRecord> = result
        .steps
        .iter()
        .filter(|s| s.name == steps::SQL_EXECUTION)
        .collect();
    assert_eq!(executions[0].status, StepStatus::Failed);
    assert_eq!(executions[1].status, StepStatus::Success);
}

#[tokio::test]
async fn persistent_sql_failure_stops_after_two_attempts() {
    let intent = QueryIntent::sql_only(0.9, sql_plan());
    let mut harness = Harness::new(intent);
    harness.executor = Arc::new(ScriptedExecutor {
        behavior: ExecBehavior::FailAlways,
    });
    harness.corrector = Some(Arc::new(StubCorrector {
        corrected: "SELECT id FROM orders".to_string(),
    }));
    let orchestrator = harness.build();

    let result = orchestrator.run(request()).await;

    assert_eq!(result.status, WorkflowStatus::Failed);
    // Exactly original + corrected, never a third attempt.
    assert_eq!(result.step_count(steps::SQL_EXECUTION), 2);
    assert_eq!(result.step_count(steps::ERROR_CORRECTION), 1);
    assert!(result.error.as_deref().unwrap_or_default().contains("SQL execution failed"));
}

#[tokio::test]
async fn sql_failure_without_corrector_is_terminal() {
    let intent = QueryIntent::sql_only(0.9, sql_plan());
    let mut harness = Harness::new(intent);
    harness.executor = Arc::new(ScriptedExecutor {
        behavior: ExecBehavior::FailAlways,
    });
    let orchestrator = harness.build();

    let result = orchestrator.run(request()).await;

    assert_eq!(result.status, WorkflowStatus::Failed);
    assert_eq!(result.step_count(steps::SQL_EXECUTION), 1);
    assert_eq!(result.step_count(steps::ERROR_CORRECTION), 0);
}

#[tokio::test]
async fn sql_timeout_is_terminal_without_correction() {
    let intent = QueryIntent::sql_only(0.9, sql_plan());
    let mut harness = Harness::new(intent);
    harness.executor = Arc::new(ScriptedExecutor {
        behavior: ExecBehavior::Sleep(Duration::from_millis(500)),
    });
    harness.corrector = Some(Arc::new(StubCorrector {
        corrected: "SELECT id FROM orders".to_string(),
    }));
    harness.config.sql_execution_timeout_ms = 40;
    let orchestrator = harness.build();

    let result = orchestrator.run(request()).await;

    assert_eq!(result.status, WorkflowStatus::Failed);
    // Timeouts are not correctable SQL errors.
    assert_eq!(result.step_count(steps::SQL_EXECUTION), 1);
    assert_eq!(result.step_count(steps::ERROR_CORRECTION), 0);
}

#[tokio::test]
async fn too_many_tables_fails_fast() {
    let plan = SqlPlan {
        tables: (0..12).map(|i| format!("table_{i}")).collect(),
        allows_fuzzy_match: false,
        fuzzy_patterns: Vec::new(),
    };
    let orchestrator = Harness::new(QueryIntent::sql_only(0.9, plan)).build();

    let result = orchestrator.run(request()).await;

    assert_eq!(result.status, WorkflowStatus::Failed);
    assert!(result.error.as_deref().unwrap_or_default().contains("too complex"));
    // Field selection never started.
    assert_eq!(result.step_count(steps::FIELD_SELECTION), 0);
}

#[tokio::test]
async fn classification_timeout_is_terminal() {
    let intent = QueryIntent::sql_only(0.9, sql_plan());
    let mut harness = Harness::new(intent);
    harness.classifier = Arc::new(SlowClassifier(QueryIntent::sql_only(0.9, sql_plan())));
    harness.config.classification_timeout_ms = 40;
    let orchestrator = harness.build();

    let result = orchestrator.run(request()).await;

    assert_eq!(result.status, WorkflowStatus::Failed);
    assert_eq!(result.steps.len(), 1);
    assert_eq!(result.steps[0].status, StepStatus::Failed);
}

#[tokio::test]
async fn empty_query_text_is_rejected_without_steps() {
    let orchestrator = Harness::new(QueryIntent::sql_only(0.9, sql_plan())).build();

    let result = orchestrator
        .run(QueryRequest {
            query_text: "   ".to_string(),
            ..request()
        })
        .await;

    assert_eq!(result.status, WorkflowStatus::Failed);
    assert!(result.steps.is_empty());
    assert!(result.error.as_deref().unwrap_or_default().contains("Invalid request"));
}

#[tokio::test]
async fn every_failure_mode_yields_exactly_one_result() {
    let cases: Vec<Harness> = vec![
        {
            let mut h = Harness::new(QueryIntent::sql_only(0.9, sql_plan()));
            h.classifier = Arc::new(UnavailableClassifier);
            h
        },
        {
            let mut h = Harness::new(QueryIntent::sql_only(0.9, sql_plan()));
            h.classifier = Arc::new(PanickingClassifier);
            h
        },
        {
            // Classifier violates the intent shape invariant.
            let mut broken = QueryIntent::hybrid(0.8, sql_plan(), vector_plan(&["notes"]));
            broken.vector_plan = None;
            Harness::new(broken)
        },
        {
            let mut h = Harness::new(QueryIntent::vector_only(0.9, vector_plan(&["notes"])));
            h.backend = Arc::new(ScriptedBackend {
                lists: HashMap::new(),
                delay: Duration::ZERO,
                fail: true,
            });
            h
        },
        {
            let mut h = Harness::new(QueryIntent::sql_only(0.9, sql_plan()));
            h.executor = Arc::new(ScriptedExecutor {
                behavior: ExecBehavior::FailAlways,
            });
            h
        },
    ];

    for harness in cases {
        let orchestrator = harness.build();
        let result = orchestrator.run(request()).await;
        assert_eq!(result.status, WorkflowStatus::Failed);
        assert!(result.error.is_some());
    }
}

#[tokio::test]
async fn repeated_query_hits_memoization_caches() {
    let intent = QueryIntent::sql_only(0.9, sql_plan());
    let orchestrator = Harness::new(intent).build();

    let first = orchestrator.run(request()).await;
    let second = orchestrator.run(request()).await;

    assert_eq!(first.status, WorkflowStatus::Success);
    assert_eq!(second.status, WorkflowStatus::Success);
    assert_ne!(first.query_id, second.query_id);

    let hit_flags: Vec<bool> = second.steps.iter().map(|s| s.cache_hit).collect();
    // Classification, field selection and SQL generation are memoized;
    // execution never is.
    assert_eq!(hit_flags, vec![true, true, true, false]);

    let first_flags: Vec<bool> = first.steps.iter().map(|s| s.cache_hit).collect();
    assert_eq!(first_flags, vec![false, false, false, false]);
}

#[tokio::test]
async fn vector_only_timeout_fails_the_request() {
    let intent = QueryIntent::vector_only(0.9, vector_plan(&["description"]));
    let mut harness = Harness::new(intent);
    harness.backend = Arc::new(ScriptedBackend {
        lists: HashMap::from([("description".to_string(), vec![1])]),
        delay: Duration::from_millis(500),
        fail: false,
    });
    harness.config.vector_search_timeout_ms = 40;
    let orchestrator = harness.build();

    let result = orchestrator.run(request()).await;

    // With no other modality there is nothing to degrade to.
    assert_eq!(result.status, WorkflowStatus::Failed);
    assert!(result.error.as_deref().unwrap_or_default().contains("Timeout"));
}
