use crate::backend::{PointFilter, PointSearchRequest, VectorBackend};
use crate::error::{Result, VectorIndexError};
use crate::point::PointHit;
use crate::tuning::{SearchTuning, TuningPolicy};
use async_trait::async_trait;
use futures::future::try_join_all;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Produces a fixed-length query vector for a piece of text.
///
/// Treated as a blocking remote call; callers layer their own caching on
/// top (embeddings for a fixed model are immutable).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// One semantic sub-query: a text searched against one or more named
/// vector spaces of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorQuerySpec {
    pub collection: String,

    pub named_vector_fields: Vec<String>,

    pub search_text: String,

    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    #[serde(default)]
    pub filter: Option<PointFilter>,
}

fn default_result_limit() -> usize {
    10
}

/// Hits for one (collection, named vector) pair within a batch
#[derive(Debug, Clone)]
pub struct FieldSearchResult {
    pub collection: String,
    pub vector_name: String,
    pub hits: Vec<PointHit>,
}

/// Client for the backing nearest-neighbor service.
///
/// Wraps a [`VectorBackend`] with query embedding, tuning policy and
/// batch fan-out. A collection that was never vectorized simply
/// contributes nothing; only transport failures are errors.
pub struct VectorIndexClient {
    backend: Arc<dyn VectorBackend>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl VectorIndexClient {
    pub fn new(backend: Arc<dyn VectorBackend>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { backend, embedder }
    }

    /// Whether a collection has been vectorized at all. Search-time
    /// callers rarely need this; absence already degrades to an empty
    /// result set.
    pub async fn exists(&self, collection: &str) -> Result<bool> {
        self.backend.collection_exists(collection).await
    }

    /// Search one named vector space with an already-computed query vector.
    pub async fn search(
        &self,
        collection: &str,
        vector_name: &str,
        query_vector: Vec<f32>,
        limit: usize,
        filter: Option<PointFilter>,
        tuning: SearchTuning,
    ) -> Result<Vec<PointHit>> {
        if query_vector.is_empty() {
            return Err(VectorIndexError::InvalidQuery(
                "query vector is empty".to_string(),
            ));
        }

        if !self.backend.collection_exists(collection).await? {
            debug!("collection '{collection}' does not exist, returning empty results");
            return Ok(Vec::new());
        }

        self.backend
            .search_points(PointSearchRequest {
                collection: collection.to_string(),
                vector_name: vector_name.to_string(),
                vector: query_vector,
                limit,
                filter,
                tuning,
            })
            .await
    }

    /// Execute a batch of sub-queries as a single fan-out.
    ///
    /// All (spec, named vector) searches are dispatched together so N
    /// searches cost one round trip of added latency, not N serial round
    /// trips. Output order matches input order: for each spec, one
    /// [`FieldSearchResult`] per named vector field.
    pub async fn batch_search(
        &self,
        specs: &[VectorQuerySpec],
        policy: &TuningPolicy,
    ) -> Result<Vec<FieldSearchResult>> {
        if specs.is_empty() {
            return Ok(Vec::new());
        }

        // Embed each spec's search text once, shared across its fields.
        let embeddings = try_join_all(
            specs
                .iter()
                .map(|spec| self.embedder.embed(&spec.search_text)),
        )
        .await?;

        // One existence check per distinct collection.
        let mut known: HashMap<&str, bool> = HashMap::new();
        for spec in specs {
            if !known.contains_key(spec.collection.as_str()) {
                let exists = self.backend.collection_exists(&spec.collection).await?;
                known.insert(spec.collection.as_str(), exists);
            }
        }

        let mut searches = Vec::new();
        for (spec, embedding) in specs.iter().zip(embeddings.iter()) {
            let exists = known.get(spec.collection.as_str()).copied().unwrap_or(false);
            let clause_count = spec.filter.as_ref().map_or(0, PointFilter::clause_count);
            let tuning = policy.tuning_for(clause_count, spec.result_limit);

            for field in &spec.named_vector_fields {
                let request = PointSearchRequest {
                    collection: spec.collection.clone(),
                    vector_name: field.clone(),
                    vector: embedding.clone(),
                    limit: spec.result_limit,
                    filter: spec.filter.clone(),
                    tuning: tuning.clone(),
                };
                searches.push(async move {
                    if !exists {
                        debug!(
                            "collection '{}' does not exist, skipping '{}'",
                            request.collection, request.vector_name
                        );
                        return Ok(FieldSearchResult {
                            collection: request.collection,
                            vector_name: request.vector_name,
                            hits: Vec::new(),
                        });
                    }
                    let collection = request.collection.clone();
                    let vector_name = request.vector_name.clone();
                    let hits = self.backend.search_points(request).await?;
                    Ok(FieldSearchResult {
                        collection,
                        vector_name,
                        hits,
                    })
                });
            }
        }

        let results = try_join_all(searches).await?;
        debug!(
            "batch search: {} specs -> {} field lists",
            specs.len(),
            results.len()
        );
        Ok(results)
    }
}
