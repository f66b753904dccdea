use crate::backend::{PointSearchRequest, VectorBackend};
use crate::error::Result;
use crate::point::{CandidateId, Payload, PointHit};
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use tokio::sync::RwLock;

struct StoredPoint {
    id: CandidateId,
    vectors: HashMap<String, Vec<f32>>,
    payload: Payload,
}

/// Brute-force in-memory backend.
///
/// Scans every point of a collection with cosine similarity, so searches
/// are always exact and the tuning knobs are no-ops. Used by tests and
/// small local corpora; production deployments plug a real service in
/// behind [`VectorBackend`].
pub struct InMemoryBackend {
    collections: RwLock<HashMap<String, Vec<StoredPoint>>>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace a point. A point may carry several named vectors
    /// (e.g. a "description" and a "notes" embedding on the same row).
    pub async fn upsert_point(
        &self,
        collection: &str,
        id: CandidateId,
        vectors: HashMap<String, Vec<f32>>,
        payload: Payload,
    ) {
        let mut collections = self.collections.write().await;
        let points = collections.entry(collection.to_string()).or_default();
        points.retain(|p| p.id != id);
        points.push(StoredPoint {
            id,
            vectors,
            payload,
        });
    }

    pub async fn point_count(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map_or(0, Vec::len)
    }
}

#[async_trait]
impl VectorBackend for InMemoryBackend {
    async fn search_points(&self, request: PointSearchRequest) -> Result<Vec<PointHit>> {
        let collections = self.collections.read().await;
        let Some(points) = collections.get(&request.collection) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(f32, &StoredPoint)> = points
            .iter()
            .filter_map(|point| {
                let vector = point.vectors.get(&request.vector_name)?;
                if let Some(filter) = &request.filter {
                    if !filter.matches(&point.payload) {
                        return None;
                    }
                }
                Some((cosine_similarity(&request.vector, vector), point))
            })
            .collect();

        // Descending score, id ascending on ties for a stable order.
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.id.cmp(&b.1.id))
        });

        let hits: Vec<PointHit> = scored
            .into_iter()
            .take(request.limit)
            .map(|(score, point)| PointHit {
                id: point.id.clone(),
                score,
                payload: point.payload.clone(),
            })
            .collect();

        debug!(
            "in-memory search '{}/{}': {} hits",
            request.collection,
            request.vector_name,
            hits.len()
        );
        Ok(hits)
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        let collections = self.collections.read().await;
        Ok(collections.contains_key(collection))
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}
