use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;
use tabula_utils_cache::{namespaces, ResultCache};
use tabula_vector_index::EmbeddingProvider;

/// Memoizing decorator for an [`EmbeddingProvider`].
///
/// Embeddings of a given text are immutable for a fixed model, so they
/// live in the long-TTL `embedding` namespace. Cache trouble of any kind
/// degrades to computing fresh; correctness never depends on the cache.
pub struct CachingEmbeddingProvider {
    inner: Arc<dyn EmbeddingProvider>,
    cache: Arc<ResultCache>,
}

impl CachingEmbeddingProvider {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, cache: Arc<ResultCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl EmbeddingProvider for CachingEmbeddingProvider {
    async fn embed(&self, text: &str) -> tabula_vector_index::Result<Vec<f32>> {
        let key = match ResultCache::key(namespaces::EMBEDDING, text) {
            Ok(key) => key,
            Err(err) => {
                warn!("embedding cache key failed, computing fresh: {err}");
                return self.inner.embed(text).await;
            }
        };

        if let Some(bytes) = self.cache.get(namespaces::EMBEDDING, &key).await {
            match serde_json::from_slice::<Vec<f32>>(&bytes) {
                Ok(vector) => {
                    debug!("embedding cache hit");
                    return Ok(vector);
                }
                Err(err) => warn!("stale embedding cache entry ignored: {err}"),
            }
        }

        let vector = self.inner.embed(text).await?;

        match serde_json::to_vec(&vector) {
            Ok(bytes) => {
                self.cache
                    .set(
                        namespaces::EMBEDDING,
                        &key,
                        bytes,
                        namespaces::default_ttl(namespaces::EMBEDDING),
                    )
                    .await;
            }
            Err(err) => warn!("embedding cache write skipped: {err}"),
        }

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn embed(&self, text: &str) -> tabula_vector_index::Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![text.len() as f32])
        }
    }

    #[tokio::test]
    async fn test_second_embed_hits_cache() {
        let inner = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let provider =
            CachingEmbeddingProvider::new(inner.clone(), Arc::new(ResultCache::new()));

        let first = provider.embed("late deliveries").await.unwrap();
        let second = provider.embed("late deliveries").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_texts_compute_separately() {
        let inner = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let provider =
            CachingEmbeddingProvider::new(inner.clone(), Arc::new(ResultCache::new()));

        provider.embed("alpha").await.unwrap();
        provider.embed("beta").await.unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
