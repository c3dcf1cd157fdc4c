use runtime::query_cache::QueryCache;

/// Bounded in-memory cache, entries beyond `limit` are evicted by mini-moka's admission policy.
pub struct InMemoryQueryCache<V> {
    inner: mini_moka::sync::Cache<String, V>,
}

impl<V> InMemoryQueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(limit: usize) -> Self {
        tracing::debug!("Creating in-memory query cache with a limit of {limit} entries");

        InMemoryQueryCache {
            inner: mini_moka::sync::Cache::builder().max_capacity(limit as u64).build(),
        }
    }
}

#[async_trait::async_trait]
impl<V> QueryCache<V> for InMemoryQueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        self.inner.get(&key.to_string())
    }

    async fn put(&self, key: String, value: V) {
        self.inner.insert(key, value);
    }

    async fn delete(&self, key: &str) {
        self.inner.invalidate(&key.to_string());
    }
}
