/// Key/value store used for persisted query bodies and parsed documents. Eviction is entirely
/// up to the implementation, a miss is never an error.
#[async_trait::async_trait]
pub trait QueryCache<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<V>;
    async fn put(&self, key: String, value: V);
    async fn delete(&self, key: &str);
}

/// Never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

#[async_trait::async_trait]
impl<V> QueryCache<V> for NoCache
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, _: &str) -> Option<V> {
        None
    }

    async fn put(&self, _: String, _: V) {}

    async fn delete(&self, _: &str) {}
}
