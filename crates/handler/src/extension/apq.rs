use std::sync::Arc;

use error::{ErrorCode, GraphqlError, GraphqlResult};
use futures_util::future::{BoxFuture, FutureExt as _};
use runtime::query_cache::QueryCache;
use sha2::{Digest, Sha256};

use crate::{RawParams, RequestContext};

use super::{Extension, ExtensionHooks};

const PERSISTED_QUERY_KEY: &str = "persistedQuery";

/// Automatic persisted queries: clients may send only the sha256 of a query they sent before.
///
/// A request carrying both the query and its hash registers the query. A request carrying only
/// the hash is completed from the cache, or fails with `PersistedQueryNotFound` so that the
/// client retries with the full query.
#[derive(Clone)]
pub struct AutomaticPersistedQuery {
    cache: Arc<dyn QueryCache<String>>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedQueryExtension {
    version: u32,
    sha256_hash: String,
}

impl AutomaticPersistedQuery {
    pub fn new(cache: impl QueryCache<String> + 'static) -> Self {
        AutomaticPersistedQuery { cache: Arc::new(cache) }
    }

    async fn apply(&self, params: &mut RawParams) -> GraphqlResult<()> {
        let Some(extension) = params.extensions.get(PERSISTED_QUERY_KEY) else {
            return Ok(());
        };

        let PersistedQueryExtension { version, sha256_hash } =
            serde_json::from_value(extension.clone()).map_err(|err| {
                tracing::debug!("invalid persisted query extension: {err}");
                GraphqlError::new("invalid APQ extension data", ErrorCode::PersistedQueryError)
            })?;

        if version != 1 {
            return Err(GraphqlError::new(
                "unsupported APQ version",
                ErrorCode::PersistedQueryError,
            ));
        }

        // Hex digests are case insensitive, entries are keyed by the lowercase form.
        let sha256_hash = sha256_hash.to_ascii_lowercase();

        if params.query.is_empty() {
            return match self.cache.get(&sha256_hash).await {
                Some(query) => {
                    params.query = query;
                    Ok(())
                }
                None => Err(GraphqlError::persisted_query_not_found()),
            };
        }

        let computed = hex::encode(Sha256::digest(params.query.as_bytes()));
        if computed != sha256_hash {
            return Err(GraphqlError::new(
                "provided APQ hash does not match query",
                ErrorCode::PersistedQueryError,
            ));
        }

        self.cache.put(computed, params.query.clone()).await;

        Ok(())
    }
}

impl Extension for AutomaticPersistedQuery {
    fn name(&self) -> &str {
        "AutomaticPersistedQuery"
    }

    fn hooks(&self) -> ExtensionHooks {
        ExtensionHooks::OPERATION_PARAMETERS
    }

    fn mutate_operation_parameters<'a>(
        &'a self,
        _: &'a RequestContext,
        params: &'a mut RawParams,
    ) -> BoxFuture<'a, GraphqlResult<()>> {
        self.apply(params).boxed()
    }
}

#[cfg(test)]
mod tests {
    use runtime_local::InMemoryQueryCache;
    use serde_json::json;

    use super::*;

    const QUERY: &str = "{ hello }";

    fn params(query: &str, hash: &str) -> RawParams {
        serde_json::from_value(json!({
            "query": query,
            "extensions": {"persistedQuery": {"version": 1, "sha256Hash": hash}}
        }))
        .unwrap()
    }

    fn hash() -> String {
        hex::encode(Sha256::digest(QUERY.as_bytes()))
    }

    #[tokio::test]
    async fn miss_then_register_then_hit() {
        let apq = AutomaticPersistedQuery::new(InMemoryQueryCache::new(10));

        let err = apq.apply(&mut params("", &hash())).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PersistedQueryNotFound);
        assert_eq!(err.message, "PersistedQueryNotFound");

        apq.apply(&mut params(QUERY, &hash())).await.unwrap();

        let mut lookup = params("", &hash());
        apq.apply(&mut lookup).await.unwrap();
        assert_eq!(lookup.query, QUERY);
    }

    #[tokio::test]
    async fn uppercase_hash_registers_and_hits() {
        let apq = AutomaticPersistedQuery::new(InMemoryQueryCache::new(10));
        let upper = hash().to_ascii_uppercase();

        apq.apply(&mut params(QUERY, &upper)).await.unwrap();

        let mut lookup = params("", &upper);
        apq.apply(&mut lookup).await.unwrap();
        assert_eq!(lookup.query, QUERY);

        let mut lookup = params("", &hash());
        apq.apply(&mut lookup).await.unwrap();
        assert_eq!(lookup.query, QUERY);
    }

    #[tokio::test]
    async fn mismatched_hash_is_rejected() {
        let apq = AutomaticPersistedQuery::new(InMemoryQueryCache::new(10));

        let err = apq.apply(&mut params(QUERY, "deadbeef")).await.unwrap_err();
        assert_eq!(err.message, "provided APQ hash does not match query");
        assert_eq!(err.code, ErrorCode::PersistedQueryError);
    }

    #[tokio::test]
    async fn unsupported_version() {
        let apq = AutomaticPersistedQuery::new(InMemoryQueryCache::new(10));
        let mut params: RawParams = serde_json::from_value(json!({
            "query": QUERY,
            "extensions": {"persistedQuery": {"version": 2, "sha256Hash": hash()}}
        }))
        .unwrap();

        let err = apq.apply(&mut params).await.unwrap_err();
        assert_eq!(err.message, "unsupported APQ version");
    }

    #[tokio::test]
    async fn malformed_extension() {
        let apq = AutomaticPersistedQuery::new(InMemoryQueryCache::new(10));
        let mut params: RawParams = serde_json::from_value(json!({
            "query": QUERY,
            "extensions": {"persistedQuery": "nope"}
        }))
        .unwrap();

        let err = apq.apply(&mut params).await.unwrap_err();
        assert_eq!(err.message, "invalid APQ extension data");
    }

    #[tokio::test]
    async fn requests_without_the_extension_are_untouched() {
        let apq = AutomaticPersistedQuery::new(InMemoryQueryCache::new(10));
        let mut params: RawParams = serde_json::from_value(json!({"query": QUERY})).unwrap();

        apq.apply(&mut params).await.unwrap();
        assert_eq!(params.query, QUERY);
    }
}
