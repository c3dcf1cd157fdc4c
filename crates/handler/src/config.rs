//! Configuration of the default server built by [`crate::Server::from_config`].

#[derive(Debug, Default, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub operation_caching: OperationCachingConfig,
    pub persisted_queries: PersistedQueriesConfig,
    pub introspection: IntrospectionConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OperationCachingConfig {
    /// If parsed and validated documents should be cached.
    pub enabled: bool,
    /// The maximum number of documents that can be kept in the cache.
    /// 1000 by default.
    pub limit: usize,
}

impl Default for OperationCachingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PersistedQueriesConfig {
    /// If automatic persisted queries are accepted.
    pub enabled: bool,
    /// The maximum number of persisted queries kept in memory.
    /// 100 by default.
    pub limit: usize,
}

impl Default for PersistedQueriesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntrospectionConfig {
    pub enabled: bool,
}

impl Default for IntrospectionConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
