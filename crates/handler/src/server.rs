use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use async_graphql_parser::types::ExecutableDocument;
use bytes::Bytes;
use error::{ErrorResponse, GraphqlError, GraphqlResult};
use futures_util::future::{BoxFuture, FutureExt as _};
use runtime::query_cache::QueryCache;
use runtime_local::InMemoryQueryCache;
use tracing::Instrument as _;

use crate::{
    ExecutableSchema, Extension, FieldContext, OperationContext, RequestContext, Response,
    ServerConfig,
    executor::{Executor, InstalledExtension, Pipeline},
    extension::{
        AutomaticPersistedQuery, FieldFunc, Introspection, NextField, NextOperation, NextResponse, OperationFunc,
        ResponseFunc,
    },
    transport::{self, Get, Options, Post, Transport},
};

/// Rewrites every error before it reaches the client.
pub type ErrorPresenter = Arc<dyn Fn(&RequestContext, GraphqlError) -> GraphqlError + Send + Sync>;

/// Turns the payload of a panic caught while handling a request into the error sent back.
pub type RecoverFunc = Arc<dyn Fn(&RequestContext, Box<dyn Any + Send>) -> GraphqlError + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} failed validation: {source}")]
    InvalidExtension {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("cannot use {name} as a handler extension because it does not implement any extension hooks")]
    NoHooks { name: String },
}

/// Logs the panic and hides its content from the client.
pub fn default_recover(_: &RequestContext, payload: Box<dyn Any + Send>) -> GraphqlError {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload");

    tracing::error!("panic while handling a GraphQL request: {message}");

    GraphqlError::internal_server_error()
}

/// A GraphQL HTTP handler.
///
/// Composition (`add_transport`, `use_extension`, ...) takes `&mut self` and happens before the
/// server is shared; [`Server::serve`] takes `&self` and may run concurrently from any number
/// of tasks.
pub struct Server {
    schema: Arc<dyn ExecutableSchema>,
    transports: Vec<Box<dyn Transport>>,
    extensions: Vec<InstalledExtension>,
    pipeline: Arc<Pipeline>,
    error_presenter: ErrorPresenter,
    recover: RecoverFunc,
    query_cache: Arc<dyn QueryCache<Arc<ExecutableDocument>>>,
}

impl Server {
    /// A bare server: no transport, no extension and no query cache.
    pub fn new(schema: impl ExecutableSchema) -> Self {
        let schema: Arc<dyn ExecutableSchema> = Arc::new(schema);

        Server {
            pipeline: Arc::new(Pipeline::compile(schema.clone(), &[])),
            schema,
            transports: Vec::new(),
            extensions: Vec::new(),
            error_presenter: Arc::new(|_: &RequestContext, error: GraphqlError| error),
            recover: Arc::new(default_recover),
            query_cache: Arc::new(runtime::query_cache::NoCache),
        }
    }

    /// The server as most deployments want it: `OPTIONS`, `GET` and `POST` transports, a
    /// bounded document cache, introspection and automatic persisted queries.
    pub fn with_defaults(schema: impl ExecutableSchema) -> Result<Self, ConfigError> {
        Self::from_config(schema, &ServerConfig::default())
    }

    /// Built-in extensions go through [`Server::use_extension`] like any other.
    pub fn from_config(schema: impl ExecutableSchema, config: &ServerConfig) -> Result<Self, ConfigError> {
        let mut server = Server::new(schema);

        server.add_transport(Options::default());
        server.add_transport(Get);
        server.add_transport(Post);

        if config.operation_caching.enabled {
            server.set_query_cache(InMemoryQueryCache::new(config.operation_caching.limit));
        }

        if config.introspection.enabled {
            server.use_extension(Introspection)?;
        }

        if config.persisted_queries.enabled {
            let apq = AutomaticPersistedQuery::new(InMemoryQueryCache::new(config.persisted_queries.limit));
            server.use_extension(apq)?;
        }

        Ok(server)
    }

    /// Transports are tried in the order they were added.
    pub fn add_transport(&mut self, transport: impl Transport + 'static) {
        self.transports.push(Box::new(transport));
    }

    /// Validates and installs an extension. Nothing changes if it is rejected.
    pub fn use_extension(&mut self, extension: impl Extension) -> Result<(), ConfigError> {
        if let Err(err) = extension.validate(self.schema.as_ref()) {
            tracing::warn!("rejected extension {}: {err}", extension.name());
            return Err(ConfigError::InvalidExtension {
                name: extension.name().to_string(),
                source: err.into(),
            });
        }

        let hooks = extension.hooks();
        if hooks.is_empty() {
            tracing::warn!("rejected extension {}: no hooks", extension.name());
            return Err(ConfigError::NoHooks {
                name: extension.name().to_string(),
            });
        }

        tracing::debug!("installing extension {} with hooks {hooks:?}", extension.name());

        self.extensions.push(InstalledExtension {
            extension: Arc::new(extension),
            hooks,
        });
        self.pipeline = Arc::new(Pipeline::compile(self.schema.clone(), &self.extensions));

        Ok(())
    }

    pub fn around_operations<F>(&mut self, f: F) -> Result<(), ConfigError>
    where
        F: for<'a> Fn(&'a OperationContext, NextOperation<'a>) -> BoxFuture<'a, Response> + Send + Sync + 'static,
    {
        self.use_extension(OperationFunc::new(f))
    }

    pub fn around_responses<F>(&mut self, f: F) -> Result<(), ConfigError>
    where
        F: for<'a> Fn(&'a RequestContext, NextResponse<'a>) -> BoxFuture<'a, Response> + Send + Sync + 'static,
    {
        self.use_extension(ResponseFunc::new(f))
    }

    pub fn around_fields<F>(&mut self, f: F) -> Result<(), ConfigError>
    where
        F: for<'a> Fn(&'a FieldContext<'a>, NextField<'a>) -> BoxFuture<'a, GraphqlResult<serde_json::Value>>
            + Send
            + Sync
            + 'static,
    {
        self.use_extension(FieldFunc::new(f))
    }

    pub fn set_error_presenter<F>(&mut self, presenter: F)
    where
        F: Fn(&RequestContext, GraphqlError) -> GraphqlError + Send + Sync + 'static,
    {
        self.error_presenter = Arc::new(presenter);
    }

    pub fn set_recover_func<F>(&mut self, recover: F)
    where
        F: Fn(&RequestContext, Box<dyn Any + Send>) -> GraphqlError + Send + Sync + 'static,
    {
        self.recover = Arc::new(recover);
    }

    pub fn set_query_cache(&mut self, cache: impl QueryCache<Arc<ExecutableDocument>> + 'static) {
        self.query_cache = Arc::new(cache);
    }

    /// Installed extensions, in registration order.
    pub fn extensions(&self) -> impl Iterator<Item = &dyn Extension> + '_ {
        self.extensions.iter().map(|installed| installed.extension.as_ref())
    }

    #[cfg(test)]
    pub(crate) fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Handles one HTTP request. Any panic raised while a transport or the pipeline handles the
    /// request is turned into a `500` error envelope. The panic is resumed only if that envelope
    /// cannot be serialized.
    pub async fn serve(&self, request: http::Request<Bytes>) -> http::Response<Bytes> {
        let ctx = Arc::new(RequestContext::new(&request));
        let span = tracing::info_span!(
            "graphql",
            http.method = %request.method(),
            http.path = %request.uri().path(),
        );

        let result = AssertUnwindSafe(self.dispatch(ctx.clone(), request))
            .catch_unwind()
            .instrument(span)
            .await;

        match result {
            Ok(response) => response,
            Err(payload) => {
                let error = (self.recover)(&ctx, payload);
                let error = (self.error_presenter)(&ctx, error);

                match ErrorResponse::new(http::StatusCode::INTERNAL_SERVER_ERROR)
                    .with_error(error)
                    .try_into_http()
                {
                    Ok(response) => response,
                    // A `GraphqlError` envelope always serializes, this keeps the panic if it ever does not.
                    Err(err) => std::panic::resume_unwind(Box::new(err)),
                }
            }
        }
    }

    async fn dispatch(&self, ctx: Arc<RequestContext>, request: http::Request<Bytes>) -> http::Response<Bytes> {
        let Some(transport) = self.transports.iter().find(|transport| transport.supports(&request)) else {
            tracing::debug!("no transport supports the request");
            return transport::error_response(ErrorResponse::transport_not_supported());
        };

        tracing::debug!("handling request with the {} transport", transport.name());

        let executor = Executor::new(&self.pipeline, self.query_cache.as_ref(), &self.error_presenter);
        transport.handle(ctx, request, &executor).await
    }
}
