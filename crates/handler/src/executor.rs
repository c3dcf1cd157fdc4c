use std::{pin::pin, sync::Arc};

use async_graphql_parser::{
    Positioned,
    types::{DocumentOperations, ExecutableDocument, OperationDefinition},
};
use error::{ErrorCode, GraphqlError, Location};
use futures_util::future::{BoxFuture, Either, FutureExt as _};
use runtime::query_cache::QueryCache;

use crate::{
    ExecutableSchema, Extension, ExtensionHooks, FieldChain, OperationContext, RawParams, RequestContext, Response,
    Stats, TraceTiming,
    extension::{NextOperation, NextResponse},
    server::ErrorPresenter,
};

/// An extension together with the hooks it declared when it was installed.
#[derive(Clone)]
pub(crate) struct InstalledExtension {
    pub(crate) extension: Arc<dyn Extension>,
    pub(crate) hooks: ExtensionHooks,
}

/// Extensions sorted by hook, in registration order. Never mutated once built: installing an
/// extension compiles a new pipeline.
pub(crate) struct Pipeline {
    pub(crate) schema: Arc<dyn ExecutableSchema>,
    pub(crate) parameter_mutators: Vec<Arc<dyn Extension>>,
    pub(crate) context_mutators: Vec<Arc<dyn Extension>>,
    pub(crate) operation_interceptors: Vec<Arc<dyn Extension>>,
    pub(crate) response_interceptors: Vec<Arc<dyn Extension>>,
    pub(crate) field_interceptors: Vec<Arc<dyn Extension>>,
}

impl Pipeline {
    pub(crate) fn compile(schema: Arc<dyn ExecutableSchema>, extensions: &[InstalledExtension]) -> Self {
        let with_hook = |hook: ExtensionHooks| {
            extensions
                .iter()
                .filter(|installed| installed.hooks.contains(hook))
                .map(|installed| installed.extension.clone())
                .collect::<Vec<_>>()
        };

        Pipeline {
            parameter_mutators: with_hook(ExtensionHooks::OPERATION_PARAMETERS),
            context_mutators: with_hook(ExtensionHooks::OPERATION_CONTEXT),
            operation_interceptors: with_hook(ExtensionHooks::OPERATION),
            response_interceptors: with_hook(ExtensionHooks::RESPONSE),
            field_interceptors: with_hook(ExtensionHooks::FIELD),
            schema,
        }
    }

    /// Innermost step of the response chain.
    pub(crate) fn execute<'a>(&'a self, operation: &'a OperationContext) -> BoxFuture<'a, Response> {
        async move {
            let mut response = self
                .schema
                .execute(operation, FieldChain::new(&self.field_interceptors))
                .await;
            response.errors.extend(operation.take_errors());
            response
        }
        .boxed()
    }
}

/// Runs operations through the pipeline. Transports receive one per request.
pub struct Executor<'a> {
    pipeline: &'a Pipeline,
    query_cache: &'a dyn QueryCache<Arc<ExecutableDocument>>,
    error_presenter: &'a ErrorPresenter,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(
        pipeline: &'a Pipeline,
        query_cache: &'a dyn QueryCache<Arc<ExecutableDocument>>,
        error_presenter: &'a ErrorPresenter,
    ) -> Self {
        Executor {
            pipeline,
            query_cache,
            error_presenter,
        }
    }

    /// Parses, validates and mutates everything needed to run an operation. Any error returned
    /// here is meant to be answered through [`Executor::dispatch_error`].
    pub async fn create_operation_context(
        &self,
        ctx: &Arc<RequestContext>,
        mut params: RawParams,
    ) -> Result<OperationContext, Vec<GraphqlError>> {
        let operation_start = ctx.trace().start_time();

        for extension in &self.pipeline.parameter_mutators {
            extension
                .mutate_operation_parameters(ctx, &mut params)
                .await
                .map_err(|error| vec![error])?;
        }

        let mut parsing = TraceTiming::starting_now();
        let mut validation = TraceTiming::starting_now();

        let document = match self.query_cache.get(&params.query).await {
            Some(document) => {
                parsing = parsing.finish();
                validation = validation.finish();
                document
            }
            None => {
                let document = parse_query(&params.query)?;
                parsing = parsing.finish();

                validation = TraceTiming::starting_now();
                let errors = self.pipeline.schema.validate(&document);
                validation = validation.finish();
                if !errors.is_empty() {
                    return Err(errors);
                }

                let document = Arc::new(document);
                self.query_cache.put(params.query.clone(), document.clone()).await;
                document
            }
        };

        let operation = select_operation(&document, params.operation_name.as_deref()).map_err(|error| vec![error])?;

        let stats = Stats {
            operation_start,
            read: params.read_time,
            parsing,
            validation,
        };

        let mut operation = OperationContext::new(ctx.clone(), params, document, operation, stats);

        for extension in &self.pipeline.context_mutators {
            extension
                .mutate_operation_context(&mut operation)
                .map_err(|error| vec![error])?;
        }

        Ok(operation)
    }

    /// Runs a prepared operation through the operation chain, the response chain and finally the
    /// schema.
    pub async fn dispatch_operation(&self, operation: &OperationContext) -> Response {
        let ctx = operation.request();

        let response = if ctx.is_cancelled() {
            Response::from_errors(vec![GraphqlError::request_cancelled()])
        } else {
            let cancelled = pin!(ctx.cancellation().cancelled());
            match futures_util::future::select(NextOperation::new(self.pipeline).run(operation), cancelled).await {
                Either::Left((response, _)) => response,
                Either::Right(_) => {
                    tracing::debug!("request cancelled during execution");
                    Response::from_errors(vec![GraphqlError::request_cancelled()])
                }
            }
        };

        self.present(ctx, response)
    }

    /// Produces the response for a request which failed before an operation could be built.
    /// Response interceptors still run.
    pub async fn dispatch_error(&self, ctx: &RequestContext, errors: Vec<GraphqlError>) -> Response {
        let response = NextResponse::errors(self.pipeline, ctx, errors).run().await;
        self.present(ctx, response)
    }

    /// Presents errors the way they will be sent to the client, without running any
    /// interceptor.
    pub fn present_errors(&self, ctx: &RequestContext, errors: Vec<GraphqlError>) -> Vec<GraphqlError> {
        errors
            .into_iter()
            .map(|error| (self.error_presenter)(ctx, error))
            .collect()
    }

    /// Full pipeline from raw parameters to the final response.
    pub async fn execute(&self, ctx: &Arc<RequestContext>, params: RawParams) -> Response {
        match self.create_operation_context(ctx, params).await {
            Ok(operation) => self.dispatch_operation(&operation).await,
            Err(errors) => self.dispatch_error(ctx, errors).await,
        }
    }

    fn present(&self, ctx: &RequestContext, mut response: Response) -> Response {
        response.errors = self.present_errors(ctx, response.errors);
        response
    }
}

fn parse_query(query: &str) -> Result<ExecutableDocument, Vec<GraphqlError>> {
    if query.trim().is_empty() {
        return Err(vec![GraphqlError::new(
            "no operation provided",
            ErrorCode::OperationParsingError,
        )]);
    }

    async_graphql_parser::parse_query(query).map_err(|err| {
        vec![
            GraphqlError::new(err.to_string(), ErrorCode::OperationParsingError)
                .with_locations(err.positions().map(Location::from)),
        ]
    })
}

fn select_operation(
    document: &ExecutableDocument,
    operation_name: Option<&str>,
) -> Result<Positioned<OperationDefinition>, GraphqlError> {
    let operation_name = operation_name.filter(|name| !name.is_empty());

    match (&document.operations, operation_name) {
        (DocumentOperations::Single(operation), None) => Ok(operation.clone()),
        (DocumentOperations::Single(_), Some(name)) => Err(operation_not_found(name)),
        (DocumentOperations::Multiple(operations), Some(name)) => operations
            .iter()
            .find(|(key, _)| key.as_str() == name)
            .map(|(_, operation)| operation.clone())
            .ok_or_else(|| operation_not_found(name)),
        (DocumentOperations::Multiple(operations), None) => {
            let mut operations = operations.values();
            match (operations.next(), operations.next()) {
                (Some(operation), None) => Ok(operation.clone()),
                _ => Err(GraphqlError::new(
                    "must provide operation name if query contains multiple operations",
                    ErrorCode::OperationValidationError,
                )),
            }
        }
    }
}

fn operation_not_found(name: &str) -> GraphqlError {
    GraphqlError::new(
        format!("operation {name} not found"),
        ErrorCode::OperationValidationError,
    )
}
