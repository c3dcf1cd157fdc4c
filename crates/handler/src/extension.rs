mod apq;
mod functional;
mod introspection;

use std::sync::Arc;

pub use apq::AutomaticPersistedQuery;
pub use functional::{FieldFunc, OperationFunc, ResponseFunc};
pub use introspection::Introspection;

use error::{GraphqlError, GraphqlResult};
use futures_util::future::{BoxFuture, FutureExt as _};

use crate::{
    ExecutableSchema, FieldContext, OperationContext, RawParams, RequestContext, Resolver, Response,
    executor::Pipeline,
};

bitflags::bitflags! {
    /// The interception points an extension takes part in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExtensionHooks: u8 {
        /// Rewrites the raw request parameters before parsing.
        const OPERATION_PARAMETERS = 1;
        /// Mutates the operation context once it is built, before any interception.
        const OPERATION_CONTEXT = 1 << 1;
        /// Wraps the whole operation.
        const OPERATION = 1 << 2;
        /// Wraps every field resolution.
        const FIELD = 1 << 3;
        /// Wraps the production of the final response.
        const RESPONSE = 1 << 4;
    }
}

/// Cross-cutting behavior attached to a [`crate::Server`].
///
/// An extension declares through [`Extension::hooks`] which of the hook methods it implements.
/// The declaration is read once when the extension is installed and only the declared hooks are
/// ever called. A single instance is shared by all in-flight requests.
pub trait Extension: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn hooks(&self) -> ExtensionHooks;

    /// Checked once when the extension is installed.
    fn validate(&self, schema: &dyn ExecutableSchema) -> anyhow::Result<()> {
        let _ = schema;
        Ok(())
    }

    fn mutate_operation_parameters<'a>(
        &'a self,
        ctx: &'a RequestContext,
        params: &'a mut RawParams,
    ) -> BoxFuture<'a, GraphqlResult<()>> {
        let _ = (ctx, params);
        futures_util::future::ready(Ok(())).boxed()
    }

    fn mutate_operation_context(&self, operation: &mut OperationContext) -> GraphqlResult<()> {
        let _ = operation;
        Ok(())
    }

    fn intercept_operation<'a>(
        &'a self,
        operation: &'a OperationContext,
        next: NextOperation<'a>,
    ) -> BoxFuture<'a, Response> {
        next.run(operation)
    }

    fn intercept_field<'a>(
        &'a self,
        field: &'a FieldContext<'a>,
        next: NextField<'a>,
    ) -> BoxFuture<'a, GraphqlResult<serde_json::Value>> {
        next.run(field)
    }

    fn intercept_response<'a>(&'a self, ctx: &'a RequestContext, next: NextResponse<'a>) -> BoxFuture<'a, Response> {
        let _ = ctx;
        next.run()
    }
}

/// The rest of the operation chain.
pub struct NextOperation<'a> {
    chain: &'a [Arc<dyn Extension>],
    pipeline: &'a Pipeline,
}

impl<'a> NextOperation<'a> {
    pub(crate) fn new(pipeline: &'a Pipeline) -> Self {
        NextOperation {
            chain: &pipeline.operation_interceptors,
            pipeline,
        }
    }

    pub fn run(self, operation: &'a OperationContext) -> BoxFuture<'a, Response> {
        match self.chain.split_first() {
            Some((first, rest)) => first.intercept_operation(
                operation,
                NextOperation {
                    chain: rest,
                    pipeline: self.pipeline,
                },
            ),
            None => NextResponse::execute(self.pipeline, operation).run(),
        }
    }
}

enum ResponseSource<'a> {
    Execute(&'a OperationContext),
    Errors(Vec<GraphqlError>),
}

/// The rest of the response chain.
pub struct NextResponse<'a> {
    chain: &'a [Arc<dyn Extension>],
    pipeline: &'a Pipeline,
    ctx: &'a RequestContext,
    source: ResponseSource<'a>,
}

impl<'a> NextResponse<'a> {
    pub(crate) fn execute(pipeline: &'a Pipeline, operation: &'a OperationContext) -> Self {
        NextResponse {
            chain: &pipeline.response_interceptors,
            pipeline,
            ctx: operation.request(),
            source: ResponseSource::Execute(operation),
        }
    }

    pub(crate) fn errors(pipeline: &'a Pipeline, ctx: &'a RequestContext, errors: Vec<GraphqlError>) -> Self {
        NextResponse {
            chain: &pipeline.response_interceptors,
            pipeline,
            ctx,
            source: ResponseSource::Errors(errors),
        }
    }

    /// The operation being answered, absent when the request failed before an operation
    /// could be built.
    pub fn operation(&self) -> Option<&'a OperationContext> {
        match self.source {
            ResponseSource::Execute(operation) => Some(operation),
            ResponseSource::Errors(_) => None,
        }
    }

    pub fn run(self) -> BoxFuture<'a, Response> {
        let NextResponse {
            chain,
            pipeline,
            ctx,
            source,
        } = self;

        match chain.split_first() {
            Some((first, rest)) => first.intercept_response(
                ctx,
                NextResponse {
                    chain: rest,
                    pipeline,
                    ctx,
                    source,
                },
            ),
            None => match source {
                ResponseSource::Execute(operation) => pipeline.execute(operation),
                ResponseSource::Errors(errors) => futures_util::future::ready(Response::from_errors(errors)).boxed(),
            },
        }
    }
}

/// The rest of the field chain.
pub struct NextField<'a> {
    chain: &'a [Arc<dyn Extension>],
    resolver: &'a dyn Resolver,
}

impl<'a> NextField<'a> {
    pub(crate) fn new(chain: &'a [Arc<dyn Extension>], resolver: &'a dyn Resolver) -> Self {
        NextField { chain, resolver }
    }

    pub fn run(self, field: &'a FieldContext<'a>) -> BoxFuture<'a, GraphqlResult<serde_json::Value>> {
        match self.chain.split_first() {
            Some((first, rest)) => first.intercept_field(
                field,
                NextField {
                    chain: rest,
                    resolver: self.resolver,
                },
            ),
            None => self.resolver.resolve(field),
        }
    }
}
