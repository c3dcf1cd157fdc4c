use std::sync::Arc;

use async_graphql_parser::types::ExecutableDocument;
use error::{GraphqlError, GraphqlResult};
use futures_util::future::BoxFuture;

use crate::{
    Extension, FieldContext, OperationContext, Response,
    extension::NextField,
};

/// The schema and its resolvers, provided by the caller.
pub trait ExecutableSchema: Send + Sync + 'static {
    /// Validates a freshly parsed document. Only documents without errors are executed and
    /// cached.
    fn validate(&self, document: &ExecutableDocument) -> Vec<GraphqlError> {
        let _ = document;
        Vec::new()
    }

    /// Executes the selected operation. Every field resolution must go through `fields` so that
    /// field interceptors observe it.
    fn execute<'a>(&'a self, operation: &'a OperationContext, fields: FieldChain<'a>) -> BoxFuture<'a, Response>;
}

/// Innermost step of field resolution.
pub trait Resolver: Send + Sync {
    fn resolve<'a>(&'a self, field: &'a FieldContext<'a>) -> BoxFuture<'a, GraphqlResult<serde_json::Value>>;
}

/// The compiled chain of field interceptors, handed to the schema for each operation.
#[derive(Clone, Copy)]
pub struct FieldChain<'a> {
    interceptors: &'a [Arc<dyn Extension>],
}

impl<'a> FieldChain<'a> {
    pub(crate) fn new(interceptors: &'a [Arc<dyn Extension>]) -> Self {
        FieldChain { interceptors }
    }

    /// Resolves `field` through every field interceptor, the first registered one running first,
    /// and finally through `resolver`.
    pub fn resolve<'f>(
        &self,
        field: &'f FieldContext<'f>,
        resolver: &'f dyn Resolver,
    ) -> BoxFuture<'f, GraphqlResult<serde_json::Value>>
    where
        'a: 'f,
    {
        NextField::new(self.interceptors, resolver).run(field)
    }
}
