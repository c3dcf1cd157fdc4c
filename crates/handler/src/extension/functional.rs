//! Extensions built from a single closure, for callers who only need one hook.

use std::sync::Arc;

use error::GraphqlResult;
use futures_util::future::BoxFuture;

use crate::{ExecutableSchema, FieldContext, OperationContext, RequestContext, Response};

use super::{Extension, ExtensionHooks, NextField, NextOperation, NextResponse};

type OperationFn = dyn for<'a> Fn(&'a OperationContext, NextOperation<'a>) -> BoxFuture<'a, Response> + Send + Sync;
type ResponseFn = dyn for<'a> Fn(&'a RequestContext, NextResponse<'a>) -> BoxFuture<'a, Response> + Send + Sync;
type FieldFn = dyn for<'a> Fn(&'a FieldContext<'a>, NextField<'a>) -> BoxFuture<'a, GraphqlResult<serde_json::Value>>
    + Send
    + Sync;

/// Operation interceptor from a closure. The default value holds no closure and fails
/// validation when installed.
#[derive(Clone, Default)]
pub struct OperationFunc(Option<Arc<OperationFn>>);

impl OperationFunc {
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a OperationContext, NextOperation<'a>) -> BoxFuture<'a, Response> + Send + Sync + 'static,
    {
        OperationFunc(Some(Arc::new(f)))
    }
}

impl Extension for OperationFunc {
    fn name(&self) -> &str {
        "InlineOperationFunc"
    }

    fn hooks(&self) -> ExtensionHooks {
        ExtensionHooks::OPERATION
    }

    fn validate(&self, _: &dyn ExecutableSchema) -> anyhow::Result<()> {
        if self.0.is_none() {
            anyhow::bail!("OperationFunc can not be nil");
        }
        Ok(())
    }

    fn intercept_operation<'a>(
        &'a self,
        operation: &'a OperationContext,
        next: NextOperation<'a>,
    ) -> BoxFuture<'a, Response> {
        match &self.0 {
            Some(f) => f(operation, next),
            None => next.run(operation),
        }
    }
}

/// Response interceptor from a closure.
#[derive(Clone, Default)]
pub struct ResponseFunc(Option<Arc<ResponseFn>>);

impl ResponseFunc {
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a RequestContext, NextResponse<'a>) -> BoxFuture<'a, Response> + Send + Sync + 'static,
    {
        ResponseFunc(Some(Arc::new(f)))
    }
}

impl Extension for ResponseFunc {
    fn name(&self) -> &str {
        "InlineResponseFunc"
    }

    fn hooks(&self) -> ExtensionHooks {
        ExtensionHooks::RESPONSE
    }

    fn validate(&self, _: &dyn ExecutableSchema) -> anyhow::Result<()> {
        if self.0.is_none() {
            anyhow::bail!("ResponseFunc can not be nil");
        }
        Ok(())
    }

    fn intercept_response<'a>(&'a self, ctx: &'a RequestContext, next: NextResponse<'a>) -> BoxFuture<'a, Response> {
        match &self.0 {
            Some(f) => f(ctx, next),
            None => next.run(),
        }
    }
}

/// Field interceptor from a closure.
#[derive(Clone, Default)]
pub struct FieldFunc(Option<Arc<FieldFn>>);

impl FieldFunc {
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a FieldContext<'a>, NextField<'a>) -> BoxFuture<'a, GraphqlResult<serde_json::Value>>
            + Send
            + Sync
            + 'static,
    {
        FieldFunc(Some(Arc::new(f)))
    }
}

impl Extension for FieldFunc {
    fn name(&self) -> &str {
        "InlineFieldFunc"
    }

    fn hooks(&self) -> ExtensionHooks {
        ExtensionHooks::FIELD
    }

    fn validate(&self, _: &dyn ExecutableSchema) -> anyhow::Result<()> {
        if self.0.is_none() {
            anyhow::bail!("FieldFunc can not be nil");
        }
        Ok(())
    }

    fn intercept_field<'a>(
        &'a self,
        field: &'a FieldContext<'a>,
        next: NextField<'a>,
    ) -> BoxFuture<'a, GraphqlResult<serde_json::Value>> {
        match &self.0 {
            Some(f) => f(field, next),
            None => next.run(field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(OperationFunc::default().name(), "InlineOperationFunc");
        assert_eq!(ResponseFunc::default().name(), "InlineResponseFunc");
        assert_eq!(FieldFunc::default().name(), "InlineFieldFunc");
    }

    #[test]
    fn each_adapter_declares_a_single_hook() {
        assert_eq!(OperationFunc::default().hooks(), ExtensionHooks::OPERATION);
        assert_eq!(ResponseFunc::default().hooks(), ExtensionHooks::RESPONSE);
        assert_eq!(FieldFunc::default().hooks(), ExtensionHooks::FIELD);
    }
}
