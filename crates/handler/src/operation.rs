use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Instant,
};

use async_graphql_parser::{
    Positioned,
    types::{ExecutableDocument, Field, OperationDefinition, OperationType},
};
use async_graphql_value::ConstValue;
use error::{ErrorCode, ErrorPath, GraphqlError, GraphqlResult};
use serde::Deserialize;

use crate::{RequestContext, TraceTiming};

/// Operation parameters as sent by the client, before parsing.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParams {
    #[serde(default, deserialize_with = "null_as_default")]
    pub query: String,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variables: serde_json::Map<String, serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extensions: serde_json::Map<String, serde_json::Value>,
    #[serde(skip)]
    pub headers: http::HeaderMap,
    #[serde(skip)]
    pub read_time: Option<TraceTiming>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone)]
pub struct Stats {
    pub operation_start: Instant,
    pub read: Option<TraceTiming>,
    pub parsing: TraceTiming,
    pub validation: TraceTiming,
}

/// Everything known about the operation being executed. Built once per request by the
/// executor, then only mutated by context mutators before interception starts.
#[derive(Debug)]
pub struct OperationContext {
    pub raw_query: String,
    pub operation_name: Option<String>,
    pub variables: serde_json::Map<String, serde_json::Value>,
    pub extensions: serde_json::Map<String, serde_json::Value>,
    pub headers: http::HeaderMap,
    pub document: Arc<ExecutableDocument>,
    pub operation: Positioned<OperationDefinition>,
    pub disable_introspection: bool,
    pub stats: Stats,
    request: Arc<RequestContext>,
    data: http::Extensions,
    errors: Mutex<Vec<GraphqlError>>,
}

impl OperationContext {
    pub(crate) fn new(
        request: Arc<RequestContext>,
        params: RawParams,
        document: Arc<ExecutableDocument>,
        operation: Positioned<OperationDefinition>,
        stats: Stats,
    ) -> Self {
        OperationContext {
            raw_query: params.query,
            operation_name: params.operation_name,
            variables: params.variables,
            extensions: params.extensions,
            headers: params.headers,
            document,
            operation,
            disable_introspection: true,
            stats,
            request,
            data: http::Extensions::new(),
            errors: Mutex::new(Vec::new()),
        }
    }

    pub fn request(&self) -> &Arc<RequestContext> {
        &self.request
    }

    pub fn operation_type(&self) -> OperationType {
        self.operation.node.ty
    }

    /// Attaches a value for the rest of the operation. Meant for context mutators.
    pub fn insert_data<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.data.insert(value)
    }

    pub fn data<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.data.get::<T>()
    }

    /// Records an error which will be appended to the response after the schema's own errors.
    pub fn add_error(&self, error: GraphqlError) {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner).push(error);
    }

    pub(crate) fn take_errors(&self) -> Vec<GraphqlError> {
        std::mem::take(&mut *self.errors.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// A single field about to be resolved.
#[derive(Debug, Clone)]
pub struct FieldContext<'a> {
    pub operation: &'a OperationContext,
    pub parent_type: &'a str,
    pub field: &'a Positioned<Field>,
    pub path: ErrorPath,
}

impl<'a> FieldContext<'a> {
    pub fn new(operation: &'a OperationContext, parent_type: &'a str, field: &'a Positioned<Field>) -> Self {
        let mut context = FieldContext {
            operation,
            parent_type,
            field,
            path: ErrorPath::default(),
        };
        context.path = ErrorPath::from(context.response_key());
        context
    }

    #[must_use]
    pub fn with_path(mut self, path: ErrorPath) -> Self {
        self.path = path;
        self
    }

    pub fn name(&self) -> &'a str {
        self.field.node.name.node.as_str()
    }

    pub fn response_key(&self) -> &'a str {
        self.field
            .node
            .alias
            .as_ref()
            .unwrap_or(&self.field.node.name)
            .node
            .as_str()
    }

    /// Arguments with variables substituted. A variable the client did not send takes the
    /// default value of its definition, or `null` without one.
    pub fn arguments(&self) -> GraphqlResult<serde_json::Map<String, serde_json::Value>> {
        let variables = &self.operation.variables;
        let definitions = &self.operation.operation.node.variable_definitions;

        self.field
            .node
            .arguments
            .iter()
            .map(|(name, value)| {
                let value = value
                    .node
                    .clone()
                    .into_const_with(|variable| match variables.get(variable.as_str()) {
                        Some(value) => ConstValue::from_json(value.clone()),
                        None => Ok(definitions
                            .iter()
                            .find(|definition| definition.node.name.node == variable)
                            .and_then(|definition| definition.node.default_value.as_ref())
                            .map(|default| default.node.clone())
                            .unwrap_or(ConstValue::Null)),
                    })
                    .and_then(ConstValue::into_json)
                    .map_err(|err| {
                        GraphqlError::new(
                            format!("argument {} could not be resolved: {err}", name.node),
                            ErrorCode::VariableError,
                        )
                    })?;

                Ok((name.node.to_string(), value))
            })
            .collect()
    }

    pub fn error(&self, error: GraphqlError) -> GraphqlError {
        error.with_location(self.field.pos).with_path(self.path.clone())
    }
}
