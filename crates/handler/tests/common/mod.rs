#![allow(dead_code, clippy::panic)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_graphql_parser::types::{DocumentOperations, ExecutableDocument, Selection};
use bytes::Bytes;
use futures_util::future::{BoxFuture, FutureExt as _};
use handler::{
    ErrorCode, ExecutableSchema, FieldChain, FieldContext, GraphqlError, GraphqlResult, Location, OperationContext,
    Resolver, Response, Server,
};
use runtime::query_cache::QueryCache;
use serde_json::{Value, json};

pub const FIELDS: &[&str] = &["hello", "panic", "fail", "slow", "introspectionEnabled", "viewer", "echo", "greet"];

/// Value attached to an operation by a context mutator, read back by the `viewer` field.
#[derive(Debug, Clone)]
pub struct Viewer(pub String);

/// A flat `Query` type whose fields exercise every path of the handler.
pub struct TestSchema;

impl ExecutableSchema for TestSchema {
    fn validate(&self, document: &ExecutableDocument) -> Vec<GraphqlError> {
        let operations: Vec<_> = match &document.operations {
            DocumentOperations::Single(operation) => vec![operation],
            DocumentOperations::Multiple(operations) => operations.values().collect(),
        };

        operations
            .into_iter()
            .flat_map(|operation| operation.node.selection_set.node.items.iter())
            .filter_map(|selection| match &selection.node {
                Selection::Field(field) => Some(field),
                _ => None,
            })
            .filter(|field| !FIELDS.contains(&field.node.name.node.as_str()))
            .map(|field| {
                GraphqlError::new(
                    format!("Cannot query field \"{}\" on type \"Query\".", field.node.name.node),
                    ErrorCode::OperationValidationError,
                )
                .with_location(Location::from(field.pos))
            })
            .collect()
    }

    fn execute<'a>(&'a self, operation: &'a OperationContext, fields: FieldChain<'a>) -> BoxFuture<'a, Response> {
        async move {
            let mut data = serde_json::Map::new();
            let mut errors = Vec::new();

            for selection in &operation.operation.node.selection_set.node.items {
                let Selection::Field(field) = &selection.node else {
                    continue;
                };

                let ctx = FieldContext::new(operation, "Query", field);
                let value = match fields.resolve(&ctx, self).await {
                    Ok(value) => value,
                    Err(error) => {
                        errors.push(ctx.error(error));
                        Value::Null
                    }
                };
                data.insert(ctx.response_key().to_string(), value);
            }

            Response {
                errors,
                data: Some(Value::Object(data)),
                ..Default::default()
            }
        }
        .boxed()
    }
}

impl Resolver for TestSchema {
    fn resolve<'a>(&'a self, field: &'a FieldContext<'a>) -> BoxFuture<'a, GraphqlResult<Value>> {
        async move {
            match field.name() {
                "hello" => Ok(json!("world")),
                "panic" => panic!("boom"),
                "fail" => Err(GraphqlError::new("failed on purpose", ErrorCode::InternalServerError)),
                "slow" => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(json!("done"))
                }
                "introspectionEnabled" => Ok(json!(!field.operation.disable_introspection)),
                "viewer" => Ok(field
                    .operation
                    .data::<Viewer>()
                    .map(|viewer| json!(viewer.0))
                    .unwrap_or(Value::Null)),
                "echo" => Ok(Value::Object(field.operation.variables.clone())),
                "greet" => field.arguments().map(|arguments| {
                    let name = arguments.get("name").and_then(Value::as_str).unwrap_or("stranger");
                    json!(format!("hello {name}"))
                }),
                other => Err(GraphqlError::new(
                    format!("unknown field {other}"),
                    ErrorCode::InternalServerError,
                )),
            }
        }
        .boxed()
    }
}

/// Document cache counting how often a document was served from it.
#[derive(Clone)]
pub struct CountingCache {
    inner: Arc<runtime_local::InMemoryQueryCache<Arc<ExecutableDocument>>>,
    pub hits: Arc<AtomicUsize>,
    pub puts: Arc<AtomicUsize>,
}

impl Default for CountingCache {
    fn default() -> Self {
        CountingCache {
            inner: Arc::new(runtime_local::InMemoryQueryCache::new(100)),
            hits: Default::default(),
            puts: Default::default(),
        }
    }
}

#[async_trait::async_trait]
impl QueryCache<Arc<ExecutableDocument>> for CountingCache {
    async fn get(&self, key: &str) -> Option<Arc<ExecutableDocument>> {
        let value = self.inner.get(key).await;
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
        value
    }

    async fn put(&self, key: String, value: Arc<ExecutableDocument>) {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) {
        self.inner.delete(key).await
    }
}

pub fn post(body: Value) -> http::Request<Bytes> {
    http::Request::post("/graphql")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Bytes::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub fn query(query: &str) -> http::Request<Bytes> {
    post(json!({"query": query}))
}

pub fn get(query_string: &str) -> http::Request<Bytes> {
    http::Request::get(format!("/graphql?{query_string}"))
        .body(Bytes::new())
        .unwrap()
}

/// Sends the request and decodes the JSON body.
pub async fn send(server: &Server, request: http::Request<Bytes>) -> (http::StatusCode, Value) {
    let response = server.serve(request).await;
    let status = response.status();
    let body = serde_json::from_slice(response.body()).unwrap();
    (status, body)
}
