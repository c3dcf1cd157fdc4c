use std::sync::Arc;

use async_graphql_parser::types::OperationType;
use bytes::Bytes;
use error::{ErrorCode, ErrorResponse, GraphqlError};
use http::{Method, StatusCode, header::UPGRADE};

use crate::{Executor, RawParams, RequestContext, TraceTiming};

use super::{Transport, bad_request, error_response, execute, request_errors};

/// Operations sent as URL parameters: `query`, `operationName`, and JSON-encoded `variables`
/// and `extensions`. Only queries are allowed.
#[derive(Debug, Default, Clone, Copy)]
pub struct Get;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryString {
    #[serde(default)]
    query: String,
    operation_name: Option<String>,
    variables: Option<String>,
    extensions: Option<String>,
}

#[async_trait::async_trait]
impl Transport for Get {
    fn name(&self) -> &str {
        "GET"
    }

    fn supports(&self, request: &http::Request<Bytes>) -> bool {
        request.method() == Method::GET && !request.headers().contains_key(UPGRADE)
    }

    async fn handle(
        &self,
        ctx: Arc<RequestContext>,
        request: http::Request<Bytes>,
        executor: &Executor<'_>,
    ) -> http::Response<Bytes> {
        let read_time = TraceTiming::starting_now();

        let query_string = match serde_urlencoded::from_str::<QueryString>(request.uri().query().unwrap_or_default()) {
            Ok(query_string) => query_string,
            Err(err) => return bad_request(format!("query string could not be decoded: {err}")),
        };

        let mut params = RawParams {
            query: query_string.query,
            operation_name: query_string.operation_name,
            headers: request.headers().clone(),
            ..Default::default()
        };

        if let Some(variables) = query_string.variables.filter(|v| !v.is_empty()) {
            match serde_json::from_str(&variables) {
                Ok(variables) => params.variables = variables,
                Err(_) => return bad_request("variables could not be decoded"),
            }
        }

        if let Some(extensions) = query_string.extensions.filter(|e| !e.is_empty()) {
            match serde_json::from_str(&extensions) {
                Ok(extensions) => params.extensions = extensions,
                Err(_) => return bad_request("extensions could not be decoded"),
            }
        }

        params.read_time = Some(read_time.finish());

        let operation = match executor.create_operation_context(&ctx, params).await {
            Ok(operation) => operation,
            Err(errors) => return request_errors(&ctx, executor, errors).await,
        };

        if operation.operation_type() == OperationType::Mutation {
            let error = GraphqlError::new("GET requests only allow query operations", ErrorCode::BadRequest);
            return error_response(
                ErrorResponse::new(StatusCode::NOT_ACCEPTABLE).with_errors(executor.present_errors(&ctx, vec![error])),
            );
        }

        execute(executor, &operation).await
    }
}
