//! Wire protocols understood by the server. The first registered transport which supports a
//! request handles it.

mod get;
mod options;
mod post;

use std::sync::Arc;

use bytes::Bytes;
use error::{APPLICATION_JSON, ErrorCode, ErrorResponse, GraphqlError};
use http::{HeaderValue, header::CONTENT_TYPE};

use crate::{Executor, OperationContext, RequestContext, Response};

pub use get::Get;
pub use options::Options;
pub use post::Post;

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap inspection of the request line and headers. Must not consume the body.
    fn supports(&self, request: &http::Request<Bytes>) -> bool;

    async fn handle(
        &self,
        ctx: Arc<RequestContext>,
        request: http::Request<Bytes>,
        executor: &Executor<'_>,
    ) -> http::Response<Bytes>;
}

/// Serializes a GraphQL response.
///
/// # Panics
///
/// If the response cannot be serialized. The panic is caught by the server and answered
/// with a `500`.
pub fn json_response(status: http::StatusCode, response: &Response) -> http::Response<Bytes> {
    let bytes = match serde_json::to_vec(response) {
        Ok(bytes) => bytes,
        Err(err) => std::panic::panic_any(err),
    };

    let mut response = http::Response::new(Bytes::from(bytes));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    response
}

/// Writes an error envelope produced without going through the pipeline.
///
/// # Panics
///
/// If the envelope cannot be serialized.
pub fn error_response(error: ErrorResponse) -> http::Response<Bytes> {
    match error.try_into_http() {
        Ok(response) => response,
        Err(err) => std::panic::panic_any(err),
    }
}

pub(crate) fn bad_request(message: impl Into<std::borrow::Cow<'static, str>>) -> http::Response<Bytes> {
    error_response(ErrorResponse::new(http::StatusCode::BAD_REQUEST).with_error(GraphqlError::new(message, ErrorCode::BadRequest)))
}

/// Answers errors raised before an operation context could be built. The status is derived
/// from the errors as they were raised, the body goes through the response interceptors and
/// the error presenter.
pub(crate) async fn request_errors(
    ctx: &RequestContext,
    executor: &Executor<'_>,
    errors: Vec<GraphqlError>,
) -> http::Response<Bytes> {
    let status = ErrorResponse::from_errors(errors.clone()).status;
    let response = executor.dispatch_error(ctx, errors).await;
    json_response(status, &response)
}

pub(crate) async fn execute(executor: &Executor<'_>, operation: &OperationContext) -> http::Response<Bytes> {
    let response = executor.dispatch_operation(operation).await;
    json_response(http::StatusCode::OK, &response)
}
