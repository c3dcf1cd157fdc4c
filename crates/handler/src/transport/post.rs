use std::sync::Arc;

use bytes::Bytes;
use http::{Method, header::CONTENT_TYPE};

use crate::{Executor, RawParams, RequestContext, TraceTiming};

use super::{Transport, bad_request, execute, request_errors};

/// Operations sent as a JSON body.
#[derive(Debug, Default, Clone, Copy)]
pub struct Post;

#[async_trait::async_trait]
impl Transport for Post {
    fn name(&self) -> &str {
        "POST"
    }

    fn supports(&self, request: &http::Request<Bytes>) -> bool {
        if request.method() != Method::POST {
            return false;
        }

        request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<mime::Mime>().ok())
            .is_some_and(|mime| mime.essence_str() == mime::APPLICATION_JSON.essence_str())
    }

    async fn handle(
        &self,
        ctx: Arc<RequestContext>,
        request: http::Request<Bytes>,
        executor: &Executor<'_>,
    ) -> http::Response<Bytes> {
        let read_time = TraceTiming::starting_now();
        let (parts, body) = request.into_parts();

        let mut params: RawParams = match serde_json::from_slice(&body) {
            Ok(params) => params,
            Err(err) => return bad_request(format!("json request body could not be decoded: {err}")),
        };

        params.headers = parts.headers;
        params.read_time = Some(read_time.finish());

        match executor.create_operation_context(&ctx, params).await {
            Ok(operation) => execute(executor, &operation).await,
            Err(errors) => request_errors(&ctx, executor, errors).await,
        }
    }
}
