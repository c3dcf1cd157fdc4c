use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderValue, Method, StatusCode, header::ALLOW};

use crate::{Executor, RequestContext};

use super::Transport;

/// Answers CORS preflight style `OPTIONS` requests and refuses `HEAD`.
#[derive(Debug, Clone)]
pub struct Options {
    allowed_methods: HeaderValue,
}

impl Options {
    pub fn new(allowed_methods: &'static str) -> Self {
        Options {
            allowed_methods: HeaderValue::from_static(allowed_methods),
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::new("OPTIONS, GET, POST")
    }
}

#[async_trait::async_trait]
impl Transport for Options {
    fn name(&self) -> &str {
        "OPTIONS"
    }

    fn supports(&self, request: &http::Request<Bytes>) -> bool {
        request.method() == Method::OPTIONS || request.method() == Method::HEAD
    }

    async fn handle(
        &self,
        _: Arc<RequestContext>,
        request: http::Request<Bytes>,
        _: &Executor<'_>,
    ) -> http::Response<Bytes> {
        let mut response = http::Response::new(Bytes::new());

        if request.method() == Method::OPTIONS {
            response.headers_mut().insert(ALLOW, self.allowed_methods.clone());
        } else {
            *response.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
        }

        response
    }
}
