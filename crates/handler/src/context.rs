use std::time::Instant;

use tokio_util::sync::CancellationToken;

/// Timing state attached to every request before a transport is selected, so that every later
/// stage and extension measures against the same origin.
#[derive(Debug, Clone, Copy)]
pub struct OperationTrace {
    start: Instant,
}

impl OperationTrace {
    pub fn start() -> Self {
        OperationTrace { start: Instant::now() }
    }

    pub fn start_time(&self) -> Instant {
        self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceTiming {
    pub start: Instant,
    pub end: Instant,
}

impl TraceTiming {
    pub fn starting_now() -> Self {
        let now = Instant::now();
        TraceTiming { start: now, end: now }
    }

    pub fn finish(mut self) -> Self {
        self.end = Instant::now();
        self
    }
}

/// Request-scoped state shared by every layer handling one request.
///
/// The cancellation token is the one the caller put into the request extensions, if any. It is
/// shared, never replaced, so cancelling it is observed by the transport, every extension and
/// the schema alike.
#[derive(Debug)]
pub struct RequestContext {
    trace: OperationTrace,
    headers: http::HeaderMap,
    extensions: http::Extensions,
    cancellation: CancellationToken,
}

impl RequestContext {
    pub fn new<B>(request: &http::Request<B>) -> Self {
        let cancellation = request
            .extensions()
            .get::<CancellationToken>()
            .cloned()
            .unwrap_or_default();

        RequestContext {
            trace: OperationTrace::start(),
            headers: request.headers().clone(),
            extensions: request.extensions().clone(),
            cancellation,
        }
    }

    pub fn trace(&self) -> &OperationTrace {
        &self.trace
    }

    pub fn headers(&self) -> &http::HeaderMap {
        &self.headers
    }

    /// Values attached to the inbound HTTP request by the caller.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
