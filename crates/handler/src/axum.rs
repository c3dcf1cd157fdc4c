//! Mounts a [`Server`] into an axum application.

use std::sync::Arc;

use ::axum::{
    Router,
    body::Body,
    extract::{Request, State},
    response::Response,
    routing::any,
};
use error::{ErrorCode, ErrorResponse, GraphqlError};

use crate::{Server, transport};

/// Largest request body accepted by [`graphql`].
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Axum handler forwarding every request to the server, whatever its method. Transport
/// negotiation decides what is supported.
pub async fn graphql(State(server): State<Arc<Server>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let body = match ::axum::body::to_bytes(body, DEFAULT_BODY_LIMIT).await {
        Ok(body) => body,
        Err(err) => {
            tracing::debug!("could not read request body: {err}");
            let error = GraphqlError::new("request body could not be read", ErrorCode::BadRequest);
            return transport::error_response(ErrorResponse::new(http::StatusCode::BAD_REQUEST).with_error(error))
                .map(Body::from);
        }
    };

    server
        .serve(http::Request::from_parts(parts, body))
        .await
        .map(Body::from)
}

pub fn router(server: Arc<Server>, path: &str) -> Router {
    Router::new().route(path, any(graphql)).with_state(server)
}
