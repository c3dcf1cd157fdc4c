mod code;
mod envelope;
mod path;

pub use code::*;
pub use envelope::*;
pub use path::*;
use std::borrow::Cow;

#[derive(Clone, Debug)]
pub struct ErrorResponse {
    pub status: http::StatusCode,
    pub errors: Vec<GraphqlError>,
}

impl ErrorResponse {
    pub fn new(status: http::StatusCode) -> Self {
        ErrorResponse {
            status,
            errors: Vec::new(),
        }
    }

    pub fn with_error(mut self, error: GraphqlError) -> Self {
        self.errors.push(error);
        self
    }

    pub fn with_errors<I>(mut self, errors: I) -> Self
    where
        I: IntoIterator<Item = GraphqlError>,
    {
        self.errors.extend(errors);
        self
    }

    /// Status derived from the errors themselves, the most helpful code wins.
    pub fn from_errors(errors: Vec<GraphqlError>) -> Self {
        let status = errors
            .iter()
            .map(|error| error.code.into_http_status_code_with_priority())
            .max_by_key(|(_, priority)| *priority)
            .map(|(status, _)| status)
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

        Self::new(status).with_errors(errors)
    }

    pub fn transport_not_supported() -> Self {
        Self::new(http::StatusCode::BAD_REQUEST)
            .with_error(GraphqlError::new("transport not supported", ErrorCode::BadRequest))
    }
}

pub type GraphqlResult<T> = Result<T, GraphqlError>;

/// A position inside the query document, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl From<async_graphql_parser::Pos> for Location {
    fn from(pos: async_graphql_parser::Pos) -> Self {
        Location {
            line: pos.line,
            column: pos.column,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphqlError {
    pub message: Cow<'static, str>,
    pub code: ErrorCode,
    pub locations: Vec<Location>,
    pub path: Option<ErrorPath>,
    // Serialized as a map, but kept as a Vec for efficiency.
    pub extensions: Vec<(Cow<'static, str>, serde_json::Value)>,
}

impl GraphqlError {
    pub fn new(message: impl Into<Cow<'static, str>>, code: ErrorCode) -> Self {
        GraphqlError {
            message: message.into(),
            code,
            locations: Vec::new(),
            path: None,
            extensions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<Location>) -> Self {
        self.locations.push(location.into());
        self
    }

    #[must_use]
    pub fn with_locations(mut self, locations: impl IntoIterator<Item = Location>) -> Self {
        self.locations.extend(locations);
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<ErrorPath>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<serde_json::Value>) -> Self {
        let key = key.into();
        self.extensions.push((key, value.into()));
        self
    }

    // ------------- //
    // Common errors //
    // ------------- //

    pub fn internal_server_error() -> Self {
        GraphqlError::new("Internal server error", ErrorCode::InternalServerError)
    }

    pub fn unauthenticated() -> Self {
        GraphqlError::new("Unauthenticated", ErrorCode::Unauthenticated)
    }

    pub fn persisted_query_not_found() -> Self {
        GraphqlError::new("PersistedQueryNotFound", ErrorCode::PersistedQueryNotFound)
    }

    pub fn request_cancelled() -> Self {
        GraphqlError::new("request cancelled", ErrorCode::RequestCancelled)
    }
}

impl std::fmt::Display for GraphqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message.fmt(f)
    }
}

impl std::error::Error for GraphqlError {}
