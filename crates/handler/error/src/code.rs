#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::IntoStaticStr,
    strum::FromRepr,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    BadRequest,
    InternalServerError,
    // Used for APQ
    PersistedQueryError,
    PersistedQueryNotFound,
    // Auth
    Unauthenticated,
    // Operation preparation phases
    OperationParsingError,
    OperationValidationError,
    VariableError,
    // Runtime
    ExtensionError,
    RequestCancelled,
}

impl From<ErrorCode> for http::StatusCode {
    fn from(code: ErrorCode) -> http::StatusCode {
        code.into_http_status_code_with_priority().0
    }
}

impl ErrorCode {
    pub fn into_http_status_code_with_priority(self) -> (http::StatusCode, usize) {
        match self {
            ErrorCode::OperationParsingError
            | ErrorCode::OperationValidationError
            | ErrorCode::VariableError
            | ErrorCode::PersistedQueryNotFound
            | ErrorCode::PersistedQueryError
            | ErrorCode::BadRequest => (http::StatusCode::BAD_REQUEST, 1000),
            ErrorCode::Unauthenticated => (http::StatusCode::UNAUTHORIZED, 600),
            ErrorCode::RequestCancelled => (http::StatusCode::SERVICE_UNAVAILABLE, 200),
            // least helpful error codes
            ErrorCode::ExtensionError | ErrorCode::InternalServerError => (http::StatusCode::INTERNAL_SERVER_ERROR, 0),
        }
    }
}
