use std::borrow::Cow;

use http::{
    HeaderValue,
    header::{CONTENT_LENGTH, CONTENT_TYPE},
};
use serde::ser::{SerializeMap, Serializer};

use crate::{ErrorCode, ErrorResponse, GraphqlError};

pub const APPLICATION_JSON: &str = "application/json";

/// The `{"errors": [...], "data": ...}` object written whenever the server produces an error
/// response by itself.
#[derive(serde::Serialize)]
pub struct ErrorEnvelope<'a> {
    pub errors: &'a [GraphqlError],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a serde_json::Value>,
}

impl serde::Serialize for GraphqlError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("message", &self.message)?;
        if !self.locations.is_empty() {
            map.serialize_entry("locations", &self.locations)?;
        }
        if let Some(path) = &self.path {
            map.serialize_entry("path", path)?;
        }
        map.serialize_entry(
            "extensions",
            &ErrorExtensions {
                code: self.code,
                extensions: &self.extensions,
            },
        )?;
        map.end()
    }
}

struct ErrorExtensions<'a> {
    code: ErrorCode,
    extensions: &'a [(Cow<'static, str>, serde_json::Value)],
}

impl serde::Serialize for ErrorExtensions<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        // An explicit code set by an error presenter takes precedence.
        if !self.extensions.iter().any(|(key, _)| key == "code") {
            map.serialize_entry("code", &self.code)?;
        }
        for (key, value) in self.extensions {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl ErrorResponse {
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&ErrorEnvelope {
            errors: &self.errors,
            data: None,
        })
    }

    /// Converts into an HTTP response. Fails only if the envelope itself cannot be serialized.
    pub fn try_into_http<B>(self) -> Result<http::Response<B>, serde_json::Error>
    where
        B: From<Vec<u8>>,
    {
        let bytes = self.to_json_bytes()?;

        let mut response = http::Response::new(B::from(Vec::new()));
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
        *response.body_mut() = B::from(bytes);

        Ok(response)
    }
}
