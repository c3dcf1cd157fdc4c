use error::GraphqlError;

#[derive(Debug, Default, Clone, PartialEq, serde::Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub extensions: serde_json::Map<String, serde_json::Value>,
}

impl Response {
    pub fn from_data(data: serde_json::Value) -> Self {
        Response {
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn from_errors(errors: Vec<GraphqlError>) -> Self {
        Response {
            errors,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_error(mut self, error: GraphqlError) -> Self {
        self.errors.push(error);
        self
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }
}
