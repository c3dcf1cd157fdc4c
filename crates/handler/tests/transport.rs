mod common;

use std::sync::Arc;

use bytes::Bytes;
use common::{TestSchema, get, query, send};
use handler::{Executor, RequestContext, Server, Transport};
use serde_json::json;

/// Supports everything and answers with its own name.
struct Named(&'static str);

#[async_trait::async_trait]
impl Transport for Named {
    fn name(&self) -> &str {
        self.0
    }

    fn supports(&self, _: &http::Request<Bytes>) -> bool {
        true
    }

    async fn handle(
        &self,
        _: Arc<RequestContext>,
        _: http::Request<Bytes>,
        _: &Executor<'_>,
    ) -> http::Response<Bytes> {
        http::Response::new(Bytes::from_static(self.0.as_bytes()))
    }
}

#[tokio::test]
async fn first_supporting_transport_wins() {
    let mut server = Server::new(TestSchema);
    server.add_transport(Named("first"));
    server.add_transport(Named("second"));

    let response = server.serve(query("{ hello }")).await;

    assert_eq!(response.body().as_ref(), b"first");
}

#[tokio::test]
async fn transport_not_supported() {
    let server = Server::with_defaults(TestSchema).unwrap();

    let request = http::Request::put("/graphql").body(Bytes::new()).unwrap();
    let response = server.serve(request).await;

    assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[http::header::CONTENT_TYPE], "application/json");

    let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    insta::assert_json_snapshot!(body, @r#"
    {
      "errors": [
        {
          "message": "transport not supported",
          "extensions": {
            "code": "BAD_REQUEST"
          }
        }
      ]
    }
    "#);
}

#[tokio::test]
async fn server_without_transports_supports_nothing() {
    let server = Server::new(TestSchema);

    let (status, body) = send(&server, query("{ hello }")).await;

    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["message"], "transport not supported");
}

#[tokio::test]
async fn post_requires_a_json_content_type() {
    let server = Server::with_defaults(TestSchema).unwrap();

    let request = http::Request::post("/graphql")
        .header(http::header::CONTENT_TYPE, "text/plain")
        .body(Bytes::from_static(br#"{"query":"{ hello }"}"#))
        .unwrap();
    let (status, _) = send(&server, request).await;
    assert_eq!(status, http::StatusCode::BAD_REQUEST);

    let request = http::Request::post("/graphql")
        .header(http::header::CONTENT_TYPE, "application/json; charset=utf-8")
        .body(Bytes::from_static(br#"{"query":"{ hello }"}"#))
        .unwrap();
    let (status, body) = send(&server, request).await;
    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(body, json!({"data": {"hello": "world"}}));
}

#[tokio::test]
async fn post_with_invalid_json() {
    let server = Server::with_defaults(TestSchema).unwrap();

    let request = http::Request::post("/graphql")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Bytes::from_static(b"{"))
        .unwrap();
    let (status, body) = send(&server, request).await;

    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    let message = body["errors"][0]["message"].as_str().unwrap();
    assert!(
        message.starts_with("json request body could not be decoded: "),
        "{message}"
    );
    assert_eq!(body["errors"][0]["extensions"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn post_without_query() {
    let server = Server::with_defaults(TestSchema).unwrap();

    let (status, body) = send(&server, common::post(json!({"variables": {}}))).await;

    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["message"], "no operation provided");
}

#[tokio::test]
async fn get_query() {
    let server = Server::with_defaults(TestSchema).unwrap();

    let (status, body) = send(
        &server,
        get("query=query%20Echo%20%7B%20echo%20%7D&operationName=Echo&variables=%7B%22a%22%3A1%7D"),
    )
    .await;

    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(body, json!({"data": {"echo": {"a": 1}}}));
}

#[tokio::test]
async fn get_rejects_mutations() {
    let server = Server::with_defaults(TestSchema).unwrap();

    let (status, body) = send(&server, get("query=mutation%20%7B%20hello%20%7D")).await;

    assert_eq!(status, http::StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body["errors"][0]["message"], "GET requests only allow query operations");
}

#[tokio::test]
async fn get_with_undecodable_variables() {
    let server = Server::with_defaults(TestSchema).unwrap();

    let (status, body) = send(&server, get("query=%7B%20hello%20%7D&variables=nope")).await;
    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["message"], "variables could not be decoded");

    let (status, body) = send(&server, get("query=%7B%20hello%20%7D&extensions=%5B")).await;
    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["message"], "extensions could not be decoded");
}

#[tokio::test]
async fn get_with_websocket_upgrade_is_not_handled() {
    let server = Server::with_defaults(TestSchema).unwrap();

    let mut request = get("query=%7B%20hello%20%7D");
    request
        .headers_mut()
        .insert(http::header::UPGRADE, http::HeaderValue::from_static("websocket"));
    let (status, body) = send(&server, request).await;

    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["message"], "transport not supported");
}

#[tokio::test]
async fn options_and_head() {
    let server = Server::with_defaults(TestSchema).unwrap();

    let request = http::Request::options("/graphql").body(Bytes::new()).unwrap();
    let response = server.serve(request).await;
    assert_eq!(response.status(), http::StatusCode::OK);
    assert_eq!(response.headers()[http::header::ALLOW], "OPTIONS, GET, POST");
    assert!(response.body().is_empty());

    let request = http::Request::head("/graphql").body(Bytes::new()).unwrap();
    let response = server.serve(request).await;
    assert_eq!(response.status(), http::StatusCode::METHOD_NOT_ALLOWED);
}
