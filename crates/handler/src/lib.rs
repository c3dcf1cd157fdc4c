#![deny(clippy::future_not_send)]

//! Request-execution core of a GraphQL server.
//!
//! A [`Server`] negotiates a [`Transport`] for every inbound request, runs the operation
//! through the compiled [`Extension`] pipeline and contains any panic inside a single fault
//! barrier per request.

pub mod axum;
mod config;
mod context;
mod executor;
pub mod extension;
mod operation;
mod response;
mod schema;
mod server;
pub mod transport;

pub use config::{IntrospectionConfig, OperationCachingConfig, PersistedQueriesConfig, ServerConfig};
pub use context::{OperationTrace, RequestContext, TraceTiming};
pub use error::{ErrorCode, ErrorPath, ErrorResponse, GraphqlError, GraphqlResult, Location};
pub use executor::Executor;
pub use extension::{Extension, ExtensionHooks};
pub use operation::{FieldContext, OperationContext, RawParams, Stats};
pub use response::Response;
pub use schema::{ExecutableSchema, FieldChain, Resolver};
pub use server::{ConfigError, ErrorPresenter, RecoverFunc, Server, default_recover};
pub use transport::Transport;

pub use async_graphql_parser::types::ExecutableDocument;
