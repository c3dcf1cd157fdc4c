#![deny(clippy::future_not_send)]

pub mod query_cache;
