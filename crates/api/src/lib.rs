//! HTTP API: post-login hook endpoint, routing, and request/response mapping.

pub mod app;
pub mod middleware;
