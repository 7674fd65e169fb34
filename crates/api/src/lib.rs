//! HTTP API: routing, request parsing, response envelopes and auth.

pub mod app;
pub mod context;
pub mod middleware;
