//! HTTP server layer.
//!
//! - [`api`]: Request/response types and route handlers
//! - [`error`]: HTTP error mapping
//! - [`metrics`]: Prometheus instrumentation

pub mod api;
pub mod error;
pub mod metrics;
