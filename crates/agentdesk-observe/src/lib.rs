//! Observability setup for agentdesk: the global tracing subscriber and the
//! optional OpenTelemetry span exporter.

pub mod tracing_setup;

pub use tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
