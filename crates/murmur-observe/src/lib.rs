//! Observability for Murmur: tracing subscriber setup.

pub mod tracing_setup;
