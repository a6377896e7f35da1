//! Sink node kinds
//!
//! Sinks terminate a pipeline. The network sinks share their batching,
//! buffering, request and TLS groups through [`crate::options`].

pub mod clickhouse;
pub mod console;
pub mod elasticsearch;
pub mod file;
