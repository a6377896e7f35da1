//! The ClickHouse sink.

use serde::Serialize;

use crate::{
    kinds::{Compression, Role},
    options::{
        BatchOptions, BufferOptions, ClickHouseAuth, SinkEncoding, SinkRequestOptions, TlsOptions,
    },
    schema::{Reader, Variant, Violation, check_section},
};

/// Type tag of [`Config`].
pub const TYPE: &str = "clickhouse";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Configuration of the ClickHouse sink
pub struct Config {
    /// Name of this node
    #[serde(skip)]
    pub name: String,
    /// Upstream node names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<String>>,
    /// Authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<ClickHouseAuth>,
    /// Batching
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchOptions>,
    /// Buffering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<BufferOptions>,
    /// Request body compression
    pub compression: Compression,
    /// Target database, the server default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Encoding of inserted rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<SinkEncoding>,
    /// Check the server is reachable on start
    pub healthcheck: bool,
    /// Server address
    pub host: String,
    /// Request limits and retries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<SinkRequestOptions>,
    /// Ignore event fields the table has no column for
    pub skip_unknown_fields: bool,
    /// Target table
    pub table: String,
    /// TLS settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsOptions>,
}

impl Variant for Config {
    const ROLE: Role = Role::Sink;
    const TYPE: &'static str = TYPE;

    fn read(name: String, reader: &mut Reader) -> Self {
        Self {
            name,
            inputs: reader.optional("inputs"),
            auth: reader.section("auth"),
            batch: reader.section("batch"),
            buffer: reader.section("buffer"),
            compression: reader.or("compression", Compression::None),
            database: reader.optional("database"),
            encoding: reader.section("encoding"),
            healthcheck: reader.or("healthcheck", true),
            host: reader.required("host"),
            request: reader.section("request"),
            skip_unknown_fields: reader.or("skip_unknown_fields", false),
            table: reader.required("table"),
            tls: reader.section("tls"),
        }
    }

    fn check(&self) -> Result<(), Violation> {
        check_section("auth", self.auth.as_ref())?;
        check_section("buffer", self.buffer.as_ref())
    }

    fn settle(&mut self) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.settle();
        }
    }

    fn node_name(&self) -> &str {
        &self.name
    }
}
