//! The Elasticsearch sink.
//!
//! Every field is optional. The `auth` and `buffer` groups carry rules that
//! are checked once all fields have been read, `auth` first.

use serde::Serialize;

use crate::{
    kinds::{Compression, Role},
    options::{
        AwsOptions, BatchOptions, BufferOptions, ElasticsearchAuth, SinkEncoding,
        SinkRequestOptions, StringMap, TlsOptions,
    },
    schema::{Reader, Variant, Violation, check_section},
};

/// Type tag of [`Config`].
pub const TYPE: &str = "elasticsearch";

fn default_doc_type() -> String {
    "_doc".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Configuration of the Elasticsearch sink
pub struct Config {
    /// Name of this node
    #[serde(skip)]
    pub name: String,
    /// Upstream node names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<String>>,
    /// Authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<ElasticsearchAuth>,
    /// AWS settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsOptions>,
    /// Batching
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchOptions>,
    /// Buffering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<BufferOptions>,
    /// Request body compression
    pub compression: Compression,
    /// Document type of indexed events
    pub doc_type: String,
    /// Encoding of indexed events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<SinkEncoding>,
    /// Extra request headers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<StringMap>,
    /// Check the cluster is reachable on start
    pub healthcheck: bool,
    /// Cluster address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Event field used as document id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_key: Option<String>,
    /// Index name template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    /// Extra query parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<StringMap>,
    /// Request limits and retries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<SinkRequestOptions>,
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
            aws: reader.section("aws"),
            batch: reader.section("batch"),
            buffer: reader.section("buffer"),
            compression: reader.or("compression", Compression::None),
            doc_type: reader.or("doc_type", default_doc_type()),
            encoding: reader.section("encoding"),
            headers: reader.optional("headers"),
            healthcheck: reader.or("healthcheck", true),
            host: reader.optional("host"),
            id_key: reader.optional("id_key"),
            index: reader.optional("index"),
            query: reader.optional("query"),
            request: reader.section("request"),
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
