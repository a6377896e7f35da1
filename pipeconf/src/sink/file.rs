//! The file sink.

use serde::Serialize;

use crate::{
    kinds::Role,
    options::FileEncoding,
    schema::{Reader, Variant},
};

/// Type tag of [`Config`].
pub const TYPE: &str = "file";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Configuration of the file sink
pub struct Config {
    /// Name of this node
    #[serde(skip)]
    pub name: String,
    /// Upstream node names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<String>>,
    /// How events are written
    pub encoding: FileEncoding,
    /// Check the sink is usable on start
    pub healthcheck: bool,
    /// Seconds a file may stay idle before it is closed
    pub idle_timeout_secs: u64,
    /// File name template, e.g. `app-{{ application_id }}-%Y-%m-%d.log`
    pub path: String,
}

impl Variant for Config {
    const ROLE: Role = Role::Sink;
    const TYPE: &'static str = TYPE;

    fn read(name: String, reader: &mut Reader) -> Self {
        Self {
            name,
            inputs: reader.optional("inputs"),
            encoding: reader.required_section("encoding"),
            healthcheck: reader.or("healthcheck", true),
            idle_timeout_secs: reader.or("idle_timeout_secs", 30),
            path: reader.required("path"),
        }
    }

    fn node_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use toml::Table;

    use super::*;
    use crate::{kinds::EncodingCodec, schema::construct};

    #[test]
    fn every_missing_field_is_named() {
        let err = construct::<Config>("out".to_string(), Table::new()).expect_err("must fail");
        let fields: Vec<&str> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["encoding", "path"]);
    }

    #[test]
    fn file_sink_defaults() {
        let attributes: Table = r#"
path = "/tmp/out-%Y-%m-%d.log"
[encoding]
codec = "ndjson"
timestamp_format = "unix"
"#
        .parse()
        .expect("table");
        let node = construct::<Config>("out".to_string(), attributes).expect("valid file sink");
        let config = node.as_any().downcast_ref::<Config>().expect("file sink");
        assert!(config.healthcheck);
        assert_eq!(config.idle_timeout_secs, 30);
        assert_eq!(config.encoding.codec, EncodingCodec::Ndjson);
        assert!(config.encoding.only_fields.is_empty());
    }
}
