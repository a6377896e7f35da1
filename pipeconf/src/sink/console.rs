//! The console sink.

use serde::Serialize;

use crate::{
    kinds::{Role, StdStream},
    options::FileEncoding,
    schema::{Reader, Variant},
};

/// Type tag of [`Config`].
pub const TYPE: &str = "console";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Configuration of the console sink
pub struct Config {
    /// Name of this node
    #[serde(skip)]
    pub name: String,
    /// Upstream node names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<String>>,
    /// How events are written
    pub encoding: FileEncoding,
    /// Stream events are written to
    pub target: StdStream,
}

impl Variant for Config {
    const ROLE: Role = Role::Sink;
    const TYPE: &'static str = TYPE;

    fn read(name: String, reader: &mut Reader) -> Self {
        Self {
            name,
            inputs: reader.optional("inputs"),
            encoding: reader.required_section("encoding"),
            target: reader.or("target", StdStream::Stdout),
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
    use crate::schema::construct;

    #[test]
    fn target_out_of_set() {
        let attributes: Table = "target = 'stdlog'\n[encoding]\ncodec = 'text'"
            .parse()
            .expect("table");
        let err = construct::<Config>("c".to_string(), attributes).expect_err("must fail");
        let fields: Vec<&str> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["encoding.timestamp_format", "target"]);
    }

    #[test]
    fn target_defaults_to_stdout() {
        let attributes: Table = "[encoding]\ncodec = 'text'\ntimestamp_format = 'rfc3339'"
            .parse()
            .expect("table");
        let node = construct::<Config>("c".to_string(), attributes).expect("valid console");
        let config = node.as_any().downcast_ref::<Config>().expect("console sink");
        assert_eq!(config.target, StdStream::Stdout);
    }
}
