//! The tokenizer transform.
//!
//! Splits a field on whitespace, respecting quotes and brackets, and
//! assigns the tokens to `field_names` in order.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    kinds::{Role, ValueKind},
    schema::{Reader, Variant},
};

/// Type tag of [`Config`].
pub const TYPE: &str = "tokenizer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Configuration of the tokenizer transform
pub struct Config {
    /// Name of this node
    #[serde(skip)]
    pub name: String,
    /// Upstream node names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<String>>,
    /// Drop `field` once it has been parsed
    pub drop_field: bool,
    /// The field to tokenize
    pub field: String,
    /// Names given to the tokens, in order
    pub field_names: Vec<String>,
    /// Coercions applied to the named tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<BTreeMap<String, ValueKind>>,
}

impl Variant for Config {
    const ROLE: Role = Role::Transform;
    const TYPE: &'static str = TYPE;

    fn read(name: String, reader: &mut Reader) -> Self {
        Self {
            name,
            inputs: reader.optional("inputs"),
            drop_field: reader.or("drop_field", true),
            field: reader.or("field", "message".to_string()),
            field_names: reader.required("field_names"),
            types: reader.optional("types"),
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
    use crate::schema::{Error, construct};

    #[test]
    fn defaults_and_types() -> Result<(), Error> {
        let attributes: Table = r#"
inputs = ["nginx_error_log"]
field_names = ["timestamp", "message"]
[types]
timestamp = "timestamp"
"#
        .parse()
        .expect("table");
        let node = construct::<Config>("parser".to_string(), attributes)?;
        let config = node.as_any().downcast_ref::<Config>().expect("tokenizer");
        assert!(config.drop_field);
        assert_eq!(config.field, "message");
        assert_eq!(
            config.types.as_ref().and_then(|t| t.get("timestamp")),
            Some(&ValueKind::Timestamp)
        );
        Ok(())
    }

    #[test]
    fn unknown_value_kind() {
        let attributes: Table = "field_names = ['a']\ntypes = { a = 'decimal' }"
            .parse()
            .expect("table");
        let err = construct::<Config>("parser".to_string(), attributes).expect_err("must fail");
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].field, "types");
    }
}
