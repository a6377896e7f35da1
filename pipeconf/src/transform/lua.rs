//! The lua transform.

use serde::Serialize;

use crate::{
    kinds::Role,
    options::RuntimeHooks,
    schema::{Reader, Variant},
};

/// Type tag of [`Config`].
pub const TYPE: &str = "lua";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Configuration of the lua transform
pub struct Config {
    /// Name of this node
    #[serde(skip)]
    pub name: String,
    /// Upstream node names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<String>>,
    /// Functions called by the runtime
    pub hooks: RuntimeHooks,
    /// Directories searched by `require`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_dirs: Option<Vec<String>>,
}

impl Variant for Config {
    const ROLE: Role = Role::Transform;
    const TYPE: &'static str = TYPE;

    fn read(name: String, reader: &mut Reader) -> Self {
        Self {
            name,
            inputs: reader.optional("inputs"),
            hooks: reader.required_section("hooks"),
            search_dirs: reader.optional("search_dirs"),
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
    fn hooks_are_required() {
        let err = construct::<Config>("lua".to_string(), Table::new()).expect_err("must fail");
        assert_eq!(err.violations()[0].field, "hooks");

        let attributes: Table = "[hooks]\ninit = 'init'".parse().expect("table");
        let err = construct::<Config>("lua".to_string(), attributes).expect_err("must fail");
        assert_eq!(err.violations()[0].field, "hooks.process");
    }

    #[test]
    fn process_hook_only() {
        let attributes: Table = "inputs = ['in']\n[hooks]\nprocess = 'process'"
            .parse()
            .expect("table");
        let node = construct::<Config>("lua".to_string(), attributes).expect("valid lua");
        let config = node.as_any().downcast_ref::<Config>().expect("lua transform");
        assert_eq!(config.hooks.process, "process");
        assert_eq!(config.inputs.as_deref(), Some(&["in".to_string()][..]));
        assert!(config.search_dirs.is_none());
    }
}
