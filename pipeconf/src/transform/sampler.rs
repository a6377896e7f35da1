//! The sampler transform.

use serde::Serialize;

use crate::{
    kinds::Role,
    schema::{Reader, Variant, Violation},
};

/// Type tag of [`Config`].
pub const TYPE: &str = "sampler";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Configuration of the sampler transform
pub struct Config {
    /// Name of this node
    #[serde(skip)]
    pub name: String,
    /// Upstream node names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<String>>,
    /// Field whose value decides if an event passes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_field: Option<String>,
    /// Patterns of events that always pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_list: Option<Vec<String>>,
    /// One in `rate` events is forwarded
    pub rate: u64,
}

impl Variant for Config {
    const ROLE: Role = Role::Transform;
    const TYPE: &'static str = TYPE;

    fn read(name: String, reader: &mut Reader) -> Self {
        Self {
            name,
            inputs: reader.optional("inputs"),
            key_field: reader.optional("key_field"),
            pass_list: reader.optional("pass_list"),
            rate: reader.required("rate"),
        }
    }

    fn check(&self) -> Result<(), Violation> {
        if self.rate == 0 {
            return Err(Violation::new("rate", "rate must be at least 1"));
        }
        Ok(())
    }

    fn node_name(&self) -> &str {
        &self.name
    }
}
