//! The node registry.
//!
//! A [`Registry`] maps a (role, type tag) pair to the constructor of a node
//! variant. Variants are registered once, before any document is read, and
//! the registry is only read afterward. Mutation takes `&mut self`, so a
//! registry shared behind `&` -- like the one returned by [`global`] -- is
//! frozen and safe to consult from many threads without locking.
//!
//! Modules outside this crate may define their own variants and register
//! them with [`Registry::register_variant`] on a registry of their own,
//! typically starting from [`Registry::builtin`].

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use toml::Table;
use tracing::debug;

use crate::{
    kinds::Role,
    schema::{self, Node, Variant, construct},
    sink, source, transform,
};

/// Builds and validates a node from its name and attributes.
pub type Constructor = fn(String, Table) -> Result<Box<dyn Node>, schema::Error>;

/// Errors produced by [`Registry`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The pair was registered before.
    #[error("Node type `{type_tag}` already registered for role {role}")]
    DuplicateRegistration {
        /// Role of the rejected registration
        role: Role,
        /// Type tag of the rejected registration
        type_tag: String,
    },
    /// Nothing is registered for the pair.
    #[error("No such type registered for role {role}: {type_tag}")]
    UnknownNodeType {
        /// Role looked up
        role: Role,
        /// Type tag looked up
        type_tag: String,
    },
}

impl Error {
    /// Whether the failure was caused by the input rather than by us.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::UnknownNodeType { .. })
    }
}

/// A resolved constructor, bound to the role it was registered under.
#[derive(Debug, Clone, Copy)]
pub struct Factory {
    role: Role,
    type_tag: &'static str,
    constructor: Constructor,
}

impl Factory {
    /// Role of the nodes this factory builds.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Type tag of the nodes this factory builds.
    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        self.type_tag
    }

    /// Build and validate a node. `attributes` holds the node's own fields
    /// only, without `type`.
    ///
    /// # Errors
    ///
    /// Returns the variant's validation error.
    pub fn build(&self, name: String, attributes: Table) -> Result<Box<dyn Node>, schema::Error> {
        (self.constructor)(name, attributes)
    }
}

/// Table from (role, type tag) to [`Constructor`].
#[derive(Debug, Default)]
pub struct Registry {
    roles: FxHashMap<Role, FxHashMap<&'static str, Constructor>>,
}

impl Registry {
    /// Create an empty [`Registry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a [`Registry`] holding every built-in node kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRegistration`] if two built-in kinds share a
    /// role and type tag.
    pub fn builtin() -> Result<Self, Error> {
        let mut registry = Self::new();
        registry.register_variant::<source::file::Config>()?;
        registry.register_variant::<source::generator::Config>()?;
        registry.register_variant::<transform::lua::Config>()?;
        registry.register_variant::<transform::tokenizer::Config>()?;
        registry.register_variant::<transform::sampler::Config>()?;
        registry.register_variant::<sink::file::Config>()?;
        registry.register_variant::<sink::console::Config>()?;
        registry.register_variant::<sink::elasticsearch::Config>()?;
        registry.register_variant::<sink::clickhouse::Config>()?;
        Ok(registry)
    }

    /// Register `constructor` for `role` and `type_tag`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRegistration`] if the pair is taken. The
    /// existing registration is kept.
    pub fn register(
        &mut self,
        role: Role,
        type_tag: &'static str,
        constructor: Constructor,
    ) -> Result<(), Error> {
        let types = self.roles.entry(role).or_default();
        if types.contains_key(type_tag) {
            return Err(Error::DuplicateRegistration {
                role,
                type_tag: type_tag.to_string(),
            });
        }
        types.insert(type_tag, constructor);
        debug!(%role, type_tag, "registered node type");
        Ok(())
    }

    /// Register the variant `V` under its own role and type tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRegistration`] if the pair is taken.
    pub fn register_variant<V: Variant>(&mut self) -> Result<(), Error> {
        self.register(V::ROLE, V::TYPE, construct::<V>)
    }

    /// Look up the factory for `role` and `type_tag`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNodeType`] if nothing is registered for the
    /// pair.
    pub fn resolve(&self, role: Role, type_tag: &str) -> Result<Factory, Error> {
        self.roles
            .get(&role)
            .and_then(|types| types.get_key_value(type_tag))
            .map(|(registered, constructor)| Factory {
                role,
                type_tag: *registered,
                constructor: *constructor,
            })
            .ok_or_else(|| Error::UnknownNodeType {
                role,
                type_tag: type_tag.to_string(),
            })
    }

    /// Type tags registered for `role`, sorted.
    #[must_use]
    pub fn types(&self, role: Role) -> Vec<&'static str> {
        let mut types: Vec<&'static str> = self
            .roles
            .get(&role)
            .map(|types| types.keys().copied().collect())
            .unwrap_or_default();
        types.sort_unstable();
        types
    }

    /// Number of registered (role, type tag) pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.values().map(FxHashMap::len).sum()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static GLOBAL: Lazy<Registry> =
    Lazy::new(|| Registry::builtin().expect("built-in node types must be distinct"));

/// The process-wide registry of built-in node kinds.
///
/// Built on first use and never modified afterward.
#[must_use]
pub fn global() -> &'static Registry {
    &GLOBAL
}
