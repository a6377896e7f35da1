//! Two-phase node construction.
//!
//! Node attributes arrive as a generic [`toml::Table`]. A [`Reader`] walks
//! that table field by field, converting each value into its typed form and
//! recording a [`Violation`] for anything it cannot convert. Only once every
//! field has been read -- and every problem recorded -- does construction
//! decide whether to fail. Cross-field rules run afterward on the fully
//! defaulted candidate, see [`Variant::check`] and [`Section::check`].

use std::{any::Any, fmt};

use serde::{Serialize, de::DeserializeOwned};
use toml::{Table, Value};
use tracing::debug;

use crate::kinds::Role;

/// Errors produced while building or rendering a node.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The attributes do not describe a valid node of this variant.
    #[error("invalid {role} `{type_tag}`: {}", render_violations(.violations))]
    Invalid {
        /// Role of the variant being built
        role: Role,
        /// Type tag of the variant being built
        type_tag: &'static str,
        /// Every offending field, in the order it was found
        violations: Vec<Violation>,
    },
    /// A node could not be rendered back into a table.
    #[error("Failed to render node fields: {0}")]
    Render(#[from] toml::ser::Error),
}

impl Error {
    /// Whether the failure was caused by the input rather than by us.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Invalid { .. })
    }

    /// The violations carried by this error, empty for render failures.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        match self {
            Error::Invalid { violations, .. } => violations,
            Error::Render(_) => &[],
        }
    }
}

fn render_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A single offending field and why it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path of the field, e.g. `buffer.max_size`
    pub field: String,
    /// Human readable reason
    pub reason: String,
}

impl Violation {
    /// Create a new [`Violation`].
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Field-by-field reader over a raw attribute table.
///
/// Fields are removed from the table as they are read. Whatever is left at
/// [`Reader::finish`] is reported as unknown.
#[derive(Debug)]
pub struct Reader {
    prefix: String,
    table: Table,
    violations: Vec<Violation>,
}

impl Reader {
    /// Create a new [`Reader`] over the top-level attributes of a node.
    #[must_use]
    pub fn new(table: Table) -> Self {
        Self {
            prefix: String::new(),
            table,
            violations: Vec::new(),
        }
    }

    fn path(&self, field: &str) -> String {
        format!("{}{field}", self.prefix)
    }

    /// Record a violation against `field`.
    pub fn invalid(&mut self, field: &str, reason: impl Into<String>) {
        let path = self.path(field);
        self.violations.push(Violation::new(path, reason));
    }

    fn convert<T: DeserializeOwned>(&mut self, field: &str, value: Value) -> Option<T> {
        match value.try_into::<T>() {
            Ok(typed) => Some(typed),
            Err(err) => {
                self.invalid(field, err.message().to_string());
                None
            }
        }
    }

    /// Read a field that must be present.
    ///
    /// A missing or malformed field records a violation and yields
    /// `T::default()` as a placeholder. The placeholder never escapes: a
    /// reader holding violations fails at [`Reader::finish`].
    pub fn required<T: DeserializeOwned + Default>(&mut self, field: &str) -> T {
        match self.table.remove(field) {
            Some(value) => self.convert(field, value).unwrap_or_default(),
            None => {
                self.invalid(field, "missing required field");
                T::default()
            }
        }
    }

    /// Read a field that may be absent.
    pub fn optional<T: DeserializeOwned>(&mut self, field: &str) -> Option<T> {
        let value = self.table.remove(field)?;
        self.convert(field, value)
    }

    /// Read a field, substituting `default` when it is absent.
    pub fn or<T: DeserializeOwned>(&mut self, field: &str, default: T) -> T {
        self.optional(field).unwrap_or(default)
    }

    /// Read a field that may be absent, also accepting it under a former
    /// `alias`. When both are given the alias is left unread and so reported
    /// as unknown.
    pub fn optional_alias<T: DeserializeOwned>(&mut self, field: &str, alias: &str) -> Option<T> {
        if self.table.contains_key(field) {
            self.optional(field)
        } else {
            self.optional(alias)
        }
    }

    /// Read an optional nested option group.
    pub fn section<S: Section>(&mut self, field: &str) -> Option<S> {
        match self.table.remove(field)? {
            Value::Table(table) => {
                let mut nested = Reader {
                    prefix: format!("{}.", self.path(field)),
                    table,
                    violations: Vec::new(),
                };
                let section = S::read(&mut nested);
                nested.drain_into(&mut self.violations);
                Some(section)
            }
            other => {
                self.invalid(
                    field,
                    format!("invalid type: {}, expected a table", other.type_str()),
                );
                None
            }
        }
    }

    /// Read a nested option group that must be present.
    pub fn required_section<S: Section>(&mut self, field: &str) -> S {
        if !self.table.contains_key(field) {
            self.invalid(field, "missing required field");
            return S::default();
        }
        self.section(field).unwrap_or_default()
    }

    fn drain_into(self, sink: &mut Vec<Violation>) {
        let Reader {
            prefix,
            table,
            violations,
        } = self;
        sink.extend(violations);
        sink.extend(
            table
                .keys()
                .map(|key| Violation::new(format!("{prefix}{key}"), "unknown field")),
        );
    }

    /// Finish reading, reporting every violation seen including unknown
    /// fields.
    ///
    /// # Errors
    ///
    /// Returns the collected violations if there are any.
    pub fn finish(self) -> Result<(), Vec<Violation>> {
        let mut violations = Vec::new();
        self.drain_into(&mut violations);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// A nested option group shared between node kinds.
pub trait Section: Default + Serialize {
    /// Read the group's fields, applying defaults.
    fn read(reader: &mut Reader) -> Self;

    /// Cross-field rules of the group, run after field-level reading
    /// succeeded for the whole node.
    ///
    /// # Errors
    ///
    /// Returns the reason of the first rule that does not hold.
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Run the cross-field rules of an optional section stored under `field`.
///
/// # Errors
///
/// Returns a [`Violation`] naming `field` if the section's rules fail.
pub fn check_section<S: Section>(field: &str, section: Option<&S>) -> Result<(), Violation> {
    match section {
        Some(section) => section
            .check()
            .map_err(|reason| Violation::new(field, reason)),
        None => Ok(()),
    }
}

/// A concrete node schema bound to one (role, type tag) pair.
pub trait Variant: fmt::Debug + Serialize + Send + Sync + 'static {
    /// Role every instance of the variant has.
    const ROLE: Role;
    /// Type tag of the variant.
    const TYPE: &'static str;

    /// Read all fields of the variant, applying defaults.
    fn read(name: String, reader: &mut Reader) -> Self;

    /// Cross-field rules, in the order sub-objects are declared.
    ///
    /// # Errors
    ///
    /// Returns the first rule that does not hold.
    fn check(&self) -> Result<(), Violation> {
        Ok(())
    }

    /// Apply defaults that only make sense once [`Variant::check`] passed.
    fn settle(&mut self) {}

    /// Name of this node instance.
    fn node_name(&self) -> &str;
}

/// Build and validate a variant from raw attributes.
///
/// This is the constructor registered for every built-in variant. The
/// attribute table must not contain `type`, `name` or `role`.
///
/// # Errors
///
/// Returns [`Error::Invalid`] listing every field-level problem, or the
/// first cross-field rule that failed.
pub fn construct<V: Variant>(name: String, attributes: Table) -> Result<Box<dyn Node>, Error> {
    let mut reader = Reader::new(attributes);
    if name.is_empty() {
        reader.invalid("name", "must not be empty");
    }
    let mut variant = V::read(name, &mut reader);
    reader.finish().map_err(|violations| Error::Invalid {
        role: V::ROLE,
        type_tag: V::TYPE,
        violations,
    })?;
    variant.check().map_err(|violation| Error::Invalid {
        role: V::ROLE,
        type_tag: V::TYPE,
        violations: vec![violation],
    })?;
    variant.settle();
    debug!(role = %V::ROLE, type_tag = V::TYPE, name = variant.node_name(), "constructed node");
    Ok(Box::new(variant))
}

/// A configured pipeline element, independent of its concrete variant.
pub trait Node: fmt::Debug + Send + Sync {
    /// Role of the node.
    fn role(&self) -> Role;

    /// Type tag of the node's variant.
    fn type_tag(&self) -> &'static str;

    /// Name of the node, unique within a document.
    fn name(&self) -> &str;

    /// Every field of the node, defaults included, without `name`, `role`
    /// and `type`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the fields cannot be expressed as TOML.
    fn fields(&self) -> Result<Table, Error>;

    /// Access to the concrete variant.
    fn as_any(&self) -> &dyn Any;

    /// Document-wide unique key, `role.name`.
    fn key(&self) -> String {
        format!("{}.{}", self.role(), self.name())
    }

    /// The fields plus `type`, `name`, `role` and the synthesized `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the fields cannot be expressed as TOML.
    fn display(&self) -> Result<Table, Error> {
        let mut table = self.fields()?;
        table.insert("id".to_string(), Value::String(self.key()));
        table.insert("name".to_string(), Value::String(self.name().to_string()));
        table.insert(
            "role".to_string(),
            Value::String(self.role().as_str().to_string()),
        );
        table.insert(
            "type".to_string(),
            Value::String(self.type_tag().to_string()),
        );
        Ok(table)
    }
}

impl<V: Variant> Node for V {
    fn role(&self) -> Role {
        V::ROLE
    }

    fn type_tag(&self) -> &'static str {
        V::TYPE
    }

    fn name(&self) -> &str {
        self.node_name()
    }

    fn fields(&self) -> Result<Table, Error> {
        match Value::try_from(self)? {
            Value::Table(table) => Ok(table),
            other => Err(<toml::ser::Error as serde::ser::Error>::custom(format!(
                "node rendered as {} rather than a table",
                other.type_str()
            ))
            .into()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
