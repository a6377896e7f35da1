//! Configuration documents.
//!
//! A [`Document`] is an ordered list of nodes. It is read from and written to
//! TOML text with exactly three top-level tables, one per role:
//!
//! ```toml
//! [sources.nginx_error_log]
//! type = "file"
//! include = ["/var/log/nginx*.log"]
//!
//! [sinks.es_cluster]
//! type = "elasticsearch"
//! inputs = ["nginx_error_log"]
//! ```
//!
//! Reading a document replaces its contents wholesale, and only once every
//! node has been built; a failed read leaves the document as it was.
//! Writing emits every field of every node, defaults included, so reading
//! the output back yields the same nodes. Nodes keep the order they are
//! written in, except that writing regroups them by role.

use std::{fmt, ops::Range};

use toml::{Table, Value};
use tracing::{debug, info};

use crate::{
    kinds::Role,
    registry::{self, Registry},
    schema::{self, Node},
};

/// Errors produced by [`Document`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The text is not valid TOML.
    #[error("Failed to parse document: {0}")]
    Parse(#[from] toml::de::Error),
    /// The text is TOML but not shaped like a document.
    #[error("Malformed document: {0}")]
    Malformed(String),
    /// A node names a type tag not registered for its role.
    #[error("No such type registered for role {role}: {type_tag}")]
    NoSuchNodeType {
        /// Role of the offending node
        role: Role,
        /// The unregistered tag
        type_tag: String,
    },
    /// A node failed to build or render.
    #[error("Node `{key}`: {source}")]
    Schema {
        /// Key of the offending node
        key: String,
        /// Underlying schema error
        #[source]
        source: schema::Error,
    },
    /// The document could not be written as TOML.
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A listing could not be converted to JSON.
    #[error("Failed to convert listing to JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the failure was caused by the input rather than by us.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Error::Parse(_) | Error::Malformed(_) | Error::NoSuchNodeType { .. } => true,
            Error::Schema { source, .. } => source.is_client_error(),
            Error::Serialize(_) | Error::Json(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which mapping a listing returns per node.
pub enum View {
    /// [`Node::fields`] plus `type`, as the node is written to text.
    Fields,
    /// See [`Node::display`].
    Display,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The slice of a listing that was returned, `[low, high)` of `total`.
pub struct ContentRange {
    /// First index returned
    pub low: usize,
    /// One past the last index returned
    pub high: usize,
    /// Number of nodes in the document
    pub total: usize,
}

impl ContentRange {
    /// Clamp a requested range to `total` items. `high` never exceeds
    /// `total` and `low` never exceeds `high`.
    #[must_use]
    pub fn clamp(requested: &Range<usize>, total: usize) -> Self {
        let high = requested.end.min(total);
        let low = requested.start.min(high);
        Self { low, high, total }
    }
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nodes {}-{}/{}", self.low, self.high, self.total)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A page of nodes rendered as JSON objects.
pub struct Listing {
    /// One JSON object per node
    pub items: Vec<serde_json::Value>,
    /// Present when a range was requested
    pub content_range: Option<ContentRange>,
}

/// An ordered collection of nodes forming one pipeline configuration.
#[derive(Debug, Default)]
pub struct Document {
    nodes: Vec<Box<dyn Node>>,
}

impl Document {
    /// Create an empty [`Document`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a [`Document`] from TOML text.
    ///
    /// # Errors
    ///
    /// See [`Document::deserialize`].
    pub fn from_text(registry: &Registry, text: &str) -> Result<Self, Error> {
        let mut document = Self::new();
        document.deserialize(registry, text)?;
        Ok(document)
    }

    /// Replace the contents of this document with the nodes described by
    /// `text`.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the document untouched, if the text is not
    /// TOML, is not shaped like a document, names an unregistered type or
    /// holds a node that fails validation.
    pub fn deserialize(&mut self, registry: &Registry, text: &str) -> Result<(), Error> {
        let nodes = read_nodes(registry, text)?;
        info!(nodes = nodes.len(), "loaded document");
        self.nodes = nodes;
        Ok(())
    }

    /// Write this document as TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if a node cannot be rendered.
    pub fn serialize(&self) -> Result<String, Error> {
        let table = self.to_table()?;
        Ok(toml::to_string(&table)?)
    }

    /// This document as a table of `group -> name -> fields`, with `type`
    /// put back into each node's fields.
    ///
    /// # Errors
    ///
    /// Returns an error if a node cannot be rendered.
    pub fn to_table(&self) -> Result<Table, Error> {
        let mut document = Table::new();
        for role in Role::ALL {
            let group = self
                .nodes
                .iter()
                .filter(|node| node.role() == role)
                .map(|node| {
                    let fields = typed_fields(node.as_ref())?;
                    Ok((node.name().to_string(), Value::Table(fields)))
                })
                .collect::<Result<Table, Error>>()?;
            document.insert(role.group().to_string(), Value::Table(group));
        }
        Ok(document)
    }

    /// Render the nodes, or the `range` slice of them, in the given view.
    ///
    /// # Errors
    ///
    /// Returns an error if a node cannot be rendered.
    pub fn list(&self, view: View, range: Option<Range<usize>>) -> Result<Listing, Error> {
        let (nodes, content_range) = match range {
            Some(requested) => {
                let content_range = ContentRange::clamp(&requested, self.nodes.len());
                (
                    &self.nodes[content_range.low..content_range.high],
                    Some(content_range),
                )
            }
            None => (&self.nodes[..], None),
        };
        let items = nodes
            .iter()
            .map(|node| {
                let table = match view {
                    View::Fields => typed_fields(node.as_ref())?,
                    View::Display => node.display().map_err(|source| Error::Schema {
                        key: node.key(),
                        source,
                    })?,
                };
                Ok(serde_json::to_value(table)?)
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Listing {
            items,
            content_range,
        })
    }

    /// The nodes in document order.
    #[must_use]
    pub fn nodes(&self) -> &[Box<dyn Node>] {
        &self.nodes
    }

    /// Keys of the nodes in document order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.nodes.iter().map(|node| node.key()).collect()
    }

    /// The node with the given key, e.g. `sink.es_cluster`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&dyn Node> {
        self.nodes
            .iter()
            .find(|node| node.key() == key)
            .map(AsRef::as_ref)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A node's fields with `type` put back, as written to text.
fn typed_fields(node: &dyn Node) -> Result<Table, Error> {
    let mut fields = node.fields().map_err(|source| Error::Schema {
        key: node.key(),
        source,
    })?;
    fields.insert(
        "type".to_string(),
        Value::String(node.type_tag().to_string()),
    );
    Ok(fields)
}

fn read_nodes(registry: &Registry, text: &str) -> Result<Vec<Box<dyn Node>>, Error> {
    let document: Table = text.parse()?;
    if let Some(unexpected) = document.keys().find(|key| Role::from_group(key).is_none()) {
        return Err(Error::Malformed(format!(
            "unexpected top-level table `{unexpected}`, expected one of sources, transforms, sinks"
        )));
    }

    // Nodes are kept in the order they are written, group by group.
    let mut nodes = Vec::new();
    for (group_name, group) in document {
        let Some(role) = Role::from_group(&group_name) else {
            continue;
        };
        let group = match group {
            Value::Table(group) => group,
            other => {
                return Err(Error::Malformed(format!(
                    "`{group_name}` must be a table, found {}",
                    other.type_str()
                )));
            }
        };
        for (name, attributes) in group {
            let Value::Table(mut attributes) = attributes else {
                return Err(Error::Malformed(format!(
                    "`{}.{name}` must be a table",
                    role.group()
                )));
            };
            let type_tag = match attributes.remove("type") {
                Some(Value::String(type_tag)) => type_tag,
                Some(other) => {
                    return Err(Error::Malformed(format!(
                        "`{}.{name}.type` must be a string, found {}",
                        role.group(),
                        other.type_str()
                    )));
                }
                None => {
                    return Err(Error::Malformed(format!(
                        "`{}.{name}` has no `type`",
                        role.group()
                    )));
                }
            };
            let factory = registry.resolve(role, &type_tag).map_err(|err| match err {
                registry::Error::UnknownNodeType { role, type_tag }
                | registry::Error::DuplicateRegistration { role, type_tag } => {
                    Error::NoSuchNodeType { role, type_tag }
                }
            })?;
            let key = format!("{role}.{name}");
            let node = factory
                .build(name, attributes)
                .map_err(|source| Error::Schema { key, source })?;
            debug!(key = %node.key(), type_tag = node.type_tag(), "read node");
            nodes.push(node);
        }
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use proptest::{collection, prelude::*};

    use super::*;
    use crate::registry::global;

    const NGINX: &str = r#"
[sources.nginx_error_log]
type = 'file'
include = ['/var/log/nginx*.log']
start_at_beginning = false
ignore_older = 86400
[transforms.nginx_error_parser]
inputs = ['nginx_error_log']
type = 'tokenizer'
field_names = ['timestamp', 'message']
[transforms.nginx_transaction_sampler]
inputs = ['nginx_error_parser']
type = 'sampler'
key_field = 'request_id'
rate = 10
[sinks.es_cluster]
inputs = ['nginx_transaction_sampler']
type = 'elasticsearch'
host = '123.123.123.123:5000'
"#;

    /// (role, name, fields) of every node, sorted, for order-free comparison.
    fn contents(document: &Document) -> Vec<(Role, String, String)> {
        let mut contents: Vec<_> = document
            .nodes()
            .iter()
            .map(|node| {
                let fields = node.fields().expect("renderable node");
                (node.role(), node.name().to_string(), fields.to_string())
            })
            .collect();
        contents.sort();
        contents
    }

    #[test]
    fn nginx_document() -> Result<(), Error> {
        let document = Document::from_text(global(), NGINX)?;
        assert_eq!(document.len(), 4);
        assert_eq!(
            document.keys(),
            vec![
                "source.nginx_error_log",
                "transform.nginx_error_parser",
                "transform.nginx_transaction_sampler",
                "sink.es_cluster",
            ]
        );
        Ok(())
    }

    #[test]
    fn round_trip_keeps_content() -> Result<(), Error> {
        let document = Document::from_text(global(), NGINX)?;
        let text = document.serialize()?;
        let again = Document::from_text(global(), &text)?;
        assert_eq!(contents(&document), contents(&again));
        assert_eq!(again.serialize()?, text);
        Ok(())
    }

    #[test]
    fn serialize_emits_defaults() -> Result<(), Error> {
        let document = Document::from_text(global(), NGINX)?;
        let table = document.to_table()?;
        let parser = table
            .get("transforms")
            .and_then(|group| group.get("nginx_error_parser"))
            .and_then(Value::as_table)
            .expect("parser present");
        assert_eq!(parser.get("type"), Some(&Value::String("tokenizer".to_string())));
        assert_eq!(parser.get("field"), Some(&Value::String("message".to_string())));
        assert_eq!(parser.get("drop_field"), Some(&Value::Boolean(true)));
        Ok(())
    }

    #[test]
    fn empty_document_has_every_group() -> Result<(), Error> {
        let table = Document::new().to_table()?;
        let groups: Vec<&str> = table.keys().map(String::as_str).collect();
        assert_eq!(groups, vec!["sources", "transforms", "sinks"]);
        let document = Document::from_text(global(), &Document::new().serialize()?)?;
        assert!(document.is_empty());
        Ok(())
    }

    #[test]
    fn deserialize_replaces_contents() -> Result<(), Error> {
        let mut document = Document::from_text(global(), NGINX)?;
        document.deserialize(
            global(),
            "[sources.gen]\ntype = 'generator'\nlines = ['hello']",
        )?;
        assert_eq!(document.keys(), vec!["source.gen"]);
        Ok(())
    }

    #[test]
    fn failed_deserialize_leaves_contents() -> Result<(), Error> {
        let mut document = Document::from_text(global(), NGINX)?;
        let err = document
            .deserialize(global(), "[sources.gen]\ntype = 'generator'")
            .expect_err("lines missing");
        assert!(matches!(err, Error::Schema { ref key, .. } if key == "source.gen"));
        assert!(err.is_client_error());
        assert_eq!(document.len(), 4);
        Ok(())
    }

    #[test]
    fn unknown_type_tag() {
        let err = Document::from_text(global(), "[transforms.t]\ntype = 'remap'")
            .expect_err("remap is not registered");
        assert!(matches!(
            err,
            Error::NoSuchNodeType { role: Role::Transform, ref type_tag } if type_tag == "remap"
        ));

        let err = Document::from_text(global(), "[sources.t]\ntype = 'elasticsearch'")
            .expect_err("elasticsearch is a sink");
        assert!(matches!(err, Error::NoSuchNodeType { role: Role::Source, .. }));
    }

    #[test]
    fn malformed_shapes() {
        let cases = [
            "[pipelines.x]\ntype = 'file'",
            "sources = 3",
            "sources = { x = 1 }",
            "[sources.x]\ninclude = []",
            "[sources.x]\ntype = 1",
        ];
        for text in cases {
            let err = Document::from_text(global(), text).expect_err(text);
            assert!(matches!(err, Error::Malformed(_)), "{text}: {err}");
            assert!(err.is_client_error());
        }

        let err = Document::from_text(global(), "[sources").expect_err("not toml");
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn type_is_not_passed_to_variant() -> Result<(), Error> {
        let document = Document::from_text(global(), NGINX)?;
        let source = document.get("source.nginx_error_log").expect("source");
        assert!(source.fields().expect("fields").get("type").is_none());
        Ok(())
    }

    #[test]
    fn display_listing() -> Result<(), Error> {
        let document = Document::from_text(global(), NGINX)?;
        let listing = document.list(View::Display, None)?;
        assert_eq!(listing.content_range, None);
        let ids: Vec<&str> = listing
            .items
            .iter()
            .filter_map(|item| item.get("id").and_then(serde_json::Value::as_str))
            .collect();
        assert_eq!(
            ids,
            vec![
                "source.nginx_error_log",
                "transform.nginx_error_parser",
                "transform.nginx_transaction_sampler",
                "sink.es_cluster",
            ]
        );
        assert_eq!(listing.items[3]["role"], "sink");
        assert_eq!(listing.items[3]["host"], "123.123.123.123:5000");

        let fields = document.list(View::Fields, None)?;
        assert!(fields.items[3].get("id").is_none());
        assert_eq!(fields.items[0]["type"], "file");
        assert_eq!(fields.items[3]["type"], "elasticsearch");
        Ok(())
    }

    #[test]
    fn fields_listing_tells_roles_apart_by_type() -> Result<(), Error> {
        let document = Document::from_text(
            global(),
            r#"
[sources.logs]
type = "file"
include = ["/var/log/*.log"]

[sinks.archive]
type = "file"
path = "/tmp/archive.log"
encoding = { codec = "ndjson", timestamp_format = "rfc3339" }
"#,
        )?;
        let listing = document.list(View::Fields, None)?;
        assert_eq!(listing.items[0]["type"], "file");
        assert!(listing.items[0].get("include").is_some());
        assert_eq!(listing.items[1]["type"], "file");
        assert!(listing.items[1].get("path").is_some());
        Ok(())
    }

    const OUT_OF_ORDER: &str = r#"
[sinks.out]
type = "console"
inputs = ["zeta"]
encoding = { codec = "text", timestamp_format = "unix" }

[transforms.zeta]
type = "sampler"
rate = 2

[transforms.alpha]
type = "sampler"
inputs = ["zeta"]
rate = 3
"#;

    #[test]
    fn nodes_keep_written_order() -> Result<(), Error> {
        let document = Document::from_text(global(), OUT_OF_ORDER)?;
        assert_eq!(
            document.keys(),
            vec!["sink.out", "transform.zeta", "transform.alpha"]
        );

        let listing = document.list(View::Display, Some(1..3))?;
        let names: Vec<&str> = listing
            .items
            .iter()
            .filter_map(|item| item.get("name").and_then(serde_json::Value::as_str))
            .collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        Ok(())
    }

    #[test]
    fn round_trip_regroups_by_role_and_keeps_order_within() -> Result<(), Error> {
        let document = Document::from_text(global(), OUT_OF_ORDER)?;
        let again = Document::from_text(global(), &document.serialize()?)?;
        assert_eq!(
            again.keys(),
            vec!["transform.zeta", "transform.alpha", "sink.out"]
        );
        Ok(())
    }

    #[test]
    fn pagination() -> Result<(), Error> {
        let text: String = (0..10)
            .map(|i| format!("[sources.gen_{i:02}]\ntype = 'generator'\nlines = ['{i}']\n"))
            .collect();
        let document = Document::from_text(global(), &text)?;

        let listing = document.list(View::Display, Some(2..5))?;
        assert_eq!(listing.items.len(), 3);
        assert_eq!(
            listing.content_range,
            Some(ContentRange {
                low: 2,
                high: 5,
                total: 10
            })
        );
        assert_eq!(listing.items[0]["name"], "gen_02");
        assert_eq!(listing.items[2]["name"], "gen_04");
        assert_eq!(
            listing.content_range.map(|r| r.to_string()).as_deref(),
            Some("nodes 2-5/10")
        );

        let listing = document.list(View::Fields, Some(8..50))?;
        assert_eq!(listing.items.len(), 2);
        assert_eq!(listing.content_range.map(|r| r.high), Some(10));

        let listing = document.list(View::Fields, Some(12..20))?;
        assert!(listing.items.is_empty());
        Ok(())
    }

    fn sampler() -> impl Strategy<Value = String> {
        ("[a-z]{1,8}", 1u32..1_000, proptest::option::of("[a-z_]{1,8}")).prop_map(
            |(input, rate, key_field)| {
                let key_field = key_field
                    .map(|key| format!("key_field = '{key}'\n"))
                    .unwrap_or_default();
                format!("type = 'sampler'\ninputs = ['{input}']\nrate = {rate}\n{key_field}")
            },
        )
    }

    fn file_source() -> impl Strategy<Value = String> {
        (
            collection::vec("/[a-z]{1,8}/\\*\\.log", 1..4),
            any::<bool>(),
            proptest::option::of(0u32..100_000),
        )
            .prop_map(|(include, oldest_first, ignore_older)| {
                let include: Vec<String> = include.iter().map(|p| format!("'{p}'")).collect();
                let ignore_older = ignore_older
                    .map(|secs| format!("ignore_older = {secs}\n"))
                    .unwrap_or_default();
                format!(
                    "type = 'file'\ninclude = [{}]\noldest_first = {oldest_first}\n{ignore_older}",
                    include.join(", ")
                )
            })
    }

    proptest! {
        #[test]
        fn content_survives_round_trip(
            sources in collection::btree_map("[a-z]{1,6}", file_source(), 0..4),
            transforms in collection::btree_map("[a-z]{1,6}", sampler(), 0..4),
        ) {
            let mut text = String::new();
            for (name, body) in &sources {
                text.push_str(&format!("[sources.{name}]\n{body}\n"));
            }
            for (name, body) in &transforms {
                text.push_str(&format!("[transforms.{name}]\n{body}\n"));
            }
            let document = Document::from_text(global(), &text).expect("valid document");
            prop_assert_eq!(document.len(), sources.len() + transforms.len());

            let serialized = document.serialize().expect("serializable");
            let again = Document::from_text(global(), &serialized).expect("round trip");
            prop_assert_eq!(contents(&document), contents(&again));
        }
    }
}
