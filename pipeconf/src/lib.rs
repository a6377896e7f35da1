//! Pipeline configuration schemas and documents.
//!
//! A pipeline is described by typed nodes: sources produce events,
//! transforms reshape them and sinks deliver them. This library reads such a
//! description from TOML, validates every node against the schema of its
//! kind and writes it back out with all defaults made explicit.
//!
//! Node kinds are looked up at runtime in a [`registry::Registry`], so kinds
//! defined outside this crate can take part alongside the built-in ones.

#![deny(clippy::all)]
#![deny(clippy::cargo)]
#![deny(clippy::pedantic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(missing_debug_implementations)]
#![allow(clippy::multiple_crate_versions)]

pub mod document;
pub mod kinds;
pub mod options;
pub mod registry;
pub mod schema;
pub mod sink;
pub mod source;
pub mod store;
pub mod transform;
