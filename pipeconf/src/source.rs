//! Source node kinds
//!
//! Sources sit at the head of a pipeline and have no `inputs`. Each kind
//! lives in its own module and exposes a `Config` implementing
//! [`crate::schema::Variant`].

pub mod file;
pub mod generator;
