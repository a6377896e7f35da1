//! Transform node kinds
//!
//! Transforms read from upstream nodes named in `inputs` and emit new
//! events. Whether `inputs` name real nodes is not checked here.

pub mod lua;
pub mod sampler;
pub mod tokenizer;
