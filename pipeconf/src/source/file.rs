//! The file source.
//!
//! Tails local files matched by `include` globs and emits one event per
//! line, or per aggregated message when `multiline` is set.

use serde::Serialize;

use crate::{
    kinds::Role,
    options::{FileFingerprinting, FileMultilineConf},
    schema::{Reader, Variant},
};

/// Type tag of [`Config`].
pub const TYPE: &str = "file";

fn default_file_key() -> String {
    "file".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Configuration of the file source
pub struct Config {
    /// Name of this node
    #[serde(skip)]
    pub name: String,
    /// Directory where checkpoints are persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Glob patterns to leave out
    pub exclude: Vec<String>,
    /// Event field holding the originating file path
    pub file_key: String,
    /// How files are told apart
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprinting: Option<FileFingerprinting>,
    /// Delay between file discovery runs, in milliseconds
    pub glob_minimum_cooldown: u64,
    /// Event field holding the current host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_key: Option<String>,
    /// Ignore files not modified in this many seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_older: Option<u64>,
    /// Glob patterns of files to read
    pub include: Vec<String>,
    /// Lines longer than this are discarded
    pub max_line_bytes: u64,
    /// Bytes read from one file before moving to the next
    pub max_read_bytes: u64,
    /// Multiline aggregation, disabled when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiline: Option<FileMultilineConf>,
    /// Drain the oldest files first
    pub oldest_first: bool,
    /// Remove files this many seconds after reaching EOF
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_after: Option<u64>,
    /// Ignore stored checkpoints and read files from the start
    pub start_at_beginning: bool,
}

impl Variant for Config {
    const ROLE: Role = Role::Source;
    const TYPE: &'static str = TYPE;

    fn read(name: String, reader: &mut Reader) -> Self {
        Self {
            name,
            data_dir: reader.optional("data_dir"),
            exclude: reader.or("exclude", Vec::new()),
            file_key: reader.or("file_key", default_file_key()),
            fingerprinting: reader.section("fingerprinting"),
            glob_minimum_cooldown: reader.or("glob_minimum_cooldown", 1_000),
            host_key: reader.optional("host_key"),
            ignore_older: reader.optional("ignore_older"),
            include: reader.required("include"),
            max_line_bytes: reader.or("max_line_bytes", 102_400),
            max_read_bytes: reader.or("max_read_bytes", 2_048),
            multiline: reader.section("multiline"),
            oldest_first: reader.or("oldest_first", false),
            remove_after: reader.optional("remove_after"),
            start_at_beginning: reader.or("start_at_beginning", false),
        }
    }

    fn node_name(&self) -> &str {
        &self.name
    }
}
