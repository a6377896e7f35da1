//! Enumerated value types shared by node schemas.
//!
//! Every enum here is a closed set of string constants. In configuration
//! text they appear in `snake_case`, e.g. `strategy = "device_and_inode"`.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
/// The pipeline position of a node.
pub enum Role {
    /// A node that produces events.
    Source,
    /// A node that consumes events from `inputs` and emits new ones.
    Transform,
    /// A node that ships events out of the pipeline.
    Sink,
}

impl Role {
    /// All roles, in the order groups appear in a document.
    pub const ALL: [Role; 3] = [Role::Source, Role::Transform, Role::Sink];

    /// The singular name of the role, used in node keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Source => "source",
            Role::Transform => "transform",
            Role::Sink => "sink",
        }
    }

    /// The name of the top-level table holding nodes of this role.
    #[must_use]
    pub fn group(self) -> &'static str {
        match self {
            Role::Source => "sources",
            Role::Transform => "transforms",
            Role::Sink => "sinks",
        }
    }

    /// Look up the role owning a top-level table name.
    #[must_use]
    pub fn from_group(group: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.group() == group)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
/// How a file source tells files apart.
pub enum FingerprintStrategy {
    /// Checksum the first bytes of the file.
    #[default]
    Checksum,
    /// Use the device and inode numbers.
    DeviceAndInode,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
/// How `condition_pattern` of a multiline config is interpreted.
pub enum MultilineMode {
    /// Every line matching the condition belongs to the current message.
    #[default]
    ContinueThrough,
    /// Lines matching the condition and the line after belong to the message.
    ContinuePast,
    /// Lines up to, not including, a match belong to the message.
    HaltBefore,
    /// Lines up to and including a match belong to the message.
    HaltWith,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
/// Codec used to encode events before writing them out.
pub enum EncodingCodec {
    /// Newline delimited JSON.
    #[default]
    Ndjson,
    /// The raw `message` field.
    Text,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
/// How event timestamps are rendered.
pub enum TimestampFormat {
    /// RFC 3339 strings.
    #[default]
    Rfc3339,
    /// Seconds since the unix epoch.
    Unix,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
/// Standard stream a console sink writes to.
pub enum StdStream {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
/// Scalar kinds a tokenizer may coerce fields into.
pub enum ValueKind {
    /// `true` or `false`.
    Bool,
    /// A 64-bit float.
    Float,
    /// A 64-bit signed integer.
    Int,
    /// Left as is.
    #[default]
    String,
    /// A timestamp.
    Timestamp,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
/// Request body compression for network sinks.
pub enum Compression {
    /// No compression.
    #[default]
    None,
    /// Gzip compression.
    Gzip,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
/// Where a sink buffers events.
pub enum BufferType {
    /// In memory, bounded by event count.
    #[default]
    Memory,
    /// On disk, bounded by bytes.
    Disk,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
/// Behavior of a full buffer.
pub enum WhenFull {
    /// Apply back pressure upstream.
    #[default]
    Block,
    /// Drop the incoming event.
    DropNewest,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
/// Authentication modes of the Elasticsearch sink.
pub enum EsAuthStrategy {
    /// AWS request signing.
    #[default]
    Aws,
    /// HTTP basic authentication.
    Basic,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
/// Authentication modes of the ClickHouse sink.
pub enum ClickHouseAuthStrategy {
    /// HTTP basic authentication.
    #[default]
    Basic,
    /// Bearer token authentication.
    Bearer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_groups_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::from_group(role.group()), Some(role));
        }
        assert_eq!(Role::from_group("source"), None);
        assert_eq!(Role::from_group("pipelines"), None);
    }

    #[test]
    fn enums_use_snake_case() -> Result<(), toml::de::Error> {
        let strategy: FingerprintStrategy =
            toml::Value::String("device_and_inode".to_string()).try_into()?;
        assert_eq!(strategy, FingerprintStrategy::DeviceAndInode);

        let when_full: WhenFull = toml::Value::String("drop_newest".to_string()).try_into()?;
        assert_eq!(when_full, WhenFull::DropNewest);
        Ok(())
    }

    #[test]
    fn out_of_set_value_is_rejected() {
        let codec: Result<EncodingCodec, _> = toml::Value::String("yaml".to_string()).try_into();
        assert!(codec.is_err());
    }
}
