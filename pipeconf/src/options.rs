//! Option groups shared between node kinds.
//!
//! Each group is a [`Section`]: it reads its own fields out of a nested
//! table and may carry cross-field rules. Groups without rules only apply
//! defaults.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    kinds::{
        BufferType, ClickHouseAuthStrategy, EncodingCodec, EsAuthStrategy, FingerprintStrategy,
        MultilineMode, TimestampFormat, WhenFull,
    },
    schema::{Reader, Section},
};

/// Default `max_events` of a memory buffer.
pub const DEFAULT_MEMORY_MAX_EVENTS: u64 = 500;

/// Largest retry count a TOML integer can carry.
pub const UNLIMITED_RETRY_ATTEMPTS: u64 = i64::MAX as u64;

/// Plain string-to-string mapping, e.g. HTTP headers.
pub type StringMap = BTreeMap<String, String>;

/// Field lists of the encodings were once spelled `*_fileds`. Documents
/// using that spelling still load and are written back corrected.
fn read_field_list(reader: &mut Reader, field: &str, alias: &str) -> Vec<String> {
    reader.optional_alias(field, alias).unwrap_or_default()
}

fn present(field: Option<&String>) -> bool {
    field.is_some_and(|value| !value.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
/// How a file source fingerprints the files it watches.
pub struct FileFingerprinting {
    /// Bytes read to build the checksum
    pub fingerprint_bytes: u64,
    /// Leading bytes skipped before checksumming
    pub ignored_header_bytes: u64,
    /// Fingerprinting strategy
    pub strategy: FingerprintStrategy,
}

impl Default for FileFingerprinting {
    fn default() -> Self {
        Self {
            fingerprint_bytes: 256,
            ignored_header_bytes: 0,
            strategy: FingerprintStrategy::default(),
        }
    }
}

impl Section for FileFingerprinting {
    fn read(reader: &mut Reader) -> Self {
        let defaults = Self::default();
        Self {
            fingerprint_bytes: reader.or("fingerprint_bytes", defaults.fingerprint_bytes),
            ignored_header_bytes: reader.or("ignored_header_bytes", defaults.ignored_header_bytes),
            strategy: reader.or("strategy", defaults.strategy),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
/// Multiline aggregation of a file source.
pub struct FileMultilineConf {
    /// Pattern looked for by `mode`
    pub condition_pattern: String,
    /// How `condition_pattern` is interpreted
    pub mode: MultilineMode,
    /// Pattern marking the start of a message
    pub start_pattern: String,
    /// A buffered message is flushed after this many milliseconds
    pub timeout_ms: u64,
}

impl Section for FileMultilineConf {
    fn read(reader: &mut Reader) -> Self {
        Self {
            condition_pattern: reader.required("condition_pattern"),
            mode: reader.required("mode"),
            start_pattern: reader.required("start_pattern"),
            timeout_ms: reader.required("timeout_ms"),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
/// Encoding of the file and console sinks.
pub struct FileEncoding {
    /// Codec events are serialized with
    pub codec: EncodingCodec,
    /// Fields left out of the encoded event
    pub except_fields: Vec<String>,
    /// If not empty, the only fields encoded
    pub only_fields: Vec<String>,
    /// How timestamps are written
    pub timestamp_format: TimestampFormat,
}

impl Section for FileEncoding {
    fn read(reader: &mut Reader) -> Self {
        Self {
            codec: reader.required("codec"),
            except_fields: read_field_list(reader, "except_fields", "except_fileds"),
            only_fields: read_field_list(reader, "only_fields", "only_fileds"),
            timestamp_format: reader.required("timestamp_format"),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
/// Encoding of the database sinks, which always write structured events.
pub struct SinkEncoding {
    /// Fields left out of the encoded event
    pub except_fields: Vec<String>,
    /// If not empty, the only fields encoded
    pub only_fields: Vec<String>,
    /// How timestamps are written
    pub timestamp_format: TimestampFormat,
}

impl Section for SinkEncoding {
    fn read(reader: &mut Reader) -> Self {
        Self {
            except_fields: read_field_list(reader, "except_fields", "except_fileds"),
            only_fields: read_field_list(reader, "only_fields", "only_fileds"),
            timestamp_format: reader.required("timestamp_format"),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
/// Lua functions a lua transform calls into.
pub struct RuntimeHooks {
    /// Called once, before the first `process`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init: Option<String>,
    /// Called for every event
    pub process: String,
    /// Called when the pipeline stops
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutdown: Option<String>,
}

impl Section for RuntimeHooks {
    fn read(reader: &mut Reader) -> Self {
        Self {
            init: reader.optional("init"),
            process: reader.required("process"),
            shutdown: reader.optional("shutdown"),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
/// AWS settings of the Elasticsearch sink.
pub struct AwsOptions {
    /// AWS region of the cluster
    pub region: String,
}

impl Section for AwsOptions {
    fn read(reader: &mut Reader) -> Self {
        Self {
            region: reader.required("region"),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
/// Authentication of the Elasticsearch sink.
pub struct ElasticsearchAuth {
    /// ARN of a role to assume, `aws` only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assume_role: Option<String>,
    /// Password, `basic` only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Authentication mode
    pub strategy: EsAuthStrategy,
    /// User name, `basic` only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl Section for ElasticsearchAuth {
    fn read(reader: &mut Reader) -> Self {
        Self {
            assume_role: reader.optional("assume_role"),
            password: reader.optional("password"),
            strategy: reader.required("strategy"),
            user: reader.optional("user"),
        }
    }

    fn check(&self) -> Result<(), String> {
        match self.strategy {
            EsAuthStrategy::Basic => {
                if !present(self.user.as_ref()) {
                    return Err("user field is required for basic strategy".to_string());
                }
                if !present(self.password.as_ref()) {
                    return Err("password field is required for basic strategy".to_string());
                }
                if self.assume_role.is_some() {
                    return Err("assume_role field is not applicable for basic strategy".to_string());
                }
            }
            EsAuthStrategy::Aws => {
                if self.user.is_some() || self.password.is_some() {
                    return Err(
                        "user and password fields are not applicable for aws strategy".to_string(),
                    );
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
/// Authentication of the ClickHouse sink.
pub struct ClickHouseAuth {
    /// Password, `basic` only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Authentication mode
    pub strategy: ClickHouseAuthStrategy,
    /// Token, `bearer` only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// User name, `basic` only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl Section for ClickHouseAuth {
    fn read(reader: &mut Reader) -> Self {
        Self {
            password: reader.optional("password"),
            strategy: reader.required("strategy"),
            token: reader.optional("token"),
            user: reader.optional("user"),
        }
    }

    fn check(&self) -> Result<(), String> {
        match self.strategy {
            ClickHouseAuthStrategy::Basic => {
                if !present(self.user.as_ref()) {
                    return Err("user field is required for basic strategy".to_string());
                }
                if !present(self.password.as_ref()) {
                    return Err("password field is required for basic strategy".to_string());
                }
                if self.token.is_some() {
                    return Err("token field is not applicable for basic strategy".to_string());
                }
            }
            ClickHouseAuthStrategy::Bearer => {
                if !present(self.token.as_ref()) {
                    return Err("token field is required for bearer strategy".to_string());
                }
                if self.user.is_some() || self.password.is_some() {
                    return Err(
                        "user and password fields are not applicable for bearer strategy"
                            .to_string(),
                    );
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
/// Batching of outgoing requests.
pub struct BatchOptions {
    /// Maximum size of a batch in bytes
    pub max_bytes: u64,
    /// Maximum number of events in a batch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_events: Option<u64>,
    /// A partial batch is flushed after this many seconds
    pub timeout_secs: u64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_bytes: 10_490_000,
            max_events: None,
            timeout_secs: 1,
        }
    }
}

impl Section for BatchOptions {
    fn read(reader: &mut Reader) -> Self {
        let defaults = Self::default();
        Self {
            max_bytes: reader.or("max_bytes", defaults.max_bytes),
            max_events: reader.optional("max_events"),
            timeout_secs: reader.or("timeout_secs", defaults.timeout_secs),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
/// Buffering of events in front of a sink.
///
/// A `disk` buffer is bounded by `max_size` bytes and has no event bound. A
/// `memory` buffer is bounded by `max_events`, which takes
/// [`DEFAULT_MEMORY_MAX_EVENTS`] once the rules have passed.
pub struct BufferOptions {
    /// Buffer location
    #[serde(rename = "type")]
    pub kind: BufferType,
    /// Maximum number of buffered events, `memory` only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_events: Option<u64>,
    /// Maximum size of the buffer in bytes, `disk` only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    /// What happens when the buffer is full
    pub when_full: WhenFull,
}

impl BufferOptions {
    /// Apply the memory default for `max_events`. Call only once
    /// [`Section::check`] has passed.
    pub(crate) fn settle(&mut self) {
        if self.kind == BufferType::Memory && self.max_events.is_none() {
            self.max_events = Some(DEFAULT_MEMORY_MAX_EVENTS);
        }
    }
}

impl Section for BufferOptions {
    fn read(reader: &mut Reader) -> Self {
        Self {
            kind: reader.or("type", BufferType::default()),
            max_events: reader.optional("max_events"),
            max_size: reader.optional("max_size"),
            when_full: reader.or("when_full", WhenFull::default()),
        }
    }

    fn check(&self) -> Result<(), String> {
        if self.kind == BufferType::Disk {
            if self.max_size.is_none_or(|size| size == 0) {
                return Err("max_size field is required for disk buffer".to_string());
            }
            if self.max_events.is_some() {
                return Err("max_events field is not applicable for disk buffer".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
/// Request concurrency, rate limiting and retries of network sinks.
pub struct SinkRequestOptions {
    /// Maximum number of requests in flight
    pub in_flight_limit: u64,
    /// Window of the rate limit in seconds
    pub rate_limit_duration_secs: u64,
    /// Requests allowed per rate limit window
    pub rate_limit_num: u64,
    /// Maximum number of retries
    pub retry_attempts: u64,
    /// Backoff before the first retry in seconds
    pub retry_initial_backoff_secs: u64,
    /// Upper bound on backoff in seconds
    pub retry_max_duration_secs: u64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SinkRequestOptions {
    fn default() -> Self {
        Self {
            in_flight_limit: 5,
            rate_limit_duration_secs: 1,
            rate_limit_num: 5,
            retry_attempts: UNLIMITED_RETRY_ATTEMPTS,
            retry_initial_backoff_secs: 1,
            retry_max_duration_secs: 10,
            timeout_secs: 10,
        }
    }
}

impl Section for SinkRequestOptions {
    fn read(reader: &mut Reader) -> Self {
        let d = Self::default();
        Self {
            in_flight_limit: reader.or("in_flight_limit", d.in_flight_limit),
            rate_limit_duration_secs: reader
                .or("rate_limit_duration_secs", d.rate_limit_duration_secs),
            rate_limit_num: reader.or("rate_limit_num", d.rate_limit_num),
            retry_attempts: reader.or("retry_attempts", d.retry_attempts),
            retry_initial_backoff_secs: reader
                .or("retry_initial_backoff_secs", d.retry_initial_backoff_secs),
            retry_max_duration_secs: reader.or("retry_max_duration_secs", d.retry_max_duration_secs),
            timeout_secs: reader.or("timeout_secs", d.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// TLS settings of network sinks.
pub struct TlsOptions {
    /// CA certificate file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<String>,
    /// Client certificate file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crt_file: Option<String>,
    /// Client key file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
    /// Passphrase of `key_file`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_pass: Option<String>,
    /// Verify the peer certificate
    pub verify_certificate: bool,
    /// Verify the peer hostname
    pub verify_hostname: bool,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            ca_file: None,
            crt_file: None,
            key_file: None,
            key_pass: None,
            verify_certificate: true,
            verify_hostname: true,
        }
    }
}

impl Section for TlsOptions {
    fn read(reader: &mut Reader) -> Self {
        Self {
            ca_file: reader.optional("ca_file"),
            crt_file: reader.optional("crt_file"),
            key_file: reader.optional("key_file"),
            key_pass: reader.optional("key_pass"),
            verify_certificate: reader.or("verify_certificate", true),
            verify_hostname: reader.or("verify_hostname", true),
        }
    }
}
