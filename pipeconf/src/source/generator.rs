//! The generator source.
//!
//! Emits a fixed list of lines, optionally a bounded number of times. Mostly
//! useful for testing pipelines.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    kinds::Role,
    schema::{Reader, Variant},
};

/// Type tag of [`Config`].
pub const TYPE: &str = "generator";

const INFINITE: &str = "infinite";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "RawCount", into = "RawCount")]
/// Number of times the generator repeats its lines.
pub enum Count {
    /// Repeat forever, written as `"infinite"`
    #[default]
    Infinite,
    /// Repeat this many times
    Times(u64),
}

/// Every shape `count` may take in text. Anything that is not a whole,
/// non-negative number or `"infinite"` lands in `Other` so the rejection
/// names the value.
#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum RawCount {
    Times(u64),
    Float(f64),
    Text(String),
    Other(toml::Value),
}

// 2^64, the first float past `u64::MAX`.
const FLOAT_TIMES_LIMIT: f64 = 18_446_744_073_709_551_616.0;

#[derive(Debug)]
struct InvalidCount(String);

impl fmt::Display for InvalidCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid count `{}`, expected a non-negative whole number or \"{INFINITE}\"",
            self.0
        )
    }
}

impl TryFrom<RawCount> for Count {
    type Error = InvalidCount;

    fn try_from(raw: RawCount) -> Result<Self, Self::Error> {
        match raw {
            RawCount::Times(times) => Ok(Count::Times(times)),
            RawCount::Float(times) => {
                whole_times(times).ok_or_else(|| InvalidCount(times.to_string()))
            }
            RawCount::Text(text) if text == INFINITE => Ok(Count::Infinite),
            RawCount::Text(text) => Err(InvalidCount(text)),
            RawCount::Other(value) => Err(InvalidCount(value.to_string())),
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
fn whole_times(times: f64) -> Option<Count> {
    let whole = times.is_finite() && times.trunc() == times;
    (whole && (0.0..FLOAT_TIMES_LIMIT).contains(&times)).then_some(Count::Times(times as u64))
}

impl From<Count> for RawCount {
    fn from(count: Count) -> Self {
        match count {
            Count::Infinite => RawCount::Text(INFINITE.to_string()),
            Count::Times(times) => RawCount::Times(times),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Configuration of the generator source
pub struct Config {
    /// Name of this node
    #[serde(skip)]
    pub name: String,
    /// Pause between batches of lines, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_interval: Option<f64>,
    /// How often the lines are repeated
    pub count: Count,
    /// Lines to emit
    pub lines: Vec<String>,
    /// Prefix every line with an increasing sequence number
    pub sequence: bool,
}

impl Variant for Config {
    const ROLE: Role = Role::Source;
    const TYPE: &'static str = TYPE;

    fn read(name: String, reader: &mut Reader) -> Self {
        Self {
            name,
            batch_interval: reader.optional("batch_interval"),
            count: reader.or("count", Count::Infinite),
            lines: reader.required("lines"),
            sequence: reader.or("sequence", false),
        }
    }

    fn node_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use toml::{Table, Value};

    use super::*;
    use crate::schema::{Error, construct};

    fn build(text: &str) -> Result<Config, Error> {
        let attributes: Table = text.parse().expect("test table must parse");
        let node = construct::<Config>("gen".to_string(), attributes)?;
        Ok(node
            .as_any()
            .downcast_ref::<Config>()
            .expect("generator source")
            .clone())
    }

    #[test]
    fn count_defaults_to_infinite() -> Result<(), Error> {
        let config = build("lines = ['a', 'b']")?;
        assert_eq!(config.count, Count::Infinite);
        assert!(config.batch_interval.is_none());
        assert!(!config.sequence);
        Ok(())
    }

    #[test]
    fn count_forms() -> Result<(), Error> {
        assert_eq!(build("lines = []\ncount = 3")?.count, Count::Times(3));
        assert_eq!(build("lines = []\ncount = 'infinite'")?.count, Count::Infinite);

        let err = build("lines = []\ncount = 'forever'").expect_err("must fail");
        assert_eq!(err.violations()[0].field, "count");
        Ok(())
    }

    #[test]
    fn whole_float_counts_are_accepted() -> Result<(), Error> {
        assert_eq!(build("lines = []\ncount = 2.0")?.count, Count::Times(2));
        assert_eq!(build("lines = []\ncount = 0.0")?.count, Count::Times(0));
        Ok(())
    }

    #[test]
    fn rejected_counts_name_the_value() {
        let cases = [
            ("count = 2.5", "invalid count `2.5`"),
            ("count = -3", "invalid count `-3`"),
            ("count = 'forever'", "invalid count `forever`"),
            ("count = true", "invalid count `true`"),
        ];
        for (count, reason) in cases {
            let err = build(&format!("lines = []\n{count}")).expect_err(count);
            let violations = err.violations();
            assert_eq!(violations.len(), 1, "{count}");
            assert_eq!(violations[0].field, "count");
            assert!(
                violations[0].reason.starts_with(reason),
                "{count}: {}",
                violations[0].reason
            );
        }
    }

    #[test]
    fn count_renders_back() -> Result<(), Error> {
        let node = construct::<Config>(
            "gen".to_string(),
            "lines = ['x']\nbatch_interval = 0.5".parse().expect("table"),
        )?;
        let fields = node.fields()?;
        assert_eq!(fields.get("count"), Some(&Value::String("infinite".to_string())));
        assert_eq!(fields.get("batch_interval"), Some(&Value::Float(0.5)));

        let node = construct::<Config>(
            "gen".to_string(),
            "lines = ['x']\ncount = 7".parse().expect("table"),
        )?;
        assert_eq!(node.fields()?.get("count"), Some(&Value::Integer(7)));
        Ok(())
    }
}
