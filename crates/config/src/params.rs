use crate::error::{ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Reserved parameter keys understood by the filesystem connector.
pub mod keys {
    /// Source directory (reader) or output root (writer).
    pub const FILE_PATH: &str = "filePath";
    /// Write sidecar metadata as Properties XML instead of `key=value` lines.
    pub const METADATA_AS_XML: &str = "metadataAsXml";
    /// Lower bound of the modification-time filter, epoch milliseconds.
    pub const START_TIME: &str = "startTime";
    /// Upper bound of the modification-time filter, epoch milliseconds.
    pub const END_TIME: &str = "endTime";
    /// Host asked for every version of a document to be deleted.
    pub const ALL_VERSIONS: &str = "allVersions";
    /// Host will fetch binaries for this enumeration pass.
    pub const INCLUDE_BINARIES: &str = "includeBinaries";

    /// Every reserved key, paired with its `snake_case` spelling (used to
    /// map environment variables back onto the host's key names).
    pub const ALL: [(&str, &str); 6] = [
        ("file_path", FILE_PATH),
        ("metadata_as_xml", METADATA_AS_XML),
        ("start_time", START_TIME),
        ("end_time", END_TIME),
        ("all_versions", ALL_VERSIONS),
        ("include_binaries", INCLUDE_BINARIES),
    ];
}

/// A single typed parameter value.
///
/// The host only ever sends strings, booleans and longs; anything else is
/// rejected at deserialization time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Long(i64),
    String(String),
}
impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Long(_) => "long",
            Self::String(_) => "string",
        }
    }
}
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}
impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}
impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}
impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Inclusive modification-time window in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}
impl TimeRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, millis: i64) -> bool {
        millis >= self.start && millis <= self.end
    }
}
impl Default for TimeRange {
    /// No filtering: everything modified on or after the Unix epoch.
    fn default() -> Self {
        Self { start: 0, end: i64::MAX }
    }
}

/// The host's per-operation configuration container.
///
/// # Examples
///
/// ```
/// use docfs_config::{Parameters, TimeRange, keys};
///
/// let params = Parameters::default()
///     .with(keys::FILE_PATH, "/srv/documents")
///     .with(keys::START_TIME, 1_000_i64);
/// assert_eq!(params.string(keys::FILE_PATH).unwrap(), "/srv/documents");
/// assert_eq!(params.date_filter().unwrap(), TimeRange::new(1_000, i64::MAX));
/// assert!(params.metadata_as_xml().unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(HashMap<String, Value>);

impl Parameters {
    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn string(&self, key: &str) -> Result<&str> {
        match self.required(key)? {
            Value::String(s) => Ok(s),
            other => exn::bail!(Self::wrong_type(key, "string", other)),
        }
    }

    pub fn boolean(&self, key: &str) -> Result<bool> {
        match self.required(key)? {
            Value::Boolean(b) => Ok(*b),
            other => exn::bail!(Self::wrong_type(key, "boolean", other)),
        }
    }

    pub fn long(&self, key: &str) -> Result<i64> {
        match self.required(key)? {
            Value::Long(l) => Ok(*l),
            other => exn::bail!(Self::wrong_type(key, "long", other)),
        }
    }

    /// Configured source directory (reader) or output root (writer).
    pub fn file_path(&self) -> Result<PathBuf> {
        self.string(keys::FILE_PATH).map(PathBuf::from)
    }

    /// Sidecar format flag. The host form defaults the checkbox to ticked.
    pub fn metadata_as_xml(&self) -> Result<bool> {
        self.optional(keys::METADATA_AS_XML, Self::boolean).map(|v| v.unwrap_or(true))
    }

    /// Modification-time filter; absent bounds mean "no filtering".
    pub fn date_filter(&self) -> Result<TimeRange> {
        let default = TimeRange::default();
        let start = self.optional(keys::START_TIME, Self::long)?.unwrap_or(default.start);
        let end = self.optional(keys::END_TIME, Self::long)?.unwrap_or(default.end);
        Ok(TimeRange { start, end })
    }

    pub fn include_binaries(&self) -> Result<bool> {
        self.optional(keys::INCLUDE_BINARIES, Self::boolean).map(|v| v.unwrap_or(false))
    }

    pub fn delete_all_versions(&self) -> Result<bool> {
        self.optional(keys::ALL_VERSIONS, Self::boolean).map(|v| v.unwrap_or(false))
    }

    fn required(&self, key: &str) -> Result<&Value> {
        self.0.get(key).ok_or_else(|| exn::Exn::from(ErrorKind::Missing(key.to_string())))
    }

    fn optional<T>(&self, key: &str, read: impl Fn(&Self, &str) -> Result<T>) -> Result<Option<T>> {
        match self.0.contains_key(key) {
            true => read(self, key).map(Some),
            false => Ok(None),
        }
    }

    fn wrong_type(key: &str, expected: &'static str, actual: &Value) -> ErrorKind {
        tracing::debug!(key, expected, actual = actual.type_name(), "Parameter has unexpected type");
        ErrorKind::WrongType { key: key.to_string(), expected }
    }
}
impl FromIterator<(String, Value)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_typed_getters() {
        let params = Parameters::default()
            .with(keys::FILE_PATH, "/tmp/source")
            .with(keys::METADATA_AS_XML, false)
            .with(keys::START_TIME, 42_i64);
        assert_eq!(params.string(keys::FILE_PATH).unwrap(), "/tmp/source");
        assert_eq!(params.file_path().unwrap(), PathBuf::from("/tmp/source"));
        assert!(!params.boolean(keys::METADATA_AS_XML).unwrap());
        assert_eq!(params.long(keys::START_TIME).unwrap(), 42);
    }

    #[test]
    fn test_missing_parameter() {
        let err = Parameters::default().file_path().unwrap_err();
        assert_eq!(&*err, &ErrorKind::Missing(keys::FILE_PATH.to_string()));
    }

    #[test]
    fn test_wrong_type() {
        let params = Parameters::default().with(keys::START_TIME, "yesterday");
        let err = params.date_filter().unwrap_err();
        assert!(matches!(&*err, ErrorKind::WrongType { expected: "long", .. }));
    }

    #[test]
    fn test_defaults() {
        let params = Parameters::default();
        assert!(params.metadata_as_xml().unwrap());
        assert!(!params.include_binaries().unwrap());
        assert!(!params.delete_all_versions().unwrap());
        assert_eq!(params.date_filter().unwrap(), TimeRange::new(0, i64::MAX));
    }

    #[test]
    fn test_date_filter_bounds() {
        let params = Parameters::default()
            .with(keys::START_TIME, 1_625_506_960_301_i64)
            .with(keys::END_TIME, 1_635_506_960_301_i64);
        assert_eq!(params.date_filter().unwrap(), TimeRange::new(1_625_506_960_301, 1_635_506_960_301));
    }

    #[rstest]
    #[case(0, true)]
    #[case(10, true)]
    #[case(20, true)]
    #[case(-1, false)]
    #[case(21, false)]
    fn test_time_range_is_inclusive(#[case] millis: i64, #[case] expected: bool) {
        assert_eq!(TimeRange::new(0, 20).contains(millis), expected);
    }

    #[test]
    fn test_deserialize_untagged_values() {
        let params: Parameters =
            serde_json::from_str(r#"{"filePath": "/data", "allVersions": true, "endTime": 99}"#).unwrap();
        assert_eq!(params.get(keys::FILE_PATH), Some(&Value::String("/data".to_string())));
        assert!(params.delete_all_versions().unwrap());
        assert_eq!(params.date_filter().unwrap().end, 99);
    }
}
