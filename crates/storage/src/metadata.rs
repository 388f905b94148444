//! Typed document metadata and its string encoding.
//!
//! Metadata arrives from the host as a map of keys to tagged values. Sidecar
//! files only hold strings, so every value is flattened through [`encode`].

use crate::models::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use time::format_description::well_known::Rfc3339;

/// Metadata keyed by name.
pub type Metadata = HashMap<String, MetadataEntry>;

/// Metadata key for a document's base file name.
pub const FILE_NAME: &str = "fileName";
/// Metadata key for a document's size in bytes.
pub const FILE_SIZE: &str = "fileSize";

/// One typed metadata value. Exactly one variant is ever populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetadataValue {
    String(String),
    LargeString(String),
    Integer(i32),
    Long(i64),
    Double(f64),
    Decimal(f32),
    Boolean(bool),
    Binary(Vec<u8>),
    Array(Vec<String>),
    DateTime(Timestamp),
}

/// A metadata slot as received from the host.
///
/// The host's message type allows a slot with no value set at all; that case
/// is kept explicit here instead of being dropped on the way in, so that the
/// encoder can report it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataEntry {
    pub value: Option<MetadataValue>,
}
impl MetadataEntry {
    pub fn empty() -> Self {
        Self { value: None }
    }
}
impl From<MetadataValue> for MetadataEntry {
    fn from(value: MetadataValue) -> Self {
        Self { value: Some(value) }
    }
}

/// The metadata the filesystem itself can vouch for: base name and size.
pub fn file_metadata(name: &str, size: u64) -> Metadata {
    Metadata::from([
        (FILE_NAME.to_string(), MetadataValue::String(name.to_string()).into()),
        (FILE_SIZE.to_string(), MetadataValue::Long(i64::try_from(size).unwrap_or(i64::MAX)).into()),
    ])
}

/// Encode a single metadata entry as the string stored in a sidecar file.
///
/// Returns `None` (and logs a warning naming `key`) when the entry has no
/// value, or holds a timestamp that cannot be represented as a date.
///
/// # Examples
///
/// ```
/// use docfs_storage::metadata::{MetadataEntry, MetadataValue, encode};
/// use docfs_storage::Timestamp;
///
/// let entry = MetadataEntry::from(MetadataValue::DateTime(Timestamp::new(1633046400, 0)));
/// assert_eq!(encode("dateTimeKey", &entry).as_deref(), Some("2021-10-01T00:00:00Z"));
///
/// let entry = MetadataEntry::from(MetadataValue::Binary(vec![0xac, 0x89]));
/// assert_eq!(encode("binaryKey", &entry).as_deref(), Some("ac89"));
///
/// assert_eq!(encode("emptyKey", &MetadataEntry::empty()), None);
/// ```
pub fn encode(key: &str, entry: &MetadataEntry) -> Option<String> {
    let Some(value) = &entry.value else {
        tracing::warn!(key, "Incompatible type, no value found for metadata key");
        return None;
    };
    match value {
        MetadataValue::Array(items) => {
            Some(items.iter().map(|item| format!("values: \"{}\"", escape(item))).collect::<Vec<_>>().join("\n"))
        },
        MetadataValue::Binary(bytes) => Some(hex::encode(bytes)),
        MetadataValue::Boolean(b) => Some(b.to_string()),
        // `Debug` keeps the trailing `.0` on integral values.
        MetadataValue::Double(d) => Some(format!("{d:?}")),
        MetadataValue::Decimal(d) => Some(format!("{d:?}")),
        MetadataValue::DateTime(ts) => {
            let formatted = ts.to_datetime().and_then(|dt| dt.format(&Rfc3339).ok());
            if formatted.is_none() {
                tracing::warn!(key, seconds = ts.seconds, nanos = ts.nanos, "Timestamp cannot be formatted as a date");
            }
            formatted
        },
        MetadataValue::Integer(i) => Some(i.to_string()),
        MetadataValue::LargeString(s) | MetadataValue::String(s) => Some(s.clone()),
        MetadataValue::Long(l) => Some(l.to_string()),
    }
}

/// Encode every entry, dropping keys that have no string form.
///
/// The result is ordered by key so sidecar files come out the same every
/// time for the same metadata.
pub fn encode_all(metadata: &Metadata) -> BTreeMap<String, String> {
    metadata.iter().filter_map(|(key, entry)| encode(key, entry).map(|value| (key.clone(), value))).collect()
}

/// Quote-escaping used inside `values: "..."` lines.
fn escape(item: &str) -> String {
    let mut escaped = String::with_capacity(item.len());
    for c in item.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(MetadataValue::Array(vec!["val1".into(), "val2".into()]), "values: \"val1\"\nvalues: \"val2\"")]
    #[case(MetadataValue::Binary(vec![0xac, 0x89]), "ac89")]
    #[case(MetadataValue::Boolean(true), "true")]
    #[case(MetadataValue::Boolean(false), "false")]
    #[case(MetadataValue::Double(123.456), "123.456")]
    #[case(MetadataValue::Decimal(789.01), "789.01")]
    #[case(MetadataValue::Double(1.0), "1.0")]
    #[case(MetadataValue::Decimal(2.0), "2.0")]
    #[case(MetadataValue::DateTime(Timestamp::new(1_633_046_400, 0)), "2021-10-01T00:00:00Z")]
    #[case(MetadataValue::DateTime(Timestamp::new(1_633_046_400, 250_000_000)), "2021-10-01T00:00:00.25Z")]
    #[case(MetadataValue::Integer(42), "42")]
    #[case(MetadataValue::LargeString("This is a large string".into()), "This is a large string")]
    #[case(MetadataValue::Long(123_456_789), "123456789")]
    #[case(MetadataValue::String("simpleString".into()), "simpleString")]
    fn test_encode(#[case] value: MetadataValue, #[case] expected: &str) {
        assert_eq!(encode("key", &value.into()).as_deref(), Some(expected));
    }

    #[test]
    fn test_encode_empty_entry() {
        assert_eq!(encode("emptyKey", &MetadataEntry::empty()), None);
    }

    #[test]
    fn test_encode_unrepresentable_timestamp() {
        let entry = MetadataEntry::from(MetadataValue::DateTime(Timestamp::new(i64::MAX, 0)));
        assert_eq!(encode("dateTimeKey", &entry), None);
    }

    #[test]
    fn test_encode_array_escapes_quotes() {
        let entry = MetadataEntry::from(MetadataValue::Array(vec![r#"say "hi""#.into()]));
        assert_eq!(encode("arrayKey", &entry).as_deref(), Some(r#"values: "say \"hi\"""#));
        let empty = MetadataEntry::from(MetadataValue::Array(vec![]));
        assert_eq!(encode("arrayKey", &empty).as_deref(), Some(""));
    }

    #[test]
    fn test_file_metadata() {
        let metadata = file_metadata("TestDoc.txt", 12);
        assert_eq!(metadata[FILE_NAME], MetadataValue::String("TestDoc.txt".into()).into());
        assert_eq!(metadata[FILE_SIZE], MetadataValue::Long(12).into());
    }

    #[test]
    fn test_encode_all_skips_empty_entries() {
        let metadata = Metadata::from([
            ("fileNumber".to_string(), MetadataValue::Integer(5).into()),
            ("fileCreator".to_string(), MetadataValue::String("user1".into()).into()),
            ("nothing".to_string(), MetadataEntry::empty()),
        ]);
        let encoded = encode_all(&metadata);
        assert_eq!(encoded.len(), 2);
        assert_eq!(encoded.get("fileNumber").map(String::as_str), Some("5"));
        assert_eq!(encoded.get("fileCreator").map(String::as_str), Some("user1"));
        assert!(!encoded.contains_key("nothing"));
    }
}
