//! Repository models.
//!
//! These types are what the host sees: documents described by their path,
//! and timestamps in the host's `(seconds, nanos)` wire form.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use time::OffsetDateTime;

/// Wire timestamp: seconds and nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}
impl Timestamp {
    pub fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    /// Convert back into an instant. Returns `None` when the timestamp is
    /// outside the range `time` can represent, or `nanos` is out of bounds.
    pub fn to_datetime(self) -> Option<OffsetDateTime> {
        if !(0..1_000_000_000).contains(&self.nanos) {
            return None;
        }
        let nanos = i128::from(self.seconds) * 1_000_000_000 + i128::from(self.nanos);
        OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
    }
}
impl From<OffsetDateTime> for Timestamp {
    fn from(datetime: OffsetDateTime) -> Self {
        // Always in 0..1_000_000_000, fits an i32.
        let nanos = datetime.nanosecond() as i32;
        Self { seconds: datetime.unix_timestamp(), nanos }
    }
}
impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        OffsetDateTime::from(time).into()
    }
}

/// A filesystem item as seen by the repository model.
///
/// Produced by enumeration (where `id` is the path of the backing file) and
/// received by the writer (where `id` is whatever the source repository
/// used, and gets rewritten to the destination path).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Filesystem path of the backing file
    pub id: String,
    /// Base file name
    pub name: String,
    pub created: Option<Timestamp>,
    pub modified: Option<Timestamp>,
    /// Derived from the file name's extension
    pub mime_type: String,
    /// Size in bytes
    pub size: u64,
    /// Normalized parent directory, root and drive letter stripped
    pub parent_path: String,
}
impl Document {
    /// Last-modified time in epoch milliseconds, as used by date filters.
    ///
    /// Documents without a modification time are treated as modified at
    /// the epoch.
    pub fn modified_millis(&self) -> i64 {
        self.modified
            .map(|ts| ts.seconds.saturating_mul(1_000).saturating_add(i64::from(ts.nanos) / 1_000_000))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_timestamp_from_datetime() {
        let ts = Timestamp::from(datetime!(2021-10-01 00:00:00.5 UTC));
        assert_eq!(ts, Timestamp::new(1_633_046_400, 500_000_000));
        assert_eq!(ts.to_datetime(), Some(datetime!(2021-10-01 00:00:00.5 UTC)));
    }

    #[test]
    fn test_timestamp_rejects_bad_nanos() {
        assert_eq!(Timestamp::new(0, -1).to_datetime(), None);
        assert_eq!(Timestamp::new(0, 1_000_000_000).to_datetime(), None);
        assert_eq!(Timestamp::new(i64::MAX, 0).to_datetime(), None);
    }

    #[test]
    fn test_modified_millis() {
        let doc = Document {
            modified: Some(Timestamp::new(1_625_506_960, 301_000_000)),
            ..Default::default()
        };
        assert_eq!(doc.modified_millis(), 1_625_506_960_301);
        assert_eq!(Document::default().modified_millis(), 0);
    }
}
