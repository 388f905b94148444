//! Configuration Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction, the same way the storage crate reports failures.

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required parameter was not supplied by the host.
    #[display("missing parameter: {_0}")]
    Missing(#[error(not(source))] String),
    /// A parameter was supplied, but not with the type the connector needs.
    #[display("parameter `{key}` is not a {expected}")]
    WrongType { key: String, expected: &'static str },
    /// Configuration sources could not be read or merged.
    #[display("could not load configuration")]
    Load,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
