//! File name to MIME type lookup.

/// Used when nothing better is known about a file.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Resolves a MIME type from a file name.
///
/// Implementations must always return something; unknown names map to
/// [`OCTET_STREAM`].
pub trait MimeLookup: Send + Sync {
    fn mime_type(&self, file_name: &str) -> String;
}

/// Extension-based lookup backed by the `mime_guess` database.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionLookup;

impl MimeLookup for ExtensionLookup {
    fn mime_type(&self, file_name: &str) -> String {
        mime_guess::from_path(file_name).first_raw().unwrap_or(OCTET_STREAM).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("TestDoc.txt", "text/plain")]
    #[case("photo.JPG", "image/jpeg")]
    #[case("report.pdf", "application/pdf")]
    #[case("no_extension", OCTET_STREAM)]
    #[case("weird.extension-nobody-uses", OCTET_STREAM)]
    fn test_extension_lookup(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(ExtensionLookup.mime_type(name), expected);
    }
}
