//! Path normalization for the wire protocol and for destination paths.
//!
//! The host speaks in plain strings: document ids are filesystem paths and
//! parent paths may carry drive letters (`C:`), trailing separators, or
//! colon-separated segments. These helpers turn them into something stable.

use std::path::{Component, MAIN_SEPARATOR, MAIN_SEPARATOR_STR, Path, PathBuf};

/// Strips trailing `/` and `:` characters, then turns every remaining `:`
/// into `/`.
///
/// # Examples
///
/// ```
/// use docfs_storage::sanitize;
/// assert_eq!(sanitize("a:b/c/d.jpg/"), "a/b/c/d.jpg");
/// assert_eq!(sanitize("C:/Users/me/"), "C//Users/me");
/// assert_eq!(sanitize(":////"), "");
/// assert_eq!(sanitize(""), "");
/// ```
pub fn sanitize(path: &str) -> String {
    path.trim_end_matches(['/', ':']).replace(':', "/")
}

/// Parent path of `path` as the host expects it: root (and drive letter)
/// removed, exactly one leading separator.
///
/// A path at the top of the tree has a parent of a single separator.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use docfs_storage::parent_path;
/// # #[cfg(unix)]
/// assert_eq!(parent_path(Path::new("/srv/docs/report.pdf")), "/srv/docs");
/// # #[cfg(unix)]
/// assert_eq!(parent_path(Path::new("/report.pdf")), "/");
/// # #[cfg(unix)]
/// assert_eq!(parent_path(Path::new("docs/report.pdf")), "/docs");
/// ```
pub fn parent_path(path: &Path) -> String {
    let segments: Vec<_> = path
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|component| match component {
            Component::Normal(s) => Some(s.to_string_lossy()),
            Component::ParentDir => Some("..".into()),
            // Drive letters, UNC prefixes and the root itself are dropped.
            Component::Prefix(_) | Component::RootDir | Component::CurDir => None,
        })
        .collect();
    format!("{MAIN_SEPARATOR}{}", segments.join(MAIN_SEPARATOR_STR))
}

/// Turn a [sanitized](sanitize) parent path into a relative path that stays
/// inside whatever root it gets joined onto.
///
/// `Path::join` replaces the base when handed an absolute path, so leading
/// separators are dropped here, as are `.` segments. `..` segments are
/// resolved but can never climb above the root.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use docfs_storage::relative_destination;
/// assert_eq!(relative_destination("/a/b"), Path::new("a/b"));
/// assert_eq!(relative_destination("a/./b/../c"), Path::new("a/c"));
/// assert_eq!(relative_destination("../../etc"), Path::new("etc"));
/// assert_eq!(relative_destination(""), Path::new(""));
/// ```
pub fn relative_destination(sanitized: &str) -> PathBuf {
    let mut components = Vec::new();
    for component in Path::new(sanitized).components() {
        match component {
            Component::Normal(s) => components.push(s),
            Component::ParentDir => {
                components.pop();
            },
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {},
        }
    }
    components.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a/b/c/", "a/b/c")]
    #[case("a:b:c", "a/b/c")]
    #[case("a:b/c/d.jpg/", "a/b/c/d.jpg")]
    #[case("a/b/c", "a/b/c")]
    #[case("", "")]
    #[case(":////", "")]
    #[case("/:/", "")]
    #[case("C:", "C")]
    #[case("C:/Users/", "C//Users")]
    #[case("/tmp/out:", "/tmp/out")]
    fn test_sanitize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize(input), expected);
    }

    #[rstest]
    #[case("a:b/c/d.jpg/")]
    #[case("a/:b")]
    #[case("::a::")]
    #[case("/x/y/:/")]
    #[case("")]
    fn test_sanitize_is_idempotent(#[case] input: &str) {
        let once = sanitize(input);
        assert_eq!(sanitize(&once), once);
    }

    #[cfg(unix)]
    #[rstest]
    #[case("/srv/docs/report.pdf", "/srv/docs")]
    #[case("/report.pdf", "/")]
    #[case("report.pdf", "/")]
    #[case("docs/report.pdf", "/docs")]
    #[case("./docs/report.pdf", "/docs")]
    #[case("/", "/")]
    fn test_parent_path(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(parent_path(Path::new(input)), expected);
    }

    #[cfg(windows)]
    #[test]
    fn test_parent_path_drops_drive_letter() {
        assert_eq!(parent_path(Path::new(r"C:\Users\me\file.txt")), r"\Users\me");
        assert_eq!(parent_path(Path::new(r"C:\file.txt")), r"\");
    }

    #[test]
    fn test_relative_destination() {
        assert_eq!(relative_destination("/tmp/target"), Path::new("tmp/target"));
        assert_eq!(relative_destination("a//b"), Path::new("a/b"));
        assert_eq!(relative_destination(&sanitize("C:/Users/")), Path::new("C/Users"));
        assert_eq!(relative_destination("a/b/.."), Path::new("a"));
        // Climbing is clamped at the root.
        assert_eq!(relative_destination("../etc/passwd"), Path::new("etc/passwd"));
        assert_eq!(relative_destination("/"), Path::new(""));
    }
}
