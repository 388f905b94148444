//! Sidecar metadata files.
//!
//! Every written document gets a sibling file holding its metadata, either as
//! Java-style `key=value` properties or as a properties XML document.

use crate::error::{ErrorKind, Result};
use crate::metadata::{Metadata, encode_all};
use exn::ResultExt;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::fs;

const COMMENT: &str = "---No Comment---";
const XML_HEADER: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n",
    "<!DOCTYPE properties SYSTEM \"http://java.sun.com/dtd/properties.dtd\">\n",
);

/// On-disk layout of a sidecar file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SidecarFormat {
    /// `key=value` lines
    Properties,
    /// `<properties><entry key="...">value</entry></properties>`
    #[default]
    Xml,
}
impl SidecarFormat {
    pub fn from_xml_flag(as_xml: bool) -> Self {
        match as_xml {
            true => Self::Xml,
            false => Self::Properties,
        }
    }

    /// Appended to the primary file's name.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Properties => ".metadata.properties.properties",
            Self::Xml => ".metadata.properties.xml",
        }
    }

    /// Render already-encoded metadata.
    pub fn render(&self, entries: &BTreeMap<String, String>) -> Result<String> {
        match self {
            Self::Properties => Ok(render_properties(entries)),
            Self::Xml => render_xml(entries),
        }
    }
}

/// Path of the sidecar belonging to `file`.
///
/// ```
/// use std::path::Path;
/// use docfs_storage::sidecar::{SidecarFormat, sidecar_path};
/// assert_eq!(
///     sidecar_path(Path::new("/out/a/report.pdf"), SidecarFormat::Xml),
///     Path::new("/out/a/report.pdf.metadata.properties.xml"),
/// );
/// ```
pub fn sidecar_path(file: &Path, format: SidecarFormat) -> PathBuf {
    let mut name = file.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format.suffix());
    file.with_file_name(name)
}

/// Encode `metadata` and write it next to `file`. Returns the sidecar path.
pub async fn write_sidecar(file: &Path, metadata: &Metadata, format: SidecarFormat) -> Result<PathBuf> {
    let path = sidecar_path(file, format);
    let contents = format.render(&encode_all(metadata)).or_raise(|| ErrorKind::Sidecar(path.clone()))?;
    fs::write(&path, contents).await.or_raise(|| ErrorKind::Sidecar(path.clone()))?;
    tracing::debug!(path = %path.display(), entries = metadata.len(), "Wrote metadata sidecar");
    Ok(path)
}

fn render_properties(entries: &BTreeMap<String, String>) -> String {
    let mut out = format!("#{COMMENT}\n");
    for (key, value) in entries {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{}={}", escape_property(key, true), escape_property(value, false));
    }
    out
}

/// Escape a key or value the way `java.util.Properties` stores them: every
/// space in keys but only leading spaces in values, the separator and
/// comment characters, control characters, and anything outside printable
/// ASCII as `\uXXXX`.
fn escape_property(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        match c {
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            },
            ' '..='~' => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{unit:04X}");
                }
            },
        }
    }
    out
}

#[derive(Serialize)]
#[serde(rename = "properties")]
struct PropertiesXml<'a> {
    comment: &'a str,
    #[serde(rename = "entry")]
    entries: Vec<EntryXml<'a>>,
}

#[derive(Serialize)]
struct EntryXml<'a> {
    #[serde(rename = "@key")]
    key: &'a str,
    #[serde(rename = "$text")]
    value: &'a str,
}

fn render_xml(entries: &BTreeMap<String, String>) -> Result<String> {
    let document = PropertiesXml {
        comment: COMMENT,
        entries: entries.iter().map(|(key, value)| EntryXml { key, value }).collect(),
    };
    let body = quick_xml::se::to_string(&document).map_err(|e| ErrorKind::Io(std::io::Error::other(e)))?;
    Ok(format!("{XML_HEADER}{body}\n"))
}
