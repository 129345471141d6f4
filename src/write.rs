//! Customize serialization behaviour

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use plist::XmlWriteOptions;
use serde::Serialize;

use crate::error::StoreWriteError;

/// The plist flavour that store files are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlistFormat {
    /// Compact binary plist. This is the default.
    Binary,
    /// Human-readable XML plist.
    Xml,
}

/// Options that can be set when writing store files to disk.
///
/// You construct `WriteOptions` using builder semantics:
///
/// ```
/// # use fixcorr::{PlistFormat, WriteOptions};
/// let binary = WriteOptions::default();
///
/// let xml_with_tabs = WriteOptions::default().format(PlistFormat::Xml);
///
/// let xml_with_spaces = WriteOptions::default()
///     .format(PlistFormat::Xml)
///     .whitespace("  ");
/// ```
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub(crate) format: PlistFormat,
    xml_opts: XmlWriteOptions,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            format: PlistFormat::Binary,
            xml_opts: Default::default(),
        }
    }
}

impl WriteOptions {
    /// Builder-style method to choose the output format.
    pub fn format(mut self, format: PlistFormat) -> Self {
        self.format = format;
        self
    }

    /// Builder-style method to customize the whitespace of XML output.
    ///
    /// By default, we indent with a single tab ("\t"). Has no effect on
    /// binary output.
    ///
    /// # Panics
    ///
    /// Panics if the provided string is empty or contains anything but spaces
    /// and tabs.
    pub fn whitespace(mut self, indent_str: impl Into<Cow<'static, str>>) -> Self {
        let indent_str = indent_str.into();
        assert!(!indent_str.is_empty(), "whitespace str must not be empty");
        assert!(indent_str.bytes().all(|c| c == b' ' || c == b'\t'), "invalid whitespace");
        self.xml_opts = XmlWriteOptions::default().indent_string(indent_str);
        self
    }

    /// Return a reference to [`XmlWriteOptions`] for use with the `plist` crate.
    pub fn xml_options(&self) -> &XmlWriteOptions {
        &self.xml_opts
    }
}

/// Serialize `value` to `path` in the configured format.
///
/// The data is first written to a sibling temporary file which then replaces
/// `path`, so an interrupted write never leaves a truncated file behind.
pub(crate) fn write_plist_to_file<T: Serialize>(
    path: &Path,
    value: &T,
    options: &WriteOptions,
) -> Result<(), StoreWriteError> {
    let mut buf = Vec::new();
    match options.format {
        PlistFormat::Binary => plist::to_writer_binary(&mut buf, value)?,
        PlistFormat::Xml => {
            plist::to_writer_xml_with_options(&mut buf, value, options.xml_options())?
        }
    }

    let tmp_path = temporary_sibling(path);
    close_already::fs::write(&tmp_path, buf)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_file_name() {
        let tmp = temporary_sibling(Path::new("offline_data/fixations.plist"));
        assert_eq!(tmp, Path::new("offline_data/fixations.plist.tmp"));
    }

    #[test]
    fn write_xml_with_custom_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.plist");
        let options = WriteOptions::default().format(PlistFormat::Xml).whitespace("  ");

        write_plist_to_file(&path, &vec![1.5f64, 2.5], &options).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("  <real>1.5</real>"), "{}", written);
        assert!(!written.contains('\t'));
        assert!(!dir.path().join("values.plist.tmp").exists());

        let read: Vec<f64> = plist::from_file(&path).unwrap();
        assert_eq!(read, vec![1.5, 2.5]);
    }

    #[test]
    #[should_panic(expected = "invalid whitespace")]
    fn reject_non_whitespace_indent() {
        let _ = WriteOptions::default().whitespace("--");
    }
}
