//! A book package: parsed markup plus its `meta.json` sidecar.

pub mod metadata;
pub mod pages;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

pub use metadata::Metadata;

use crate::dom::Document;
use crate::error::{Error, Result};
use crate::util::decode_text;

/// Parsed book markup and sidecar metadata, loaded once and read-only afterwards.
#[derive(Debug)]
pub struct Book {
    pub document: Document,
    pub metadata: Metadata,
}

impl Book {
    /// Build a book from raw markup and sidecar JSON text.
    pub fn parse(markup: &str, sidecar_json: &str) -> Result<Self> {
        Ok(Self {
            document: Document::parse(markup)?,
            metadata: Metadata::parse(sidecar_json)?,
        })
    }

    /// Build a book from raw bytes, sniffing the text encoding.
    pub fn from_bytes(markup: &[u8], sidecar_json: &[u8]) -> Result<Self> {
        Self::parse(&decode_text(markup, None), &decode_text(sidecar_json, None))
    }

    /// Load the book file and sidecar from an unpacked book folder.
    pub fn from_folder(folder: &Path, meta_file_name: &str) -> Result<Self> {
        let book_path = find_book_file(folder).ok_or_else(|| {
            Error::IncompleteUpload("missing book's HTML file".into())
        })?;
        let meta_path = folder.join(meta_file_name);
        if !meta_path.is_file() {
            return Err(Error::IncompleteUpload(format!(
                "missing book's {meta_file_name} file"
            )));
        }
        debug!(book = %book_path.display(), "loading book package");
        Self::from_bytes(&fs::read(&book_path)?, &fs::read(&meta_path)?)
    }
}

/// Locate the book's markup file in a folder.
///
/// Prefers `<folder name>.htm`; otherwise the first `.htm`/`.html` file by name.
pub fn find_book_file(folder: &Path) -> Option<PathBuf> {
    if let Some(name) = folder.file_name() {
        let mut preferred = name.to_os_string();
        preferred.push(".htm");
        let candidate = folder.join(preferred);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(folder)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("htm") || e.eq_ignore_ascii_case("html"))
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requires_valid_sidecar() {
        let err = Book::parse("<body></body>", "not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_folder_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = Book::from_folder(dir.path(), "meta.json").unwrap_err();
        assert!(matches!(err, Error::IncompleteUpload(_)));

        fs::write(dir.path().join("story.htm"), "<body><p>x</p></body>").unwrap();
        let err = Book::from_folder(dir.path(), "meta.json").unwrap_err();
        assert!(matches!(err, Error::IncompleteUpload(msg) if msg.contains("meta.json")));

        fs::write(dir.path().join("meta.json"), "{}").unwrap();
        let book = Book::from_folder(dir.path(), "meta.json").unwrap();
        assert_eq!(book.document.body().inner_text(), "x");
    }

    #[test]
    fn test_find_book_file_prefers_folder_name() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("My Book");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("aaa.htm"), "").unwrap();
        fs::write(folder.join("My Book.htm"), "").unwrap();
        assert_eq!(find_book_file(&folder), Some(folder.join("My Book.htm")));

        fs::remove_file(folder.join("My Book.htm")).unwrap();
        assert_eq!(find_book_file(&folder), Some(folder.join("aaa.htm")));
    }
}
