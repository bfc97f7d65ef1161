//! Item catalog: the flat list of items extracted from the hunt document.
//!
//! Text extraction is delegated to a [`DocumentSource`]. PDFs go through
//! `pdftotext` (poppler-utils), which separates pages with form feeds; any
//! other file is read as plain text using the same page separator.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{AnnouncerError, Result};

const PAGE_SEPARATOR: char = '\x0c';

/// A single hunt item. `ordinal` restarts at 1 on every page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub text: String,
    pub page: u32,
    pub ordinal: u32,
}

impl Item {
    pub fn new(text: impl Into<String>, page: u32, ordinal: u32) -> Self {
        Self {
            text: text.into(),
            page,
            ordinal,
        }
    }
}

/// Produces the text of each page, in document order.
pub trait DocumentSource {
    fn pages(&self) -> Result<Vec<String>>;
}

/// Extracts page text from a PDF with `pdftotext -layout <path> -`.
pub struct PdfToTextSource {
    path: PathBuf,
}

impl PdfToTextSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentSource for PdfToTextSource {
    fn pages(&self) -> Result<Vec<String>> {
        let unavailable = |reason: String| AnnouncerError::DocumentUnavailable {
            path: self.path.clone(),
            reason,
        };

        if !self.path.exists() {
            return Err(unavailable("file not found".into()));
        }

        let output = Command::new("pdftotext")
            .arg("-layout")
            .arg(&self.path)
            .arg("-")
            .output()
            .map_err(|e| unavailable(format!("failed to run pdftotext: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(unavailable(format!(
                "pdftotext exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(split_pages(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Reads a UTF-8 text file whose pages are separated by form feeds.
pub struct PlainTextSource {
    path: PathBuf,
}

impl PlainTextSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentSource for PlainTextSource {
    fn pages(&self) -> Result<Vec<String>> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            AnnouncerError::DocumentUnavailable {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(split_pages(&contents))
    }
}

/// Pick an extractor from the file extension.
pub fn source_for(path: &Path) -> Box<dyn DocumentSource> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        Box::new(PdfToTextSource::new(path))
    } else {
        Box::new(PlainTextSource::new(path))
    }
}

fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split(PAGE_SEPARATOR).map(str::to_string).collect();
    // pdftotext terminates the last page with a form feed too.
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

/// Ordered list of all items: page order, then in-page order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Item>,
}

impl Catalog {
    /// Build the catalog from page text. Each non-blank line is one item.
    pub fn from_pages<S: AsRef<str>>(pages: &[S]) -> Self {
        let mut items = Vec::new();
        for (page_idx, page) in pages.iter().enumerate() {
            let page_num = page_idx as u32 + 1;
            let lines = page
                .as_ref()
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty());
            for (idx, line) in lines.enumerate() {
                items.push(Item::new(line, page_num, idx as u32 + 1));
            }
        }
        debug!("Built catalog of {} items from {} pages", items.len(), pages.len());
        Self { items }
    }

    pub fn from_items(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Load and build the catalog. An unreadable or empty document is fatal.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_from(source_for(path).as_ref(), path)
    }

    pub fn load_from(source: &dyn DocumentSource, path: &Path) -> Result<Self> {
        let pages = source.pages()?;
        let catalog = Self::from_pages(&pages);
        if catalog.is_empty() {
            return Err(AnnouncerError::DocumentUnavailable {
                path: path.to_path_buf(),
                reason: "no items found".into(),
            });
        }
        info!(
            "Loaded {} items from {} ({} pages)",
            catalog.len(),
            path.display(),
            pages.len()
        );
        Ok(catalog)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_restart_on_each_page() {
        let catalog = Catalog::from_pages(&["A\nB\n", "C"]);
        assert_eq!(
            catalog.items(),
            &[Item::new("A", 1, 1), Item::new("B", 1, 2), Item::new("C", 2, 1)]
        );
    }

    #[test]
    fn blank_lines_are_dropped_and_text_trimmed() {
        let catalog = Catalog::from_pages(&["\n   \n  Find a duck  \n\n\tBring a kazoo\n"]);
        let texts: Vec<&str> = catalog.items().iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, ["Find a duck", "Bring a kazoo"]);
        assert_eq!(catalog.items()[1].ordinal, 2);
    }

    #[test]
    fn empty_page_keeps_page_numbering() {
        let catalog = Catalog::from_pages(&["A", "   ", "B"]);
        assert_eq!(catalog.items()[1], Item::new("B", 3, 1));
    }

    #[test]
    fn split_pages_drops_trailing_form_feed() {
        assert_eq!(split_pages("one\x0ctwo\x0c"), vec!["one", "two"]);
        assert_eq!(split_pages("single"), vec!["single"]);
    }

    #[test]
    fn plain_text_document_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.txt");
        std::fs::write(&path, "1. Duck\n2. Kazoo\n\x0c1. Goat\n").unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.items()[2], Item::new("1. Goat", 2, 1));
    }

    #[test]
    fn missing_document_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, AnnouncerError::DocumentUnavailable { .. }));

        let err = Catalog::load(&dir.path().join("missing.pdf")).unwrap_err();
        assert!(matches!(err, AnnouncerError::DocumentUnavailable { .. }));
    }

    #[test]
    fn document_without_items_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.txt");
        std::fs::write(&path, "\n\n  \n").unwrap();
        assert!(matches!(
            Catalog::load(&path),
            Err(AnnouncerError::DocumentUnavailable { .. })
        ));
    }
}
