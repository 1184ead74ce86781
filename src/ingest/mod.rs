mod pdf;

pub use pdf::extract_pdf_text;

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::types::{DocKind, Document};

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("valid regex"));
static MULTI_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Loads the source corpus from a folder of PDF and TXT files.
///
/// Per-file failures (unreadable file, empty extracted text) are logged and
/// skip that file only; a missing or empty folder yields an empty list, not
/// an error.
pub struct DocumentLoader {
    folder: PathBuf,
}

impl DocumentLoader {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn load_documents(&self) -> Vec<Document> {
        let mut documents = Vec::new();

        if !self.folder.exists() {
            warn!("corpus folder does not exist: {}", self.folder.display());
            return documents;
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&self.folder)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| matches!(extension_of(path).as_deref(), Some("pdf") | Some("txt")))
            .collect();
        files.sort();

        if files.is_empty() {
            warn!("no PDF or TXT files found in {}", self.folder.display());
            return documents;
        }

        for path in files {
            match self.load_file(&path) {
                Ok(Some(doc)) => {
                    info!(
                        source = %doc.source_name,
                        kind = %doc.kind,
                        chars = doc.raw_text.chars().count(),
                        "document loaded"
                    );
                    documents.push(doc);
                }
                Ok(None) => {
                    warn!("{}: no usable text, skipping", path.display());
                }
                Err(e) => {
                    warn!("{}: {e:#}, skipping", path.display());
                }
            }
        }

        documents
    }

    fn load_file(&self, path: &Path) -> anyhow::Result<Option<Document>> {
        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match extension_of(path).as_deref() {
            Some("pdf") => {
                let raw = extract_pdf_text(path)?;
                // Merge pages before chunking so boundaries are chosen over
                // full semantic units, not page breaks
                let (merged, page_count) = merge_pages(&raw);
                if merged.trim().is_empty() {
                    return Ok(None);
                }
                Ok(Some(Document {
                    id: Uuid::new_v4().to_string(),
                    source_name,
                    kind: DocKind::Pdf,
                    raw_text: clean_text(&merged),
                    page_range: Some((0, page_count.saturating_sub(1))),
                }))
            }
            Some("txt") => {
                let raw = fs::read_to_string(path)?;
                if raw.trim().is_empty() {
                    return Ok(None);
                }
                Ok(Some(Document {
                    id: Uuid::new_v4().to_string(),
                    source_name,
                    kind: DocKind::Text,
                    raw_text: clean_text(&raw),
                    page_range: None,
                }))
            }
            _ => Ok(None),
        }
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Join non-empty pages (form-feed separated) with paragraph breaks.
/// Returns the merged text and the count of pages that carried text.
pub(crate) fn merge_pages(raw: &str) -> (String, usize) {
    let pages: Vec<&str> = raw
        .split('\u{c}')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    (pages.join("\n\n"), pages.len())
}

/// Whitespace cleanup applied to every loaded document: tabs become spaces,
/// space runs collapse, line ends are trimmed, blank-line runs collapse to
/// one paragraph break.
pub(crate) fn clean_text(text: &str) -> String {
    let text = text.replace('\t', " ");
    let text = MULTI_SPACE.replace_all(&text, " ");

    let trimmed_lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let text = trimmed_lines.join("\n");

    let text = MULTI_NEWLINE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_text() {
        let raw = "a\tb   c  \nline two   \n\n\n\n\nlast";
        assert_eq!(clean_text(raw), "a b c\nline two\n\nlast");
    }

    #[test]
    fn test_merge_pages() {
        let raw = "page one\u{c}\u{c}  \u{c}page two";
        let (merged, count) = merge_pages(raw);
        assert_eq!(merged, "page one\n\npage two");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_missing_folder_returns_empty() {
        let loader = DocumentLoader::new("definitely/not/a/folder");
        assert!(loader.load_documents().is_empty());
    }

    #[test]
    fn test_loads_txt_and_skips_other_extensions() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "some skin care notes").unwrap();
        fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();

        let loader = DocumentLoader::new(dir.path());
        let docs = loader.load_documents();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source_name, "notes.txt");
        assert_eq!(docs[0].kind, DocKind::Text);
        assert!(docs[0].page_range.is_none());
    }

    #[test]
    fn test_unreadable_file_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        // Invalid UTF-8 makes read_to_string fail for this file only
        fs::write(dir.path().join("broken.txt"), [0xff, 0xfe, 0xfd]).unwrap();
        fs::write(dir.path().join("good.txt"), "usable text").unwrap();

        let loader = DocumentLoader::new(dir.path());
        let docs = loader.load_documents();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source_name, "good.txt");
    }

    #[test]
    fn test_empty_txt_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("empty.txt"), "   \n  ").unwrap();

        let loader = DocumentLoader::new(dir.path());
        assert!(loader.load_documents().is_empty());
    }
}
