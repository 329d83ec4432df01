use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use crate::error::{RagError, Result};

/// Where the PDF bytes come from.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Path(PathBuf),
    Bytes { name: String, data: Vec<u8> },
}

impl DocumentSource {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        DocumentSource::Path(path.as_ref().to_path_buf())
    }

    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        DocumentSource::Bytes {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> String {
        match self {
            DocumentSource::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            DocumentSource::Bytes { name, .. } => name.clone(),
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Path(path) => write!(f, "{}", path.display()),
            DocumentSource::Bytes { name, data } => write!(f, "{} ({} bytes)", name, data.len()),
        }
    }
}

/// Produces the plain text of a document, pages in order.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, source: &DocumentSource) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_pages(&self, source: &DocumentSource) -> Result<Vec<String>> {
        // pdf-extract panics on some malformed files instead of returning an error
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match source {
            DocumentSource::Path(path) => pdf_extract::extract_text_by_pages(path),
            DocumentSource::Bytes { data, .. } => pdf_extract::extract_text_from_mem_by_pages(data),
        }));

        match outcome {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(RagError::Document(format!(
                "Failed to read PDF {}: {}",
                source, e
            ))),
            Err(_) => Err(RagError::Document(format!(
                "Failed to read PDF {}: the file is malformed",
                source
            ))),
        }
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, source: &DocumentSource) -> Result<String> {
        if let DocumentSource::Path(path) = source {
            if !path.is_file() {
                return Err(RagError::Document(format!("File not found: {}", path.display())));
            }
        }

        let pages = self.extract_pages(source)?;
        let page_count = pages.len();
        let text = join_pages(pages);
        log::info!(
            "Extracted {} characters from {} pages of {}",
            text.len(),
            page_count,
            source.name()
        );
        Ok(text)
    }
}

/// Concatenates page texts, each followed by a newline. Pages with no text are skipped.
pub fn join_pages<I>(pages: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut full_text = String::new();
    for page in pages {
        if !page.is_empty() {
            full_text.push_str(&page);
            full_text.push('\n');
        }
    }
    full_text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_join_pages_in_order() {
        let text = join_pages(vec!["first page".to_string(), "second page".to_string()]);
        assert_eq!(text, "first page\nsecond page\n");
    }

    #[test]
    fn test_join_pages_skips_empty() {
        let text = join_pages(vec![
            String::new(),
            "only text".to_string(),
            String::new(),
        ]);
        assert_eq!(text, "only text\n");
    }

    #[test]
    fn test_join_no_pages() {
        assert_eq!(join_pages(Vec::new()), "");
    }

    #[test]
    fn test_missing_file_is_document_error() {
        let extractor = PdfExtractor::new();
        let source = DocumentSource::from_path("/definitely/not/here.pdf");
        assert!(matches!(extractor.extract(&source), Err(RagError::Document(_))));
    }

    #[test]
    fn test_garbage_file_is_document_error() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"this is not a pdf at all").unwrap();

        let extractor = PdfExtractor::new();
        let source = DocumentSource::from_path(file.path());
        assert!(matches!(extractor.extract(&source), Err(RagError::Document(_))));
    }

    #[test]
    fn test_garbage_bytes_is_document_error() {
        let extractor = PdfExtractor::new();
        let source = DocumentSource::from_bytes("upload.pdf", b"%PDF-garbage".to_vec());
        assert!(matches!(extractor.extract(&source), Err(RagError::Document(_))));
    }

    #[test]
    fn test_source_names() {
        assert_eq!(DocumentSource::from_path("/tmp/report.pdf").name(), "report.pdf");
        assert_eq!(DocumentSource::from_bytes("upload.pdf", vec![1, 2]).name(), "upload.pdf");
        assert_eq!(
            DocumentSource::from_bytes("upload.pdf", vec![1, 2]).to_string(),
            "upload.pdf (2 bytes)"
        );
    }
}
