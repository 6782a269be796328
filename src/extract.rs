//! Document ingestion: raw bytes to decoded plain text.
//!
//! The pipeline downstream only ever sees a UTF-8 string. Files are read as
//! bytes, PDF containers are handed to a text extractor, everything else is
//! decoded with a best-guess charset, and HTML documents are flattened to
//! plain text.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use chardetng::EncodingDetector;
use thiserror::Error;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Column width used when flattening HTML to text.
const HTML_TEXT_WIDTH: usize = 80;

/// Errors raised while turning a file into plain text.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path of the file that could not be read.
        path: String,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// A PDF body could not be parsed.
    #[error("Failed to extract text from PDF: {0}")]
    Pdf(String),
    /// No decodable text came out of the file.
    #[error("No text could be extracted from {0}")]
    NoText(String),
}

/// Extract the plain text of the document at `path`.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let raw = fs::read(path).map_err(|source| ExtractError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let text = if raw.starts_with(PDF_MAGIC) {
        pdf_extract::extract_text_from_mem(&raw)
            .map_err(|error| ExtractError::Pdf(error.to_string()))?
    } else {
        let decoded = decode_bytes(&raw);
        if looks_like_html(&decoded) {
            html_to_text(&decoded)
        } else {
            decoded
        }
    };

    if text.trim().is_empty() {
        return Err(ExtractError::NoText(path.display().to_string()));
    }
    Ok(text)
}

/// Decode a byte buffer using its best-guess charset.
///
/// Undecodable sequences are replaced rather than treated as fatal; the
/// detector always nominates some encoding.
fn decode_bytes(raw: &[u8]) -> String {
    let mut detector = EncodingDetector::new();
    detector.feed(raw, true);
    let encoding = detector.guess(None, true);
    let (decoded, actual, _had_errors) = encoding.decode(raw);
    tracing::debug!(encoding = actual.name(), "Decoded document bytes");
    decoded.into_owned()
}

fn looks_like_html(text: &str) -> bool {
    let head: String = text
        .trim_start()
        .chars()
        .take(64)
        .collect::<String>()
        .to_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

fn html_to_text(html: &str) -> String {
    // html2text expects bytes; fall back to the raw markup if it chokes.
    html2text::from_read(Cursor::new(html.as_bytes()), HTML_TEXT_WIDTH)
        .unwrap_or_else(|_| html.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_fixture(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).expect("fixture written");
        path
    }

    #[test]
    fn reads_utf8_text_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_fixture(&dir, "notes.txt", "plain text body\nwith two lines".as_bytes());

        let text = extract_text(&path).expect("extracted");
        assert_eq!(text, "plain text body\nwith two lines");
    }

    #[test]
    fn decodes_legacy_encodings() {
        let dir = tempfile::tempdir().expect("tempdir");
        // windows-1252: é = 0xE9, ê = 0xEA, ô = 0xF4
        let path = write_fixture(
            &dir,
            "legacy.txt",
            b"Le caf\xe9 est pr\xeat. La journ\xe9e commence t\xf4t.",
        );

        let text = extract_text(&path).expect("extracted");
        assert!(text.contains("café"), "decoded text was {text:?}");
        assert!(text.contains("prêt"), "decoded text was {text:?}");
    }

    #[test]
    fn flattens_html_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_fixture(
            &dir,
            "page.html",
            b"<html><body><h1>Title</h1><p>Hello world</p></body></html>",
        );

        let text = extract_text(&path).expect("extracted");
        assert!(text.contains("Hello world"), "flattened text was {text:?}");
        assert!(!text.contains("<p>"), "markup survived: {text:?}");
    }

    #[test]
    fn empty_file_is_an_extraction_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_fixture(&dir, "empty.txt", b"");

        let error = extract_text(&path).expect_err("no text");
        assert!(matches!(error, ExtractError::NoText(_)));
    }

    #[test]
    fn missing_file_is_an_io_failure() {
        let error = extract_text(Path::new("/nonexistent/document.txt")).expect_err("io error");
        assert!(matches!(error, ExtractError::Io { .. }));
    }
}
