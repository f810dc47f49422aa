use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::Path;

use super::{SourceOrigin, SourceText};
use crate::QuizError;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const TEXT_MIME: &str = "text/plain";

/// Declared type for files whose extension says nothing useful
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// Document types accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentKind {
    /// Match a declared MIME type; parameters such as `; charset=utf-8` are ignored
    pub fn from_mime(declared: &str) -> Option<Self> {
        let essence = declared
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            PDF_MIME => Some(DocumentKind::Pdf),
            DOCX_MIME => Some(DocumentKind::Docx),
            TEXT_MIME => Some(DocumentKind::PlainText),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => PDF_MIME,
            DocumentKind::Docx => DOCX_MIME,
            DocumentKind::PlainText => TEXT_MIME,
        }
    }

    pub fn origin(&self) -> SourceOrigin {
        match self {
            DocumentKind::Pdf => SourceOrigin::Pdf,
            DocumentKind::Docx => SourceOrigin::Docx,
            DocumentKind::PlainText => SourceOrigin::PlainText,
        }
    }
}

/// Declared MIME type for a file, the way an upload form would report it
pub fn declared_type_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => PDF_MIME,
        Some("docx") => DOCX_MIME,
        Some("txt") => TEXT_MIME,
        _ => UNKNOWN_MIME,
    }
}

/// Extract plain text from an uploaded file, dispatching on its declared type only
pub fn extract_document(bytes: &[u8], declared_type: &str) -> Result<SourceText, QuizError> {
    let kind = DocumentKind::from_mime(declared_type)
        .ok_or_else(|| QuizError::UnsupportedFileType(declared_type.to_string()))?;

    tracing::info!("Extracting text from {} ({} bytes)", kind.mime_type(), bytes.len());

    let text = match kind {
        DocumentKind::Pdf => extract_pdf_text(bytes)?,
        DocumentKind::Docx => extract_docx_text(bytes)?,
        DocumentKind::PlainText => extract_plain_text(bytes)?,
    };

    Ok(SourceText::new(text.trim(), kind.origin()))
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, QuizError> {
    // pdf-extract panics on some malformed files instead of returning an error
    let outcome = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));

    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(QuizError::DocumentExtraction(format!("Failed to read PDF: {}", e))),
        Err(_) => Err(QuizError::DocumentExtraction(
            "Failed to read PDF: parser aborted on malformed content".to_string(),
        )),
    }
}

fn extract_docx_text(bytes: &[u8]) -> Result<String, QuizError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| QuizError::DocumentExtraction(format!("Failed to open DOCX: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| QuizError::DocumentExtraction(format!("DOCX has no document body: {}", e)))?
        .read_to_string(&mut xml)
        .map_err(|e| QuizError::DocumentExtraction(format!("Failed to read DOCX body: {}", e)))?;

    let paragraphs = docx_paragraphs(&xml)?;
    Ok(paragraphs.join("\n"))
}

/// Body-level paragraph texts of a WordprocessingML document, in document order.
///
/// Paragraphs nested in tables or text boxes are skipped.
fn docx_paragraphs(xml: &str) -> Result<Vec<String>, QuizError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut nested = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:tbl" | b"w:txbxContent" => nested += 1,
                b"w:t" if nested == 0 => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if nested == 0 => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| QuizError::DocumentExtraction(format!("Malformed DOCX text: {}", e)))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:tbl" | b"w:txbxContent" => nested = nested.saturating_sub(1),
                b"w:t" => in_text = false,
                b"w:p" if nested == 0 => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(QuizError::DocumentExtraction(format!(
                    "Malformed DOCX body at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn extract_plain_text(bytes: &[u8]) -> Result<String, QuizError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| QuizError::DocumentExtraction(format!("Text file is not valid UTF-8: {}", e)))?;

    Ok(text.trim_start_matches('\u{feff}').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_docx(body: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default();
        writer.start_file("word/document.xml", options).unwrap();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        );
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_unsupported_type_names_the_type() {
        let err = extract_document(b"a,b,c", "text/csv").unwrap_err();
        assert!(matches!(err, QuizError::UnsupportedFileType(ref t) if t == "text/csv"));
        assert!(err.to_string().contains("text/csv"));
    }

    #[test]
    fn test_dispatch_ignores_file_content() {
        // A valid PDF header does not help when the declared type is wrong
        let err = extract_document(b"%PDF-1.5", "image/png").unwrap_err();
        assert!(err.to_string().contains("image/png"));
    }

    #[test]
    fn test_plain_text_is_trimmed() {
        let text = extract_document("\u{feff}  Photosynthesis converts light.\n\n".as_bytes(), "text/plain").unwrap();
        assert_eq!(text.text, "Photosynthesis converts light.");
        assert_eq!(text.origin, SourceOrigin::PlainText);
    }

    #[test]
    fn test_plain_text_with_charset_parameter() {
        let text = extract_document(b"hello", "Text/Plain; charset=utf-8").unwrap();
        assert_eq!(text.text, "hello");
    }

    #[test]
    fn test_plain_text_invalid_utf8() {
        let err = extract_document(&[0xff, 0xfe, 0x00, 0x41], "text/plain").unwrap_err();
        assert!(matches!(err, QuizError::DocumentExtraction(_)));
        assert!(err.to_string().starts_with("Error processing document:"));
    }

    #[test]
    fn test_docx_paragraphs() {
        let docx = build_docx(
            r#"<w:p><w:r><w:t>Cells are</w:t></w:r><w:r><w:t xml:space="preserve"> the unit of life.</w:t></w:r></w:p><w:p/><w:p><w:r><w:t>Mitochondria &amp; energy</w:t><w:tab/><w:t>ATP</w:t></w:r></w:p>"#,
        );
        let text = extract_document(&docx, DOCX_MIME).unwrap();
        assert_eq!(text.text, "Cells are the unit of life.\n\nMitochondria & energy\tATP");
        assert_eq!(text.origin, SourceOrigin::Docx);
    }

    #[test]
    fn test_docx_skips_table_and_text_box_paragraphs() {
        let docx = build_docx(
            r#"<w:p><w:r><w:t>Intro</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell text</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:p><w:r><w:t>Caption</w:t><w:pict><w:txbxContent><w:p><w:r><w:t>Boxed</w:t></w:r></w:p></w:txbxContent></w:pict></w:r></w:p><w:p><w:r><w:t>Outro</w:t></w:r></w:p>"#,
        );
        let text = extract_document(&docx, DOCX_MIME).unwrap();
        assert_eq!(text.text, "Intro\nCaption\nOutro");
    }

    #[test]
    fn test_docx_that_is_not_a_zip() {
        let err = extract_document(b"plain bytes", DOCX_MIME).unwrap_err();
        assert!(matches!(err, QuizError::DocumentExtraction(_)));
    }

    #[test]
    fn test_pdf_garbage_is_an_extraction_error() {
        let err = extract_document(b"definitely not a pdf", PDF_MIME).unwrap_err();
        assert!(matches!(err, QuizError::DocumentExtraction(_)));
    }

    #[test]
    fn test_declared_type_for_path() {
        assert_eq!(declared_type_for_path(Path::new("notes.TXT")), TEXT_MIME);
        assert_eq!(declared_type_for_path(Path::new("paper.pdf")), PDF_MIME);
        assert_eq!(declared_type_for_path(Path::new("essay.docx")), DOCX_MIME);
        assert_eq!(declared_type_for_path(Path::new("legacy.doc")), UNKNOWN_MIME);
        assert_eq!(declared_type_for_path(Path::new("README")), UNKNOWN_MIME);
    }
}
