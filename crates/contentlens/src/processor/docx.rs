use std::io::Read;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, Event};
use quick_xml::Reader;

use crate::document::Document;
use crate::error::ProcessError;
use crate::processor::{DocumentProcessor, MediaType};

/// Word (OOXML) documents: body paragraphs in order, one per line.
pub struct DocxProcessor;

impl DocxProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for DocxProcessor {
    fn extract(&self, document: &Document) -> Result<String, ProcessError> {
        let file =
            std::fs::File::open(&document.source_path).map_err(|e| ProcessError::ReadDocument {
                path: document.source_path.clone(),
                source: e,
            })?;

        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| ProcessError::DocxProcessing(format!("Failed to open DOCX: {}", e)))?;

        extract_docx_text(&mut archive)
    }

    fn supports(&self, media_type: &MediaType) -> bool {
        matches!(media_type, MediaType::WordDocument)
    }
}

fn extract_docx_text<R: Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<String, ProcessError> {
    let mut document_xml = archive
        .by_name("word/document.xml")
        .map_err(|e| ProcessError::DocxProcessing(format!("Failed to find document.xml: {}", e)))?;

    let mut xml_content = String::new();
    document_xml
        .read_to_string(&mut xml_content)
        .map_err(|e| ProcessError::DocxProcessing(format!("Failed to read document.xml: {}", e)))?;

    parse_docx_xml(&xml_content)
}

/// Collects the text of body-level paragraphs. Paragraphs nested in tables or
/// text boxes are skipped, run formatting is dropped, and `w:tab` / `w:br`
/// inside runs become `\t` / `\n`.
fn parse_docx_xml(xml: &str) -> Result<String, ProcessError> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    let mut in_run = false;
    let mut in_text = false;
    // Depth inside w:tbl / w:txbxContent.
    let mut nested = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"tbl" | b"txbxContent" => nested += 1,
                b"p" if nested == 0 => current = Some(String::new()),
                b"r" if nested == 0 => in_run = true,
                b"t" if nested == 0 && in_run => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if nested == 0 => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"tab" if in_run => push_to(&mut current, "\t"),
                b"br" | b"cr" if in_run => push_to(&mut current, "\n"),
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"tbl" | b"txbxContent" => nested = nested.saturating_sub(1),
                b"p" if nested == 0 => {
                    if let Some(paragraph) = current.take() {
                        paragraphs.push(paragraph);
                    }
                }
                b"r" if nested == 0 => in_run = false,
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_text && nested == 0 => {
                let decoded = e
                    .decode()
                    .map_err(|e| ProcessError::DocxProcessing(format!("Invalid text: {}", e)))?;
                push_to(&mut current, &decoded);
            }
            Ok(Event::GeneralRef(e)) if in_text && nested == 0 => {
                push_to(&mut current, &resolve_reference(&e)?);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ProcessError::DocxProcessing(format!(
                    "XML parsing error: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

fn push_to(paragraph: &mut Option<String>, text: &str) {
    if let Some(p) = paragraph.as_mut() {
        p.push_str(text);
    }
}

fn resolve_reference(reference: &BytesRef<'_>) -> Result<String, ProcessError> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|e| ProcessError::DocxProcessing(format!("Invalid character reference: {}", e)))?
    {
        return Ok(ch.to_string());
    }

    let name = reference
        .decode()
        .map_err(|e| ProcessError::DocxProcessing(format!("Invalid entity reference: {}", e)))?;

    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| ProcessError::DocxProcessing(format!("Unknown entity '&{};'", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use uuid::Uuid;
    use zip::write::SimpleFileOptions;

    const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    fn wrap_body(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}"><w:body>{}</w:body></w:document>"#,
            W_NS, body
        )
    }

    fn write_docx(path: &std::path::Path, document_xml: &str) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_supports_docx_format() {
        let processor = DocxProcessor::new();
        assert!(processor.supports(&MediaType::WordDocument));
        assert!(!processor.supports(&MediaType::PlainText));
        assert!(!processor.supports(&MediaType::Json));
    }

    #[test]
    fn test_paragraphs_joined_with_newline() {
        let xml = wrap_body(
            "<w:p><w:r><w:t>First</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Second</w:t></w:r></w:p>",
        );
        assert_eq!(parse_docx_xml(&xml).unwrap(), "First\nSecond");
    }

    #[test]
    fn test_runs_are_concatenated_within_paragraph() {
        let xml = wrap_body(
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Hello</w:t></w:r><w:r><w:t xml:space="preserve"> world</w:t></w:r></w:p>"#,
        );
        assert_eq!(parse_docx_xml(&xml).unwrap(), "Hello world");
    }

    #[test]
    fn test_empty_paragraphs_are_kept() {
        let xml = wrap_body(
            "<w:p><w:r><w:t>Above</w:t></w:r></w:p><w:p/><w:p></w:p>\
             <w:p><w:r><w:t>Below</w:t></w:r></w:p>",
        );
        assert_eq!(parse_docx_xml(&xml).unwrap(), "Above\n\n\nBelow");
    }

    #[test]
    fn test_table_paragraphs_are_skipped() {
        let xml = wrap_body(
            "<w:p><w:r><w:t>Intro</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             <w:p><w:r><w:t>Outro</w:t></w:r></w:p>",
        );
        assert_eq!(parse_docx_xml(&xml).unwrap(), "Intro\nOutro");
    }

    #[test]
    fn test_tabs_breaks_and_entities() {
        let xml = wrap_body(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>A</w:t><w:tab/><w:t>B &amp; C</w:t><w:br/><w:t>D</w:t></w:r></w:p>"#,
        );
        assert_eq!(parse_docx_xml(&xml).unwrap(), "A\tB & C\nD");
    }

    #[test]
    fn test_extract_from_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.docx");
        write_docx(
            &path,
            &wrap_body("<w:p><w:r><w:t>Quarterly</w:t></w:r></w:p><w:p><w:r><w:t>Report</w:t></w:r></w:p>"),
        );

        let doc = Document::new(
            Uuid::new_v4(),
            path,
            "report.docx",
            crate::processor::media_type::WORD_DOCUMENT,
        );
        assert_eq!(
            DocxProcessor::new().extract(&doc).unwrap(),
            "Quarterly\nReport"
        );
    }

    #[test]
    fn test_corrupt_archive_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();

        let doc = Document::new(Uuid::new_v4(), path, "broken.docx", "application/octet-stream");
        assert!(matches!(
            DocxProcessor::new().extract(&doc),
            Err(ProcessError::DocxProcessing(_))
        ));
    }
}
