use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use super::ExtractError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Reads the main document part and returns one line per non-empty paragraph.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::CorruptDocument(format!("DOCX archive is unreadable: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| ExtractError::CorruptDocument(format!("DOCX has no {DOCUMENT_PART}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::CorruptDocument(format!("DOCX body is unreadable: {e}")))?;

    paragraphs(&xml)
}

fn paragraphs(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExtractError::CorruptDocument(format!("DOCX XML is malformed: {e}")))?;

        match event {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    let line = current.trim();
                    if !line.is_empty() {
                        lines.push(line.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Event::Empty(e) if matches!(e.name().as_ref(), b"w:tab" | b"w:br") => {
                current.push(' ');
            }
            Event::Text(t) if in_text => {
                let text = t.unescape().map_err(|e| {
                    ExtractError::CorruptDocument(format!("DOCX text is malformed: {e}"))
                })?;
                current.push_str(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    // Trailing text outside a closed paragraph.
    let tail = current.trim();
    if !tail.is_empty() {
        lines.push(tail.to_string());
    }

    Ok(lines.join("\n"))
}

/// Builds a minimal DOCX archive; each inner slice is one paragraph of runs.
#[cfg(test)]
pub(crate) fn build_docx(paragraphs: &[&[&str]]) -> Vec<u8> {
    use std::io::Write;

    let mut body = String::new();
    for runs in paragraphs {
        body.push_str("<w:p>");
        for run in runs.iter() {
            body.push_str(&format!(
                r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#,
                quick_xml::escape::escape(*run)
            ));
        }
        body.push_str("</w:p>");
    }
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(DOCUMENT_PART, zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}
