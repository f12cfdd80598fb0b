//! DOCX text extraction.
//!
//! A DOCX file is a ZIP archive; the body lives in `word/document.xml`.
//! Paragraph text is emitted in document order, one line per paragraph,
//! with empty paragraphs kept as empty lines.

use super::ExtractError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract plain text from a DOCX file.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
    let xml = read_document_xml(&mut archive)?;
    Ok(parse_paragraphs(&xml)?.join("\n"))
}

fn read_document_xml<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> Result<String, ExtractError> {
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractError::Malformed(format!("missing {DOCUMENT_PART}: {e}")))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Collect paragraph texts from `document.xml`.
///
/// Paragraphs nested in text boxes close before their parent, so they are
/// emitted first; each paragraph still comes out whole. Word stores a text
/// box twice, as a drawing (`mc:Choice`) and as a VML copy (`mc:Fallback`);
/// only the drawing copy is read.
pub(crate) fn parse_paragraphs(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;
    // Depth inside an `mc:Fallback` subtree; zero when outside.
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::Malformed(format!(
                    "XML error at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            Ok(Event::Start(_)) if skip_depth > 0 => skip_depth += 1,
            Ok(Event::End(_)) if skip_depth > 0 => skip_depth -= 1,
            _ if skip_depth > 0 => {}
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"mc:Fallback" => skip_depth = 1,
                b"w:p" => open.push(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:p" => {
                    if let Some(paragraph) = open.pop() {
                        paragraphs.push(paragraph);
                    }
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                let current = open.last_mut();
                match (e.name().as_ref(), current) {
                    (b"w:p", _) => paragraphs.push(String::new()),
                    (b"w:tab", Some(p)) => p.push('\t'),
                    (b"w:br" | b"w:cr", Some(p)) => p.push('\n'),
                    _ => {}
                }
            }
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| ExtractError::Malformed(e.to_string()))?;
                if let Some(p) = open.last_mut() {
                    p.push_str(&text);
                }
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

    fn document(body: &str) -> String {
        format!(r#"<?xml version="1.0" encoding="UTF-8"?><w:document {NS}><w:body>{body}</w:body></w:document>"#)
    }

    #[test]
    fn joins_runs_within_a_paragraph() {
        let xml = document(
            r#"<w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:t xml:space="preserve">World</w:t></w:r></w:p>
               <w:p><w:r><w:t>Second</w:t></w:r></w:p>"#,
        );
        let paragraphs = parse_paragraphs(&xml).unwrap();
        assert_eq!(paragraphs, vec!["Hello World", "Second"]);
    }

    #[test]
    fn keeps_empty_paragraphs() {
        let xml = document(
            r#"<w:p><w:r><w:t>One</w:t></w:r></w:p><w:p/><w:p><w:pPr/></w:p><w:p><w:r><w:t>Two</w:t></w:r></w:p>"#,
        );
        let paragraphs = parse_paragraphs(&xml).unwrap();
        assert_eq!(paragraphs, vec!["One", "", "", "Two"]);
    }

    #[test]
    fn tabs_breaks_and_entities() {
        let xml = document(
            r#"<w:p><w:r><w:t>A</w:t><w:tab/><w:t>B</w:t><w:br/><w:t>C &amp; D</w:t></w:r></w:p>"#,
        );
        let paragraphs = parse_paragraphs(&xml).unwrap();
        assert_eq!(paragraphs, vec!["A\tB\nC & D"]);
    }

    #[test]
    fn ignores_text_outside_runs() {
        let xml = document(r#"<w:p><w:r><w:instrText>PAGE</w:instrText><w:t>Body</w:t></w:r></w:p>"#);
        assert_eq!(parse_paragraphs(&xml).unwrap(), vec!["Body"]);
    }

    #[test]
    fn text_box_is_read_once() {
        let text_box = r#"<w:txbxContent><w:p><w:r><w:t>BOX</w:t></w:r></w:p></w:txbxContent>"#;
        let drawing = format!(
            r#"<w:drawing><wp:anchor><a:graphic><a:graphicData><wps:wsp><wps:txbx>{text_box}</wps:txbx></wps:wsp></a:graphicData></a:graphic></wp:anchor></w:drawing>"#
        );
        let vml = format!(r#"<w:pict><v:shape><v:textbox>{text_box}</v:textbox></v:shape></w:pict>"#);
        let xml = document(&format!(
            r#"<w:p><w:r><mc:AlternateContent><mc:Choice Requires="wps">{drawing}</mc:Choice><mc:Fallback>{vml}</mc:Fallback></mc:AlternateContent></w:r><w:r><w:t>Body</w:t></w:r></w:p><w:p><w:r><w:t>After</w:t></w:r></w:p>"#
        ));

        assert_eq!(parse_paragraphs(&xml).unwrap(), vec!["BOX", "Body", "After"]);
    }

    #[test]
    fn extracts_from_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kt.docx");
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(DOCUMENT_PART, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(
            document(r#"<w:p><w:r><w:t>Line one</w:t></w:r></w:p><w:p/><w:p><w:r><w:t>Line two</w:t></w:r></w:p>"#)
                .as_bytes(),
        )
        .unwrap();
        zip.finish().unwrap();

        assert_eq!(extract_text(&path).unwrap(), "Line one\n\nLine two");
    }

    #[test]
    fn non_zip_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.docx");
        std::fs::write(&path, b"plain text, not a zip").unwrap();

        assert!(matches!(extract_text(&path), Err(ExtractError::Zip(_))));
    }
}
