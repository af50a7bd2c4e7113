use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use super::{DocumentTextExtractor, ExtractionError};
use crate::outcome::Outcome;

/// Slide text from a PowerPoint package, one `=== Slide N ===` block per slide.
pub struct PptxExtractor;

fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

/// Collect `<a:t>` runs, one line per `<a:p>` paragraph.
fn slide_text(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut in_text = false;
    let mut paragraph = String::new();
    let mut lines: Vec<String> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"a:t" => in_text = true,
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:p" => {
                    let line = paragraph.trim();
                    if !line.is_empty() {
                        lines.push(line.to_string());
                    }
                    paragraph.clear();
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| ExtractionError::Failed(format!("Error reading PPTX: {e}")))?;
                paragraph.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractionError::Failed(format!("Error reading PPTX: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    if !paragraph.trim().is_empty() {
        lines.push(paragraph.trim().to_string());
    }
    Ok(lines.join("\n"))
}

impl DocumentTextExtractor for PptxExtractor {
    fn name(&self) -> &'static str {
        "pptx"
    }

    fn extract(&self, bytes: &[u8]) -> Result<Outcome<String>, ExtractionError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractionError::Failed(format!("Error reading PPTX: {e}")))?;

        let mut slides: Vec<(u32, String)> = archive
            .file_names()
            .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
            .collect();
        slides.sort_by_key(|(n, _)| *n);

        let mut out = String::new();
        for (position, (_, name)) in slides.iter().enumerate() {
            let mut xml = String::new();
            archive
                .by_name(name)
                .map_err(|e| ExtractionError::Failed(format!("Error reading PPTX: {e}")))?
                .read_to_string(&mut xml)
                .map_err(|e| ExtractionError::Failed(format!("Error reading PPTX: {e}")))?;

            out.push_str(&format!("\n=== Slide {} ===\n", position + 1));
            let text = slide_text(&xml)?;
            if !text.is_empty() {
                out.push_str(&text);
                out.push('\n');
            }
            out.push('\n');
        }

        Ok(Outcome::Full(out.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_pptx(slides: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored);
            for (name, body) in slides {
                writer.start_file(*name, options).unwrap();
                writer.write_all(body.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    fn slide(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:t>{p}</a:t></a:r></a:p>"))
            .collect();
        format!(
            r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="p"><p:txBody>{body}</p:txBody></p:sld>"#
        )
    }

    #[test]
    fn parses_slide_numbers() {
        assert_eq!(slide_number("ppt/slides/slide12.xml"), Some(12));
        assert_eq!(slide_number("ppt/slides/_rels/slide1.xml.rels"), None);
    }

    #[test]
    fn extracts_slides_in_numeric_order() {
        let second = slide(&["Second slide"]);
        let tenth = slide(&["Tenth slide", "Q&amp;A"]);
        let first = slide(&["Title", "Subtitle"]);
        let bytes = build_pptx(&[
            ("ppt/slides/slide10.xml", &tenth),
            ("ppt/slides/slide2.xml", &second),
            ("ppt/slides/slide1.xml", &first),
        ]);

        let text = PptxExtractor.extract(&bytes).unwrap().into_value();
        assert_eq!(
            text,
            "=== Slide 1 ===\nTitle\nSubtitle\n\n\n=== Slide 2 ===\nSecond slide\n\n\n=== Slide 3 ===\nTenth slide\nQ&A"
        );
    }

    #[test]
    fn rejects_non_zip_input() {
        assert!(PptxExtractor.extract(b"nope").is_err());
    }
}
