//! Shape text extraction from PPTX decks.
//!
//! Slides are read in presentation order; each top-level shape with a text
//! frame yields one text, paragraphs joined by newlines.

use croco_core::{Deck, Error, Result, Slide};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Line break inside a paragraph, as presentation tools render `a:br`.
const LINE_BREAK: char = '\u{b}';

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    pub fn new() -> Self {
        Self
    }

    /// Read every slide's shape texts from a deck.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Deck> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut deck = Deck::new(filename);

        let slide_order = self.get_slide_order(&mut archive)?;

        for (idx, slide_path) in slide_order.iter().enumerate() {
            let slide = self.parse_slide(&mut archive, slide_path, idx + 1)?;
            deck.add_slide(slide);
        }

        log::debug!("{}: parsed {} slides", filename, deck.slides.len());
        Ok(deck)
    }

    /// Get the ordered list of slide paths from the presentation relationships.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_path = "ppt/_rels/presentation.xml.rels";

        let rels_content = self.read_file_from_archive(archive, rels_path)?;
        let mut slides: Vec<(String, Option<usize>)> = Vec::new();

        let mut reader = Reader::from_str(&rels_content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut id = String::new();

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Type" => rel_type = String::from_utf8_lossy(&attr.value).to_string(),
                            b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                            b"Id" => id = String::from_utf8_lossy(&attr.value).to_string(),
                            _ => {}
                        }
                    }

                    if is_slide_relationship(&rel_type) {
                        let order_num =
                            extract_slide_number(&id).or_else(|| extract_slide_number(&target));
                        let full_path = match target.strip_prefix('/') {
                            Some(absolute) => absolute.to_string(),
                            None => format!("ppt/{}", target),
                        };
                        slides.push((full_path, order_num));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing relationships: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide from the archive.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<Slide> {
        let content = self.read_file_from_archive(archive, slide_path)?;
        let mut slide = Slide::new(slide_number);

        for text in extract_shape_texts(&content) {
            slide.add_shape(text);
        }

        Ok(slide)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive.by_name(path).map_err(|e| {
            Error::PptxParseError(format!("File not found in package '{}': {}", path, e))
        })?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Text collected for the shape currently being read.
#[derive(Debug, Default)]
struct ShapeState {
    has_text_frame: bool,
    paragraphs: usize,
    text: String,
}

impl ShapeState {
    fn start_paragraph(&mut self) {
        if self.paragraphs > 0 {
            self.text.push('\n');
        }
        self.paragraphs += 1;
    }
}

/// Texts of the top-level shapes with a text frame, in document order.
///
/// Shapes nested in group shapes or `mc:AlternateContent` wrappers are not
/// top-level and are skipped, as are pictures, tables, and other graphic
/// frames. A shape text is its paragraphs joined by `\n`.
fn extract_shape_texts(xml_content: &str) -> Vec<String> {
    let mut texts = Vec::new();
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(false);

    // Open grpSp and AlternateContent elements around the cursor.
    let mut wrapper_depth = 0usize;
    let mut current_shape: Option<ShapeState> = None;
    let mut in_text_body = false;
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"grpSp" | b"AlternateContent" => wrapper_depth += 1,
                b"sp" if wrapper_depth == 0 => current_shape = Some(ShapeState::default()),
                b"txBody" => {
                    if let Some(ref mut shape) = current_shape {
                        shape.has_text_frame = true;
                        in_text_body = true;
                    }
                }
                b"p" if in_text_body => {
                    if let Some(ref mut shape) = current_shape {
                        shape.start_paragraph();
                    }
                }
                b"t" if in_text_body => in_run_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                handle_empty_element(e, in_text_body, current_shape.as_mut());
            }
            Ok(Event::Text(ref e)) => {
                if in_run_text {
                    if let Some(ref mut shape) = current_shape {
                        match e.unescape() {
                            Ok(text) => shape.text.push_str(&text),
                            Err(err) => log::warn!("Skipping undecodable text run: {}", err),
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"grpSp" | b"AlternateContent" => wrapper_depth = wrapper_depth.saturating_sub(1),
                b"sp" if wrapper_depth == 0 => {
                    if let Some(shape) = current_shape.take() {
                        if shape.has_text_frame {
                            texts.push(shape.text);
                        }
                    }
                    in_text_body = false;
                    in_run_text = false;
                }
                b"txBody" => in_text_body = false,
                b"t" => in_run_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error, keeping shapes read so far: {}", e);
                break;
            }
            _ => {}
        }
    }

    texts
}

/// Self-closing elements that still contribute to shape text.
fn handle_empty_element(e: &BytesStart<'_>, in_text_body: bool, shape: Option<&mut ShapeState>) {
    let Some(shape) = shape else {
        return;
    };
    match local_name(e.name().as_ref()) {
        // <p:txBody/> is a text frame with no paragraphs.
        b"txBody" => shape.has_text_frame = true,
        b"p" if in_text_body => shape.start_paragraph(),
        b"br" if in_text_body => shape.text.push(LINE_BREAK),
        _ => {}
    }
}

/// Whether a relationship type points at a slide (not a layout or master).
fn is_slide_relationship(rel_type: &str) -> bool {
    rel_type.ends_with("/slide")
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use std::io::Cursor;

    fn slide_xml(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree>
    <p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>
    {}
  </p:spTree></p:cSld>
</p:sld>"#,
            body
        )
    }

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_is_slide_relationship() {
        let base = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
        assert!(is_slide_relationship(&format!("{}/slide", base)));
        assert!(!is_slide_relationship(&format!("{}/slideLayout", base)));
        assert!(!is_slide_relationship(&format!("{}/slideMaster", base)));
        assert!(!is_slide_relationship(&format!("{}/notesMaster", base)));
    }

    #[test]
    fn test_shape_paragraphs_join_with_newline() {
        let xml = slide_xml(
            r#"<p:sp><p:txBody><a:bodyPr/>
                <a:p><a:r><a:t>Ябл</a:t></a:r><a:r><a:t>око</a:t></a:r></a:p>
                <a:p/>
                <a:p><a:r><a:t>груша</a:t></a:r><a:br/><a:r><a:t>слива</a:t></a:r></a:p>
            </p:txBody></p:sp>"#,
        );
        assert_eq!(
            extract_shape_texts(&xml),
            vec!["Яблоко\n\nгруша\u{b}слива".to_string()]
        );
    }

    #[test]
    fn test_whitespace_inside_runs_is_kept() {
        let xml = slide_xml(
            r#"<p:sp><p:txBody><a:p><a:r><a:t>two words</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        assert_eq!(extract_shape_texts(&xml), vec!["two words".to_string()]);
    }

    #[test]
    fn test_entities_are_unescaped() {
        let xml = slide_xml(
            r#"<p:sp><p:txBody><a:p><a:r><a:t>A&amp;B</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        assert_eq!(extract_shape_texts(&xml), vec!["A&B".to_string()]);
    }

    #[test]
    fn test_shapes_without_text_frame_are_skipped() {
        let xml = slide_xml(
            r#"<p:sp><p:spPr/></p:sp>
               <p:pic><p:blipFill/></p:pic>
               <p:graphicFrame><a:graphic><a:graphicData><a:tbl><a:tr><a:tc><a:txBody>
                 <a:p><a:r><a:t>cell</a:t></a:r></a:p>
               </a:txBody></a:tc></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>
               <p:sp><p:txBody><a:p><a:r><a:t>kept</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        assert_eq!(extract_shape_texts(&xml), vec!["kept".to_string()]);
    }

    #[test]
    fn test_empty_text_frame_yields_empty_text() {
        let xml = slide_xml(r#"<p:sp><p:txBody><a:bodyPr/><a:p/></p:txBody></p:sp>"#);
        assert_eq!(extract_shape_texts(&xml), vec![String::new()]);
    }

    #[test]
    fn test_grouped_shapes_are_not_top_level() {
        let xml = slide_xml(
            r#"<p:grpSp><p:nvGrpSpPr/>
                 <p:sp><p:txBody><a:p><a:r><a:t>inner</a:t></a:r></a:p></p:txBody></p:sp>
               </p:grpSp>
               <p:sp><p:txBody><a:p><a:r><a:t>outer</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        assert_eq!(extract_shape_texts(&xml), vec!["outer".to_string()]);
    }

    #[test]
    fn test_alternate_content_shapes_are_skipped() {
        let xml = slide_xml(
            r#"<mc:AlternateContent xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006">
                 <mc:Choice Requires="a14">
                   <p:sp><p:txBody><a:p><a:r><a:t>formula</a:t></a:r></a:p></p:txBody></p:sp>
                 </mc:Choice>
                 <mc:Fallback>
                   <p:sp><p:txBody><a:p><a:r><a:t>formula</a:t></a:r></a:p></p:txBody></p:sp>
                 </mc:Fallback>
               </mc:AlternateContent>
               <p:sp><p:txBody><a:p><a:r><a:t>plain</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        assert_eq!(extract_shape_texts(&xml), vec!["plain".to_string()]);
    }

    #[test]
    fn test_malformed_xml_keeps_shapes_read_before_the_error() {
        let xml = slide_xml(
            r#"<p:sp><p:txBody><a:p><a:r><a:t>first</a:t></a:r></a:p></p:txBody></p:sp>
               <p:sp><p:txBody><a:p><a:r><a:t>x</a:b>
               <p:sp><p:txBody><a:p><a:r><a:t>after</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        assert_eq!(extract_shape_texts(&xml), vec!["first".to_string()]);
    }

    #[test]
    fn test_parse_orders_slides_by_relationship() {
        let bytes = fixtures::deck_bytes(&[&["first"], &["second", "third"]]);
        let deck = PptxParser::new()
            .parse(Cursor::new(bytes), "game.pptx")
            .unwrap();

        assert_eq!(deck.filename, "game.pptx");
        assert_eq!(deck.slides.len(), 2);
        assert_eq!(deck.slides[0].number, 1);
        assert_eq!(deck.slides[1].number, 2);
        let texts: Vec<&str> = deck.shape_texts().collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_parse_rejects_non_zip() {
        let result = PptxParser::new().parse(Cursor::new(b"not a zip".to_vec()), "bad.pptx");
        assert!(matches!(result, Err(Error::ZipError(_))));
    }

    #[test]
    fn test_parse_requires_presentation_relationships() {
        let bytes = fixtures::archive_bytes(&[("docProps/app.xml", b"<Properties/>".to_vec())]);
        let result = PptxParser::new().parse(Cursor::new(bytes), "empty.pptx");
        assert!(matches!(result, Err(Error::PptxParseError(_))));
    }
}
