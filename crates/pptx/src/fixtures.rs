//! In-memory PPTX decks and ZIP archives for tests.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const SLIDE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const LAYOUT_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";

/// Build a ZIP archive from `(path, content)` entries.
pub fn archive_bytes(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    archive_with_dirs(&[], entries)
}

/// Build a ZIP archive with explicit directory entries followed by files.
pub fn archive_with_dirs(dirs: &[&str], entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();

    for dir in dirs {
        zip.add_directory(*dir, options).expect("add directory");
    }
    for (path, content) in entries {
        zip.start_file(*path, options).expect("start file");
        zip.write_all(content).expect("write file");
    }

    zip.finish().expect("finish archive").into_inner()
}

/// Flip bytes in the middle of the first entry's data of a ZIP archive.
///
/// The local header is left intact, so the archive still opens and the
/// damage only shows when the entry is read.
pub fn corrupt_first_entry(mut archive: Vec<u8>) -> Vec<u8> {
    let u16_at = |at: usize| u16::from_le_bytes([archive[at], archive[at + 1]]) as usize;
    let compressed = u32::from_le_bytes([archive[18], archive[19], archive[20], archive[21]]) as usize;
    let data_start = 30 + u16_at(26) + u16_at(28);
    assert!(compressed > 8, "entry too small to corrupt");

    let from = data_start + compressed / 4;
    let to = (from + 40).min(data_start + compressed - 4);
    for byte in &mut archive[from..to] {
        *byte ^= 0xA5;
    }
    archive
}

/// Build a PPTX deck; each slide lists the texts of its shapes.
///
/// A `\n` in a shape text starts a new paragraph.
pub fn deck_bytes(slides: &[&[&str]]) -> Vec<u8> {
    let mut rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    rels.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="{}" Target="slideMasters/slideMaster1.xml"/>"#,
        slides.len() + 1,
        LAYOUT_REL_TYPE
    ));
    // Written in reverse so ordering has to come from the ids.
    for number in (1..=slides.len()).rev() {
        rels.push_str(&format!(
            r#"<Relationship Id="rId{0}" Type="{1}" Target="slides/slide{0}.xml"/>"#,
            number, SLIDE_REL_TYPE
        ));
    }
    rels.push_str("</Relationships>");

    let mut entries: Vec<(String, Vec<u8>)> = vec![
        (
            "[Content_Types].xml".to_string(),
            br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#.to_vec(),
        ),
        ("ppt/_rels/presentation.xml.rels".to_string(), rels.into_bytes()),
    ];
    for (idx, shapes) in slides.iter().enumerate() {
        entries.push((
            format!("ppt/slides/slide{}.xml", idx + 1),
            slide_xml(shapes).into_bytes(),
        ));
    }

    let borrowed: Vec<(&str, Vec<u8>)> = entries
        .iter()
        .map(|(path, content)| (path.as_str(), content.clone()))
        .collect();
    archive_bytes(&borrowed)
}

fn slide_xml(shapes: &[&str]) -> String {
    let mut body = String::new();
    for (idx, text) in shapes.iter().enumerate() {
        body.push_str(&format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="TextBox"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/>"#,
            idx + 2
        ));
        for paragraph in text.split('\n') {
            if paragraph.is_empty() {
                body.push_str("<a:p/>");
            } else {
                body.push_str(&format!(
                    "<a:p><a:r><a:t>{}</a:t></a:r></a:p>",
                    escape_xml(paragraph)
                ));
            }
        }
        body.push_str("</p:txBody></p:sp>");
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
        body
    )
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
