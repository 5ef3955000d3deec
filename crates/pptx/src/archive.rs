//! Walking ZIP archives of decks and dispatching uploaded files.

use crate::PptxParser;
use croco_core::{deck_clues, Deck, Error, Result, SourceKind};
use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

/// Parse every `.pptx` entry of a ZIP archive.
///
/// Directory entries and entries with any other extension are skipped;
/// decks may sit in nested folders.
pub fn decks_in_zip<R: Read + Seek>(reader: R) -> Result<Vec<Deck>> {
    let mut archive = ZipArchive::new(reader)
        .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;
    let parser = PptxParser::new();
    let mut decks = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", index, e)))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if SourceKind::from_filename(&name) != Some(SourceKind::Pptx) {
            log::debug!("Skipping archive entry {}", name);
            continue;
        }

        // The declared size comes from the archive itself and is not trusted.
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;
        drop(entry);

        log::info!("getting words from {} file", name);
        decks.push(parser.parse(Cursor::new(bytes), &name)?);
    }

    Ok(decks)
}

/// Clue candidates from every deck of a ZIP archive, in archive order.
pub fn clues_in_zip<R: Read + Seek>(reader: R) -> Result<Vec<String>> {
    let clues: Vec<String> = decks_in_zip(reader)?.iter().flat_map(deck_clues).collect();
    log::info!("getting words done. got {} words", clues.len());
    Ok(clues)
}

/// Clue candidates from an uploaded `.pptx` deck or `.zip` archive.
pub fn clues_from_upload(filename: &str, bytes: &[u8]) -> Result<Vec<String>> {
    match SourceKind::from_filename(filename) {
        Some(SourceKind::Pptx) => {
            log::info!("getting words from {} file", filename);
            let deck = PptxParser::new().parse(Cursor::new(bytes), filename)?;
            let clues = deck_clues(&deck);
            log::info!("getting words done. got {} words", clues.len());
            Ok(clues)
        }
        Some(SourceKind::Zip) => clues_in_zip(Cursor::new(bytes)),
        None => Err(Error::UnsupportedFormat(filename.to_string())),
    }
}
