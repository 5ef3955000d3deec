//! PPTX (Office Open XML) parser backend for clue extraction.
//!
//! Parses .pptx files which are ZIP archives containing XML documents,
//! and ZIP archives that bundle several such decks.

pub mod archive;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod parser;

pub use archive::{clues_from_upload, clues_in_zip, decks_in_zip};
pub use parser::PptxParser;
