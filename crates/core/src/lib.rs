//! Core domain types, clue filtering, and spelling normalization
//! for extracting clue words from slide decks.

pub mod clues;
pub mod error;
pub mod spelling;
pub mod types;

pub use clues::{clean_word, deck_clues, is_rejected};
pub use error::{Error, Result};
pub use spelling::{apply_corrections, check_spelling, normalize_words, Correction, Speller};
pub use types::{Deck, ShapeText, Slide, SourceKind};
