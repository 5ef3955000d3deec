//! Clue candidate filtering and word cleaning.
//!
//! A clue is a shape whose whole text is a single word. Shapes holding
//! phrases, hyphenated compounds, "label: value" pairs, or the game banner
//! are rejected before any cleaning happens.

use crate::Deck;
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Everything that is not a Latin or Cyrillic letter.
static NON_LETTER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-zА-Яа-яЁё]+").unwrap());

/// Characters whose presence disqualifies a shape text as a clue.
const REJECTED_CHARS: &[char] = &[' ', '-', ':'];

/// Banner printed on title slides of the game decks.
pub const BANNER_WORD: &str = "СУПЕРКРОКО";

/// Whether a shape text cannot be a single-word clue.
pub fn is_rejected(text: &str) -> bool {
    text.contains(REJECTED_CHARS) || text.contains(BANNER_WORD)
}

/// Clue candidates of a deck, in slide order.
///
/// Every accepted shape yields its trimmed text, which can be empty for
/// shapes with an empty text frame.
pub fn deck_clues(deck: &Deck) -> Vec<String> {
    let clues: Vec<String> = deck
        .shape_texts()
        .filter(|text| !is_rejected(text))
        .map(|text| text.trim().to_string())
        .collect();

    log::debug!("{}: got {} clue candidates", deck.filename, clues.len());
    clues
}

/// Reduce a word to its letters.
///
/// The input is NFC-normalized first so that a decomposed "ё" survives as a
/// letter instead of losing its combining diaeresis.
pub fn clean_word(word: &str) -> String {
    let composed: String = word.nfc().collect();
    NON_LETTER_REGEX
        .replace_all(&composed, "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Slide;

    #[test]
    fn test_is_rejected() {
        assert!(is_rejected("two words"));
        assert!(is_rejected("with-hyphen"));
        assert!(is_rejected("with:colon"));
        assert!(is_rejected("СУПЕРКРОКО"));
        assert!(is_rejected("ИграСУПЕРКРОКО2"));
        assert!(!is_rejected("apple\n"));
        assert!(!is_rejected("банан"));
        assert!(!is_rejected(""));
    }

    #[test]
    fn test_deck_clues_filters_and_strips() {
        let mut slide = Slide::new(1);
        for text in [
            "apple\n",
            "two words",
            "with-hyphen",
            "with:colon",
            "СУПЕРКРОКО",
            "banana",
        ] {
            slide.add_shape(text);
        }
        let mut deck = Deck::new("sample.pptx");
        deck.add_slide(slide);

        assert_eq!(deck_clues(&deck), vec!["apple", "banana"]);
    }

    #[test]
    fn test_deck_clues_keeps_empty_shapes() {
        let mut slide = Slide::new(1);
        slide.add_shape("\n");
        let mut deck = Deck::new("blank.pptx");
        deck.add_slide(slide);

        assert_eq!(deck_clues(&deck), vec![""]);
    }

    #[test]
    fn test_clean_word() {
        assert_eq!(clean_word("apple"), "apple");
        assert_eq!(clean_word(" Ёлка! "), "Ёлка");
        assert_eq!(clean_word("«кот»"), "кот");
        assert_eq!(clean_word("r2d2"), "rd");
        assert_eq!(clean_word("a\nb"), "ab");
        assert_eq!(clean_word("123"), "");
        assert_eq!(clean_word("über"), "ber");
    }

    #[test]
    fn test_clean_word_composes_decomposed_yo() {
        let decomposed = "е\u{0308}ж";
        assert_eq!(clean_word(decomposed), "ёж");
    }
}
