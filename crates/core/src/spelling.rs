//! Spelling normalization of clue words against an external speller.

use crate::clues::clean_word;
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeSet;

/// A spelling authority that can correct free text.
#[async_trait]
pub trait Speller: Send + Sync {
    /// Return `text` with every reported misspelling replaced by the
    /// first suggestion.
    async fn spelled(&self, text: &str) -> Result<String>;
}

/// One misspelling reported by a speller.
///
/// `pos` and `len` count characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Correction {
    pub pos: usize,
    pub len: usize,
    pub word: String,
    #[serde(rename = "s", default)]
    pub suggestions: Vec<String>,
}

/// Apply reported corrections to `text`.
///
/// Corrections without suggestions are ignored. A correction whose span
/// does not hold its reported word, or that overlaps one already applied,
/// is skipped.
pub fn apply_corrections(text: &str, corrections: &[Correction]) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    let mut ordered: Vec<&Correction> = corrections
        .iter()
        .filter(|c| !c.suggestions.is_empty())
        .collect();
    // Right to left so earlier positions stay valid.
    ordered.sort_by(|a, b| b.pos.cmp(&a.pos));

    let mut limit = chars.len();
    for correction in ordered {
        let end = correction.pos.checked_add(correction.len);
        let Some(end) = end.filter(|&end| end <= limit) else {
            log::warn!(
                "skipping correction of '{}' at {}: span out of range or overlapping",
                correction.word,
                correction.pos
            );
            continue;
        };
        let original: String = chars[correction.pos..end].iter().collect();
        if original != correction.word {
            log::warn!(
                "skipping correction of '{}' at {}: text there is '{}'",
                correction.word,
                correction.pos,
                original
            );
            continue;
        }
        chars.splice(correction.pos..end, correction.suggestions[0].chars());
        limit = correction.pos;
    }

    chars.into_iter().collect()
}

/// Spell-check a list of words with a single speller call.
///
/// An empty list never reaches the speller.
pub async fn check_spelling(speller: &dyn Speller, words: &[String]) -> Result<Vec<String>> {
    if words.is_empty() {
        return Ok(Vec::new());
    }

    log::info!("checking {} words for spelling", words.len());
    let spelled = speller.spelled(&words.join(" ")).await?;
    log::info!("spell checking done");

    Ok(spelled.split_whitespace().map(str::to_string).collect())
}

/// Clean, deduplicate, spell-check, and clean again.
///
/// The result is sorted and free of duplicates and empty words.
pub async fn normalize_words<S: AsRef<str>>(
    speller: &dyn Speller,
    words: &[S],
) -> Result<Vec<String>> {
    let unique: Vec<String> = clean_unique(words.iter().map(|w| w.as_ref()));
    let checked = check_spelling(speller, &unique).await?;
    Ok(clean_unique(checked.iter().map(String::as_str)))
}

fn clean_unique<'a>(words: impl Iterator<Item = &'a str>) -> Vec<String> {
    words
        .map(clean_word)
        .filter(|w| !w.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
