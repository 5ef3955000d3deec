//! Deck uploads: extract clues, normalize them and store the new words.

use axum::extract::Multipart;
use croco_core::normalize_words;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::AppError;
use crate::state::SharedState;

/// Counts reported back after an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    /// Uploaded file names, comma-separated.
    pub filenames: String,
    /// Raw clue texts found, duplicates included.
    pub extracted: usize,
    /// Distinct non-empty clue texts.
    pub unique_extracted: usize,
    /// Words left after cleaning and spell-checking.
    pub checked_unique: usize,
    /// Words that were new to the store.
    pub inserted: usize,
}

/// One file taken from a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Collect every file sent under the form field `field`.
pub async fn read_files(multipart: &mut Multipart, field: &str) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if part.name() != Some(field) {
            continue;
        }
        let filename = part.file_name().unwrap_or("upload").to_string();
        let bytes = part
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(format!("Failed to read {}: {}", filename, e)))?;
        files.push(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }
    Ok(files)
}

/// Extract, normalize and store the words of every uploaded file.
///
/// Nothing is stored if any file fails to parse.
pub async fn process_uploads(
    state: &SharedState,
    files: Vec<UploadedFile>,
) -> Result<UploadReport, AppError> {
    if files.is_empty() {
        return Err(AppError::bad_request("Files required."));
    }
    let filenames = files
        .iter()
        .map(|f| f.filename.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let extracted = tokio::task::spawn_blocking(move || {
        let mut clues = Vec::new();
        for file in &files {
            let found = croco_pptx::clues_from_upload(&file.filename, &file.bytes)?;
            log::info!("Upload: {} clues in {}", found.len(), file.filename);
            clues.extend(found);
        }
        Ok::<_, croco_core::Error>(clues)
    })
    .await
    .map_err(|e| AppError::Internal(format!("upload task failed: {}", e)))??;

    let unique: BTreeSet<&str> = extracted
        .iter()
        .map(|clue| clue.trim())
        .filter(|clue| !clue.is_empty())
        .collect();
    let unique: Vec<&str> = unique.into_iter().collect();

    let checked = normalize_words(state.speller.as_ref(), &unique).await?;
    let inserted = if checked.is_empty() {
        0
    } else {
        state.store.insert_words(&checked)?
    };

    Ok(UploadReport {
        filenames,
        extracted: extracted.len(),
        unique_extracted: unique.len(),
        checked_unique: checked.len(),
        inserted,
    })
}
