//! Clue words and per-user usage.
//!
//! Downloads pick words least-recently-used first for the requesting user:
//! words the user never received come first, then the ones received longest
//! ago. Ties are broken randomly so equally fresh words rotate.

use rusqlite::params;

use crate::error::is_constraint_violation;
use crate::{utc_now, Store, StoreError, StoreResult};

/// Sort order of the word list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordOrder {
    /// Alphabetical.
    #[default]
    Alpha,
    /// Newest first, then alphabetical.
    CreatedDesc,
}

impl WordOrder {
    /// Parse the query-string form.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "alpha" => Some(Self::Alpha),
            "created_desc" => Some(Self::CreatedDesc),
            _ => None,
        }
    }

    /// Query-string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::CreatedDesc => "created_desc",
        }
    }

    fn order_by(&self) -> &'static str {
        match self {
            Self::Alpha => "w.word ASC",
            Self::CreatedDesc => "w.created_at DESC, w.word ASC",
        }
    }
}

/// A word with the viewer's last use of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRow {
    pub id: i64,
    pub word: String,
    /// RFC 3339 UTC timestamp, `None` if the viewer never received it.
    pub last_used_at: Option<String>,
}

impl Store {
    /// Total number of stored words.
    pub fn count_words(&self) -> StoreResult<i64> {
        let conn = self.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM words", [], |r| r.get(0))?)
    }

    /// Insert words that are not stored yet; returns how many were new.
    pub fn insert_words(&self, words: &[String]) -> StoreResult<usize> {
        let now = utc_now();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO words (word, created_at) VALUES (?1, ?2)")?;
            for word in words {
                inserted += stmt.execute(params![word, now])?;
            }
        }
        tx.commit()?;

        log::info!("Store: inserted {} of {} words", inserted, words.len());
        Ok(inserted)
    }

    /// One page of words with `user_id`'s last use of each.
    pub fn list_words(
        &self,
        user_id: i64,
        order: WordOrder,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<WordRow>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT w.id, w.word, u.last_used_at
             FROM words AS w
             LEFT JOIN user_word_usage AS u
                 ON u.word_id = w.id AND u.user_id = ?1
             ORDER BY {}
             LIMIT ?2 OFFSET ?3",
            order.order_by()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![user_id, limit, offset], |row| {
                Ok(WordRow {
                    id: row.get(0)?,
                    word: row.get(1)?,
                    last_used_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Rename a word. Returns whether the word exists.
    pub fn update_word(&self, word_id: i64, word: &str) -> StoreResult<bool> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE words SET word = ?1 WHERE id = ?2",
                params![word, word_id],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::Duplicate(format!("word {}", word))
                } else {
                    StoreError::Database(e)
                }
            })?;
        Ok(changed > 0)
    }

    /// Pick up to `limit` words least recently used by `user_id` and mark
    /// them used now.
    ///
    /// Selection and marking happen in one transaction. The returned order
    /// is the selection order.
    pub fn select_words_for_user(&self, user_id: i64, limit: i64) -> StoreResult<Vec<String>> {
        let now = utc_now();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let picked: Vec<(i64, String)> = {
            let mut stmt = tx.prepare(
                "SELECT w.id, w.word
                 FROM words AS w
                 LEFT JOIN user_word_usage AS u
                     ON u.word_id = w.id AND u.user_id = ?1
                 ORDER BY u.last_used_at IS NOT NULL, u.last_used_at ASC, RANDOM()
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![user_id, limit], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        {
            let mut stmt = tx.prepare(
                "INSERT INTO user_word_usage (user_id, word_id, last_used_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, word_id)
                 DO UPDATE SET last_used_at = excluded.last_used_at",
            )?;
            for (word_id, _) in &picked {
                stmt.execute(params![user_id, word_id, now])?;
            }
        }
        tx.commit()?;

        log::debug!("Store: user {} received {} words", user_id, picked.len());
        Ok(picked.into_iter().map(|(_, word)| word).collect())
    }

    /// Forget every word `user_id` has received.
    pub fn reset_usage(&self, user_id: i64) -> StoreResult<usize> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM user_word_usage WHERE user_id = ?1",
            params![user_id],
        )?;
        log::info!("Store: reset {} usage rows for user {}", removed, user_id);
        Ok(removed)
    }
}
