//! Login sessions keyed by opaque random tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use rand::RngCore;
use rusqlite::{params, OptionalExtension};
use std::time::Duration;

use crate::{Store, StoreResult, User};

/// Random bytes behind each session token.
const TOKEN_BYTES: usize = 32;

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

impl Store {
    /// Start a session for `user_id` lasting `ttl` and return its token.
    pub fn create_session(&self, user_id: i64, ttl: Duration) -> StoreResult<String> {
        let token = new_token();
        let now = Utc::now().timestamp();
        let expires_at = now.saturating_add(ttl.as_secs() as i64);

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![token, user_id, now, expires_at],
        )?;
        Ok(token)
    }

    /// The user behind an unexpired session token.
    pub fn session_user(&self, token: &str) -> StoreResult<Option<User>> {
        let now = Utc::now().timestamp();
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT u.id, u.username, u.is_admin
                 FROM sessions AS s
                 JOIN users AS u ON u.id = s.user_id
                 WHERE s.token = ?1 AND s.expires_at > ?2",
                params![token, now],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        is_admin: row.get::<_, i64>(2)? == 1,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// End a session. Unknown tokens are ignored.
    pub fn delete_session(&self, token: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(())
    }

    /// Drop every expired session and return how many were removed.
    pub fn purge_expired_sessions(&self) -> StoreResult<usize> {
        let now = Utc::now().timestamp();
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
        if removed > 0 {
            log::info!("Store: purged {} expired sessions", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(60 * 60 * 24);

    fn store_with_user() -> (Store, i64) {
        let store = Store::open_in_memory().unwrap().with_password_iterations(1);
        let id = store.create_user("alice", "pw", false).unwrap();
        (store, id)
    }

    #[test]
    fn test_token_is_url_safe() {
        let token = new_token();
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(token, new_token());
    }

    #[test]
    fn test_session_resolves_user() {
        let (store, id) = store_with_user();
        let token = store.create_session(id, DAY).unwrap();

        let user = store.session_user(&token).unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.username, "alice");
        assert!(store.session_user("unknown").unwrap().is_none());
    }

    #[test]
    fn test_expired_session_is_rejected_and_purged() {
        let (store, id) = store_with_user();
        let token = store.create_session(id, Duration::ZERO).unwrap();
        let live = store.create_session(id, DAY).unwrap();

        assert!(store.session_user(&token).unwrap().is_none());
        assert_eq!(store.purge_expired_sessions().unwrap(), 1);
        assert!(store.session_user(&live).unwrap().is_some());
    }

    #[test]
    fn test_delete_session() {
        let (store, id) = store_with_user();
        let token = store.create_session(id, DAY).unwrap();
        store.delete_session(&token).unwrap();
        assert!(store.session_user(&token).unwrap().is_none());
        store.delete_session(&token).unwrap();
    }

    #[test]
    fn test_deleting_user_ends_sessions() {
        let (store, id) = store_with_user();
        let token = store.create_session(id, DAY).unwrap();
        store.delete_user("alice").unwrap();
        assert!(store.session_user(&token).unwrap().is_none());
    }
}
