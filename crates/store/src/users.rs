//! User accounts and roles.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::is_constraint_violation;
use crate::password::{generate_salt, hash_password, verify_password};
use crate::{utc_now, Store, StoreError, StoreResult};

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

/// A user as listed on the admin page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
    pub created_at: String,
}

/// Full user row including credentials.
struct UserRecord {
    user: User,
    password_salt: Vec<u8>,
    password_hash: Vec<u8>,
}

fn find_record(conn: &Connection, username: &str) -> StoreResult<Option<UserRecord>> {
    let record = conn
        .query_row(
            "SELECT id, username, password_salt, password_hash, is_admin
             FROM users WHERE username = ?1",
            params![username],
            |row| {
                Ok(UserRecord {
                    user: User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        is_admin: row.get::<_, i64>(4)? == 1,
                    },
                    password_salt: row.get(2)?,
                    password_hash: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(record)
}

impl Store {
    /// Look up a user by exact username.
    pub fn find_user(&self, username: &str) -> StoreResult<Option<User>> {
        let conn = self.conn()?;
        Ok(find_record(&conn, username)?.map(|r| r.user))
    }

    /// Create a user and return its id.
    pub fn create_user(&self, username: &str, password: &str, is_admin: bool) -> StoreResult<i64> {
        let salt = generate_salt();
        let hash = hash_password(password, &salt, self.password_iterations);
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO users (username, password_salt, password_hash, created_at, is_admin)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![username, &salt[..], &hash[..], utc_now(), is_admin as i64],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::Duplicate(format!("user {}", username))
            } else {
                StoreError::Database(e)
            }
        })?;

        log::info!("Store: created user {} (admin: {})", username, is_admin);
        Ok(conn.last_insert_rowid())
    }

    /// Return the user when the password matches.
    pub fn verify_credentials(&self, username: &str, password: &str) -> StoreResult<Option<User>> {
        let record = {
            let conn = self.conn()?;
            find_record(&conn, username)?
        };
        // Hashing runs outside the lock.
        Ok(record.and_then(|r| {
            verify_password(
                password,
                &r.password_salt,
                &r.password_hash,
                self.password_iterations,
            )
            .then_some(r.user)
        }))
    }

    /// Replace a user's password. Returns whether the user exists.
    pub fn set_password(&self, username: &str, password: &str) -> StoreResult<bool> {
        let salt = generate_salt();
        let hash = hash_password(password, &salt, self.password_iterations);
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE users SET password_salt = ?1, password_hash = ?2 WHERE username = ?3",
            params![&salt[..], &hash[..], username],
        )?;
        Ok(changed > 0)
    }

    /// Grant or revoke the admin role. Returns whether the user exists.
    pub fn set_admin(&self, username: &str, is_admin: bool) -> StoreResult<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE users SET is_admin = ?1 WHERE username = ?2",
            params![is_admin as i64, username],
        )?;
        Ok(changed > 0)
    }

    /// Delete a user with their sessions and usage. Returns whether the user existed.
    pub fn delete_user(&self, username: &str) -> StoreResult<bool> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM users WHERE username = ?1", params![username])?;
        Ok(changed > 0)
    }

    /// Number of users holding the admin role.
    pub fn count_admins(&self) -> StoreResult<i64> {
        let conn = self.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM users WHERE is_admin = 1", [], |r| r.get(0))?)
    }

    /// All users, admins first, then by username.
    pub fn list_users(&self) -> StoreResult<Vec<UserSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, username, is_admin, created_at
             FROM users
             ORDER BY is_admin DESC, username ASC",
        )?;
        let users = stmt
            .query_map([], |row| {
                Ok(UserSummary {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    is_admin: row.get::<_, i64>(2)? == 1,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Make sure `username` exists and is an admin.
    ///
    /// A missing user is created with `password`; an existing user keeps
    /// their password and is promoted if needed.
    pub fn ensure_admin(&self, username: &str, password: &str) -> StoreResult<()> {
        match self.find_user(username)? {
            None => {
                self.create_user(username, password, true)?;
            }
            Some(user) if !user.is_admin => {
                log::info!("Store: promoting {} to admin", username);
                self.set_admin(username, true)?;
            }
            Some(_) => {}
        }
        Ok(())
    }
}
