//! SQLite storage for users, sessions, clue words, and per-user word usage.
//!
//! One connection is shared behind a mutex; every operation holds it for the
//! duration of a single statement or transaction.

pub mod error;
pub mod password;
mod schema;
pub mod sessions;
pub mod users;
pub mod words;

pub use error::{StoreError, StoreResult};
pub use users::{User, UserSummary};
pub use words::{WordOrder, WordRow};

use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Handle to the word database.
pub struct Store {
    conn: Mutex<Connection>,
    password_iterations: u32,
}

impl Store {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        log::debug!("Store: opening {}", path.display());
        let conn = Connection::open(path).map_err(|e| {
            log::warn!("Store: open {} failed! {}", path.display(), e);
            StoreError::Database(e)
        })?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        schema::apply(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            password_iterations: password::DEFAULT_ITERATIONS,
        })
    }

    /// Use a different PBKDF2 iteration count for hashes written and checked
    /// from now on.
    pub fn with_password_iterations(mut self, iterations: u32) -> Self {
        self.password_iterations = iterations;
        self
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

/// Current UTC time as stored in text timestamp columns.
pub(crate) fn utc_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
