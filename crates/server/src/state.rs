//! Shared application state.

use croco_core::Speller;
use croco_store::{Store, StoreResult};
use std::sync::Arc;
use std::time::Duration;

use crate::config::SESSION_TTL;
use crate::error::AppError;

/// Default request body limit (100 MB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

pub struct AppState {
    pub store: Store,
    pub speller: Arc<dyn Speller>,
    pub session_ttl: Duration,
    pub max_upload_bytes: usize,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: Store, speller: Arc<dyn Speller>) -> Self {
        Self {
            store,
            speller,
            session_ttl: SESSION_TTL,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}

/// Run a store operation on the blocking pool.
///
/// Used for calls that hash passwords.
pub async fn blocking_store<T, F>(state: &SharedState, op: F) -> Result<T, AppError>
where
    F: FnOnce(&Store) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || op(&state.store))
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {}", e)))?
        .map_err(AppError::from)
}
