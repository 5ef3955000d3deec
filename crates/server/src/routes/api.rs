//! JSON API behind HTTP Basic auth.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{check_range, is_truthy, query_params, required_credentials};
use crate::auth::{BasicAdmin, BasicUser};
use crate::config::{DEFAULT_WORD_COUNT, MAX_WORD_COUNT};
use crate::error::AppError;
use crate::state::{blocking_store, SharedState};
use crate::upload::{process_uploads, read_files, UploadReport};

pub(super) async fn upload(
    State(state): State<SharedState>,
    BasicUser(user): BasicUser,
    mut multipart: Multipart,
) -> Result<Json<UploadReport>, AppError> {
    let files = read_files(&mut multipart, "file").await?;
    let report = process_uploads(&state, files).await?;
    log::info!("API upload by {}: {} new words", user.username, report.inserted);
    Ok(Json(report))
}

#[derive(Deserialize)]
pub(super) struct WordsQuery {
    n: Option<i64>,
}

#[derive(Serialize)]
pub(super) struct WordsResponse {
    count: usize,
    words: Vec<String>,
}

pub(super) async fn words(
    State(state): State<SharedState>,
    BasicUser(user): BasicUser,
    query: Result<Query<WordsQuery>, QueryRejection>,
) -> Result<Json<WordsResponse>, AppError> {
    let query = query_params(query)?;
    let n = check_range("n", query.n.unwrap_or(DEFAULT_WORD_COUNT), 1, MAX_WORD_COUNT)?;
    let words = state.store.select_words_for_user(user.id, n)?;
    Ok(Json(WordsResponse {
        count: words.len(),
        words,
    }))
}

#[derive(Deserialize)]
pub(super) struct NewUser {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    is_admin: Option<Value>,
}

#[derive(Serialize)]
pub(super) struct CreatedUser {
    username: String,
}

/// Accepts `true`, `1` and the truthy strings.
fn admin_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        Some(Value::String(s)) => is_truthy(s),
        _ => false,
    }
}

pub(super) async fn create_user(
    State(state): State<SharedState>,
    BasicAdmin(_admin): BasicAdmin,
    Json(payload): Json<NewUser>,
) -> Result<Json<CreatedUser>, AppError> {
    let (username, password) = required_credentials(&payload.username, &payload.password)?;
    let is_admin = admin_flag(payload.is_admin.as_ref());
    if state.store.find_user(&username)?.is_some() {
        return Err(AppError::Conflict("User already exists.".to_string()));
    }

    let created = username.clone();
    blocking_store(&state, move |store| store.create_user(&created, &password, is_admin)).await?;
    Ok(Json(CreatedUser { username }))
}
