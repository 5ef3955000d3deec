//! Browser pages behind the session cookie.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use croco_core::{check_spelling, clean_word};
use croco_store::{StoreError, WordOrder};
use rand::seq::SliceRandom;
use serde::Deserialize;

use super::{check_range, is_truthy, query_params};
use crate::auth::{cleared_session_cookie, session_cookie, session_token, SessionUser};
use crate::config::{DEFAULT_WORDS_PAGE_SIZE, DEFAULT_WORD_COUNT, MAX_WORDS_PAGE_SIZE, MAX_WORD_COUNT};
use crate::error::AppError;
use crate::pages::{self, Notice, WordsPage};
use crate::state::{blocking_store, SharedState};
use crate::upload::{process_uploads, read_files};

const LOGIN_FAILED: &str = "Неверный логин или пароль.";

pub(super) async fn index(
    State(state): State<SharedState>,
    SessionUser(user): SessionUser,
) -> Result<Html<String>, AppError> {
    let total = state.store.count_words()?;
    Ok(Html(pages::index_page(&user.username, user.is_admin, total)))
}

pub(super) async fn login_form(State(state): State<SharedState>, headers: HeaderMap) -> Result<Response, AppError> {
    if let Some(token) = session_token(&headers) {
        if state.store.session_user(&token)?.is_some() {
            return Ok(Redirect::to("/").into_response());
        }
    }
    Ok(Html(pages::login_page("", None)).into_response())
}

#[derive(Deserialize)]
pub(super) struct LoginForm {
    username: String,
    password: String,
}

pub(super) async fn login(
    State(state): State<SharedState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim().to_string();
    let password = form.password.trim().to_string();

    let user = {
        let username = username.clone();
        blocking_store(&state, move |store| store.verify_credentials(&username, &password)).await?
    };
    let Some(user) = user else {
        log::warn!("Login failed for {}", username);
        return Ok((
            StatusCode::UNAUTHORIZED,
            Html(pages::login_page(&username, Some(LOGIN_FAILED))),
        )
            .into_response());
    };

    let token = state.store.create_session(user.id, state.session_ttl)?;
    log::info!("User {} signed in", user.username);
    Ok((
        [(header::SET_COOKIE, session_cookie(&token))],
        Redirect::to("/"),
    )
        .into_response())
}

pub(super) async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Result<Response, AppError> {
    if let Some(token) = session_token(&headers) {
        state.store.delete_session(&token)?;
    }
    Ok((
        [(header::SET_COOKIE, cleared_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response())
}

#[derive(Deserialize)]
pub(super) struct WordsQuery {
    page: Option<i64>,
    per_page: Option<i64>,
    order: Option<String>,
    msg: Option<String>,
}

pub(super) async fn words_page(
    State(state): State<SharedState>,
    SessionUser(user): SessionUser,
    query: Result<Query<WordsQuery>, QueryRejection>,
) -> Result<Html<String>, AppError> {
    let query = query_params(query)?;
    let page = check_range("page", query.page.unwrap_or(1), 1, i64::MAX)?;
    let per_page = check_range(
        "per_page",
        query.per_page.unwrap_or(DEFAULT_WORDS_PAGE_SIZE),
        1,
        MAX_WORDS_PAGE_SIZE,
    )?;
    let order = match query.order.as_deref() {
        None => WordOrder::default(),
        Some(raw) => WordOrder::parse(raw).ok_or_else(|| {
            AppError::Unprocessable("order must be alpha or created_desc".to_string())
        })?,
    };

    let total = state.store.count_words()?;
    let offset = (page - 1).saturating_mul(per_page);
    let words = state.store.list_words(user.id, order, per_page, offset)?;

    let view = WordsPage {
        username: &user.username,
        words: &words,
        total,
        page,
        per_page,
        order,
        notice: query.msg.as_deref().and_then(Notice::from_code),
    };
    Ok(Html(view.render()))
}

#[derive(Deserialize)]
pub(super) struct EditWordForm {
    word_id: i64,
    word: String,
}

pub(super) async fn edit_word(
    State(state): State<SharedState>,
    SessionUser(_user): SessionUser,
    Form(form): Form<EditWordForm>,
) -> Result<Redirect, AppError> {
    let notice = edit_notice(&state, form.word_id, &form.word).await?;
    Ok(Redirect::to(&notice.location()))
}

async fn edit_notice(state: &SharedState, word_id: i64, raw: &str) -> Result<Notice, AppError> {
    let cleaned = clean_word(raw);
    if cleaned.is_empty() {
        return Ok(Notice::EmptyAfterCleaning);
    }

    let checked = check_spelling(state.speller.as_ref(), &[cleaned]).await?;
    let checked = checked.first().map(|w| clean_word(w)).unwrap_or_default();
    if checked.is_empty() {
        return Ok(Notice::NoValidSuggestion);
    }

    match state.store.update_word(word_id, &checked) {
        Ok(true) => {
            log::info!("Word {} renamed to {}", word_id, checked);
            Ok(Notice::Updated)
        }
        Ok(false) => Ok(Notice::NotFound),
        Err(StoreError::Duplicate(_)) => Ok(Notice::Duplicate),
        Err(e) => Err(e.into()),
    }
}

pub(super) async fn upload(
    State(state): State<SharedState>,
    SessionUser(user): SessionUser,
    mut multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let files = read_files(&mut multipart, "files").await?;
    let report = process_uploads(&state, files).await?;
    Ok(Html(pages::upload_page(&user.username, &report)))
}

#[derive(Deserialize)]
pub(super) struct DownloadQuery {
    n: Option<i64>,
    shuffle: Option<String>,
}

pub(super) async fn words_txt(
    State(state): State<SharedState>,
    SessionUser(user): SessionUser,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let query = query_params(query)?;
    let n = check_range("n", query.n.unwrap_or(DEFAULT_WORD_COUNT), 1, MAX_WORD_COUNT)?;

    let mut words = state.store.select_words_for_user(user.id, n)?;
    if query.shuffle.as_deref().is_some_and(is_truthy) {
        words.shuffle(&mut rand::rng());
    }

    let mut payload = words.join("\n");
    if !payload.is_empty() {
        payload.push('\n');
    }
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=words.txt"),
        ],
        payload,
    ))
}

pub(super) async fn reset_usage(
    State(state): State<SharedState>,
    SessionUser(user): SessionUser,
) -> Result<Redirect, AppError> {
    state.store.reset_usage(user.id)?;
    Ok(Redirect::to("/"))
}
