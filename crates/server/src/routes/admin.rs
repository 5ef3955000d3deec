//! User administration for admins signed in through the browser.

use axum::extract::State;
use axum::response::{Html, Redirect};
use axum::Form;
use croco_store::User;
use serde::Deserialize;

use super::{is_truthy, required_credentials};
use crate::auth::SessionAdmin;
use crate::error::AppError;
use crate::pages;
use crate::state::{blocking_store, SharedState};

pub(super) async fn admin_page(
    State(state): State<SharedState>,
    SessionAdmin(admin): SessionAdmin,
) -> Result<Html<String>, AppError> {
    let users = state.store.list_users()?;
    Ok(Html(pages::admin_page(&admin.username, &users)))
}

#[derive(Deserialize)]
pub(super) struct CredentialsForm {
    username: String,
    password: String,
    is_admin: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct RoleForm {
    username: String,
    is_admin: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct UsernameForm {
    username: String,
}

fn back_to_admin() -> Redirect {
    Redirect::to("/admin")
}

fn required_username(username: &str) -> Result<String, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::bad_request("Username required."));
    }
    Ok(username.to_string())
}

fn existing_user(state: &SharedState, username: &str) -> Result<User, AppError> {
    state
        .store
        .find_user(username)?
        .ok_or_else(|| AppError::not_found("User not found."))
}

/// Refuse to leave the store without an admin.
fn ensure_not_last_admin(state: &SharedState, target: &User, message: &str) -> Result<(), AppError> {
    if target.is_admin && state.store.count_admins()? <= 1 {
        return Err(AppError::bad_request(message));
    }
    Ok(())
}

pub(super) async fn create_user(
    State(state): State<SharedState>,
    SessionAdmin(admin): SessionAdmin,
    Form(form): Form<CredentialsForm>,
) -> Result<Redirect, AppError> {
    let (username, password) = required_credentials(&form.username, &form.password)?;
    let is_admin = form.is_admin.as_deref().is_some_and(is_truthy);
    if state.store.find_user(&username)?.is_some() {
        return Err(AppError::Conflict("User already exists.".to_string()));
    }

    blocking_store(&state, move |store| store.create_user(&username, &password, is_admin)).await?;
    log::info!("Admin {} created a user", admin.username);
    Ok(back_to_admin())
}

pub(super) async fn set_password(
    State(state): State<SharedState>,
    SessionAdmin(_admin): SessionAdmin,
    Form(form): Form<CredentialsForm>,
) -> Result<Redirect, AppError> {
    let (username, password) = required_credentials(&form.username, &form.password)?;
    existing_user(&state, &username)?;

    blocking_store(&state, move |store| store.set_password(&username, &password)).await?;
    Ok(back_to_admin())
}

pub(super) async fn set_role(
    State(state): State<SharedState>,
    SessionAdmin(admin): SessionAdmin,
    Form(form): Form<RoleForm>,
) -> Result<Redirect, AppError> {
    let username = required_username(&form.username)?;
    let target = existing_user(&state, &username)?;
    let make_admin = form.is_admin.as_deref().is_some_and(is_truthy);

    if !make_admin {
        if target.id == admin.id {
            return Err(AppError::bad_request("Cannot remove admin from self."));
        }
        ensure_not_last_admin(&state, &target, "Cannot remove last admin.")?;
    }

    state.store.set_admin(&username, make_admin)?;
    log::info!("Admin {} set admin={} for {}", admin.username, make_admin, username);
    Ok(back_to_admin())
}

pub(super) async fn delete_user(
    State(state): State<SharedState>,
    SessionAdmin(admin): SessionAdmin,
    Form(form): Form<UsernameForm>,
) -> Result<Redirect, AppError> {
    let username = required_username(&form.username)?;
    if username == admin.username {
        return Err(AppError::bad_request("Cannot delete self."));
    }
    let target = existing_user(&state, &username)?;
    ensure_not_last_admin(&state, &target, "Cannot delete last admin.")?;

    state.store.delete_user(&username)?;
    log::info!("Admin {} deleted {}", admin.username, username);
    Ok(back_to_admin())
}

pub(super) async fn reset_usage(
    State(state): State<SharedState>,
    SessionAdmin(_admin): SessionAdmin,
    Form(form): Form<UsernameForm>,
) -> Result<Redirect, AppError> {
    let username = required_username(&form.username)?;
    let target = existing_user(&state, &username)?;
    state.store.reset_usage(target.id)?;
    Ok(back_to_admin())
}
