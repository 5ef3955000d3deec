//! Request authentication: session cookies for the web UI, HTTP Basic for
//! the JSON API.

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use croco_store::User;

use crate::error::AppError;
use crate::state::{blocking_store, SharedState};

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "croco_session";

/// Session token from the request cookies, if any.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

/// `Set-Cookie` value starting a session.
pub fn session_cookie(token: &str) -> String {
    format!("{}={}; HttpOnly; SameSite=Lax; Path=/", SESSION_COOKIE, token)
}

/// `Set-Cookie` value removing the session cookie.
pub fn cleared_session_cookie() -> String {
    format!(
        "{}=\"\"; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/",
        SESSION_COOKIE
    )
}

/// Username and password from an `Authorization: Basic` header.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// User signed in through the session cookie.
pub struct SessionUser(pub User);

impl FromRequestParts<SharedState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(AppError::LoginRequired)?;
        state
            .store
            .session_user(&token)?
            .map(SessionUser)
            .ok_or(AppError::LoginRequired)
    }
}

/// Session user holding the admin role.
pub struct SessionAdmin(pub User);

impl FromRequestParts<SharedState> for SessionAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let SessionUser(user) = SessionUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Forbidden);
        }
        Ok(SessionAdmin(user))
    }
}

/// User authenticated with HTTP Basic credentials.
pub struct BasicUser(pub User);

impl FromRequestParts<SharedState> for BasicUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let (username, password) =
            basic_credentials(&parts.headers).ok_or(AppError::InvalidCredentials)?;
        blocking_store(state, move |store| store.verify_credentials(&username, &password))
            .await?
            .map(BasicUser)
            .ok_or(AppError::InvalidCredentials)
    }
}

/// Basic-authenticated user holding the admin role.
pub struct BasicAdmin(pub User);

impl FromRequestParts<SharedState> for BasicAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let BasicUser(user) = BasicUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Forbidden);
        }
        Ok(BasicAdmin(user))
    }
}
