//! HTTP routes.
//!
//! The browser UI lives in [`web`] and [`admin`] and authenticates through
//! the session cookie; [`api`] serves JSON behind HTTP Basic auth.

mod admin;
mod api;
mod web;

use axum::extract::rejection::QueryRejection;
use axum::extract::{DefaultBodyLimit, Query, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::time::Instant;

use crate::error::AppError;
use crate::state::SharedState;

/// Build the application router.
pub fn router(state: SharedState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        // Browser UI
        .route("/", get(web::index))
        .route("/login", get(web::login_form).post(web::login))
        .route("/logout", get(web::logout))
        .route("/words", get(web::words_page))
        .route("/words/edit", post(web::edit_word))
        .route("/words.txt", get(web::words_txt))
        .route("/upload", post(web::upload))
        .route("/usage/reset", post(web::reset_usage))
        // Administration
        .route("/admin", get(admin::admin_page))
        .route("/admin/users/create", post(admin::create_user))
        .route("/admin/users/password", post(admin::set_password))
        .route("/admin/users/role", post(admin::set_role))
        .route("/admin/users/delete", post(admin::delete_user))
        .route("/admin/users/reset-usage", post(admin::reset_usage))
        // JSON API
        .route("/api/upload", post(api::upload))
        .route("/api/words", get(api::words))
        .route("/api/users", post(api::create_user))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    log::info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

/// Unwrap query parameters, reporting malformed values as 422.
fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| AppError::Unprocessable(rejection.body_text()))
}

/// Whether a form or JSON flag value means "yes".
fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Check that `value` lies in `min..=max`.
fn check_range(name: &str, value: i64, min: i64, max: i64) -> Result<i64, AppError> {
    if value < min || value > max {
        return Err(AppError::Unprocessable(format!(
            "{} must be between {} and {}",
            name, min, max
        )));
    }
    Ok(value)
}

/// Trimmed username and password, both required.
fn required_credentials(username: &str, password: &str) -> Result<(String, String), AppError> {
    let username = username.trim();
    let password = password.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::bad_request("Username and password required."));
    }
    Ok((username.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy_values() {
        for value in ["1", "true", "YES", " on "] {
            assert!(is_truthy(value), "{value}");
        }
        for value in ["", "0", "false", "off", "nope"] {
            assert!(!is_truthy(value), "{value}");
        }
    }

    #[test]
    fn test_range_check() {
        assert_eq!(check_range("n", 1, 1, 10).unwrap(), 1);
        assert_eq!(check_range("n", 10, 1, 10).unwrap(), 10);
        assert!(matches!(check_range("n", 0, 1, 10), Err(AppError::Unprocessable(_))));
        assert!(matches!(check_range("n", 11, 1, 10), Err(AppError::Unprocessable(_))));
    }

    #[test]
    fn test_required_credentials_trims() {
        assert_eq!(
            required_credentials(" bob ", " pw\n").unwrap(),
            ("bob".to_string(), "pw".to_string())
        );
        assert!(matches!(
            required_credentials("bob", "   "),
            Err(AppError::BadRequest(_))
        ));
    }
}
