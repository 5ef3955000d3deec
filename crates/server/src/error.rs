//! Application error type and its HTTP rendering.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use croco_store::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// No valid session cookie; the browser is sent to the login page.
    #[error("Login required")]
    LoginRequired,

    /// Missing or wrong HTTP Basic credentials.
    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("Admin access required.")]
    Forbidden,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// A query or form value is outside its allowed range.
    #[error("{0}")]
    Unprocessable(String),

    #[error("Spelling service error: {0}")]
    Speller(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::LoginRequired => StatusCode::SEE_OTHER,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::Store(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Speller(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

impl From<croco_core::Error> for AppError {
    fn from(err: croco_core::Error) -> Self {
        use croco_core::Error;

        match err {
            Error::UnsupportedFormat(_) => Self::bad_request("Only .pptx or .zip is supported."),
            Error::ZipError(_) => Self::bad_request("Invalid zip file."),
            Error::PptxParseError(_) | Error::XmlError(_) => {
                Self::bad_request("Invalid presentation file.")
            }
            Error::SpellerError(message) => Self::Speller(message),
            Error::IoError(e) => Self::Internal(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let detail = match &self {
            Self::LoginRequired => return Redirect::to("/login").into_response(),
            Self::InvalidCredentials => {
                return (
                    status,
                    [(header::WWW_AUTHENTICATE, "Basic")],
                    Json(ErrorBody {
                        detail: self.to_string(),
                    }),
                )
                    .into_response();
            }
            Self::Store(StoreError::Duplicate(what)) => format!("Already exists: {}", what),
            // Hide internal details
            Self::Store(_) | Self::Internal(_) => {
                log::error!("{}", self);
                "Internal server error".to_owned()
            }
            Self::Speller(_) => {
                log::error!("{}", self);
                "Spelling service unavailable".to_owned()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_codes() {
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Store(StoreError::Duplicate("user x".into())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Store(StoreError::Poisoned).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Speller("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn core_errors_map_to_client_errors() {
        let err = AppError::from(croco_core::Error::UnsupportedFormat("a.txt".into()));
        assert_eq!(err.to_string(), "Only .pptx or .zip is supported.");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AppError::from(croco_core::Error::ZipError("bad".into()));
        assert_eq!(err.to_string(), "Invalid zip file.");

        let err = AppError::from(croco_core::Error::SpellerError("timeout".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn login_required_redirects() {
        let response = AppError::LoginRequired.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[test]
    fn invalid_credentials_challenge_basic() {
        let response = AppError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Basic");
    }
}
