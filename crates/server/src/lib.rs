//! Croco Words web application.
//!
//! Signed-in users upload slide decks, the clue words found in them are
//! spell-checked and stored, and each user downloads word lists that favour
//! the words they have not received recently.

pub mod auth;
pub mod config;
pub mod error;
pub mod pages;
pub mod routes;
pub mod state;
pub mod upload;

pub use config::ServerConfig;
pub use error::AppError;
pub use routes::router;
pub use state::{AppState, SharedState};
