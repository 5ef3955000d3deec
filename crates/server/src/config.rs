//! Server configuration from command-line flags and environment variables.

use clap::Parser;
use croco_speller::{SpellerConfig, DEFAULT_BASE_URL, DEFAULT_LANG};
use std::path::PathBuf;
use std::time::Duration;

/// Words per download when the request does not say.
pub const DEFAULT_WORD_COUNT: i64 = 120;

/// Most words one download may ask for.
pub const MAX_WORD_COUNT: i64 = 10_000;

/// Rows on a word list page when the request does not say.
pub const DEFAULT_WORDS_PAGE_SIZE: i64 = 200;

/// Most rows on one word list page.
pub const MAX_WORDS_PAGE_SIZE: i64 = 1000;

/// Lifetime of a login session.
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// Admin account used when none is configured.
pub const DEFAULT_ADMIN_USER: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

/// Serve clue words extracted from slide decks.
#[derive(Parser, Debug, Clone)]
#[command(name = "croco-server")]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Bind host
    #[arg(long, env = "APP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Bind port
    #[arg(long, env = "APP_PORT", default_value_t = 8000)]
    pub port: u16,

    /// SQLite database file
    #[arg(long, env = "APP_DB_PATH", default_value = "data/words.db")]
    pub db_path: PathBuf,

    /// Admin account created or promoted at startup
    #[arg(long, env = "APP_USER")]
    pub admin_user: Option<String>,

    /// Password for a newly created admin account
    #[arg(long, env = "APP_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Base URL of the Yandex Speller JSON service
    #[arg(long, env = "SPELLER_URL", default_value = DEFAULT_BASE_URL)]
    pub speller_url: String,

    /// Languages the speller checks against
    #[arg(long, env = "SPELLER_LANG", default_value = DEFAULT_LANG)]
    pub speller_lang: String,

    /// Speller request timeout in seconds
    #[arg(long, env = "SPELLER_TIMEOUT_SECS", default_value_t = 30)]
    pub speller_timeout_secs: u64,

    /// Largest accepted request body in megabytes
    #[arg(long, env = "APP_MAX_UPLOAD_MB", default_value_t = 100)]
    pub max_upload_mb: usize,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServerConfig {
    /// Address to listen on.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Admin username and password, falling back to the defaults.
    pub fn admin_credentials(&self) -> (String, String) {
        if self.admin_user.is_none() || self.admin_password.is_none() {
            log::warn!("APP_USER or APP_PASSWORD not set. Using default credentials.");
        }
        (
            self.admin_user
                .clone()
                .unwrap_or_else(|| DEFAULT_ADMIN_USER.to_string()),
            self.admin_password
                .clone()
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
        )
    }

    /// Settings for the speller client.
    pub fn speller_config(&self) -> SpellerConfig {
        SpellerConfig {
            base_url: self.speller_url.clone(),
            lang: self.speller_lang.clone(),
            timeout: Duration::from_secs(self.speller_timeout_secs),
            ..SpellerConfig::default()
        }
    }

    /// Body size limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "croco-server",
            "--port",
            "9000",
            "--db-path",
            "/tmp/words.db",
            "--admin-user",
            "root",
            "--admin-password",
            "secret",
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.db_path, PathBuf::from("/tmp/words.db"));
        assert_eq!(
            config.admin_credentials(),
            ("root".to_string(), "secret".to_string())
        );
        assert_eq!(config.max_upload_bytes(), 100 * 1024 * 1024);
    }

    #[test]
    fn test_speller_config_uses_flags() {
        let config = ServerConfig::try_parse_from([
            "croco-server",
            "--speller-url",
            "http://localhost:9999/speller",
            "--speller-timeout-secs",
            "5",
        ])
        .unwrap();

        let speller = config.speller_config();
        assert_eq!(speller.base_url, "http://localhost:9999/speller");
        assert_eq!(speller.timeout, Duration::from_secs(5));
        assert_eq!(speller.options, 0);
    }
}
